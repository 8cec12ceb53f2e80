//! Body encoding selection.
//!
//! The steps run in a fixed order, and reordering them changes the outcome
//! for mixed requests:
//!
//! 1. A mapping under a JSON `Content-Type` becomes its JSON serialization.
//! 2. An XML `Content-Type` only makes the body length get computed.
//! 3. Pending files become `field -> @/absolute/path` markers merged into a
//!    mapping payload, and `Content-Type` switches to `multipart/form-data`.
//! 4. A mapping left over, with no files and no multipart type, is url-encoded.
//! 5. JSON, XML and string bodies get a `Content-Length`.
//! 6. An empty result sends no body.

use super::{Fields, Payload, PendingFile, RequestBody};
use crate::error::Result;
use crate::store::HeaderStore;

use regex::Regex;
use std::sync::OnceLock;
use tracing::trace;

pub const MULTIPART_FORM_DATA: &str = "multipart/form-data";

const CONTENT_TYPE: &str = "Content-Type";
const CONTENT_LENGTH: &str = "Content-Length";

fn json_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^(?:application|text)/(?:[a-z]+(?:[.-][0-9a-z]+)*[+.]|x-)?json(?:-[a-z]+)?")
            .expect("JSON content-type pattern is valid")
    })
}

fn xml_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^(?:text/|application/(?:atom\+|rss\+)?)xml")
            .expect("XML content-type pattern is valid")
    })
}

/// Whether `content_type` declares a JSON document, vendor types included.
pub fn is_json_content_type(content_type: &str) -> bool {
    json_pattern().is_match(content_type.trim())
}

/// Whether `content_type` declares an XML, Atom or RSS document.
pub fn is_xml_content_type(content_type: &str) -> bool {
    xml_pattern().is_match(content_type.trim())
}

/// Decides the wire body for `payload`, updating `headers` in place.
///
/// `Content-Type` is read from the live header store; `Content-Length`
/// (and `Content-Type` when files are attached) are written back to it.
pub fn negotiate(headers: &mut HeaderStore, payload: Payload, files: &[PendingFile]) -> Result<RequestBody> {
    // A length left over from an earlier call never describes this body.
    headers.remove(CONTENT_LENGTH)?;

    let content_type = headers.get(CONTENT_TYPE).cloned().unwrap_or_default();
    let is_json = is_json_content_type(&content_type);
    let is_xml = is_xml_content_type(&content_type);

    let mut payload = payload;

    if is_json {
        if let Payload::Fields(fields) = &payload {
            payload = Payload::Text(serde_json::to_string(fields)?);
        }
    }

    if !files.is_empty() {
        let markers: Fields = files.iter().map(|file| (file.field.clone(), file.marker())).collect();
        headers.set(CONTENT_TYPE, MULTIPART_FORM_DATA)?;
        payload = match payload {
            Payload::None => Payload::Fields(markers),
            Payload::Fields(mut fields) => {
                fields.extend(markers.iter());
                Payload::Fields(fields)
            }
            text => text,
        };
    }

    let multipart = files.is_empty()
        && headers
            .get(CONTENT_TYPE)
            .is_some_and(|value| value.trim().to_ascii_lowercase().starts_with(MULTIPART_FORM_DATA));

    if let Payload::Fields(fields) = &payload {
        if files.is_empty() && !multipart {
            payload = Payload::Text(fields.to_query());
        }
    }

    // JSON and XML payloads are always text by now.
    if let Payload::Text(text) = &payload {
        headers.set(CONTENT_LENGTH, text.len().to_string())?;
    }

    let body = match payload {
        Payload::None => RequestBody::None,
        Payload::Fields(fields) if fields.is_empty() => RequestBody::None,
        Payload::Fields(fields) => RequestBody::Multipart(fields),
        Payload::Text(text) if text.is_empty() => RequestBody::None,
        Payload::Text(text) => RequestBody::Text(text),
    };

    trace!(kind = body.kind(), json = is_json, xml = is_xml, "negotiated request body");
    Ok(body)
}
