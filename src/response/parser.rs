//! Raw response stream decoding.
//!
//! The transport hands back every header block it saw, one per followed
//! redirect, then the final header block and the body. Parsing walks through
//! four states:
//!
//! - `AwaitingHeaderBlock`: skip `redirect_count` hop blocks and cut the
//!   final header block at its blank line
//! - `HeaderBlockFound`: read the status line and the `name: value` lines
//! - `BodyExtracted`: collect the `Set-Cookie` lines
//! - `Done`: assemble the [`Response`]
//!
//! Any failure discards the whole response.

use super::{Response, ResponseHeader};
use crate::cookie::CookieJar;
use crate::error::{Error, Result};
use crate::store::HeaderStore;

use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, trace};

const BLOCK_END: &[u8] = b"\r\n\r\n";

fn status_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"HTTP/(\d+(?:\.\d+)?)[ \t]+(\d{3})(?:[ \t]+([^\r\n]*))?")
            .expect("status line pattern is valid")
    })
}

/// A status line at the very start of the remaining bytes.
fn status_start_pattern() -> &'static regex::bytes::Regex {
    static PATTERN: OnceLock<regex::bytes::Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        regex::bytes::Regex::new(r"^HTTP/\d+(?:\.\d+)?[ \t]+\d{3}(?:[ \t]|\r\n)")
            .expect("status line start pattern is valid")
    })
}

fn starts_with_status_line(bytes: &[u8]) -> bool {
    status_start_pattern().is_match(bytes)
}

fn field_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([!#$%&'*+.^_`|~0-9A-Za-z-]+):[ \t]*(.*?)[ \t]*$")
            .expect("header field pattern is valid")
    })
}

#[derive(Debug)]
enum State<'a> {
    AwaitingHeaderBlock,
    HeaderBlockFound {
        block: &'a [u8],
        body: &'a [u8],
    },
    BodyExtracted {
        block: String,
        header: ResponseHeader,
        body: &'a [u8],
    },
    Done(Response),
}

/// Decodes a raw response stream that went through `redirect_count` hops.
///
/// ```rust
/// use curlish::response::parse_response;
///
/// let raw = b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\n\r\nhello";
/// let response = parse_response(raw, 0)?;
/// assert_eq!(response.status_code(), 200);
/// assert_eq!(response.header("content-type"), Some("text/plain"));
/// assert_eq!(response.text(), "hello");
/// # Ok::<(), curlish::Error>(())
/// ```
pub fn parse_response(raw: &[u8], redirect_count: u32) -> Result<Response> {
    let mut state = State::AwaitingHeaderBlock;

    loop {
        state = match state {
            State::AwaitingHeaderBlock => {
                let (block, body) = split_blocks(raw, redirect_count)?;
                State::HeaderBlockFound { block, body }
            }
            State::HeaderBlockFound { block, body } => {
                let block = String::from_utf8_lossy(block).into_owned();
                let header = parse_header_block(&block)?;
                trace!(status = header.status_code, fields = header.fields.len(), "parsed header block");
                State::BodyExtracted { block, header, body }
            }
            State::BodyExtracted { block, header, body } => {
                let cookies = CookieJar::parse(&block);
                State::Done(Response {
                    body: body.to_vec(),
                    header,
                    cookies,
                    redirect_count,
                    raw_header_block: block,
                })
            }
            State::Done(response) => {
                debug!(
                    status = response.status_code(),
                    redirects = redirect_count,
                    body_len = response.body().len(),
                    "parsed response"
                );
                return Ok(response);
            }
        };
    }
}

/// Isolates the final header block and the body that follows it.
fn split_blocks(raw: &[u8], redirect_count: u32) -> Result<(&[u8], &[u8])> {
    let mut cursor = 0;
    let mut last = None;

    for _ in 0..=redirect_count {
        match find(&raw[cursor..], BLOCK_END) {
            Some(offset) => {
                last = Some((cursor, cursor + offset));
                cursor += offset + BLOCK_END.len();
            }
            None => break,
        }
        // No further status line: this block is the final one.
        if !starts_with_status_line(&raw[cursor..]) {
            break;
        }
    }

    let Some((start, end)) = last else {
        return Err(Error::MalformedResponse(
            "no blank line terminates the header block".to_string(),
        ));
    };
    let (mut block, mut body) = (&raw[start..end], &raw[cursor..]);

    // A miscounted hop leaves another complete header block at the start of
    // the body. Without a terminator the bytes stay in the body.
    if starts_with_status_line(body) {
        if let Some(offset) = find(body, BLOCK_END) {
            block = &body[..offset];
            body = &body[offset + BLOCK_END.len()..];
        }
    }

    Ok((block, body))
}

fn parse_header_block(block: &str) -> Result<ResponseHeader> {
    let status = status_pattern()
        .captures(block)
        .ok_or_else(|| Error::MalformedResponse("no status line found".to_string()))?;

    let http_version = status[1].to_string();
    let status_code = status[2]
        .parse::<u16>()
        .map_err(|err| Error::MalformedResponse(format!("bad status code: {err}")))?;
    let reason = status.get(3).map_or("", |reason| reason.as_str());
    let status_text = match reason.find("HTTP/") {
        Some(index) => &reason[..index],
        None => reason,
    }
    .trim()
    .to_string();

    let mut fields = HeaderStore::case_insensitive();
    for line in block.split("\r\n").skip(1) {
        if let Some(field) = field_pattern().captures(line) {
            fields.set(&field[1], &field[2])?;
        }
    }

    Ok(ResponseHeader {
        http_version,
        status_code,
        status_text,
        fields: fields.snapshot(),
    })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}
