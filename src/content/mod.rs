//! Outgoing request content.
//!
//! This module holds the payload types a caller hands to a verb method and
//! the logic that turns them into what goes on the wire:
//!
//! - [`negotiate`] - picks the body encoding from `Content-Type` and the
//!   pending file attachments, and computes `Content-Length`
//! - [`url`] - merges query parameters into the request URL
//!
//! # Examples
//!
//! ```rust
//! use curlish::content::{negotiate, Payload, RequestBody};
//! use curlish::store::HeaderStore;
//!
//! let mut headers = HeaderStore::case_insensitive();
//! headers.set("Content-Type", "application/json")?;
//!
//! let body = negotiate(&mut headers, Payload::from([("name", "curlish")]), &[])?;
//! assert_eq!(body, RequestBody::Text(r#"{"name":"curlish"}"#.to_string()));
//! assert_eq!(headers.get("Content-Length").map(String::as_str), Some("18"));
//! # Ok::<(), curlish::Error>(())
//! ```

pub mod negotiate;
pub mod url;

pub use negotiate::{is_json_content_type, is_xml_content_type, negotiate, MULTIPART_FORM_DATA};
pub use url::build_url;

use crate::error::Result;

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::path::{Path, PathBuf};

/// Prefix marking a field value as a reference to a file to upload.
pub const FILE_MARKER: char = '@';

/// Ordered `name -> value` form fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields(Vec<(String, String)>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field; an existing field with the same name is overwritten.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `application/x-www-form-urlencoded` rendering, fields joined by `&`.
    pub fn to_query(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.iter())
            .finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Fields::new();
        for (name, value) in iter {
            fields.insert(name, value);
        }
        fields
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for Fields {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.insert(name, value);
        }
    }
}

/// Serializes as a JSON object whose members keep field order.
impl Serialize for Fields {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// What a caller passes to a verb method.
///
/// For `GET`, `HEAD` and `DELETE` the payload becomes the query string; for
/// every other method it becomes the request body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Payload {
    #[default]
    None,
    /// A mapping, encoded according to the declared `Content-Type`.
    Fields(Fields),
    /// A pre-encoded string, sent as-is.
    Text(String),
}

impl Payload {
    pub fn is_empty(&self) -> bool {
        match self {
            Payload::None => true,
            Payload::Fields(fields) => fields.is_empty(),
            Payload::Text(text) => text.is_empty(),
        }
    }
}

impl From<()> for Payload {
    fn from(_: ()) -> Self {
        Payload::None
    }
}

impl From<Fields> for Payload {
    fn from(fields: Fields) -> Self {
        Payload::Fields(fields)
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_string())
    }
}

impl<K: Into<String>, V: Into<String>> From<Vec<(K, V)>> for Payload {
    fn from(pairs: Vec<(K, V)>) -> Self {
        Payload::Fields(pairs.into_iter().collect())
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for Payload {
    fn from(pairs: [(K, V); N]) -> Self {
        Payload::Fields(pairs.into_iter().collect())
    }
}

impl<T: Into<Payload>> From<Option<T>> for Payload {
    fn from(payload: Option<T>) -> Self {
        payload.map(Into::into).unwrap_or_default()
    }
}

/// The body handed to the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RequestBody {
    /// No body is sent.
    #[default]
    None,
    /// Encoded text: url-encoded form, JSON, XML or a raw caller string.
    Text(String),
    /// Form fields for a `multipart/form-data` upload. Values starting with
    /// [`FILE_MARKER`] reference a file by absolute path.
    Multipart(Fields),
}

impl RequestBody {
    pub fn is_none(&self) -> bool {
        matches!(self, RequestBody::None)
    }

    /// Short name used in log records.
    pub fn kind(&self) -> &'static str {
        match self {
            RequestBody::None => "none",
            RequestBody::Text(_) => "text",
            RequestBody::Multipart(_) => "multipart",
        }
    }
}

/// A file queued for upload under a form field name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFile {
    pub field: String,
    pub path: PathBuf,
}

impl PendingFile {
    /// Queues `path` under `field`, resolving it to an absolute path.
    ///
    /// Fails when the file cannot be resolved, so that a bad attachment is
    /// reported while configuring rather than by the transport.
    pub fn new(field: impl Into<String>, path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            field: field.into(),
            path: path.as_ref().canonicalize()?,
        })
    }

    /// The `@/absolute/path` field value the transport recognizes.
    pub fn marker(&self) -> String {
        format!("{FILE_MARKER}{}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_keep_order_and_overwrite() {
        let mut fields: Fields = [("b", "1"), ("a", "2")].into_iter().collect();
        fields.insert("b", "3");
        let pairs: Vec<(&str, &str)> = fields.iter().collect();
        assert_eq!(pairs, vec![("b", "3"), ("a", "2")]);
    }

    #[test]
    fn test_fields_to_query_percent_encodes() {
        let fields: Fields = [("q", "rust lang"), ("x&y", "1=2")].into_iter().collect();
        assert_eq!(fields.to_query(), "q=rust+lang&x%26y=1%3D2");
    }

    #[test]
    fn test_fields_serialize_in_order() {
        let fields: Fields = [("z", "1"), ("a", "2")].into_iter().collect();
        assert_eq!(serde_json::to_string(&fields).unwrap(), r#"{"z":"1","a":"2"}"#);
    }

    #[test]
    fn test_payload_conversions() {
        assert_eq!(Payload::from("raw"), Payload::Text("raw".to_string()));
        assert!(Payload::from(None::<&str>).is_empty());
        assert_eq!(Payload::from(()), Payload::None);
        assert!(Payload::from(Vec::<(String, String)>::new()).is_empty());
        assert!(!Payload::from([("a", "1")]).is_empty());
    }

    #[test]
    fn test_pending_file_marker_is_absolute() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload.txt");
        std::fs::write(&path, b"data").unwrap();

        let file = PendingFile::new("doc", &path).unwrap();
        assert!(file.path.is_absolute());
        assert!(file.marker().starts_with('@'));
        assert!(file.marker().ends_with("upload.txt"));
    }

    #[test]
    fn test_pending_file_missing_path_fails() {
        assert!(PendingFile::new("doc", "/definitely/not/here.txt").is_err());
    }
}
