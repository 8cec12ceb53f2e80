//! Parsed responses.
//!
//! A [`Response`] is built once per completed request by [`parse_response`]
//! and never changes afterwards. Its header store is frozen.

pub mod parser;

pub use parser::parse_response;

use crate::cookie::{Cookie, CookieJar};
use crate::store::HeaderStore;

use std::borrow::Cow;
use std::fmt;

/// Status line and header fields of the final hop.
#[derive(Debug, Clone)]
pub struct ResponseHeader {
    /// Protocol version without the `HTTP/` prefix, e.g. `1.1` or `2`.
    pub http_version: String,
    pub status_code: u16,
    /// Reason phrase; empty when the server sent none.
    pub status_text: String,
    /// `name -> value` pairs, matched case-insensitively.
    pub fields: HeaderStore,
}

/// A fully parsed response.
#[derive(Debug, Clone)]
pub struct Response {
    pub(crate) body: Vec<u8>,
    pub(crate) header: ResponseHeader,
    pub(crate) cookies: CookieJar,
    pub(crate) redirect_count: u32,
    pub(crate) raw_header_block: String,
}

impl Response {
    /// The bytes after the final header block.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The body decoded as UTF-8, invalid sequences replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Consumes the response, returning the body.
    pub fn into_body(self) -> Vec<u8> {
        self.body
    }

    pub fn header_info(&self) -> &ResponseHeader {
        &self.header
    }

    /// Value of header `name`, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.header.fields.get(name).map(String::as_str)
    }

    pub fn header_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.header(name).unwrap_or(default)
    }

    /// All header fields of the final hop.
    pub fn headers(&self) -> &HeaderStore {
        &self.header.fields
    }

    pub fn status_code(&self) -> u16 {
        self.header.status_code
    }

    pub fn status_text(&self) -> &str {
        &self.header.status_text
    }

    pub fn http_version(&self) -> &str {
        &self.header.http_version
    }

    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }

    /// Value of the first cookie called `name`.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name)
    }

    pub fn find_cookie(&self, name: &str) -> Option<&Cookie> {
        self.cookies.find(name)
    }

    /// Number of redirect header blocks skipped before the final one.
    pub fn redirect_count(&self) -> u32 {
        self.redirect_count
    }

    /// The final header block as received, without its blank line.
    pub fn raw_header_block(&self) -> &str {
        &self.raw_header_block
    }

    /// Whether the status code is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.header.status_code)
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}
