//! Read-only record of the last request.

use crate::error::Result;
use crate::store::HeaderStore;
use crate::transport::{Diagnostics, OptionStore};

use regex::Regex;
use std::sync::OnceLock;

/// Pseudo-entry holding the protocol version of the request line.
pub const HTTP_VERSION: &str = "Http-Version";
/// Pseudo-entry holding the method of the request line.
pub const REQUEST_METHOD: &str = "Request-Method";

/// What was configured and sent for the last call. Every store is frozen.
#[derive(Debug, Clone)]
pub struct RequestSnapshot {
    /// The header store as it stood after body negotiation.
    pub headers: HeaderStore,
    /// The option store applied to the transport.
    pub options: OptionStore,
    /// Headers actually sent, from the transport's request trace.
    pub request_headers: HeaderStore,
    pub diagnostics: Diagnostics,
}

impl RequestSnapshot {
    pub(crate) fn capture(headers: &HeaderStore, options: &OptionStore, diagnostics: Diagnostics) -> Result<Self> {
        Ok(Self {
            headers: headers.snapshot(),
            options: options.snapshot(),
            request_headers: parse_request_trace(&diagnostics.request_header)?,
            diagnostics,
        })
    }
}

fn request_line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\S+)\s+\S+\s+HTTP/(\S+)$").expect("request line pattern is valid")
    })
}

/// Turns a request trace into a frozen, case-insensitive store.
pub(crate) fn parse_request_trace(trace: &str) -> Result<HeaderStore> {
    let mut headers = HeaderStore::case_insensitive();
    for line in trace.lines().map(str::trim_end) {
        if let Some((name, value)) = line.split_once(": ") {
            headers.set(name.trim(), value.trim())?;
        } else if let Some(request_line) = request_line_pattern().captures(line) {
            headers.set(HTTP_VERSION, &request_line[2])?;
            headers.set(REQUEST_METHOD, &request_line[1])?;
        }
    }
    Ok(headers.snapshot())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_trace() {
        let trace = "POST /submit?a=1 HTTP/1.1\r\nHost: example.com\r\nContent-Length: 3\r\n\r\n";
        let headers = parse_request_trace(trace).unwrap();

        assert!(headers.is_frozen());
        assert_eq!(headers.get(REQUEST_METHOD).map(String::as_str), Some("POST"));
        assert_eq!(headers.get(HTTP_VERSION).map(String::as_str), Some("1.1"));
        assert_eq!(headers.get("host").map(String::as_str), Some("example.com"));
        assert_eq!(headers.len(), 4);
    }

    #[test]
    fn test_empty_trace() {
        assert!(parse_request_trace("").unwrap().is_empty());
    }
}
