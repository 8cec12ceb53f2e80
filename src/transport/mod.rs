//! The transport collaborator.
//!
//! Everything that touches the network (connections, TLS, proxies, redirect
//! following) lives behind the [`Transport`] and [`Session`] traits. The
//! request orchestration in [`client`](crate::client) only configures a
//! session through typed [`TransportOption`]s, executes it and parses the
//! raw bytes it returns.
//!
//! # Overview
//!
//! - [`Transport::open`] allocates a [`Session`]
//! - [`Session::set_option`] configures one knob
//! - [`Session::execute`] performs the blocking call and returns the raw
//!   response stream: one header block per followed redirect, then the final
//!   header block and the body
//! - [`Session::diagnostics`] reports the redirect count, effective URL,
//!   timing and the request header trace
//! - dropping the session releases it
//!
//! [`ReqwestTransport`] is the default implementation.

pub mod codes;
pub mod native;

pub use codes::code_name;
pub use native::{ReqwestSession, ReqwestTransport};

use crate::content::RequestBody;
use crate::error::{Error, Result};
use crate::store::{KeyValueStore, SlotKey};

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Opens transport sessions.
pub trait Transport {
    type Session: Session;

    /// Allocates a fresh session, optionally pointed at `url` already.
    fn open(&self, url: Option<&str>) -> Result<Self::Session>;
}

/// One transport handle. Dropping it closes it.
pub trait Session {
    /// Applies a single option.
    fn set_option(&mut self, option: &TransportOption) -> Result<()>;

    /// Performs the blocking call.
    fn execute(&mut self) -> std::result::Result<Vec<u8>, TransportFailure>;

    /// Details about the last call.
    fn diagnostics(&self) -> Diagnostics;
}

/// A call that produced no result at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportFailure {
    /// Native error code, see [`codes`].
    pub code: u32,
    pub message: String,
}

impl TransportFailure {
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<TransportFailure> for Error {
    fn from(failure: TransportFailure) -> Self {
        Error::transport(failure.code, failure.message)
    }
}

/// What the transport knows about the last call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    /// URL of the final hop.
    pub effective_url: String,
    /// Number of redirects followed.
    pub redirect_count: u32,
    /// Status code of the final hop.
    pub http_code: u16,
    pub total_time: Duration,
    /// The request line and headers as sent, when capture is enabled.
    pub request_header: String,
}

/// Proxy protocols.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProxyKind {
    #[default]
    Http,
    Socks4,
    Socks5,
}

impl ProxyKind {
    pub fn scheme(&self) -> &'static str {
        match self {
            ProxyKind::Http => "http",
            ProxyKind::Socks4 => "socks4",
            ProxyKind::Socks5 => "socks5",
        }
    }
}

/// HTTP authentication methods.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthScheme {
    #[default]
    Basic,
}

/// Names of the transport knobs; the key of the option store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionKey {
    Url,
    IncludeHeaders,
    UserAgent,
    CookieFile,
    CookieJar,
    FollowLocation,
    CaptureRequestHeaders,
    HttpHeader,
    Cookie,
    NoBody,
    HttpGet,
    Post,
    CustomRequest,
    PostFields,
    SslVerifyPeer,
    Referer,
    Proxy,
    ProxyPort,
    ProxyType,
    HttpAuth,
    UserPwd,
    ConnectTimeout,
    Timeout,
}

impl OptionKey {
    /// The native flag this key maps to.
    pub fn native_name(&self) -> &'static str {
        match self {
            OptionKey::Url => "CURLOPT_URL",
            OptionKey::IncludeHeaders => "CURLOPT_HEADER",
            OptionKey::UserAgent => "CURLOPT_USERAGENT",
            OptionKey::CookieFile => "CURLOPT_COOKIEFILE",
            OptionKey::CookieJar => "CURLOPT_COOKIEJAR",
            OptionKey::FollowLocation => "CURLOPT_FOLLOWLOCATION",
            OptionKey::CaptureRequestHeaders => "CURLINFO_HEADER_OUT",
            OptionKey::HttpHeader => "CURLOPT_HTTPHEADER",
            OptionKey::Cookie => "CURLOPT_COOKIE",
            OptionKey::NoBody => "CURLOPT_NOBODY",
            OptionKey::HttpGet => "CURLOPT_HTTPGET",
            OptionKey::Post => "CURLOPT_POST",
            OptionKey::CustomRequest => "CURLOPT_CUSTOMREQUEST",
            OptionKey::PostFields => "CURLOPT_POSTFIELDS",
            OptionKey::SslVerifyPeer => "CURLOPT_SSL_VERIFYPEER",
            OptionKey::Referer => "CURLOPT_REFERER",
            OptionKey::Proxy => "CURLOPT_PROXY",
            OptionKey::ProxyPort => "CURLOPT_PROXYPORT",
            OptionKey::ProxyType => "CURLOPT_PROXYTYPE",
            OptionKey::HttpAuth => "CURLOPT_HTTPAUTH",
            OptionKey::UserPwd => "CURLOPT_USERPWD",
            OptionKey::ConnectTimeout => "CURLOPT_CONNECTTIMEOUT",
            OptionKey::Timeout => "CURLOPT_TIMEOUT",
        }
    }

    /// Keys that only describe the request being built, never a later one.
    pub fn is_request_scoped(&self) -> bool {
        matches!(
            self,
            OptionKey::Url
                | OptionKey::NoBody
                | OptionKey::HttpGet
                | OptionKey::Post
                | OptionKey::CustomRequest
                | OptionKey::PostFields
        )
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.native_name())
    }
}

impl SlotKey for OptionKey {
    fn same_slot(&self, other: &Self, _case_fold: bool) -> bool {
        self == other
    }
}

/// A transport knob together with its typed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportOption {
    Url(String),
    /// Prefix the returned bytes with the response header blocks.
    IncludeHeaders(bool),
    UserAgent(String),
    /// Cookie file read before each call.
    CookieFile(PathBuf),
    /// Cookie file written after each call.
    CookieJar(PathBuf),
    FollowLocation(bool),
    CaptureRequestHeaders(bool),
    /// Request headers as `Name: value` lines.
    HttpHeader(Vec<String>),
    /// Value of the `Cookie` request header.
    Cookie(String),
    NoBody(bool),
    HttpGet(bool),
    Post(bool),
    CustomRequest(String),
    PostFields(RequestBody),
    SslVerifyPeer(bool),
    Referer(String),
    Proxy(String),
    ProxyPort(u16),
    ProxyType(ProxyKind),
    HttpAuth(AuthScheme),
    /// `user:password`.
    UserPwd(String),
    ConnectTimeout(Duration),
    Timeout(Duration),
}

impl TransportOption {
    pub fn key(&self) -> OptionKey {
        match self {
            TransportOption::Url(_) => OptionKey::Url,
            TransportOption::IncludeHeaders(_) => OptionKey::IncludeHeaders,
            TransportOption::UserAgent(_) => OptionKey::UserAgent,
            TransportOption::CookieFile(_) => OptionKey::CookieFile,
            TransportOption::CookieJar(_) => OptionKey::CookieJar,
            TransportOption::FollowLocation(_) => OptionKey::FollowLocation,
            TransportOption::CaptureRequestHeaders(_) => OptionKey::CaptureRequestHeaders,
            TransportOption::HttpHeader(_) => OptionKey::HttpHeader,
            TransportOption::Cookie(_) => OptionKey::Cookie,
            TransportOption::NoBody(_) => OptionKey::NoBody,
            TransportOption::HttpGet(_) => OptionKey::HttpGet,
            TransportOption::Post(_) => OptionKey::Post,
            TransportOption::CustomRequest(_) => OptionKey::CustomRequest,
            TransportOption::PostFields(_) => OptionKey::PostFields,
            TransportOption::SslVerifyPeer(_) => OptionKey::SslVerifyPeer,
            TransportOption::Referer(_) => OptionKey::Referer,
            TransportOption::Proxy(_) => OptionKey::Proxy,
            TransportOption::ProxyPort(_) => OptionKey::ProxyPort,
            TransportOption::ProxyType(_) => OptionKey::ProxyType,
            TransportOption::HttpAuth(_) => OptionKey::HttpAuth,
            TransportOption::UserPwd(_) => OptionKey::UserPwd,
            TransportOption::ConnectTimeout(_) => OptionKey::ConnectTimeout,
            TransportOption::Timeout(_) => OptionKey::Timeout,
        }
    }
}

/// Option storage: one typed value per [`OptionKey`].
pub type OptionStore = KeyValueStore<OptionKey, TransportOption>;

impl OptionStore {
    /// Stores `option` under its own key.
    pub fn put(&mut self, option: TransportOption) -> Result<()> {
        self.set(option.key(), option)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_key_round_trip() {
        let option = TransportOption::Timeout(Duration::from_secs(5));
        assert_eq!(option.key(), OptionKey::Timeout);
        assert_eq!(option.key().to_string(), "CURLOPT_TIMEOUT");
    }

    #[test]
    fn test_option_store_keeps_one_value_per_key() {
        let mut options = OptionStore::new();
        options.put(TransportOption::Post(true)).unwrap();
        options.put(TransportOption::Timeout(Duration::from_secs(1))).unwrap();
        options.put(TransportOption::Timeout(Duration::from_secs(2))).unwrap();

        assert_eq!(options.len(), 2);
        assert_eq!(
            options.get(&OptionKey::Timeout),
            Some(&TransportOption::Timeout(Duration::from_secs(2)))
        );
    }

    #[test]
    fn test_request_scoped_keys() {
        assert!(OptionKey::PostFields.is_request_scoped());
        assert!(OptionKey::CustomRequest.is_request_scoped());
        assert!(!OptionKey::Timeout.is_request_scoped());
        assert!(!OptionKey::HttpHeader.is_request_scoped());
    }

    #[test]
    fn test_failure_converts_through_code_table() {
        let err: Error = TransportFailure::new(7, "Connection refused").into();
        assert_eq!(err.to_string(), "CURLE_COULDNT_CONNECT: Connection refused");
    }
}
