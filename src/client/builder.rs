//! Builder pattern implementation for creating [`Client`] instances.
//!
//! ```rust
//! use curlish::{ClientBuilder, ProxyKind};
//! use std::time::Duration;
//!
//! let client = ClientBuilder::new()
//!     .user_agent("curlish/0.1")
//!     .header("Accept", "application/json")
//!     .timeout(Duration::from_secs(5), Some(Duration::from_secs(30)))
//!     .proxy("127.0.0.1", Some(1080), ProxyKind::Socks5)
//!     .build()?;
//! assert_eq!(client.header("accept"), Some("application/json"));
//! # Ok::<(), curlish::Error>(())
//! ```

use super::client::Client;
use super::config::{self, ClientConfig};
use crate::error::Result;
use crate::transport::{ProxyKind, ReqwestTransport, Transport, TransportOption};

use std::path::PathBuf;
use std::time::Duration;

/// A builder used to create a [`Client`].
#[derive(Debug, Default)]
pub struct ClientBuilder {
    config: ClientConfig,
    headers: Vec<(String, String)>,
    options: Vec<TransportOption>,
    cookie_storage: Option<(PathBuf, Option<String>)>,
}

impl ClientBuilder {
    /// Creates a builder with the default options.
    pub fn new() -> Self {
        ClientBuilder::default()
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Add a default request header.
    ///
    /// Later calls with the same name, in any case, replace the value.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Add several default request headers.
    ///
    /// See also [`header()`].
    ///
    /// [`header()`]: ClientBuilder::header
    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(name, value)| (name.into(), value.into())));
        self
    }

    /// Add a default transport option.
    pub fn option(mut self, option: TransportOption) -> Self {
        self.options.push(option);
        self
    }

    fn with_options(mut self, options: impl IntoIterator<Item = TransportOption>) -> Self {
        self.options.extend(options);
        self
    }

    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.config.follow_redirects = follow;
        self
    }

    /// Keep one transport session open across calls.
    pub fn interactive(mut self, interactive: bool) -> Self {
        self.config.interactive = interactive;
        self
    }

    /// Persist cookies in `dir`. The directory is checked by [`build()`].
    ///
    /// [`build()`]: ClientBuilder::build
    pub fn cookie_storage(mut self, dir: impl Into<PathBuf>, filename: Option<&str>) -> Self {
        self.cookie_storage = Some((dir.into(), filename.map(str::to_string)));
        self
    }

    pub fn timeout(self, connect: Duration, total: Option<Duration>) -> Self {
        self.with_options(config::timeout_options(connect, total))
    }

    pub fn proxy(self, address: &str, port: Option<u16>, kind: ProxyKind) -> Self {
        self.with_options(config::proxy_options(address, port, kind))
    }

    pub fn auth(self, username: &str, password: Option<&str>) -> Self {
        self.with_options(config::auth_options(username, password))
    }

    pub fn ignore_ssl(self, ignore: bool) -> Self {
        self.option(TransportOption::SslVerifyPeer(!ignore))
    }

    pub fn referer(self, referer: impl Into<String>) -> Self {
        self.option(TransportOption::Referer(referer.into()))
    }

    /// Create the [`Client`] with the default transport.
    pub fn build(self) -> Result<Client> {
        self.build_with(ReqwestTransport::new())
    }

    /// Create the [`Client`] on top of `transport`.
    ///
    /// Headers and options are applied in the order they were added.
    pub fn build_with<T: Transport>(mut self, transport: T) -> Result<Client<T>> {
        self.config.default_headers.extend(self.headers)?;
        for option in self.options {
            self.config.default_options.put(option)?;
        }
        if let Some((dir, filename)) = &self.cookie_storage {
            self.config.cookie_file = Some(config::cookie_path(dir, filename.as_deref())?);
        }
        Ok(Client::with_transport(self.config, transport))
    }
}
