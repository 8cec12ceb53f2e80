//! Request orchestration.
//!
//! A call runs through a fixed sequence: open a session unless one is kept
//! open, select the method flag, build the final URL, negotiate the body,
//! apply every option, execute, release the session and parse the bytes.
//!
//! ```rust,no_run
//! use curlish::Client;
//!
//! # fn example() -> curlish::Result<()> {
//! let mut client = Client::new();
//! client.set_header("Accept", "application/json")?;
//!
//! let response = client.get("https://httpbin.org/get", [("page", "2")])?;
//! println!("{} {}", response.status_code(), response.text());
//! # Ok(())
//! # }
//! ```

use super::config::{self, ClientConfig};
use super::snapshot::RequestSnapshot;
use crate::content::{self, build_url, Payload, PendingFile};
use crate::error::{Error, Result};
use crate::response::{parse_response, Response};
use crate::store::HeaderStore;
use crate::transport::{
    codes, OptionKey, OptionStore, ProxyKind, ReqwestTransport, Session, Transport,
    TransportOption,
};

use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// Methods whose parameters always go in the query string.
const QUERY_METHODS: [&str; 3] = ["GET", "HEAD", "DELETE"];

/// The request orchestrator.
///
/// A client can be created via its builder:
///
/// ```rust
/// use curlish::ClientBuilder;
///
/// let client = ClientBuilder::new().user_agent("curlish/0.1").build()?;
/// # Ok::<(), curlish::Error>(())
/// ```
///
/// A client is not meant to be shared between threads; interactive mode
/// reuses a single transport session for consecutive calls.
pub struct Client<T: Transport = ReqwestTransport> {
    config: ClientConfig,
    transport: T,
    headers: HeaderStore,
    options: OptionStore,
    cookies: HeaderStore,
    query: Payload,
    files: Vec<PendingFile>,
    session: Option<T::Session>,
    last_request: Option<RequestSnapshot>,
}

impl<T: Transport> fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("headers", &self.headers)
            .field("options", &self.options)
            .field("cookies", &self.cookies)
            .field("query", &self.query)
            .field("files", &self.files)
            .field("open", &self.session.is_some())
            .finish()
    }
}

impl Client<ReqwestTransport> {
    /// Creates a client with the default configuration and transport.
    pub fn new() -> Self {
        Self::with_transport(ClientConfig::default(), ReqwestTransport::new())
    }

    pub fn with_config(config: ClientConfig) -> Self {
        Self::with_transport(config, ReqwestTransport::new())
    }
}

impl Default for Client<ReqwestTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> Client<T> {
    /// Creates a client that issues its calls through `transport`.
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        // Live copies: mutable even if the configured stores are snapshots.
        let headers = HeaderStore::from_entries(
            config.default_headers.iter().map(|(name, value)| (name.clone(), value.clone())),
            true,
            false,
        );
        let options = OptionStore::from_entries(
            config.default_options.iter().map(|(key, option)| (*key, option.clone())),
            false,
            false,
        );
        Self {
            headers,
            options,
            cookies: HeaderStore::new(),
            query: Payload::None,
            files: Vec::new(),
            session: None,
            last_request: None,
            config,
            transport,
        }
    }

    /// Gets the configuration the client was created with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn delete(&mut self, url: &str, params: impl Into<Payload>) -> Result<Response> {
        self.request("DELETE", url, params)
    }

    pub fn get(&mut self, url: &str, params: impl Into<Payload>) -> Result<Response> {
        self.request("GET", url, params)
    }

    pub fn head(&mut self, url: &str, params: impl Into<Payload>) -> Result<Response> {
        self.request("HEAD", url, params)
    }

    pub fn post(&mut self, url: &str, params: impl Into<Payload>) -> Result<Response> {
        self.request("POST", url, params)
    }

    pub fn put(&mut self, url: &str, params: impl Into<Payload>) -> Result<Response> {
        self.request("PUT", url, params)
    }

    /// Issues a `method` request to `url`.
    ///
    /// For `GET`, `HEAD` and `DELETE`, `params` are appended to the query
    /// string. For every other method they become the body. Unknown methods
    /// are sent as-is.
    ///
    /// Unless the client is interactive, the transport session is released
    /// before this returns, whether the call succeeded or not.
    pub fn request(&mut self, method: &str, url: &str, params: impl Into<Payload>) -> Result<Response> {
        if url.trim().is_empty() {
            return Err(Error::InvalidUrl("request URL is empty".to_string()));
        }
        let method = method.trim().to_ascii_uppercase();

        let outcome = self.perform(&method, url, params.into());
        if !self.config.interactive {
            self.close();
        }
        outcome
    }

    fn perform(&mut self, method: &str, url: &str, params: Payload) -> Result<Response> {
        let files = std::mem::take(&mut self.files);
        let query = std::mem::take(&mut self.query);

        let (query, body) = if QUERY_METHODS.contains(&method) {
            (merge_query(query, params), Payload::None)
        } else {
            (query, params)
        };
        let url = build_url(url, &query);

        self.open(&url)?;
        let scoped: Vec<OptionKey> = self
            .options
            .iter()
            .map(|(key, _)| *key)
            .filter(OptionKey::is_request_scoped)
            .collect();
        for key in &scoped {
            self.options.remove(key)?;
        }
        self.options.put(method_option(method))?;
        debug!(method, url = %url, "sending request");
        self.options.put(TransportOption::Url(url))?;

        let body = content::negotiate(&mut self.headers, body, &files)?;
        if !body.is_none() {
            self.options.put(TransportOption::PostFields(body))?;
        }
        self.options.put(TransportOption::HttpHeader(self.header_lines()))?;
        if let Some(cookie) = self.cookie_header() {
            self.options.put(TransportOption::Cookie(cookie))?;
        }

        let session = self
            .session
            .as_mut()
            .ok_or_else(|| Error::Configuration("no open transport session".to_string()))?;
        for (_, option) in &self.options {
            session.set_option(option)?;
        }
        let executed = session.execute();
        let diagnostics = session.diagnostics();
        debug!(
            status = diagnostics.http_code,
            redirects = diagnostics.redirect_count,
            elapsed = ?diagnostics.total_time,
            "transport finished"
        );

        let redirect_count = diagnostics.redirect_count;
        self.last_request = Some(RequestSnapshot::capture(&self.headers, &self.options, diagnostics)?);

        let raw = executed.map_err(|failure| {
            warn!(code = failure.code, message = %failure.message, "transport failure");
            Error::from(failure)
        })?;
        if raw.is_empty() {
            return Err(Error::transport(codes::GOT_NOTHING, "Empty reply from server"));
        }
        parse_response(&raw, redirect_count)
    }

    /// Opens a transport session for `url` unless an interactive one is
    /// still open.
    fn open(&mut self, url: &str) -> Result<()> {
        if self.session.is_some() && self.config.interactive {
            return Ok(());
        }
        self.session = Some(self.transport.open(Some(url))?);
        for option in self.config.session_options() {
            self.options.put(option)?;
        }
        debug!(interactive = self.config.interactive, "opened transport session");
        Ok(())
    }

    /// Releases the current transport session, if any.
    pub fn close(&mut self) -> &mut Self {
        if self.session.take().is_some() {
            debug!("closed transport session");
        }
        self
    }

    /// Whether a transport session is currently held.
    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    fn header_lines(&self) -> Vec<String> {
        self.headers
            .iter()
            .map(|(name, value)| format!("{name}: {value}"))
            .collect()
    }

    fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        let pairs: Vec<String> = self
            .cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        Some(pairs.join("; "))
    }

    /// Sets a request header for this and later calls.
    pub fn set_header(&mut self, name: &str, value: &str) -> Result<&mut Self> {
        self.headers.set(name, value)?;
        Ok(self)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// The live header store.
    pub fn headers(&self) -> &HeaderStore {
        &self.headers
    }

    /// Sets a transport option for this and later calls.
    pub fn set_option(&mut self, option: TransportOption) -> Result<&mut Self> {
        self.options.put(option)?;
        Ok(self)
    }

    pub fn option(&self, key: OptionKey) -> Option<&TransportOption> {
        self.options.get(&key)
    }

    /// The live option store.
    pub fn options(&self) -> &OptionStore {
        &self.options
    }

    /// Sets a cookie sent in the `Cookie` header of every call.
    pub fn set_cookie(&mut self, name: &str, value: &str) -> Result<&mut Self> {
        self.cookies.set(name, value)?;
        Ok(self)
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// Persists cookies between calls in `dir`, in a file named `filename`
    /// (`CookieCurl.txt` by default).
    ///
    /// Fails right away when `dir` is not an existing, readable directory.
    pub fn set_cookie_storage(&mut self, dir: impl AsRef<Path>, filename: Option<&str>) -> Result<&mut Self> {
        let path = config::cookie_path(dir.as_ref(), filename)?;
        debug!(path = %path.display(), "using cookie file");
        self.config.cookie_file = Some(path);
        Ok(self)
    }

    /// Queues `path` for upload under form field `field` with the next call.
    pub fn add_file(&mut self, field: &str, path: impl AsRef<Path>) -> Result<&mut Self> {
        self.files.push(PendingFile::new(field, path)?);
        Ok(self)
    }

    /// Sets the connect timeout and the overall timeout, which defaults to
    /// the connect one.
    pub fn set_timeout(&mut self, connect: Duration, total: Option<Duration>) -> Result<&mut Self> {
        for option in config::timeout_options(connect, total) {
            self.options.put(option)?;
        }
        Ok(self)
    }

    pub fn set_proxy(&mut self, address: &str, port: Option<u16>, kind: ProxyKind) -> Result<&mut Self> {
        for option in config::proxy_options(address, port, kind) {
            self.options.put(option)?;
        }
        Ok(self)
    }

    /// Uses basic authentication. An empty `username` leaves things as they are.
    pub fn set_auth(&mut self, username: &str, password: Option<&str>) -> Result<&mut Self> {
        for option in config::auth_options(username, password) {
            self.options.put(option)?;
        }
        Ok(self)
    }

    /// Skips TLS peer verification when `ignore` is true.
    pub fn ignore_ssl(&mut self, ignore: bool) -> Result<&mut Self> {
        self.options.put(TransportOption::SslVerifyPeer(!ignore))?;
        Ok(self)
    }

    pub fn set_referer(&mut self, referer: &str) -> Result<&mut Self> {
        self.options.put(TransportOption::Referer(referer.to_string()))?;
        Ok(self)
    }

    pub fn set_user_agent(&mut self, user_agent: &str) -> &mut Self {
        self.config.user_agent = user_agent.to_string();
        self
    }

    /// Keeps the transport session open across calls.
    pub fn set_interactive(&mut self, interactive: bool) -> &mut Self {
        self.config.interactive = interactive;
        self
    }

    /// Query parameters for the next call only.
    pub fn with(&mut self, params: impl Into<Payload>) -> &mut Self {
        self.query = params.into();
        self
    }

    /// Empties the live header and option stores.
    pub fn clear(&mut self) -> &mut Self {
        self.headers.clear();
        self.options.clear();
        self
    }

    /// Frozen record of the last call, set even when that call failed.
    pub fn last_request(&self) -> Option<&RequestSnapshot> {
        self.last_request.as_ref()
    }
}

fn method_option(method: &str) -> TransportOption {
    match method {
        "HEAD" => TransportOption::NoBody(true),
        "GET" => TransportOption::HttpGet(true),
        "POST" => TransportOption::Post(true),
        other => TransportOption::CustomRequest(other.to_string()),
    }
}

/// Parameters queued with [`Client::with`] followed by the call's own.
fn merge_query(queued: Payload, params: Payload) -> Payload {
    match (queued, params) {
        (Payload::Fields(mut queued), Payload::Fields(params)) => {
            queued.extend(params.iter());
            Payload::Fields(queued)
        }
        (queued, params) if params.is_empty() => queued,
        (_, params) => params,
    }
}
