//! Default transport built on the blocking `reqwest` client.
//!
//! reqwest hands back a decoded response rather than the byte stream a
//! curl-style transport produces, so [`ReqwestSession::execute`] rebuilds
//! that stream: one `status line + Location` header block per redirect hop
//! it followed, then the final status line, headers, blank line and body.
//!
//! Field values carrying the `@/absolute/path` marker in a multipart body
//! are uploaded as file parts.

use super::codes;
use super::{Diagnostics, ProxyKind, Session, Transport, TransportFailure, TransportOption};
use crate::content::{RequestBody, FILE_MARKER};
use crate::cookie::{file as cookie_file, CookieJar};
use crate::error::Result;

use chrono::Utc;
use reqwest::blocking::{multipart, Client, Request, RequestBuilder};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::redirect::Policy;
use reqwest::{Method, Proxy, StatusCode, Url, Version};
use std::error::Error as StdError;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const MAX_REDIRECTS: usize = 20;

/// Opens [`ReqwestSession`]s.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport;

impl ReqwestTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Transport for ReqwestTransport {
    type Session = ReqwestSession;

    fn open(&self, url: Option<&str>) -> Result<ReqwestSession> {
        let mut session = ReqwestSession::default();
        session.url = url.map(str::to_string);
        debug!(url = ?session.url, "opened transport session");
        Ok(session)
    }
}

#[derive(Debug, Clone)]
struct Hop {
    status: StatusCode,
    location: Url,
}

/// A reqwest-backed transport handle.
///
/// The underlying client, and with it the connection pool, lives as long as
/// the session unless a client-level option changes.
#[derive(Debug)]
pub struct ReqwestSession {
    url: Option<String>,
    include_headers: bool,
    user_agent: Option<String>,
    cookie_file: Option<PathBuf>,
    cookie_jar: Option<PathBuf>,
    follow_location: bool,
    capture_request_headers: bool,
    headers: Vec<String>,
    cookie: Option<String>,
    method: String,
    body: RequestBody,
    verify_peer: bool,
    referer: Option<String>,
    proxy: Option<String>,
    proxy_port: Option<u16>,
    proxy_kind: ProxyKind,
    credentials: Option<String>,
    connect_timeout: Option<Duration>,
    timeout: Option<Duration>,
    client: Option<Client>,
    hops: Arc<Mutex<Vec<Hop>>>,
    diagnostics: Diagnostics,
}

impl Default for ReqwestSession {
    fn default() -> Self {
        Self {
            url: None,
            include_headers: false,
            user_agent: None,
            cookie_file: None,
            cookie_jar: None,
            follow_location: false,
            capture_request_headers: false,
            headers: Vec::new(),
            cookie: None,
            method: Method::GET.to_string(),
            body: RequestBody::None,
            verify_peer: true,
            referer: None,
            proxy: None,
            proxy_port: None,
            proxy_kind: ProxyKind::Http,
            credentials: None,
            connect_timeout: None,
            timeout: None,
            client: None,
            hops: Arc::new(Mutex::new(Vec::new())),
            diagnostics: Diagnostics::default(),
        }
    }
}

impl Session for ReqwestSession {
    fn set_option(&mut self, option: &TransportOption) -> Result<()> {
        match option {
            TransportOption::Url(url) => self.url = Some(url.clone()),
            TransportOption::IncludeHeaders(on) => self.include_headers = *on,
            TransportOption::CookieFile(path) => self.cookie_file = Some(path.clone()),
            TransportOption::CookieJar(path) => self.cookie_jar = Some(path.clone()),
            TransportOption::CaptureRequestHeaders(on) => self.capture_request_headers = *on,
            TransportOption::HttpHeader(lines) => self.headers = lines.clone(),
            TransportOption::Cookie(value) => self.cookie = Some(value.clone()),
            TransportOption::NoBody(true) => self.method = Method::HEAD.to_string(),
            TransportOption::NoBody(false) => {
                if self.method == Method::HEAD.as_str() {
                    self.method = Method::GET.to_string();
                }
            }
            TransportOption::HttpGet(on) => {
                if *on {
                    self.method = Method::GET.to_string();
                }
            }
            TransportOption::Post(on) => {
                if *on {
                    self.method = Method::POST.to_string();
                }
            }
            TransportOption::CustomRequest(method) => self.method = method.clone(),
            TransportOption::PostFields(body) => self.body = body.clone(),
            TransportOption::Referer(referer) => self.referer = Some(referer.clone()),
            TransportOption::HttpAuth(_) => {}
            TransportOption::UserPwd(credentials) => self.credentials = Some(credentials.clone()),
            // Client-level knobs: the client is rebuilt on the next call.
            TransportOption::UserAgent(agent) => {
                self.user_agent = Some(agent.clone());
                self.client = None;
            }
            TransportOption::FollowLocation(on) => {
                self.follow_location = *on;
                self.client = None;
            }
            TransportOption::SslVerifyPeer(on) => {
                self.verify_peer = *on;
                self.client = None;
            }
            TransportOption::Proxy(address) => {
                self.proxy = Some(address.clone());
                self.client = None;
            }
            TransportOption::ProxyPort(port) => {
                self.proxy_port = Some(*port);
                self.client = None;
            }
            TransportOption::ProxyType(kind) => {
                self.proxy_kind = *kind;
                self.client = None;
            }
            TransportOption::ConnectTimeout(duration) => {
                self.connect_timeout = Some(*duration);
                self.client = None;
            }
            TransportOption::Timeout(duration) => {
                self.timeout = Some(*duration);
                self.client = None;
            }
        }
        Ok(())
    }

    fn execute(&mut self) -> std::result::Result<Vec<u8>, TransportFailure> {
        let started = Instant::now();
        let target = self
            .url
            .clone()
            .ok_or_else(|| TransportFailure::new(codes::URL_MALFORMAT, "No URL set"))?;
        let url = Url::parse(&target)
            .map_err(|err| TransportFailure::new(codes::URL_MALFORMAT, format!("{target}: {err}")))?;

        let client = self.client()?;
        // Method and body only ever describe the call being made.
        let method = std::mem::replace(&mut self.method, Method::GET.to_string());
        let body = std::mem::take(&mut self.body);
        let request = self.build_request(&client, &url, &method, &body)?;
        let request_header = if self.capture_request_headers {
            request_trace(&request)
        } else {
            String::new()
        };

        if let Ok(mut hops) = self.hops.lock() {
            hops.clear();
        }
        debug!(method = %request.method(), url = %request.url(), "executing request");
        let response = client.execute(request).map_err(|err| classify(&err))?;
        let hops = self
            .hops
            .lock()
            .map(|mut hops| std::mem::take(&mut *hops))
            .unwrap_or_default();

        let status = response.status();
        let version = response.version();
        let effective_url = response.url().clone();
        let final_block = header_block(version, status, response.headers());
        let body = response.bytes().map_err(|err| classify(&err))?;

        self.store_cookies(&final_block, &effective_url)?;

        self.diagnostics = Diagnostics {
            effective_url: effective_url.to_string(),
            redirect_count: hops.len() as u32,
            http_code: status.as_u16(),
            total_time: started.elapsed(),
            request_header,
        };

        if !self.include_headers {
            return Ok(body.to_vec());
        }

        let mut raw = Vec::with_capacity(final_block.len() + body.len());
        for hop in &hops {
            raw.extend_from_slice(
                format!(
                    "{} {}\r\nLocation: {}\r\n\r\n",
                    version_text(version),
                    status_text(hop.status),
                    hop.location
                )
                .as_bytes(),
            );
        }
        raw.extend_from_slice(final_block.as_bytes());
        raw.extend_from_slice(&body);
        Ok(raw)
    }

    fn diagnostics(&self) -> Diagnostics {
        self.diagnostics.clone()
    }
}

impl ReqwestSession {
    /// The client for the current settings, built on first use.
    fn client(&mut self) -> std::result::Result<Client, TransportFailure> {
        if let Some(client) = &self.client {
            return Ok(client.clone());
        }

        let redirect = if self.follow_location {
            let hops = Arc::clone(&self.hops);
            Policy::custom(move |attempt| {
                if attempt.previous().len() > MAX_REDIRECTS {
                    return attempt.error("too many redirects");
                }
                if let Ok(mut hops) = hops.lock() {
                    hops.push(Hop {
                        status: attempt.status(),
                        location: attempt.url().clone(),
                    });
                }
                attempt.follow()
            })
        } else {
            Policy::none()
        };

        let mut builder = Client::builder()
            .redirect(redirect)
            .timeout(self.timeout)
            .danger_accept_invalid_certs(!self.verify_peer);
        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        if let Some(connect) = self.connect_timeout {
            builder = builder.connect_timeout(connect);
        }
        if let Some(address) = &self.proxy {
            let proxy = Proxy::all(proxy_url(address, self.proxy_port, self.proxy_kind))
                .map_err(|err| TransportFailure::new(codes::COULDNT_RESOLVE_PROXY, chain(&err)))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|err| TransportFailure::new(codes::FAILED_INIT, chain(&err)))?;
        self.client = Some(client.clone());
        Ok(client)
    }

    fn build_request(
        &self,
        client: &Client,
        url: &Url,
        method: &str,
        body: &RequestBody,
    ) -> std::result::Result<Request, TransportFailure> {
        let method = Method::from_bytes(method.as_bytes()).map_err(|_| {
            TransportFailure::new(
                codes::BAD_FUNCTION_ARGUMENT,
                format!("Invalid request method: {method}"),
            )
        })?;
        let multipart = matches!(body, RequestBody::Multipart(_));

        let mut headers = HeaderMap::new();
        for line in &self.headers {
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            let name = name.trim();
            // reqwest computes the length itself and owns the multipart boundary.
            if name.eq_ignore_ascii_case("content-length")
                || (multipart && name.eq_ignore_ascii_case("content-type"))
            {
                continue;
            }
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value.trim()),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => warn!(header = %line, "skipping invalid request header"),
            }
        }

        let mut builder: RequestBuilder = client.request(method, url.clone()).headers(headers);

        if let Some(referer) = &self.referer {
            builder = builder.header(reqwest::header::REFERER, referer.as_str());
        }
        if let Some(cookie) = self.cookie_header(url)? {
            builder = builder.header(reqwest::header::COOKIE, cookie);
        }
        if let Some(credentials) = &self.credentials {
            let (user, password) = credentials.split_once(':').unwrap_or((credentials.as_str(), ""));
            builder = builder.basic_auth(user, Some(password));
        }

        builder = match body {
            RequestBody::None => builder,
            RequestBody::Text(text) => builder.body(text.clone()),
            RequestBody::Multipart(fields) => {
                let mut form = multipart::Form::new();
                for (name, value) in fields.iter() {
                    form = match value.strip_prefix(FILE_MARKER) {
                        Some(path) => form.file(name.to_string(), path).map_err(|err| {
                            TransportFailure::new(codes::READ_ERROR, format!("{path}: {err}"))
                        })?,
                        None => form.text(name.to_string(), value.to_string()),
                    };
                }
                builder.multipart(form)
            }
        };

        builder.build().map_err(|err| classify(&err))
    }

    /// `Cookie` header value: the explicit cookie option plus whatever the
    /// cookie file holds for this URL.
    fn cookie_header(&self, url: &Url) -> std::result::Result<Option<String>, TransportFailure> {
        let mut values: Vec<String> = self.cookie.iter().cloned().collect();

        if let Some(path) = &self.cookie_file {
            let stored = cookie_file::load(path)
                .map_err(|err| TransportFailure::new(codes::READ_ERROR, err.to_string()))?;
            let host = url.host_str().unwrap_or_default();
            let secure = url.scheme() == "https";
            if let Some(value) = cookie_file::header_value(&stored, host, url.path(), secure, Utc::now()) {
                values.push(value);
            }
        }

        Ok(if values.is_empty() {
            None
        } else {
            Some(values.join("; "))
        })
    }

    fn store_cookies(&self, header_block: &str, url: &Url) -> std::result::Result<(), TransportFailure> {
        let Some(path) = &self.cookie_jar else {
            return Ok(());
        };
        let received = CookieJar::parse(header_block);
        let write_failure = |err: crate::Error| TransportFailure::new(codes::WRITE_ERROR, err.to_string());

        let mut stored = cookie_file::load(path).map_err(write_failure)?;
        cookie_file::merge(
            &mut stored,
            received.iter().cloned(),
            url.host_str().unwrap_or_default(),
            Utc::now(),
        );
        cookie_file::save(path, &stored).map_err(write_failure)
    }
}

fn proxy_url(address: &str, port: Option<u16>, kind: ProxyKind) -> String {
    let host = address
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(address)
        .trim_end_matches('/');
    match port {
        Some(port) => format!("{}://{host}:{port}", kind.scheme()),
        None => format!("{}://{host}", kind.scheme()),
    }
}

fn version_text(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_2 => "HTTP/2",
        Version::HTTP_3 => "HTTP/3",
        _ => "HTTP/1.1",
    }
}

fn status_text(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {reason}", status.as_u16()),
        None => status.as_u16().to_string(),
    }
}

fn header_block(version: Version, status: StatusCode, headers: &HeaderMap) -> String {
    let mut block = format!("{} {}\r\n", version_text(version), status_text(status));
    for (name, value) in headers {
        block.push_str(&format!(
            "{}: {}\r\n",
            name,
            String::from_utf8_lossy(value.as_bytes())
        ));
    }
    block.push_str("\r\n");
    block
}

fn request_trace(request: &Request) -> String {
    let url = request.url();
    let mut target = url.path().to_string();
    if let Some(query) = url.query() {
        target.push('?');
        target.push_str(query);
    }

    let mut trace = format!("{} {target} HTTP/1.1\r\n", request.method());
    if let Some(host) = url.host_str() {
        match url.port() {
            Some(port) => trace.push_str(&format!("Host: {host}:{port}\r\n")),
            None => trace.push_str(&format!("Host: {host}\r\n")),
        }
    }
    for (name, value) in request.headers() {
        trace.push_str(&format!(
            "{}: {}\r\n",
            name,
            String::from_utf8_lossy(value.as_bytes())
        ));
    }
    trace.push_str("\r\n");
    trace
}

/// The error message followed by its source chain.
fn chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Maps a reqwest failure onto the native code table.
fn classify(err: &reqwest::Error) -> TransportFailure {
    let message = chain(err);
    let lower = message.to_ascii_lowercase();

    let code = if err.is_timeout() {
        codes::OPERATION_TIMEDOUT
    } else if err.is_redirect() {
        codes::TOO_MANY_REDIRECTS
    } else if err.is_builder() {
        if lower.contains("scheme") {
            codes::UNSUPPORTED_PROTOCOL
        } else {
            codes::URL_MALFORMAT
        }
    } else if err.is_connect() {
        if lower.contains("dns") {
            codes::COULDNT_RESOLVE_HOST
        } else if lower.contains("certificate") || lower.contains("tls") || lower.contains("ssl") {
            codes::SSL_CONNECT_ERROR
        } else {
            codes::COULDNT_CONNECT
        }
    } else if err.is_decode() {
        codes::BAD_CONTENT_ENCODING
    } else if err.is_body() {
        codes::RECV_ERROR
    } else if err.is_request() {
        codes::SEND_ERROR
    } else {
        codes::RECV_ERROR
    };

    TransportFailure::new(code, message)
}
