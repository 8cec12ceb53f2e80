//! Client configuration and defaults.
//!
//! [`ClientConfig`] is the explicit value a [`Client`](super::Client) starts
//! from. Nothing is read from global state: the user agent, redirect policy,
//! cookie file and the initial header and option stores all live here.

use crate::error::{Error, Result};
use crate::store::HeaderStore;
use crate::transport::{AuthScheme, OptionStore, ProxyKind, TransportOption};

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Browser-like user agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 6.3; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/37.0.2049.0 Safari/537.36";

/// Configuration structure for the client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Value of the `User-Agent` sent with every request.
    pub user_agent: String,
    /// Follow `Location` redirects.
    pub follow_redirects: bool,
    /// Headers the live header store starts with.
    pub default_headers: HeaderStore,
    /// Transport options the live option store starts with.
    pub default_options: OptionStore,
    /// Keep one transport session open across calls.
    pub interactive: bool,
    /// Cookie-jar file read before and written after each call.
    pub cookie_file: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            follow_redirects: true,
            default_headers: HeaderStore::case_insensitive(),
            default_options: OptionStore::new(),
            interactive: false,
            cookie_file: None,
        }
    }
}

impl ClientConfig {
    /// Options every session gets when it is opened.
    pub(crate) fn session_options(&self) -> Vec<TransportOption> {
        let mut options = vec![
            TransportOption::IncludeHeaders(true),
            TransportOption::UserAgent(self.user_agent.clone()),
        ];
        if let Some(path) = &self.cookie_file {
            options.push(TransportOption::CookieFile(path.clone()));
            options.push(TransportOption::CookieJar(path.clone()));
        }
        if self.follow_redirects {
            options.push(TransportOption::FollowLocation(true));
        }
        options.push(TransportOption::CaptureRequestHeaders(true));
        options
    }
}

/// Resolves the cookie file inside `dir`, which must be an existing,
/// readable directory.
pub(crate) fn cookie_path(dir: &Path, filename: Option<&str>) -> Result<PathBuf> {
    let usable = dir.is_dir() && std::fs::read_dir(dir).is_ok();
    if !usable {
        return Err(Error::Configuration(format!(
            "Path to store the cookie file must be writable: {}",
            dir.display()
        )));
    }
    let filename = filename
        .filter(|name| !name.is_empty())
        .unwrap_or(crate::cookie::file::DEFAULT_FILE_NAME);
    Ok(dir.join(filename))
}

/// Connect and overall timeouts; the overall one defaults to `connect`.
pub(crate) fn timeout_options(connect: Duration, total: Option<Duration>) -> [TransportOption; 2] {
    [
        TransportOption::ConnectTimeout(connect),
        TransportOption::Timeout(total.unwrap_or(connect)),
    ]
}

pub(crate) fn proxy_options(address: &str, port: Option<u16>, kind: ProxyKind) -> Vec<TransportOption> {
    let mut options = vec![TransportOption::Proxy(address.to_string())];
    if let Some(port) = port {
        options.push(TransportOption::ProxyPort(port));
    }
    options.push(TransportOption::ProxyType(kind));
    options
}

/// Basic authentication options; none when `username` is empty.
pub(crate) fn auth_options(username: &str, password: Option<&str>) -> Vec<TransportOption> {
    if username.is_empty() {
        return Vec::new();
    }
    vec![
        TransportOption::HttpAuth(AuthScheme::Basic),
        TransportOption::UserPwd(format!("{username}:{}", password.unwrap_or_default())),
    ]
}
