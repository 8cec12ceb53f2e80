//! Netscape cookie-jar files.
//!
//! One cookie per line, seven tab-separated fields:
//! `domain`, `include-subdomains`, `path`, `secure`, `expiry`, `name`, `value`.
//! Lines starting with `#` are comments, except the `#HttpOnly_` domain
//! prefix. An expiry of `0` marks a session cookie.

use super::Cookie;
use crate::error::Result;

use chrono::{DateTime, Utc};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::trace;

/// File name used when the caller gives only a directory.
pub const DEFAULT_FILE_NAME: &str = "CookieCurl.txt";

const HEADER: &str = "# Netscape HTTP Cookie File";
const HTTP_ONLY_PREFIX: &str = "#HttpOnly_";

/// Reads every cookie stored at `path`. A missing file is an empty jar.
pub fn load(path: &Path) -> Result<Vec<Cookie>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };

    let cookies: Vec<Cookie> = contents.lines().filter_map(parse_line).collect();
    trace!(path = %path.display(), count = cookies.len(), "loaded cookie file");
    Ok(cookies)
}

/// Writes `cookies` to `path`, replacing the previous contents.
pub fn save(path: &Path, cookies: &[Cookie]) -> Result<()> {
    let mut contents = String::from(HEADER);
    contents.push_str("\n\n");
    for cookie in cookies {
        contents.push_str(&format_line(cookie));
        contents.push('\n');
    }
    fs::write(path, contents)?;
    trace!(path = %path.display(), count = cookies.len(), "saved cookie file");
    Ok(())
}

/// Parses one line of a cookie file.
pub fn parse_line(line: &str) -> Option<Cookie> {
    let (line, http_only) = match line.strip_prefix(HTTP_ONLY_PREFIX) {
        Some(rest) => (rest, true),
        None => (line, false),
    };
    if line.trim().is_empty() || line.starts_with('#') {
        return None;
    }

    let fields: Vec<&str> = line.split('\t').collect();
    let [domain, _subdomains, path, secure, expiry, name, value] = fields.as_slice() else {
        return None;
    };

    let expires = match expiry.trim().parse::<i64>().ok()? {
        0 => None,
        secs => DateTime::from_timestamp(secs, 0),
    };

    Some(Cookie {
        name: name.to_string(),
        value: value.to_string(),
        domain: Some(domain.to_string()),
        path: Some(path.to_string()),
        expires,
        secure: secure.eq_ignore_ascii_case("TRUE"),
        http_only,
    })
}

/// Renders a cookie as one cookie-file line, without the trailing newline.
pub fn format_line(cookie: &Cookie) -> String {
    let domain = cookie.domain.as_deref().unwrap_or_default();
    format!(
        "{}{}\t{}\t{}\t{}\t{}\t{}\t{}",
        if cookie.http_only { HTTP_ONLY_PREFIX } else { "" },
        domain,
        flag(domain.starts_with('.')),
        cookie.path.as_deref().unwrap_or("/"),
        flag(cookie.secure),
        cookie.expires.map(|date| date.timestamp()).unwrap_or(0),
        cookie.name,
        cookie.value,
    )
}

/// Folds cookies received from `host` into the stored set.
///
/// A cookie replaces a stored one with the same name, domain and path; an
/// already expired cookie deletes it instead.
pub fn merge<I>(stored: &mut Vec<Cookie>, received: I, host: &str, now: DateTime<Utc>)
where
    I: IntoIterator<Item = Cookie>,
{
    for mut cookie in received {
        cookie.domain = Some(match cookie.domain.as_deref() {
            Some(domain) => format!(".{}", domain.trim_start_matches('.')),
            None => host.to_ascii_lowercase(),
        });
        if cookie.path.is_none() {
            cookie.path = Some("/".to_string());
        }

        stored.retain(|existing| {
            !(existing.name == cookie.name
                && existing.domain == cookie.domain
                && existing.path == cookie.path)
        });
        if !cookie.is_expired(now) {
            stored.push(cookie);
        }
    }
}

/// Builds the `Cookie` request header value for a request to `host`/`path`.
pub fn header_value(
    stored: &[Cookie],
    host: &str,
    path: &str,
    secure: bool,
    now: DateTime<Utc>,
) -> Option<String> {
    let pairs: Vec<String> = stored
        .iter()
        .filter(|cookie| !cookie.is_expired(now))
        .filter(|cookie| secure || !cookie.secure)
        .filter(|cookie| domain_matches(cookie.domain.as_deref(), host))
        .filter(|cookie| path.starts_with(cookie.path.as_deref().unwrap_or("/")))
        .map(|cookie| format!("{}={}", cookie.name, cookie.value))
        .collect();

    if pairs.is_empty() {
        None
    } else {
        Some(pairs.join("; "))
    }
}

fn domain_matches(domain: Option<&str>, host: &str) -> bool {
    let Some(domain) = domain else {
        return false;
    };
    let bare = domain.trim_start_matches('.');
    host.eq_ignore_ascii_case(bare)
        || (domain.starts_with('.')
            && host
                .to_ascii_lowercase()
                .ends_with(&format!(".{}", bare.to_ascii_lowercase())))
}

fn flag(value: bool) -> &'static str {
    if value {
        "TRUE"
    } else {
        "FALSE"
    }
}
