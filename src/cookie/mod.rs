//! Cookies received through `Set-Cookie` headers.
//!
//! A [`CookieJar`] is built once per response from its header block and is
//! immutable afterwards. Each `Set-Cookie` line yields at most one
//! [`Cookie`]; lines without a `name=value` pair are dropped silently.
//!
//! The [`file`] submodule reads and writes the Netscape cookie-jar format the
//! default transport uses to persist cookies between calls.
//!
//! # Examples
//!
//! ```rust
//! use curlish::cookie::CookieJar;
//!
//! let jar = CookieJar::parse("HTTP/1.1 200 OK\r\nSet-Cookie: a=1; Path=/; Domain=example.com\r\n");
//! let cookie = jar.find("a").unwrap();
//! assert_eq!(cookie.value, "1");
//! assert_eq!(cookie.domain.as_deref(), Some("example.com"));
//! ```

pub mod file;

use chrono::{DateTime, NaiveDateTime, Utc};
use percent_encoding::percent_decode_str;

const SET_COOKIE: &str = "set-cookie:";

/// A single cookie parsed from a `Set-Cookie` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: Option<String>,
    pub path: Option<String>,
    pub expires: Option<DateTime<Utc>>,
    pub secure: bool,
    pub http_only: bool,
}

impl Cookie {
    /// Creates a session cookie with no attributes.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: None,
            path: None,
            expires: None,
            secure: false,
            http_only: false,
        }
    }

    /// Parses the part of a `Set-Cookie` line after the colon.
    ///
    /// `path` and `domain` are URL-decoded and `expires` becomes a timestamp;
    /// the first other `key=value` pair is the cookie itself. Pairs lacking
    /// `=` are dropped, apart from the `Secure` and `HttpOnly` flags.
    pub fn parse(line: &str) -> Option<Self> {
        let mut cookie: Option<Cookie> = None;
        let mut domain = None;
        let mut path = None;
        let mut expires = None;
        let mut secure = false;
        let mut http_only = false;

        for pair in line.split(';') {
            let pair = pair.trim();
            let Some((key, value)) = pair.split_once('=') else {
                if pair.eq_ignore_ascii_case("secure") {
                    secure = true;
                } else if pair.eq_ignore_ascii_case("httponly") {
                    http_only = true;
                }
                continue;
            };

            match key.trim().to_ascii_lowercase().as_str() {
                "path" => path = Some(url_decode(value.trim())),
                "domain" => domain = Some(url_decode(value.trim())),
                "expires" => expires = parse_expires(&url_decode(value.trim())),
                "max-age" | "samesite" | "priority" => {}
                name if cookie.is_none() && !name.is_empty() => {
                    cookie = Some(Cookie::new(key.trim(), value.trim()));
                }
                _ => {}
            }
        }

        cookie.map(|cookie| Cookie {
            domain,
            path,
            expires,
            secure,
            http_only,
            ..cookie
        })
    }

    /// Whether the cookie carries an expiry date earlier than `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|expires| expires <= now)
    }
}

/// The cookies of one response, in header order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    cookies: Vec<Cookie>,
}

impl CookieJar {
    /// Extracts every `Set-Cookie` line of a raw header block.
    pub fn parse(header_block: &str) -> Self {
        let cookies = header_block
            .lines()
            .filter_map(|line| {
                let line = line.trim();
                let head = line.get(..SET_COOKIE.len())?;
                if !head.eq_ignore_ascii_case(SET_COOKIE) {
                    return None;
                }
                Cookie::parse(&line[SET_COOKIE.len()..])
            })
            .collect();

        Self { cookies }
    }

    /// Value of the first cookie called `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.find(name).map(|cookie| cookie.value.as_str())
    }

    /// Value of the first cookie called `name`, or `default`.
    pub fn get_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.get(name).unwrap_or(default)
    }

    /// Looks up several cookies at once; each missing one resolves to `default`.
    pub fn get_many<'n, 'a>(&'a self, names: &[&'n str], default: &'a str) -> Vec<(&'n str, &'a str)> {
        names
            .iter()
            .map(|name| (*name, self.get_or(name, default)))
            .collect()
    }

    /// The first cookie called `name`.
    pub fn find(&self, name: &str) -> Option<&Cookie> {
        self.cookies.iter().find(|cookie| cookie.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Cookie> {
        self.cookies.iter()
    }

    pub fn as_slice(&self) -> &[Cookie] {
        &self.cookies
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}

impl<'a> IntoIterator for &'a CookieJar {
    type Item = &'a Cookie;
    type IntoIter = std::slice::Iter<'a, Cookie>;

    fn into_iter(self) -> Self::IntoIter {
        self.cookies.iter()
    }
}

/// Decodes `%XX` escapes and `+` the way form data does.
pub(crate) fn url_decode(value: &str) -> String {
    let spaced = value.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

/// Parses the date formats seen in `Expires` attributes.
pub(crate) fn parse_expires(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc2822(value) {
        return Some(date.with_timezone(&Utc));
    }

    const FORMATS: [&str; 4] = [
        "%a, %d-%b-%Y %H:%M:%S GMT",
        "%A, %d-%b-%y %H:%M:%S GMT",
        "%a, %d %b %Y %H:%M:%S GMT",
        "%a %b %e %H:%M:%S %Y",
    ];
    FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_name_value_path_domain() {
        let jar = CookieJar::parse("Set-Cookie: a=1; Path=/; Domain=example.com");
        assert_eq!(jar.len(), 1);
        let cookie = jar.find("a").unwrap();
        assert_eq!(cookie.name, "a");
        assert_eq!(cookie.value, "1");
        assert_eq!(cookie.path.as_deref(), Some("/"));
        assert_eq!(cookie.domain.as_deref(), Some("example.com"));
        assert!(cookie.expires.is_none());
    }

    #[test]
    fn test_path_and_domain_are_url_decoded() {
        let cookie = Cookie::parse(" sid=abc; path=/my%20app; domain=ex%2Eample.com").unwrap();
        assert_eq!(cookie.path.as_deref(), Some("/my app"));
        assert_eq!(cookie.domain.as_deref(), Some("ex.ample.com"));
    }

    #[test]
    fn test_expires_is_parsed() {
        let cookie = Cookie::parse("id=7; Expires=Wed, 21 Oct 2015 07:28:00 GMT").unwrap();
        let expected = Utc.with_ymd_and_hms(2015, 10, 21, 7, 28, 0).unwrap();
        assert_eq!(cookie.expires, Some(expected));
        assert!(cookie.is_expired(Utc::now()));
    }

    #[test]
    fn test_netscape_expires_format() {
        let expires = parse_expires("Thu, 01-Jan-2099 00:00:00 GMT");
        assert_eq!(expires, Some(Utc.with_ymd_and_hms(2099, 1, 1, 0, 0, 0).unwrap()));
        assert_eq!(parse_expires("not a date"), None);
    }

    #[test]
    fn test_flags_and_ignored_attributes() {
        let cookie =
            Cookie::parse("token=xyz; Max-Age=3600; SameSite=Lax; Secure; HttpOnly").unwrap();
        assert_eq!(cookie.name, "token");
        assert_eq!(cookie.value, "xyz");
        assert!(cookie.secure);
        assert!(cookie.http_only);
    }

    #[test]
    fn test_line_without_pair_is_dropped() {
        let block = "HTTP/1.1 200 OK\r\nSet-Cookie: garbage\r\nSet-Cookie: ok=1\r\n";
        let jar = CookieJar::parse(block);
        assert_eq!(jar.len(), 1);
        assert_eq!(jar.get("ok"), Some("1"));
    }

    #[test]
    fn test_only_set_cookie_lines_are_read() {
        let block = "HTTP/1.1 200 OK\r\nCookie: nope=1\r\nX-Set-Cookie: nope=2\r\nset-cookie: yes=3\r\n";
        let jar = CookieJar::parse(block);
        assert_eq!(jar.len(), 1);
        assert_eq!(jar.get("yes"), Some("3"));
        assert_eq!(jar.get("nope"), None);
    }

    #[test]
    fn test_value_may_contain_equals() {
        let cookie = Cookie::parse("data=a=b=c").unwrap();
        assert_eq!(cookie.value, "a=b=c");
    }

    #[test]
    fn test_lookup_helpers() {
        let jar = CookieJar::parse("Set-Cookie: a=1\r\nSet-Cookie: b=2\r\n");
        assert_eq!(jar.get_or("missing", "none"), "none");
        assert_eq!(
            jar.get_many(&["a", "b", "c"], ""),
            vec![("a", "1"), ("b", "2"), ("c", "")]
        );
        let names: Vec<&str> = jar.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
