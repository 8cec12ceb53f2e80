//! Query string merging.

use super::Payload;

/// Appends `query` to `url`.
///
/// The parameters are joined with `&` when `url` already carries a query
/// string and with `?` otherwise. A fragment stays at the end of the URL.
///
/// ```rust
/// use curlish::content::{build_url, Payload};
///
/// let params = Payload::from([("a", "1"), ("b", "2")]);
/// assert_eq!(build_url("http://x/y", &params), "http://x/y?a=1&b=2");
/// assert_eq!(build_url("http://x/y?z=3", &params), "http://x/y?z=3&a=1&b=2");
/// ```
pub fn build_url(url: &str, query: &Payload) -> String {
    let encoded = match query {
        Payload::None => return url.to_string(),
        Payload::Fields(fields) => fields.to_query(),
        Payload::Text(text) => text.trim_start_matches(['?', '&']).to_string(),
    };
    if encoded.is_empty() {
        return url.to_string();
    }

    let (base, fragment) = match url.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (url, None),
    };

    let mut built = String::with_capacity(url.len() + encoded.len() + 1);
    built.push_str(base);
    if base.contains('?') {
        if !base.ends_with(['?', '&']) {
            built.push('&');
        }
    } else {
        built.push('?');
    }
    built.push_str(&encoded);
    if let Some(fragment) = fragment {
        built.push('#');
        built.push_str(fragment);
    }
    built
}
