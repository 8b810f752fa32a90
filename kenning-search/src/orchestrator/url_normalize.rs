//! URL identity keys for search result deduplication.
//!
//! Two results are the same page when their keys match. The key folds
//! away differences that never change the page served: scheme, host
//! capitalisation, a leading `www.`, default ports, fragments, tracking
//! parameters, parameter order and a trailing slash.

use url::Url;

/// Query parameters that only carry attribution and are dropped.
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "mc_cid",
    "mc_eid",
    "ref",
];

/// Build the identity key for a result URL.
///
/// Transformations:
///
/// 1. `http` and `https` collapse to `https`.
/// 2. Host is lowercased and a leading `www.` removed.
/// 3. Default ports and the fragment are removed.
/// 4. Tracking parameters are dropped, the rest sorted by key then value.
/// 5. A trailing slash is removed unless the path is exactly `/`.
///
/// Input that does not parse as an absolute URL is trimmed and lowercased
/// so that at least case differences still collapse.
///
/// # Examples
///
/// ```
/// use kenning_search::orchestrator::url_normalize::normalize_url;
///
/// let a = normalize_url("http://WWW.Example.com/path/?b=2&a=1#top");
/// let b = normalize_url("https://example.com/path?a=1&b=2");
/// assert_eq!(a, b);
/// ```
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    let Ok(mut parsed) = Url::parse(trimmed) else {
        return trimmed.to_lowercase();
    };

    if parsed.scheme() == "http" {
        let _ = parsed.set_scheme("https");
    }

    if let Some(host) = parsed.host_str() {
        if let Some(bare) = host.strip_prefix("www.") {
            let bare = bare.to_string();
            let _ = parsed.set_host(Some(&bare));
        }
    }

    if matches!(parsed.port(), Some(80) | Some(443)) {
        let _ = parsed.set_port(None);
    }

    parsed.set_fragment(None);

    let mut params: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| !TRACKING_PARAMS.contains(&key.to_lowercase().as_str()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    params.sort();

    if params.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.query_pairs_mut().clear().extend_pairs(params);
    }

    let path = parsed.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        parsed.set_path(path.trim_end_matches('/'));
    }

    parsed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_host_but_not_path() {
        assert_eq!(
            normalize_url("https://Example.COM/Path"),
            "https://example.com/Path"
        );
    }

    #[test]
    fn http_and_https_collapse() {
        assert_eq!(
            normalize_url("http://example.com/a"),
            normalize_url("https://example.com/a")
        );
    }

    #[test]
    fn strips_www_prefix() {
        assert_eq!(
            normalize_url("https://www.rust-lang.org/"),
            "https://rust-lang.org/"
        );
    }

    #[test]
    fn removes_trailing_slash_but_keeps_root() {
        assert_eq!(normalize_url("https://example.com/path/"), "https://example.com/path");
        assert_eq!(normalize_url("https://example.com/"), "https://example.com/");
    }

    #[test]
    fn removes_default_ports_only() {
        assert_eq!(normalize_url("http://example.com:80/p"), "https://example.com/p");
        assert_eq!(
            normalize_url("https://example.com:8443/p"),
            "https://example.com:8443/p"
        );
    }

    #[test]
    fn drops_tracking_and_sorts_remaining_params() {
        assert_eq!(
            normalize_url("https://example.com/s?z=1&utm_source=x&a=2&fbclid=y"),
            "https://example.com/s?a=2&z=1"
        );
    }

    #[test]
    fn removes_fragment() {
        assert_eq!(
            normalize_url("https://example.com/page#section"),
            "https://example.com/page"
        );
    }

    #[test]
    fn unparseable_input_is_lowercased() {
        assert_eq!(normalize_url("  Not A URL "), "not a url");
        assert_eq!(normalize_url(""), "");
    }

    #[test]
    fn notion_page_urls_stay_distinct() {
        assert_ne!(
            normalize_url("https://www.notion.so/ML-Research-1a2b"),
            normalize_url("https://www.notion.so/Reading-List-3c4d")
        );
    }
}
