//! Rewriting of URLs reported by Jenkins onto the configured origin.
//!
//! Jenkins builds absolute URLs from its own "Jenkins URL" setting or proxy
//! headers, which can name a host the caller cannot reach. Every URL read
//! from a response is passed through [`normalize_url`] before use.

use std::sync::LazyLock;

use regex::Regex;

static QUEUE_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/queue/item/(\d+)").expect("valid regex"));

/// Rewrite `raw` so it is served from `base`.
///
/// - already on `base` → unchanged
/// - root-relative (`/job/x/1/`) → `base` + path
/// - absolute on another origin → `base` + everything from the first `/`
///   after `scheme://`
/// - anything else is a relative path → `base` + `/` + path
pub fn normalize_url(raw: &str, base: &str) -> String {
    let base = base.trim_end_matches('/');
    let raw = raw.trim();

    if let Some(rest) = raw.strip_prefix(base) {
        if rest.is_empty() || rest.starts_with('/') || rest.starts_with('?') {
            return raw.to_string();
        }
    }

    if let Some(authority_and_path) = raw.strip_prefix("//") {
        return rebase_after_authority(authority_and_path, base);
    }
    if raw.starts_with('/') {
        return format!("{base}{raw}");
    }
    if let Some(authority_and_path) = strip_scheme(raw) {
        return rebase_after_authority(authority_and_path, base);
    }
    format!("{base}/{raw}")
}

/// The numeric id in a `.../queue/item/<id>/` URL.
pub fn queue_item_id(url: &str) -> Option<u64> {
    QUEUE_ITEM
        .captures(url)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn rebase_after_authority(authority_and_path: &str, base: &str) -> String {
    match authority_and_path.find('/') {
        Some(i) => format!("{base}{}", &authority_and_path[i..]),
        None => format!("{base}/"),
    }
}

/// `Some(rest)` when `raw` starts with a syntactically valid `scheme://`.
fn strip_scheme(raw: &str) -> Option<&str> {
    let (scheme, rest) = raw.split_once("://")?;
    let mut chars = scheme.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then_some(rest)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    const ORIGIN: &str = "http://jenkins.example.com:8080";

    #[rstest]
    #[case("/job/X/1/", "http://jenkins.example.com:8080/job/X/1/")]
    #[case("https://other.host/job/X/1/", "http://jenkins.example.com:8080/job/X/1/")]
    #[case("http://www.example.com:8080/job/X/1/", "http://jenkins.example.com:8080/job/X/1/")]
    #[case("job/X/1/", "http://jenkins.example.com:8080/job/X/1/")]
    #[case(
        "http://jenkins.example.com:8080/job/X/1/",
        "http://jenkins.example.com:8080/job/X/1/"
    )]
    #[case("//proxy.internal/queue/item/9/", "http://jenkins.example.com:8080/queue/item/9/")]
    #[case("https://other.host", "http://jenkins.example.com:8080/")]
    #[case(
        "job/X?next=http://elsewhere/",
        "http://jenkins.example.com:8080/job/X?next=http://elsewhere/"
    )]
    fn rewrites_onto_origin(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_url(raw, ORIGIN), expected);
    }

    #[test]
    fn trailing_slash_on_base_is_ignored() {
        assert_eq!(
            normalize_url("/job/X/1/", "http://jenkins.example.com:8080/"),
            "http://jenkins.example.com:8080/job/X/1/"
        );
    }

    #[test]
    fn port_prefix_is_not_same_origin() {
        // "…:80" is a string prefix of "…:8080" but a different origin
        assert_eq!(
            normalize_url("http://jenkins.example.com:8080/job/X/", "http://jenkins.example.com:80"),
            "http://jenkins.example.com:80/job/X/"
        );
    }

    #[rstest]
    #[case("http://ci/queue/item/42/", Some(42))]
    #[case("/queue/item/7", Some(7))]
    #[case("http://ci/job/x/", None)]
    fn queue_ids(#[case] url: &str, #[case] expected: Option<u64>) {
        assert_eq!(queue_item_id(url), expected);
    }
}
