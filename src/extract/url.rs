//! URL resolution for extracted links and image sources.
//!
//! Every `href` and image source pulled out of a page passes through
//! [`resolve`] before it is stored on a record.

use url::Url;

/// Resolve a possibly-relative `candidate` against `base`.
///
/// Candidates that already carry an `http`/`https` scheme are returned as-is
/// (trimmed). Anything else is joined against `base` with RFC 3986 rules.
/// If the join fails the trimmed candidate is returned unchanged, which keeps
/// the function idempotent: `resolve(b, &resolve(b, x)) == resolve(b, x)`.
///
/// # Examples
///
/// ```ignore
/// let base = Url::parse("https://crypto.news/news/").unwrap();
/// assert_eq!(resolve(&base, "/bar"), "https://crypto.news/bar");
/// assert_eq!(resolve(&base, "bar"), "https://crypto.news/news/bar");
/// ```
pub fn resolve(base: &Url, candidate: &str) -> String {
    let candidate = candidate.trim();
    if has_http_scheme(candidate) {
        return candidate.to_string();
    }
    match base.join(candidate) {
        Ok(joined) => joined.to_string(),
        Err(e) => {
            tracing::debug!(%base, candidate, error = %e, "Could not resolve URL; keeping as-is");
            candidate.to_string()
        }
    }
}

fn has_http_scheme(s: &str) -> bool {
    let lower = s.get(..8).unwrap_or(s).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://crypto.news/news/latest").unwrap()
    }

    #[test]
    fn test_absolute_urls_are_unchanged() {
        assert_eq!(
            resolve(&base(), "https://cdn.example.com/a.jpg"),
            "https://cdn.example.com/a.jpg"
        );
        assert_eq!(resolve(&base(), "HTTP://Example.com/x"), "HTTP://Example.com/x");
    }

    #[test]
    fn test_root_relative_replaces_path() {
        assert_eq!(resolve(&base(), "/bar"), "https://crypto.news/bar");
    }

    #[test]
    fn test_bare_segment_resolves_against_current_path() {
        assert_eq!(resolve(&base(), "bar"), "https://crypto.news/news/bar");
        assert_eq!(resolve(&base(), "../up"), "https://crypto.news/up");
    }

    #[test]
    fn test_protocol_relative_takes_base_scheme() {
        assert_eq!(
            resolve(&base(), "//img.crypto.news/a.png"),
            "https://img.crypto.news/a.png"
        );
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        assert_eq!(resolve(&base(), "  /bar \n"), "https://crypto.news/bar");
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let candidates = [
            "/bar",
            "bar?x=1#frag",
            "../a/b.jpg",
            "//cdn.crypto.news/c.webp",
            "https://crypto.news/already",
            "mailto:news@crypto.news",
            "",
            "%zz bad",
        ];
        let bases = [
            base(),
            Url::parse("https://crypto.news/").unwrap(),
            Url::parse("http://example.org/a/b/c.html?q=1").unwrap(),
        ];
        for b in &bases {
            for c in candidates {
                let once = resolve(b, c);
                assert_eq!(resolve(b, &once), once, "base={b} candidate={c}");
            }
        }
    }
}
