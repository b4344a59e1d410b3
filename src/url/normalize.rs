use url::{ParseError, Url};

/// Normalizes a raw anchor `href` found on a site's root page
///
/// # Normalization Steps
///
/// 1. Trim whitespace; empty and fragment-only hrefs yield `None`
/// 2. Absolute http(s) URLs are returned unchanged
/// 3. Relative references are resolved against the site root
/// 4. Any other scheme (`tel:`, `mailto:`, ...) keeps only the scheme and
///    its first segment, dropping suffixes such as `:ext99` that anchors
///    sometimes append to phone numbers
///
/// Links produced by step 4 are not fetchable; callers filter them with
/// [`is_fetchable`].
///
/// # Examples
///
/// ```
/// use lemma_crawl::url::normalize_link;
/// use url::Url;
///
/// let root = Url::parse("https://x.com").unwrap();
/// assert_eq!(normalize_link("/about", &root).as_deref(), Some("https://x.com/about"));
/// assert_eq!(normalize_link("https://x.com/y", &root).as_deref(), Some("https://x.com/y"));
/// assert_eq!(
///     normalize_link("tel:+1-555-123:ext99", &root).as_deref(),
///     Some("tel:+1-555-123")
/// );
/// ```
pub fn normalize_link(href: &str, root: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    match Url::parse(href) {
        Ok(absolute) if is_http(&absolute) => Some(href.to_string()),
        Ok(_) => Some(strip_scheme_suffix(href)),
        Err(ParseError::RelativeUrlWithoutBase) => root.join(href).ok().map(String::from),
        Err(e) => {
            tracing::debug!("Dropping unparseable link {}: {}", href, e);
            None
        }
    }
}

/// Returns true if `link` is an absolute http(s) URL
pub fn is_fetchable(link: &str) -> bool {
    Url::parse(link).map(|url| is_http(&url)).unwrap_or(false)
}

fn is_http(url: &Url) -> bool {
    url.scheme() == "http" || url.scheme() == "https"
}

/// Keeps `scheme:first-segment` of a non-http link
fn strip_scheme_suffix(href: &str) -> String {
    let mut parts = href.splitn(3, ':');
    match (parts.next(), parts.next()) {
        (Some(scheme), Some(first)) => format!("{}:{}", scheme, first),
        _ => href.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> Url {
        Url::parse("https://x.com").unwrap()
    }

    #[test]
    fn test_relative_path_resolved_against_root() {
        assert_eq!(
            normalize_link("/about", &root()).as_deref(),
            Some("https://x.com/about")
        );
        assert_eq!(
            normalize_link("contact", &root()).as_deref(),
            Some("https://x.com/contact")
        );
    }

    #[test]
    fn test_absolute_http_unchanged() {
        assert_eq!(
            normalize_link("https://x.com/y", &root()).as_deref(),
            Some("https://x.com/y")
        );
        // No trailing slash is added to a bare host.
        assert_eq!(
            normalize_link("http://other.com", &root()).as_deref(),
            Some("http://other.com")
        );
    }

    #[test]
    fn test_absolute_url_with_port_keeps_port() {
        assert_eq!(
            normalize_link("http://127.0.0.1:8080/page", &root()).as_deref(),
            Some("http://127.0.0.1:8080/page")
        );
    }

    #[test]
    fn test_phone_suffix_stripped() {
        assert_eq!(
            normalize_link("tel:+1-555-123:ext99", &root()).as_deref(),
            Some("tel:+1-555-123")
        );
        assert_eq!(
            normalize_link("tel:+1-555-123", &root()).as_deref(),
            Some("tel:+1-555-123")
        );
    }

    #[test]
    fn test_scheme_relative_link() {
        assert_eq!(
            normalize_link("//cdn.x.com/a", &root()).as_deref(),
            Some("https://cdn.x.com/a")
        );
    }

    #[test]
    fn test_empty_and_fragment_links_dropped() {
        assert_eq!(normalize_link("", &root()), None);
        assert_eq!(normalize_link("   ", &root()), None);
        assert_eq!(normalize_link("#top", &root()), None);
    }

    #[test]
    fn test_is_fetchable() {
        assert!(is_fetchable("https://x.com/about"));
        assert!(is_fetchable("http://x.com"));
        assert!(!is_fetchable("tel:+1-555-123"));
        assert!(!is_fetchable("mailto:a@x.com"));
        assert!(!is_fetchable("/relative"));
    }
}
