use url::Url;

/// Extracts the lowercase host of a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use wayback_mirror::url::extract_domain;
///
/// let url = Url::parse("https://Blog.Example.COM:8080/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("blog.example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Checks whether `candidate` lies inside the allowed domain
///
/// A domain covers itself and every subdomain below it:
/// "example.com" matches "example.com" and "blog.example.com" but not
/// "notexample.com".
pub fn matches_domain(allowed: &str, candidate: &str) -> bool {
    if allowed.is_empty() {
        return false;
    }
    candidate == allowed
        || candidate
            .strip_suffix(allowed)
            .map(|prefix| prefix.ends_with('.'))
            .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_domain() {
        assert!(matches_domain("example.com", "example.com"));
        assert!(!matches_domain("example.com", "other.com"));
    }

    #[test]
    fn test_subdomains_covered() {
        assert!(matches_domain("example.com", "blog.example.com"));
        assert!(matches_domain("example.com", "api.v2.example.com"));
        assert!(!matches_domain("blog.example.com", "example.com"));
    }

    #[test]
    fn test_partial_names_not_covered() {
        assert!(!matches_domain("example.com", "notexample.com"));
        assert!(!matches_domain("example.com", "example.com.org"));
    }

    #[test]
    fn test_empty_allowed_matches_nothing() {
        assert!(!matches_domain("", "example.com"));
        assert!(!matches_domain("", ""));
    }

    #[test]
    fn test_extract_domain_from_ip() {
        let url = Url::parse("http://127.0.0.1:9000/").unwrap();
        assert_eq!(extract_domain(&url), Some("127.0.0.1".to_string()));
    }
}
