use crate::{UrlError, UrlResult};
use url::Url;

/// Canonical form of a URL, used as the duplicate-suppression key
///
/// # Canonicalization Steps
///
/// 1. Drop the fragment (everything after #)
/// 2. Sort query parameters by key, keeping their relative order otherwise
/// 3. Remove an empty query string (trailing ?)
///
/// Scheme and host are already lowercased by the URL parser. The path is
/// left alone: archives key captures by their exact path.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use wayback_mirror::url::canonicalize_url;
///
/// let url = Url::parse("HTTP://Example.COM/Page?b=2&a=1#top").unwrap();
/// assert_eq!(canonicalize_url(&url).as_str(), "http://example.com/Page?a=1&b=2");
/// ```
pub fn canonicalize_url(url: &Url) -> Url {
    let mut canonical = url.clone();
    canonical.set_fragment(None);

    if canonical.query().is_some() {
        let mut params: Vec<(String, String)> = canonical
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        params.sort_by(|a, b| a.0.cmp(&b.0));

        if params.is_empty() {
            canonical.set_query(None);
        } else {
            canonical
                .query_pairs_mut()
                .clear()
                .extend_pairs(params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
    }

    canonical
}

/// The target an index query is made for: host and path only
///
/// Scheme, port, query and fragment are dropped and surrounding slashes
/// trimmed, so `https://example.com:8080/a/?q=1` becomes `example.com/a`.
///
/// # Returns
///
/// * `Ok(String)` - The query target
/// * `Err(UrlError)` - The URL is not http(s) or has no host
pub fn index_target(url: &Url) -> UrlResult<String> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS URLs are archived, got: {}",
            url.scheme()
        )));
    }

    let host = url.host_str().ok_or(UrlError::MissingDomain)?;
    if host.is_empty() {
        return Err(UrlError::MissingDomain);
    }

    let target = format!("{}{}", host.to_lowercase(), url.path());
    Ok(target.trim_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_canonical_drops_fragment() {
        let result = canonicalize_url(&url("https://example.com/page#section"));
        assert_eq!(result.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_canonical_sorts_query() {
        let result = canonicalize_url(&url("https://example.com/page?b=2&a=1&c=3"));
        assert_eq!(result.as_str(), "https://example.com/page?a=1&b=2&c=3");
    }

    #[test]
    fn test_canonical_removes_empty_query() {
        let result = canonicalize_url(&url("https://example.com/page?"));
        assert_eq!(result.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_canonical_keeps_path_and_www() {
        let result = canonicalize_url(&url("http://WWW.Example.com/Dir/"));
        assert_eq!(result.as_str(), "http://www.example.com/Dir/");
    }

    #[test]
    fn test_canonical_equal_for_equivalent_urls() {
        assert_eq!(
            canonicalize_url(&url("https://example.com/p?x=1&y=2#a")),
            canonicalize_url(&url("https://EXAMPLE.com/p?y=2&x=1#b"))
        );
    }

    #[test]
    fn test_index_target_root() {
        assert_eq!(index_target(&url("https://example.com/")).unwrap(), "example.com");
        assert_eq!(index_target(&url("http://example.com")).unwrap(), "example.com");
    }

    #[test]
    fn test_index_target_strips_port_query_fragment() {
        assert_eq!(
            index_target(&url("https://example.com:8443/a/b/?q=1#frag")).unwrap(),
            "example.com/a/b"
        );
    }

    #[test]
    fn test_index_target_rejects_other_schemes() {
        assert!(matches!(
            index_target(&url("ftp://example.com/file")),
            Err(UrlError::InvalidScheme(_))
        ));
        assert!(index_target(&url("mailto:someone@example.com")).is_err());
    }
}
