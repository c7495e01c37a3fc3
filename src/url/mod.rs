//! URL handling module for Wayback-Mirror
//!
//! This module provides URL canonicalization, index query targets, seed
//! parsing, and the link filter that decides which discovered URLs are
//! mirrored.

mod normalize;
mod scope;

use crate::{ConfigError, ConfigResult, UrlError, UrlResult};
use regex::Regex;
use url::Url;

// Re-export main functions
pub use normalize::{canonicalize_url, index_target};
pub use scope::{extract_domain, matches_domain};

/// File extensions never worth mirroring as pages
const IGNORED_EXTENSIONS: &[&str] = &[
    "7z", "avi", "bmp", "css", "dmg", "exe", "flv", "gif", "gz", "ico", "iso", "jpeg", "jpg",
    "js", "m4a", "mkv", "mov", "mp3", "mp4", "mpeg", "ogg", "png", "rar", "svg", "tar", "tgz",
    "tif", "tiff", "wav", "webm", "webp", "wmv", "woff", "woff2", "zip",
];

/// Parses a configured domain or URL into a starting URL
///
/// Bare domains get an `http://` scheme; full URLs are used as given.
///
/// # Examples
///
/// ```
/// use wayback_mirror::url::seed_url;
///
/// assert_eq!(seed_url("example.com").unwrap().as_str(), "http://example.com/");
/// assert_eq!(
///     seed_url("https://live.example.com/docs").unwrap().as_str(),
///     "https://live.example.com/docs"
/// );
/// ```
pub fn seed_url(domain: &str) -> UrlResult<Url> {
    let trimmed = domain.trim();
    let full = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    };

    let url = Url::parse(&full).map_err(|e| UrlError::Parse(format!("{}: {}", domain, e)))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }
    if url.host_str().map(str::is_empty).unwrap_or(true) {
        return Err(UrlError::MissingDomain);
    }
    Ok(url)
}

/// Decides which discovered links are followed
///
/// A link is followable when it is http(s), its host lies inside one of
/// the allowed domains, its path does not end in an ignored extension, it
/// matches at least one allow pattern (when any are given), and it matches
/// no deny pattern.
#[derive(Debug, Clone)]
pub struct LinkFilter {
    allowed_domains: Vec<String>,
    allow: Vec<Regex>,
    deny: Vec<Regex>,
}

impl LinkFilter {
    /// Creates a filter, compiling the allow and deny patterns
    ///
    /// # Returns
    ///
    /// * `Ok(LinkFilter)` - All patterns compiled
    /// * `Err(ConfigError::InvalidPattern)` - A pattern is not a valid regex
    pub fn new(allowed_domains: Vec<String>, allow: &[String], deny: &[String]) -> ConfigResult<Self> {
        Ok(Self {
            allowed_domains: allowed_domains
                .into_iter()
                .map(|d| d.to_lowercase())
                .collect(),
            allow: compile_patterns(allow)?,
            deny: compile_patterns(deny)?,
        })
    }

    /// Builds a filter scoped to the hosts of the seed domains
    pub fn for_seeds(seeds: &[Url], allow: &[String], deny: &[String]) -> ConfigResult<Self> {
        let mut domains: Vec<String> = Vec::new();
        for seed in seeds {
            if let Some(domain) = extract_domain(seed) {
                if !domains.contains(&domain) {
                    domains.push(domain);
                }
            }
        }
        Self::new(domains, allow, deny)
    }

    pub fn allowed_domains(&self) -> &[String] {
        &self.allowed_domains
    }

    /// Returns true if `url` should be mirrored
    pub fn is_followable(&self, url: &Url) -> bool {
        if url.scheme() != "http" && url.scheme() != "https" {
            return false;
        }

        let Some(domain) = extract_domain(url) else {
            return false;
        };
        if !self
            .allowed_domains
            .iter()
            .any(|allowed| matches_domain(allowed, &domain))
        {
            return false;
        }

        if has_ignored_extension(url) {
            return false;
        }

        let candidate = url.as_str();
        if !self.allow.is_empty() && !self.allow.iter().any(|re| re.is_match(candidate)) {
            return false;
        }

        !self.deny.iter().any(|re| re.is_match(candidate))
    }
}

fn compile_patterns(patterns: &[String]) -> ConfigResult<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| {
            Regex::new(p)
                .map_err(|e| ConfigError::InvalidPattern(format!("Invalid regex '{}': {}", p, e)))
        })
        .collect()
}

fn has_ignored_extension(url: &Url) -> bool {
    let last = url.path().rsplit('/').next().unwrap_or("");
    match last.rsplit_once('.') {
        Some((_, ext)) => IGNORED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()),
        None => false,
    }
}
