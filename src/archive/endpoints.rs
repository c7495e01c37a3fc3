//! Archive service endpoints

use crate::archive::index::INDEX_FIELDS;
use crate::{UrlError, UrlResult};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

/// Default archive service
pub const DEFAULT_ARCHIVE_BASE: &str = "https://web.archive.org";

/// Default path of the index (CDX) search endpoint
pub const DEFAULT_INDEX_PATH: &str = "/cdx/search/cdx";

/// Characters left as-is in the index query target; path separators stay
const INDEX_TARGET_SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

/// URLs of the archive service the mediator talks to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEndpoints {
    base: String,
    index_path: String,
    robots: Url,
}

impl ArchiveEndpoints {
    /// Creates endpoints rooted at `base`
    ///
    /// # Arguments
    ///
    /// * `base` - Scheme and host of the archive, e.g. `https://web.archive.org`
    /// * `index_path` - Path of the index search endpoint
    pub fn new(base: &str, index_path: &str) -> UrlResult<Self> {
        let parsed = Url::parse(base).map_err(|e| UrlError::Parse(e.to_string()))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(UrlError::InvalidScheme(parsed.scheme().to_string()));
        }
        if parsed.host_str().is_none() {
            return Err(UrlError::MissingDomain);
        }

        let base = base.trim_end_matches('/').to_string();
        let index_path = format!("/{}", index_path.trim_start_matches('/'));
        let robots = Url::parse(&format!("{}/robots.txt", base))
            .map_err(|e| UrlError::Malformed(e.to_string()))?;

        Ok(Self {
            base,
            index_path,
            robots,
        })
    }

    /// The archive's policy-disclosure endpoint
    pub fn robots_url(&self) -> &Url {
        &self.robots
    }

    /// Index query for `target` (host and path, no scheme)
    ///
    /// # Example
    ///
    /// ```
    /// use wayback_mirror::archive::ArchiveEndpoints;
    ///
    /// let endpoints = ArchiveEndpoints::default();
    /// let url = endpoints.index_url("example.com/a b").unwrap();
    /// assert_eq!(
    ///     url.as_str(),
    ///     "https://web.archive.org/cdx/search/cdx?url=example.com/a%20b&output=json&fl=timestamp,original,statuscode,digest"
    /// );
    /// ```
    pub fn index_url(&self, target: &str) -> UrlResult<Url> {
        let encoded = utf8_percent_encode(target, INDEX_TARGET_SAFE);
        let raw = format!(
            "{}{}?url={}&output=json&fl={}",
            self.base,
            self.index_path,
            encoded,
            INDEX_FIELDS.join(",")
        );
        Url::parse(&raw).map_err(|e| UrlError::Malformed(format!("{}: {}", raw, e)))
    }

    /// Unmodified-payload URL of one capture
    pub fn snapshot_url(&self, timestamp: &str, original: &str) -> UrlResult<Url> {
        let raw = format!("{}/web/{}id_/{}", self.base, timestamp, original);
        Url::parse(&raw).map_err(|e| UrlError::Malformed(format!("{}: {}", raw, e)))
    }
}

impl Default for ArchiveEndpoints {
    fn default() -> Self {
        let base = DEFAULT_ARCHIVE_BASE.to_string();
        let robots = Url::parse("https://web.archive.org/robots.txt")
            .expect("static robots URL is valid");
        Self {
            base,
            index_path: DEFAULT_INDEX_PATH.to_string(),
            robots,
        }
    }
}
