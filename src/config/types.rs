use crate::archive::{
    ArchiveEndpoints, Mediator, TimeRangeSpec, TimeSpec, TimeWindow, DEFAULT_ARCHIVE_BASE,
    DEFAULT_INDEX_PATH, DEFAULT_MAX_ATTEMPTS,
};
use crate::url::{seed_url, LinkFilter};
use crate::{ConfigError, ConfigResult};
use serde::Deserialize;
use url::Url;

/// Earliest capture time considered when no range is configured
pub const DEFAULT_FROM: &str = "10000101";

/// Latest capture time considered when no range is configured
pub const DEFAULT_TO: &str = "30000101";

/// Main configuration structure for Wayback-Mirror
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub mirror: MirrorConfig,
    #[serde(default)]
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// What to mirror
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MirrorConfig {
    /// Domains or full URLs to start from
    #[serde(default)]
    pub domains: Vec<String>,

    /// Regular expressions that followed URLs must match (any of)
    #[serde(default)]
    pub allow: Vec<String>,

    /// Regular expressions excluding URLs from being followed
    #[serde(default)]
    pub deny: Vec<String>,

    /// Maximum link depth from the start URLs (unbounded when absent)
    #[serde(rename = "max-depth", default)]
    pub max_depth: Option<u32>,
}

/// Archive service and capture range
#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveConfig {
    /// Scheme and host of the archive service
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,

    /// Path of the index search endpoint
    #[serde(rename = "index-path", default = "default_index_path")]
    pub index_path: String,

    /// One instant, or an inclusive [start, end] pair
    #[serde(rename = "time-range", default = "default_time_range")]
    pub time_range: TimeRangeSpec,

    /// Fetches a request gets, first one included, before a server error
    /// response is handed on
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,
}

/// Fetch engine behavior
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of requests in flight
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,

    /// Minimum time between dispatching two requests (milliseconds)
    #[serde(rename = "download-delay", default)]
    pub download_delay: u64,

    /// Wait before the first re-issue of a failed request (milliseconds).
    /// Doubles with every further attempt.
    #[serde(rename = "retry-delay", default = "default_retry_delay")]
    pub retry_delay: u64,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name", default = "default_crawler_name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version", default = "default_crawler_version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url", default)]
    pub contact_url: Option<String>,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory the snapshots are written under
    #[serde(default = "default_directory")]
    pub directory: String,

    /// Name snapshot files by Unix timestamp instead of YYYYmmddHHMMSS
    #[serde(rename = "unix-filenames", default)]
    pub unix_filenames: bool,
}

fn default_base_url() -> String {
    DEFAULT_ARCHIVE_BASE.to_string()
}

fn default_index_path() -> String {
    DEFAULT_INDEX_PATH.to_string()
}

fn default_time_range() -> TimeRangeSpec {
    TimeRangeSpec::Pair(vec![TimeSpec::from(DEFAULT_FROM), TimeSpec::from(DEFAULT_TO)])
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_concurrency() -> u32 {
    10
}

fn default_retry_delay() -> u64 {
    1000
}

fn default_crawler_name() -> String {
    "WaybackMirror".to_string()
}

fn default_crawler_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_directory() -> String {
    "website".to_string()
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            index_path: default_index_path(),
            time_range: default_time_range(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            download_delay: 0,
            retry_delay: default_retry_delay(),
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: default_crawler_name(),
            crawler_version: default_crawler_version(),
            contact_url: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            unix_filenames: false,
        }
    }
}

impl Config {
    /// Builds a configuration with defaults for everything but the domains
    pub fn from_domains(domains: Vec<String>) -> Self {
        Self {
            mirror: MirrorConfig {
                domains,
                ..MirrorConfig::default()
            },
            archive: ArchiveConfig::default(),
            crawler: CrawlerConfig::default(),
            user_agent: UserAgentConfig::default(),
            output: OutputConfig::default(),
        }
    }

    /// The configured capture window
    pub fn time_window(&self) -> ConfigResult<TimeWindow> {
        TimeWindow::from_spec(&self.archive.time_range)
    }

    /// The configured archive endpoints
    pub fn endpoints(&self) -> ConfigResult<ArchiveEndpoints> {
        ArchiveEndpoints::new(&self.archive.base_url, &self.archive.index_path).map_err(|e| {
            ConfigError::InvalidUrl(format!(
                "Invalid archive base-url '{}': {}",
                self.archive.base_url, e
            ))
        })
    }

    /// Builds the mediator for this configuration
    pub fn mediator(&self) -> ConfigResult<Mediator> {
        Ok(Mediator::new(self.time_window()?, self.endpoints()?)
            .with_max_attempts(self.archive.max_attempts))
    }

    /// Start URLs for every configured domain
    pub fn seed_urls(&self) -> ConfigResult<Vec<Url>> {
        self.mirror
            .domains
            .iter()
            .map(|domain| {
                seed_url(domain).map_err(|e| {
                    ConfigError::InvalidUrl(format!("Invalid domain '{}': {}", domain, e))
                })
            })
            .collect()
    }

    /// Link filter scoped to the seed domains
    pub fn link_filter(&self) -> ConfigResult<LinkFilter> {
        LinkFilter::for_seeds(&self.seed_urls()?, &self.mirror.allow, &self.mirror.deny)
    }

    /// User-Agent header value: `Name/Version (+contact-url)`
    pub fn user_agent_string(&self) -> String {
        match &self.user_agent.contact_url {
            Some(contact) => format!(
                "{}/{} (+{})",
                self.user_agent.crawler_name, self.user_agent.crawler_version, contact
            ),
            None => format!(
                "{}/{}",
                self.user_agent.crawler_name, self.user_agent.crawler_version
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_domains_defaults() {
        let config = Config::from_domains(vec!["example.com".to_string()]);
        let window = config.time_window().unwrap();

        assert_eq!(window.start().format("%Y%m%d").to_string(), "10000101");
        assert_eq!(window.end().format("%Y%m%d").to_string(), "30000101");
        assert_eq!(config.crawler.concurrency, 10);
        assert_eq!(config.output.directory, "website");
        assert!(!config.output.unix_filenames);
        assert_eq!(config.archive.max_attempts, 3);
        assert_eq!(config.crawler.retry_delay, 1000);
    }

    #[test]
    fn test_user_agent_string() {
        let mut config = Config::from_domains(vec![]);
        config.user_agent.crawler_version = "1.0".to_string();
        assert_eq!(config.user_agent_string(), "WaybackMirror/1.0");

        config.user_agent.contact_url = Some("https://example.com/bot".to_string());
        assert_eq!(
            config.user_agent_string(),
            "WaybackMirror/1.0 (+https://example.com/bot)"
        );
    }

    #[test]
    fn test_seed_urls_and_filter() {
        let config = Config::from_domains(vec![
            "example.com".to_string(),
            "https://docs.example.org/start".to_string(),
        ]);

        let seeds = config.seed_urls().unwrap();
        assert_eq!(seeds[0].as_str(), "http://example.com/");
        assert_eq!(seeds[1].as_str(), "https://docs.example.org/start");

        let filter = config.link_filter().unwrap();
        assert_eq!(filter.allowed_domains().len(), 2);
    }

    #[test]
    fn test_invalid_base_url() {
        let mut config = Config::from_domains(vec!["example.com".to_string()]);
        config.archive.base_url = "archive".to_string();
        assert!(matches!(
            config.endpoints(),
            Err(ConfigError::InvalidUrl(_))
        ));
    }
}
