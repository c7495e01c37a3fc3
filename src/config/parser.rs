use crate::archive::{TimeRangeSpec, TimeSpec};
use crate::config::types::{Config, DEFAULT_FROM, DEFAULT_TO};
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Command-line values layered over a configuration file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Additional domains or URLs to mirror
    pub domains: Vec<String>,

    /// Output directory
    pub output: Option<String>,

    /// Start of the capture range
    pub from: Option<String>,

    /// End of the capture range
    pub to: Option<String>,

    /// Additional allow patterns
    pub allow: Vec<String>,

    /// Additional deny patterns
    pub deny: Vec<String>,

    /// Maximum requests in flight
    pub concurrency: Option<u32>,

    /// Name snapshot files by Unix timestamp
    pub unix_filenames: bool,
}

impl ConfigOverrides {
    /// Applies these overrides on top of `config`
    pub fn apply(self, mut config: Config) -> Config {
        config.mirror.domains.extend(self.domains);
        config.mirror.allow.extend(self.allow);
        config.mirror.deny.extend(self.deny);

        if let Some(output) = self.output {
            config.output.directory = output;
        }
        if let Some(concurrency) = self.concurrency {
            config.crawler.concurrency = concurrency;
        }
        if self.unix_filenames {
            config.output.unix_filenames = true;
        }

        if self.from.is_some() || self.to.is_some() {
            let (start, end) = range_bounds(&config.archive.time_range);
            config.archive.time_range = TimeRangeSpec::Pair(vec![
                self.from.map(|f| TimeSpec::from(f.as_str())).unwrap_or(start),
                self.to.map(|t| TimeSpec::from(t.as_str())).unwrap_or(end),
            ]);
        }

        config
    }
}

/// Current start and end of a configured range, falling back to the defaults
fn range_bounds(range: &TimeRangeSpec) -> (TimeSpec, TimeSpec) {
    match range {
        TimeRangeSpec::Single(value) => (value.clone(), value.clone()),
        TimeRangeSpec::Pair(values) => (
            values
                .first()
                .cloned()
                .unwrap_or_else(|| TimeSpec::from(DEFAULT_FROM)),
            values
                .last()
                .cloned()
                .unwrap_or_else(|| TimeSpec::from(DEFAULT_TO)),
        ),
    }
}

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use wayback_mirror::config::load_config;
///
/// let config = load_config(Path::new("mirror.toml")).unwrap();
/// println!("Mirroring {} domains", config.mirror.domains.len());
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let config = read_config(path)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so runs can be matched to the exact file they used.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read(path)?;
    Ok(hex::encode(Sha256::digest(&content)))
}

/// Builds the effective configuration from an optional file plus CLI values
///
/// # Arguments
///
/// * `path` - Optional TOML configuration file
/// * `overrides` - Values given on the command line
///
/// # Returns
///
/// * `Ok((Config, Option<String>))` - Validated configuration and the file hash, if a file was read
/// * `Err(ConfigError)` - The file could not be read or the result is invalid
pub fn resolve_config(
    path: Option<&Path>,
    overrides: ConfigOverrides,
) -> Result<(Config, Option<String>), ConfigError> {
    let (base, hash) = match path {
        Some(path) => (read_config(path)?, Some(compute_config_hash(path)?)),
        None => (Config::from_domains(Vec::new()), None),
    };

    let config = overrides.apply(base);
    validate(&config)?;
    Ok((config, hash))
}

fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const FULL_CONFIG: &str = r#"
[mirror]
domains = ["example.com", "https://docs.example.org/"]
allow = ["/docs/"]
deny = ["\\?print="]
max-depth = 4

[archive]
base-url = "http://127.0.0.1:9999"
index-path = "/index/search"
time-range = ["2019", 1577836800]
max-attempts = 2

[crawler]
concurrency = 4
download-delay = 250
retry-delay = 5000

[user-agent]
crawler-name = "TestMirror"
crawler-version = "0.1"
contact-url = "https://example.com/bot"

[output]
directory = "./snapshots"
unix-filenames = true
"#;

    #[test]
    fn test_load_full_config() {
        let file = create_temp_config(FULL_CONFIG);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.mirror.domains.len(), 2);
        assert_eq!(config.mirror.max_depth, Some(4));
        assert_eq!(config.archive.index_path, "/index/search");
        assert_eq!(config.archive.max_attempts, 2);
        assert_eq!(config.crawler.concurrency, 4);
        assert_eq!(config.crawler.download_delay, 250);
        assert_eq!(config.crawler.retry_delay, 5000);
        assert_eq!(config.user_agent.crawler_name, "TestMirror");
        assert!(config.output.unix_filenames);

        let window = config.time_window().unwrap();
        assert_eq!(window.end().timestamp(), 1577836800);
    }

    #[test]
    fn test_load_minimal_config() {
        let file = create_temp_config("[mirror]\ndomains = [\"example.com\"]\n");
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.archive.base_url, "https://web.archive.org");
        assert_eq!(config.crawler.concurrency, 10);
        assert_eq!(config.output.directory, "website");
    }

    #[test]
    fn test_single_time_value() {
        let file = create_temp_config(
            "[mirror]\ndomains = [\"example.com\"]\n[archive]\ntime-range = \"20200115\"\n",
        );
        let config = load_config(file.path()).unwrap();
        let window = config.time_window().unwrap();
        assert_eq!(window.start(), window.end());
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/mirror.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_config_with_bad_time_range() {
        let file = create_temp_config(
            "[mirror]\ndomains = [\"example.com\"]\n[archive]\ntime-range = \"last week\"\n",
        );
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::InvalidTime { .. })
        ));
    }

    #[test]
    fn test_config_hash_stable_and_distinct() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        assert_eq!(hash1, compute_config_hash(file1.path()).unwrap());
        assert_eq!(hash1.len(), 64);
        assert_ne!(hash1, compute_config_hash(file2.path()).unwrap());
    }

    #[test]
    fn test_resolve_without_file() {
        let overrides = ConfigOverrides {
            domains: vec!["example.com".to_string()],
            from: Some("2015".to_string()),
            concurrency: Some(2),
            unix_filenames: true,
            ..ConfigOverrides::default()
        };

        let (config, hash) = resolve_config(None, overrides).unwrap();
        assert!(hash.is_none());
        assert_eq!(config.crawler.concurrency, 2);
        assert!(config.output.unix_filenames);

        let window = config.time_window().unwrap();
        assert_eq!(window.start().format("%Y").to_string(), "2015");
        assert_eq!(window.end().format("%Y").to_string(), "3000");
    }

    #[test]
    fn test_resolve_layers_over_file() {
        let file = create_temp_config(FULL_CONFIG);
        let overrides = ConfigOverrides {
            domains: vec!["extra.example.net".to_string()],
            output: Some("elsewhere".to_string()),
            to: Some("2019".to_string()),
            ..ConfigOverrides::default()
        };

        let (config, hash) = resolve_config(Some(file.path()), overrides).unwrap();
        assert!(hash.is_some());
        assert_eq!(config.mirror.domains.len(), 3);
        assert_eq!(config.output.directory, "elsewhere");

        let window = config.time_window().unwrap();
        assert_eq!(window.start(), window.end());
    }

    #[test]
    fn test_resolve_requires_domains() {
        let result = resolve_config(None, ConfigOverrides::default());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }
}
