use crate::config::types::{ArchiveConfig, Config, CrawlerConfig, OutputConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
///
/// The capture range, archive endpoints, start URLs and link patterns are
/// all resolved here once, so a bad value fails at startup rather than
/// mid-crawl.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_domains(config)?;
    config.time_window()?;
    config.endpoints()?;
    config.link_filter()?;
    validate_archive_config(&config.archive)?;
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the list of domains to mirror
fn validate_domains(config: &Config) -> Result<(), ConfigError> {
    if config.mirror.domains.is_empty() {
        return Err(ConfigError::Validation(
            "at least one domain to mirror is required".to_string(),
        ));
    }

    if let Some(blank) = config.mirror.domains.iter().find(|d| d.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "domain entries cannot be blank, got '{}'",
            blank
        )));
    }

    config.seed_urls()?;
    Ok(())
}

fn validate_archive_config(config: &ArchiveConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > 100 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 100, got {}",
            config.concurrency
        )));
    }

    // Backoff doubles per attempt, so keep the base within a minute
    if config.retry_delay > 60_000 {
        return Err(ConfigError::Validation(format!(
            "retry-delay must be at most 60000 ms, got {}",
            config.retry_delay
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler-name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler-name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.trim().is_empty() {
        return Err(ConfigError::Validation(
            "crawler-version cannot be empty".to_string(),
        ));
    }

    if let Some(contact) = &config.contact_url {
        Url::parse(contact)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact-url: {}", e)))?;
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}
