use crate::config::types::{Config, OutputConfig, PageTarget, PollConfig, SourceConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_source_config(&config.source)?;
    validate_poll_config(&config.poll)?;
    validate_output_config(&config.output)?;
    validate_target(&config.target)?;
    Ok(())
}

/// Validates the announcements source
fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid base-url '{}': {}", config.base_url, e))
    })?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' must use http or https",
            config.base_url
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' has no host",
            config.base_url
        )));
    }

    // The locale is joined onto the root, which would drop any path given here
    if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' must be scheme and host only, without a path or query",
            config.base_url
        )));
    }

    if config.locale.is_empty()
        || !config
            .locale
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "locale must be non-empty and contain only letters, digits and hyphens, got '{}'",
            config.locale
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.connect_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "connect-timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates poll pacing
fn validate_poll_config(config: &PollConfig) -> Result<(), ConfigError> {
    if config.interval_ms == 0 {
        return Err(ConfigError::Validation(
            "interval-ms must be >= 1".to_string(),
        ));
    }

    if config.max_backoff_ms < config.interval_ms {
        return Err(ConfigError::Validation(format!(
            "max-backoff-ms ({}) must be >= interval-ms ({})",
            config.max_backoff_ms, config.interval_ms
        )));
    }

    if !(0.0..=1.0).contains(&config.jitter) {
        return Err(ConfigError::Validation(format!(
            "jitter must be between 0.0 and 1.0, got {}",
            config.jitter
        )));
    }

    if config.parse_alert_threshold < 1 {
        return Err(ConfigError::Validation(
            "parse-alert-threshold must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates the output file path
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.path.as_os_str().is_empty() {
        return Err(ConfigError::InvalidOutput(
            "output path cannot be empty".to_string(),
        ));
    }

    if config.path.is_dir() {
        return Err(ConfigError::InvalidOutput(format!(
            "'{}' is a directory",
            config.path.display()
        )));
    }

    if let Some(parent) = config.path.parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            return Err(ConfigError::InvalidOutput(format!(
                "parent directory of '{}' does not exist",
                config.path.display()
            )));
        }
    }

    Ok(())
}

/// Validates the category filter and page number
fn validate_target(target: &PageTarget) -> Result<(), ConfigError> {
    validate_category(&target.category)?;

    if target.page < 1 {
        return Err(ConfigError::Validation(format!(
            "page must be >= 1, got {}",
            target.page
        )));
    }

    Ok(())
}

/// Category values go into the query string verbatim
fn validate_category(category: &str) -> Result<(), ConfigError> {
    if !category
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::InvalidCategory(category.to_string()));
    }
    Ok(())
}
