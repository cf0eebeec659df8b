use crate::config::types::{Config, PageTarget};
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Values given on the command line; each one replaces the file's value
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub output: Option<PathBuf>,
    pub category: Option<String>,
    pub page: Option<u32>,
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
/// use bulletin_watch::config::load_config;
///
/// let config = load_config(Path::new("watch.toml")).unwrap();
/// println!("Polling every {}ms", config.poll.interval_ms);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let config = read_config(path)?;
    validate(&config)?;
    Ok(config)
}

fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so operators can tell which configuration a running
/// poller was started with.
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Builds the effective configuration
///
/// Starts from the file at `path` (or the built-in defaults when there is
/// none), applies the command-line overrides, and validates the result.
///
/// # Returns
///
/// * `Ok((Config, Option<String>))` - The configuration and, when a file was
///   read, its hash
/// * `Err(ConfigError)` - The file could not be read or the result is invalid
pub fn resolve_config(
    path: Option<&Path>,
    overrides: Overrides,
) -> Result<(Config, Option<String>), ConfigError> {
    let (mut config, hash) = match path {
        Some(path) => (read_config(path)?, Some(compute_config_hash(path)?)),
        None => (Config::default(), None),
    };

    if let Some(output) = overrides.output {
        config.output.path = output;
    }

    config.target = PageTarget {
        category: overrides.category.unwrap_or_default(),
        page: overrides.page.unwrap_or(1),
    };

    validate(&config)?;
    Ok((config, hash))
}
