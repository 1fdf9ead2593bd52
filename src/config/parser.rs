use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Command-line values that take precedence over the configuration file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub target_items: Option<u64>,
    pub pages_per_keyword: Option<u32>,
    pub keywords: Option<Vec<String>>,
    pub checkpoint_path: Option<String>,
    pub workers: Option<u32>,
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
/// use listing_harvest::config::load_config;
///
/// let config = load_config(Path::new("harvest.toml")).unwrap();
/// println!("Target: {}", config.crawler.target_items);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// This is used to tell runs with different configurations apart in the logs.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
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

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

/// Applies command-line overrides and re-validates the result
pub fn apply_overrides(mut config: Config, overrides: &ConfigOverrides) -> Result<Config, ConfigError> {
    if let Some(target) = overrides.target_items {
        config.crawler.target_items = target;
    }
    if let Some(pages) = overrides.pages_per_keyword {
        config.crawler.pages_per_keyword = pages;
    }
    if let Some(keywords) = &overrides.keywords {
        config.crawler.keywords = keywords.clone();
    }
    if let Some(path) = &overrides.checkpoint_path {
        config.output.checkpoint_path = path.clone();
    }
    if let Some(workers) = overrides.workers {
        config.crawler.workers = workers;
    }

    validate(&config)?;
    Ok(config)
}
