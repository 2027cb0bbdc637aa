use super::Config;
use anyhow::{Context, Result};
use std::path::Path;

/// Read, parse, and validate a TOML configuration file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid TOML for
/// [`Config`], or holds out-of-range values.
pub fn parse_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config_str(&content)
        .with_context(|| format!("Invalid config file: {}", path.display()))
}

/// Parse and validate configuration from TOML text.
///
/// # Errors
///
/// Returns an error if the text is not valid TOML or fails validation.
pub fn parse_config_str(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).context("Failed to parse TOML config")?;

    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &Config) -> Result<()> {
    if config.scan.max_files == 0 {
        anyhow::bail!("scan.max_files must be at least 1");
    }

    if config.scan.max_file_size == 0 {
        anyhow::bail!("scan.max_file_size must be at least 1 byte");
    }

    if config.performance.parallel_threads == 0 {
        anyhow::bail!("Parallel threads must be at least 1");
    }

    if config.lock.retry_interval_ms == 0 {
        anyhow::bail!("lock.retry_interval_ms must be at least 1");
    }

    if config.lock.timeout_ms < config.lock.retry_interval_ms {
        anyhow::bail!("lock.timeout_ms must not be shorter than lock.retry_interval_ms");
    }

    Ok(())
}
