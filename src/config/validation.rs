use crate::config::types::{Config, OutputConfig, SourceConfig, SyncConfig};
use crate::ConfigError;
use glob::Pattern;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_source_config(&config.source)?;
    validate_sync_config(&config.sync)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the remote source configuration
fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    // Repository identifier must be "owner/name"
    let parts: Vec<&str> = config.repository.split('/').collect();
    if parts.len() != 2 || parts.iter().any(|p| p.is_empty()) {
        return Err(ConfigError::Validation(format!(
            "repository must be of the form 'owner/name', got '{}'",
            config.repository
        )));
    }

    if config.directory.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "directory must be relative to the repository root, got '{}'",
            config.directory
        )));
    }

    if config.api_base_url.is_empty() {
        return Err(ConfigError::Validation(
            "api-base-url cannot be empty".to_string(),
        ));
    }

    // Exclude patterns must be valid globs
    for pattern in &config.exclude_patterns {
        Pattern::new(pattern)
            .map_err(|e| ConfigError::InvalidPattern(format!("'{}': {}", pattern, e)))?;
    }

    Ok(())
}

/// Validates sync behavior configuration
fn validate_sync_config(config: &SyncConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > 64 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 64, got {}",
            config.concurrency
        )));
    }

    if config.max_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "max-retries must be >= 1, got {}",
            config.max_retries
        )));
    }

    if !(config.requests_per_second > 0.0) {
        return Err(ConfigError::Validation(format!(
            "requests-per-second must be > 0, got {}",
            config.requests_per_second
        )));
    }

    if config.burst < 1 {
        return Err(ConfigError::Validation(format!(
            "burst must be >= 1, got {}",
            config.burst
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.site_dir.is_empty() {
        return Err(ConfigError::Validation(
            "site-dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}
