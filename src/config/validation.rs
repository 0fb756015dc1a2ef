use crate::config::types::{Config, FetchConfig, RateLimitConfig, RetentionConfig, ServerConfig};
use crate::ConfigError;
use std::net::SocketAddr;

/// Upper bound on the fetch concurrency ceiling
const MAX_CONCURRENT_FETCHES: usize = 1024;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_server_config(&config.server)?;
    validate_fetch_config(&config.fetch)?;
    validate_rate_limit_config(&config.rate_limit)?;
    validate_retention_config(&config.retention)?;
    Ok(())
}

fn validate_server_config(config: &ServerConfig) -> Result<(), ConfigError> {
    config
        .address
        .parse::<SocketAddr>()
        .map_err(|e| ConfigError::InvalidAddress(format!("'{}': {}", config.address, e)))?;
    Ok(())
}

/// Validates outbound fetch settings
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "fetch timeout must be at least 1 second".to_string(),
        ));
    }

    if config.max_content_size == 0 {
        return Err(ConfigError::Validation(
            "max_content_size must be >= 1 byte".to_string(),
        ));
    }

    if config.max_concurrent_fetches < 1 || config.max_concurrent_fetches > MAX_CONCURRENT_FETCHES {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_fetches must be between 1 and {}, got {}",
            MAX_CONCURRENT_FETCHES, config.max_concurrent_fetches
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_rate_limit_config(config: &RateLimitConfig) -> Result<(), ConfigError> {
    if config.requests < 1 {
        return Err(ConfigError::Validation(format!(
            "rate limit requests must be >= 1, got {}",
            config.requests
        )));
    }

    if config.burst < 1 {
        return Err(ConfigError::Validation(format!(
            "rate limit burst must be >= 1, got {}",
            config.burst
        )));
    }

    // A zero-length window is allowed: the limiter then refills the full burst
    Ok(())
}

fn validate_retention_config(config: &RetentionConfig) -> Result<(), ConfigError> {
    if config.cleanup_interval_secs == 0 {
        return Err(ConfigError::Validation(
            "cleanup interval must be at least 1 second".to_string(),
        ));
    }

    if config.max_results < 1 {
        return Err(ConfigError::Validation(format!(
            "max_results must be >= 1, got {}",
            config.max_results
        )));
    }

    Ok(())
}
