//! Configuration module for URL Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files,
//! and layering environment-variable overrides on top of them.
//!
//! # Example
//!
//! ```no_run
//! use url_harvest::config::load_effective_config;
//! use std::path::Path;
//!
//! let (config, _hash) = load_effective_config(Some(Path::new("harvest.toml"))).unwrap();
//! println!("Keeping at most {} results", config.retention.max_results);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, FetchConfig, RateLimitConfig, RetentionConfig, ServerConfig, DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{
    apply_overrides, compute_config_hash, format_duration, load_config, load_config_with_hash,
    load_effective_config, parse_duration,
};
pub use validation::validate;
