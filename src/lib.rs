//! URL Harvest: a concurrent URL fetching service
//!
//! This crate accepts batches of URLs, fetches each one concurrently over HTTP,
//! and keeps the accumulating results in a bounded in-memory store that callers
//! can snapshot at any time. Submissions are guarded by a per-client admission
//! limiter, and a background sweep evicts results past their time-to-live.

pub mod config;
pub mod fetcher;
pub mod limiter;
pub mod server;
pub mod service;
pub mod store;

use thiserror::Error;

/// Main error type for URL Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("No URLs provided")]
    EmptyBatch,

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid server address: {0}")]
    InvalidAddress(String),
}

/// Reasons a single URL fetch can fail
///
/// These never escape as process errors. The `Display` text of each variant is
/// what gets recorded in the `error` field of the failed entry.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("URL is empty")]
    EmptyUrl,

    #[error("Failed to create request: {0}")]
    InvalidUrl(String),

    #[error("Failed to fetch URL: {0}")]
    Transport(String),

    #[error("Request timeout exceeded")]
    Timeout,

    #[error("stopped after {max} redirects")]
    RedirectLimit { max: u32 },

    #[error("Response body too large (exceeds {limit} bytes)")]
    BodyTooLarge { limit: u64 },

    #[error("Failed to read response body: {0}")]
    BodyRead(String),

    #[error("Fetch service is shutting down")]
    ShuttingDown,
}

impl FetchError {
    /// Classifies a transport-level reqwest error
    ///
    /// Deadline expiries reported by the client are folded into [`FetchError::Timeout`]
    /// so that callers see a single timeout message regardless of where it fired.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_builder() {
            Self::InvalidUrl(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Result type alias for URL Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use fetcher::{Fetch, FetchOptions, FetchOutcome, HttpFetcher};
pub use limiter::{LimiterStats, RateLimiter};
pub use service::{BatchHandle, FetchService};
pub use store::{
    CleanupStats, EntryId, FetchEntry, FetchResponse, FetchStatus, ResultStore, RetentionPolicy,
};
