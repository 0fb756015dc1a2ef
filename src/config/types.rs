use crate::fetcher::FetchOptions;
use crate::store::RetentionPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Identifying user agent sent with every fetch unless overridden
pub const DEFAULT_USER_AGENT: &str = "URL-Fetch-Service/1.0";

/// Main configuration structure for URL Harvest
///
/// Every section is optional; missing keys fall back to the defaults below.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub fetch: FetchConfig,
    #[serde(rename = "rate-limit")]
    pub rate_limit: RateLimitConfig,
    pub retention: RetentionConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. "0.0.0.0:8080"
    pub address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Outbound fetch behavior
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Total wall-clock bound on a single fetch (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Maximum number of redirect hops followed
    #[serde(rename = "max-redirects")]
    pub max_redirects: u32,

    /// Body size cap in bytes; reaching it fails the fetch
    #[serde(rename = "max-content-size")]
    pub max_content_size: u64,

    /// Maximum number of fetches performing network I/O at once
    #[serde(rename = "max-concurrent-fetches")]
    pub max_concurrent_fetches: usize,

    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_redirects: 10,
            max_content_size: 10 * 1024 * 1024,
            max_concurrent_fetches: 64,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Per-client admission limits for submissions
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Requests allowed per window
    pub requests: u32,

    /// Burst allowance, refilled linearly across the window
    pub burst: u32,

    /// Window length (seconds)
    #[serde(rename = "window-secs")]
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests: 100,
            burst: 20,
            window_secs: 60,
        }
    }
}

/// Result retention and eviction
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetentionConfig {
    /// Maximum age of a result before it is swept (seconds)
    #[serde(rename = "ttl-secs")]
    pub ttl_secs: u64,

    /// Time between cleanup sweeps (seconds)
    #[serde(rename = "cleanup-interval-secs")]
    pub cleanup_interval_secs: u64,

    /// Capacity ceiling for results kept in memory
    #[serde(rename = "max-results")]
    pub max_results: usize,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 3600,
            cleanup_interval_secs: 600,
            max_results: 10_000,
        }
    }
}

impl Config {
    /// Builds the immutable options handed to the HTTP fetch executor
    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            timeout: Duration::from_secs(self.fetch.timeout_secs),
            max_redirects: self.fetch.max_redirects,
            max_content_bytes: self.fetch.max_content_size,
            user_agent: self.fetch.user_agent.clone(),
        }
    }

    /// Builds the eviction policy handed to the result store
    pub fn retention_policy(&self) -> RetentionPolicy {
        RetentionPolicy {
            ttl: Duration::from_secs(self.retention.ttl_secs),
            max_results: self.retention.max_results,
        }
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.retention.cleanup_interval_secs)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit.window_secs)
    }
}
