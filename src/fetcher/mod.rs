//! HTTP fetch executor
//!
//! This module performs the network side of a fetch, including:
//! - Building an HTTP client that identifies the service on every request
//! - Following redirects manually so hops can be counted and capped
//! - Bounding total wall-clock time and body size
//! - Turning every failure into data on a [`FetchOutcome`]
//!
//! The [`Fetch`] trait is the seam between the orchestrator and the network,
//! so the orchestrator can be driven by a stub in tests.

mod http;
mod outcome;

pub use http::{build_http_client, HttpFetcher};
pub use outcome::FetchOutcome;

use async_trait::async_trait;
use std::time::Duration;

/// Immutable limits applied to every fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// Total wall-clock bound: connect, redirects, and body read together
    pub timeout: Duration,

    /// Redirect hops allowed before the fetch fails
    pub max_redirects: u32,

    /// Body size cap; reaching it fails the fetch
    pub max_content_bytes: u64,

    /// Identifying User-Agent sent with every request, including redirects
    pub user_agent: String,
}

/// Something that can turn a URL into a [`FetchOutcome`]
///
/// Implementations never fail as such: every problem is reported inside the outcome.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, url: &str) -> FetchOutcome;
}
