//! Integration tests for URL Harvest
//!
//! The HTTP fetcher is tested against wiremock servers; the service and the
//! router are driven through stub fetchers so no real network is involved.

mod fetch_tests;
mod server_tests;
