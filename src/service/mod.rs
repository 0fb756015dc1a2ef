//! Fetch service: the orchestrator in front of the store, limiter, and fetcher
//!
//! Submitting a batch returns as soon as its entries are recorded as pending.
//! Each URL is then fetched in its own task, with at most
//! `fetch.max-concurrent-fetches` performing network I/O at once.

mod coordinator;

pub use coordinator::{BatchHandle, FetchService};
