//! Read-side views of the result store
//!
//! These are plain copies handed out to callers; none of them alias store state.

use crate::store::entry::{FetchEntry, FetchStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Consistent view of every stored entry plus derived counts
#[derive(Debug, Clone, Default, Serialize)]
pub struct FetchResponse {
    pub total_urls: usize,
    pub success_count: usize,
    pub failed_count: usize,
    pub pending_count: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_submission: Option<DateTime<Utc>>,

    pub results: Vec<FetchEntry>,
}

impl FetchResponse {
    /// Builds a response from entries already in insertion order
    pub(crate) fn from_entries(
        results: Vec<FetchEntry>,
        last_submission: Option<DateTime<Utc>>,
    ) -> Self {
        let mut response = Self {
            total_urls: results.len(),
            last_submission,
            ..Self::default()
        };

        for entry in &results {
            match entry.status {
                FetchStatus::Pending => response.pending_count += 1,
                FetchStatus::Success => response.success_count += 1,
                FetchStatus::Failed => response.failed_count += 1,
            }
        }

        response.results = results;
        response
    }

    /// Returns true when every entry has reached a terminal status
    pub fn is_settled(&self) -> bool {
        self.pending_count == 0
    }
}

/// Cleanup bookkeeping, updated by sweeps and by clear-all
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupStats {
    pub last_cleanup: Option<DateTime<Utc>>,
    pub total_cleaned: u64,
    pub cleanup_count: u64,
    pub results_in_memory: usize,
}
