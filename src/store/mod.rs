//! In-memory result store
//!
//! This module owns every submitted URL's record, including:
//! - Appending pending entries for a submitted batch
//! - Completing entries by durable identity
//! - Consistent snapshots with derived counts
//! - TTL and capacity eviction, run by the [`CleanupScheduler`]
//! - Clear-all and cleanup statistics
//!
//! Entries are keyed by [`EntryId`] rather than by position, so a fetch that
//! finishes after its entry was evicted performs a no-op instead of overwriting
//! whatever now occupies its old slot.

mod cleanup;
mod entry;
mod snapshot;

pub use cleanup::CleanupScheduler;
pub use entry::{EntryId, FetchEntry, FetchStatus};
pub use snapshot::{CleanupStats, FetchResponse};

use crate::fetcher::FetchOutcome;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

/// Eviction limits applied by each sweep
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Entries older than this are removed
    pub ttl: Duration,

    /// Ceiling on entries kept after TTL filtering; oldest go first
    pub max_results: usize,
}

#[derive(Debug, Default)]
struct StoreInner {
    /// Ordered by id, which is insertion order
    entries: BTreeMap<EntryId, FetchEntry>,
    next_id: u64,
    last_submission: Option<DateTime<Utc>>,
    stats: CleanupStats,
}

/// Thread-safe store of fetch entries
///
/// Writers are serialized by a single lock; snapshots and statistics take the
/// shared side and may run concurrently with each other. The lock is never
/// held across an `.await`.
#[derive(Debug)]
pub struct ResultStore {
    policy: RetentionPolicy,
    inner: RwLock<StoreInner>,
}

impl ResultStore {
    pub fn new(policy: RetentionPolicy) -> Self {
        Self {
            policy,
            inner: RwLock::new(StoreInner::default()),
        }
    }

    pub fn policy(&self) -> &RetentionPolicy {
        &self.policy
    }

    // A panic elsewhere never leaves entries half-written, so a poisoned lock is still usable
    fn read(&self) -> RwLockReadGuard<'_, StoreInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends one pending entry per URL, in order
    ///
    /// Returns the assigned ids paired with their URLs so the caller can launch
    /// one fetch per entry.
    pub fn append_pending(&self, urls: &[String]) -> Vec<(EntryId, String)> {
        self.append_pending_at(urls, Utc::now())
    }

    pub(crate) fn append_pending_at(
        &self,
        urls: &[String],
        now: DateTime<Utc>,
    ) -> Vec<(EntryId, String)> {
        let mut inner = self.write();
        inner.last_submission = Some(now);

        let mut assigned = Vec::with_capacity(urls.len());
        for url in urls {
            let id = EntryId::new(inner.next_id);
            inner.next_id += 1;
            inner
                .entries
                .insert(id, FetchEntry::pending(id, url.clone(), now));
            assigned.push((id, url.clone()));
        }

        assigned
    }

    /// Records the terminal outcome for an entry
    ///
    /// Returns false, leaving the store untouched, if the entry has been evicted
    /// or has already been completed.
    pub fn complete(&self, id: EntryId, outcome: FetchOutcome) -> bool {
        let mut inner = self.write();
        match inner.entries.get_mut(&id) {
            Some(entry) if !entry.status.is_terminal() => {
                entry.apply(outcome);
                true
            }
            Some(entry) => {
                tracing::warn!(
                    "Ignoring second completion for {} ({}), already {}",
                    id,
                    entry.url,
                    entry.status
                );
                false
            }
            None => {
                tracing::debug!("Entry {} was evicted before its fetch completed", id);
                false
            }
        }
    }

    /// Returns a copy of one entry
    pub fn get(&self, id: EntryId) -> Option<FetchEntry> {
        self.read().entries.get(&id).cloned()
    }

    /// Returns a consistent copy of all entries with their counts
    pub fn snapshot(&self) -> FetchResponse {
        let inner = self.read();
        FetchResponse::from_entries(
            inner.entries.values().cloned().collect(),
            inner.last_submission,
        )
    }

    /// Removes every entry and returns how many were removed
    pub fn clear_all(&self) -> usize {
        let mut inner = self.write();
        let count = inner.entries.len();
        inner.entries.clear();
        inner.stats.total_cleaned += count as u64;
        inner.stats.results_in_memory = 0;

        tracing::info!("Manually cleared all {} results", count);
        count
    }

    /// Evicts expired and surplus entries; returns the number removed
    pub fn sweep(&self) -> usize {
        self.sweep_at(Utc::now())
    }

    pub(crate) fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        let mut inner = self.write();
        let before = inner.entries.len();

        let ttl = self.policy.ttl;
        inner.entries.retain(|_, entry| entry.age(now) <= ttl);

        let surplus = inner.entries.len().saturating_sub(self.policy.max_results);
        for _ in 0..surplus {
            inner.entries.pop_first();
        }

        let removed = before - inner.entries.len();
        if removed > 0 {
            inner.stats.last_cleanup = Some(now);
            inner.stats.total_cleaned += removed as u64;
            inner.stats.cleanup_count += 1;
            inner.stats.results_in_memory = inner.entries.len();

            tracing::info!(
                "Cleanup: removed {} old results, {} remaining in memory",
                removed,
                inner.entries.len()
            );
        }

        removed
    }

    /// Returns cleanup statistics with the current entry count
    pub fn cleanup_stats(&self) -> CleanupStats {
        let inner = self.read();
        let mut stats = inner.stats.clone();
        stats.results_in_memory = inner.entries.len();
        stats
    }

    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
