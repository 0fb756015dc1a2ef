//! Fetch coordinator - submission and fan-out logic
//!
//! This module wires the core together:
//! - Appending pending entries for each submitted batch
//! - Launching one fetch task per entry under a concurrency ceiling
//! - Writing each outcome back into the store by entry identity
//! - Owning the background tasks (cleanup sweep, idle visitor sweep)

use crate::config::Config;
use crate::fetcher::{Fetch, FetchOutcome, HttpFetcher};
use crate::limiter::{LimiterStats, RateLimiter, IDLE_SWEEP_INTERVAL};
use crate::store::{CleanupScheduler, CleanupStats, EntryId, FetchResponse, ResultStore};
use crate::{FetchError, HarvestError};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;

/// Handle on a submitted batch
///
/// Dropping it detaches the batch; the fetches keep running either way.
#[derive(Debug)]
pub struct BatchHandle {
    ids: Vec<EntryId>,
    completion: JoinHandle<()>,
}

impl BatchHandle {
    /// Ids of the entries created for this batch, in submission order
    pub fn ids(&self) -> &[EntryId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Waits until every fetch in the batch has written its outcome
    pub async fn wait(self) {
        if let Err(e) = self.completion.await {
            tracing::warn!("Batch completion task failed: {}", e);
        }
    }
}

/// Tasks stopped together at shutdown
#[derive(Debug)]
struct Background {
    cleanup: CleanupScheduler,
    visitor_sweep: JoinHandle<()>,
}

/// Main service structure
///
/// Owns the result store, the admission limiter, the fetch executor, and the
/// background tasks. Constructing it starts the background tasks, so it must
/// happen inside a tokio runtime.
pub struct FetchService {
    store: Arc<ResultStore>,
    limiter: Arc<RateLimiter>,
    fetcher: Arc<dyn Fetch>,
    permits: Arc<Semaphore>,
    max_concurrent_fetches: usize,
    shutdown: CancellationToken,
    background: Mutex<Option<Background>>,
}

impl std::fmt::Debug for FetchService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchService")
            .field("entries", &self.store.len())
            .field("max_concurrent_fetches", &self.max_concurrent_fetches)
            .field("shutdown", &self.shutdown.is_cancelled())
            .finish()
    }
}

impl FetchService {
    /// Creates a service that fetches over HTTP
    ///
    /// # Returns
    ///
    /// * `Ok(FetchService)` - Service running with its background tasks
    /// * `Err(HarvestError)` - The HTTP client could not be built
    pub fn new(config: &Config) -> Result<Self, HarvestError> {
        let fetcher = HttpFetcher::new(config.fetch_options())?;
        Ok(Self::with_fetcher(config, Arc::new(fetcher)))
    }

    /// Creates a service around any fetch executor
    pub fn with_fetcher(config: &Config, fetcher: Arc<dyn Fetch>) -> Self {
        let store = Arc::new(ResultStore::new(config.retention_policy()));
        let limiter = Arc::new(RateLimiter::from_config(&config.rate_limit));
        let max_concurrent_fetches = config.fetch.max_concurrent_fetches;
        let shutdown = CancellationToken::new();

        let cleanup = CleanupScheduler::start(Arc::clone(&store), config.cleanup_interval(), &shutdown);
        let visitor_sweep = limiter.spawn_sweeper(IDLE_SWEEP_INTERVAL, shutdown.child_token());

        Self {
            store,
            limiter,
            fetcher,
            permits: Arc::new(Semaphore::new(max_concurrent_fetches)),
            max_concurrent_fetches,
            shutdown,
            background: Mutex::new(Some(Background {
                cleanup,
                visitor_sweep,
            })),
        }
    }

    /// Submits a batch of URLs for fetching
    ///
    /// Entries are appended as pending before this returns; the fetches run in
    /// the background. An empty batch is rejected. Empty URLs inside a batch
    /// are accepted and recorded as failed without touching the network.
    pub fn submit(&self, urls: Vec<String>) -> Result<BatchHandle, HarvestError> {
        if urls.is_empty() {
            return Err(HarvestError::EmptyBatch);
        }

        let assigned = self.store.append_pending(&urls);
        let ids: Vec<EntryId> = assigned.iter().map(|(id, _)| *id).collect();
        tracing::info!("Submitted {} URLs for fetching", ids.len());

        let mut tasks = JoinSet::new();
        for (id, url) in assigned {
            tasks.spawn(run_fetch(
                id,
                url,
                Arc::clone(&self.store),
                Arc::clone(&self.fetcher),
                Arc::clone(&self.permits),
            ));
        }

        let batch_size = ids.len();
        let completion = tokio::spawn(async move {
            while let Some(joined) = tasks.join_next().await {
                if let Err(e) = joined {
                    tracing::error!("Fetch task failed: {}", e);
                }
            }
            tracing::info!("All {} URLs in batch fetched", batch_size);
        });

        Ok(BatchHandle { ids, completion })
    }

    /// Checks whether a submission from `key` should be admitted
    pub fn allow(&self, key: &str) -> bool {
        self.limiter.allow(key)
    }

    pub fn snapshot(&self) -> FetchResponse {
        self.store.snapshot()
    }

    pub fn clear_all(&self) -> usize {
        self.store.clear_all()
    }

    pub fn cleanup_stats(&self) -> CleanupStats {
        self.store.cleanup_stats()
    }

    pub fn limiter_stats(&self) -> LimiterStats {
        self.limiter.stats()
    }

    pub fn store(&self) -> &Arc<ResultStore> {
        &self.store
    }

    /// Returns true until [`shutdown`](Self::shutdown) has been called
    pub fn is_running(&self) -> bool {
        !self.shutdown.is_cancelled()
    }

    /// Stops the background tasks and waits for them to exit
    ///
    /// Fetches already holding a permit run to completion; queued fetches that
    /// have not started are recorded as failed. Calling this more than once is
    /// harmless.
    pub async fn shutdown(&self) {
        let background = self
            .background
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        self.shutdown.cancel();
        self.permits.close();

        if let Some(background) = background {
            background.cleanup.stop().await;
            if let Err(e) = background.visitor_sweep.await {
                tracing::warn!("Idle visitor sweep ended abnormally: {}", e);
            }
            tracing::info!("Fetch service stopped");
        }
    }
}

/// Fetches one entry and records its outcome
async fn run_fetch(
    id: EntryId,
    url: String,
    store: Arc<ResultStore>,
    fetcher: Arc<dyn Fetch>,
    permits: Arc<Semaphore>,
) {
    let started = Instant::now();

    let outcome = if url.trim().is_empty() {
        FetchOutcome::failure(FetchError::EmptyUrl, started.elapsed())
    } else {
        match permits.acquire_owned().await {
            Ok(permit) => {
                let outcome = fetcher.fetch(&url).await;
                drop(permit);
                outcome
            }
            Err(_) => FetchOutcome::failure(FetchError::ShuttingDown, Duration::ZERO),
        }
    };

    if outcome.is_success() {
        tracing::debug!("Recording success for {} ({})", id, url);
    } else if let Some(e) = outcome.error() {
        tracing::warn!("Fetch failed for {}: {}", url, e);
    }

    store.complete(id, outcome);
}
