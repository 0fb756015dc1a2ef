//! Periodic eviction of stale results
//!
//! The scheduler is either running (ticking) or stopped. Stopping consumes it,
//! so a stopped scheduler cannot be restarted for the same handle.

use crate::store::ResultStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Background task that sweeps a [`ResultStore`] on a fixed interval
#[derive(Debug)]
pub struct CleanupScheduler {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl CleanupScheduler {
    /// Starts sweeping `store` every `interval`
    ///
    /// The first sweep happens one full interval after start. The scheduler
    /// also stops when `shutdown` is cancelled.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(store: Arc<ResultStore>, interval: Duration, shutdown: &CancellationToken) -> Self {
        let token = shutdown.child_token();
        let period = interval.max(Duration::from_millis(1));

        let task_token = token.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            tracing::info!("Cleanup scheduler started (interval: {:?})", period);
            loop {
                tokio::select! {
                    _ = task_token.cancelled() => {
                        tracing::info!("Cleanup scheduler stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let removed = store.sweep();
                        tracing::debug!("Cleanup sweep finished, {} results removed", removed);
                    }
                }
            }
        });

        Self { token, handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stops the scheduler and waits for its task to exit
    pub async fn stop(self) {
        self.token.cancel();
        if let Err(e) = self.handle.await {
            tracing::warn!("Cleanup scheduler task ended abnormally: {}", e);
        }
    }
}
