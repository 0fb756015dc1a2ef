//! Per-client admission limiting for submissions
//!
//! This module handles:
//! - Per-key visitor state, created lazily on first request
//! - A fixed counting window combined with linear token refill
//! - Idle visitor eviction on a background sweep
//!
//! The limiter gates submission calls only. It never errors; it only answers
//! whether a request is admitted.

mod visitor;

pub use visitor::{Limits, Visitor};

use crate::config::RateLimitConfig;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// How often idle visitors are purged
pub const IDLE_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Point-in-time limiter statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LimiterStats {
    pub active_keys: usize,
    pub rate: u32,
    pub burst: u32,
    pub window_seconds: u64,
}

/// Keyed admission limiter
///
/// Admission decisions take the exclusive side of the lock; statistics take the
/// shared side. This lock is independent of the result store's lock.
#[derive(Debug)]
pub struct RateLimiter {
    limits: Limits,
    visitors: RwLock<HashMap<String, Visitor>>,
}

impl RateLimiter {
    /// Creates a limiter admitting `rate` requests per `window`, with bursts of at most `burst`
    pub fn new(rate: u32, burst: u32, window: Duration) -> Self {
        Self {
            limits: Limits {
                rate,
                burst,
                window,
            },
            visitors: RwLock::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(
            config.requests,
            config.burst,
            Duration::from_secs(config.window_secs),
        )
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Checks whether a request from `key` should be admitted
    pub fn allow(&self, key: &str) -> bool {
        self.allow_at(key, Instant::now())
    }

    /// Same as [`allow`](Self::allow) with an explicit clock reading
    pub fn allow_at(&self, key: &str, now: Instant) -> bool {
        let mut visitors = self.visitors.write().unwrap_or_else(PoisonError::into_inner);

        if let Some(visitor) = visitors.get_mut(key) {
            return visitor.admit(&self.limits, now);
        }

        visitors.insert(key.to_string(), Visitor::new(&self.limits, now));
        true
    }

    /// Removes visitors idle for more than twice the window; returns how many
    pub fn purge_idle(&self) -> usize {
        self.purge_idle_at(Instant::now())
    }

    pub fn purge_idle_at(&self, now: Instant) -> usize {
        let mut visitors = self.visitors.write().unwrap_or_else(PoisonError::into_inner);
        let before = visitors.len();
        visitors.retain(|_, visitor| !visitor.is_idle(&self.limits, now));
        before - visitors.len()
    }

    pub fn stats(&self) -> LimiterStats {
        let visitors = self.visitors.read().unwrap_or_else(PoisonError::into_inner);
        LimiterStats {
            active_keys: visitors.len(),
            rate: self.limits.rate,
            burst: self.limits.burst,
            window_seconds: self.limits.window.as_secs(),
        }
    }

    /// Spawns the idle-visitor sweep, which runs until `shutdown` is cancelled
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        let limiter = Arc::clone(self);
        let period = interval.max(Duration::from_millis(1));

        tokio::spawn(async move {
            let mut ticker = interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        tracing::debug!("Idle visitor sweep stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let purged = limiter.purge_idle();
                        if purged > 0 {
                            tracing::debug!("Purged {} idle rate limit visitors", purged);
                        }
                    }
                }
            }
        })
    }
}
