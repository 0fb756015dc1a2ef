use std::time::{Duration, Instant};

/// Admission limits shared by every visitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Flat cap on requests per window
    pub rate: u32,

    /// Maximum tokens a visitor may hold
    pub burst: u32,

    /// Window length
    pub window: Duration,
}

impl Limits {
    /// Visitors unseen for longer than this are purged
    pub fn idle_after(&self) -> Duration {
        self.window.saturating_mul(2)
    }
}

/// Tracks admission state for a single key
///
/// This combines a fixed counting window with token-style smoothing: the
/// window caps total requests, the tokens cap how quickly they may arrive.
#[derive(Debug, Clone)]
pub struct Visitor {
    /// Remaining burst allowance
    pub tokens: u32,

    /// When the current window opened
    pub window_start: Instant,

    /// Requests admitted in the current window
    pub request_count: u32,

    /// Last time this key was seen, admitted or not
    pub last_seen: Instant,
}

impl Visitor {
    /// Creates the state for a key's first request, which is admitted
    pub fn new(limits: &Limits, now: Instant) -> Self {
        Self {
            tokens: limits.burst.saturating_sub(1),
            window_start: now,
            request_count: 1,
            last_seen: now,
        }
    }

    /// Decides whether a further request from this key is admitted
    ///
    /// An expired window is a hard reset, not a rolling window: the key gets a
    /// fresh count and a full burst regardless of recent load.
    pub fn admit(&mut self, limits: &Limits, now: Instant) -> bool {
        self.last_seen = now;

        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed > limits.window {
            self.window_start = now;
            self.request_count = 1;
            self.tokens = limits.burst.saturating_sub(1);
            return true;
        }

        // The flat per-window cap wins over token availability
        if self.request_count >= limits.rate {
            return false;
        }

        let refill = if limits.window.is_zero() {
            limits.burst
        } else {
            (elapsed.as_secs_f64() * f64::from(limits.burst) / limits.window.as_secs_f64()) as u32
        };
        self.tokens = self.tokens.saturating_add(refill).min(limits.burst);

        if self.tokens > 0 {
            self.tokens -= 1;
            self.request_count += 1;
            true
        } else {
            false
        }
    }

    pub fn is_idle(&self, limits: &Limits, now: Instant) -> bool {
        now.saturating_duration_since(self.last_seen) > limits.idle_after()
    }
}
