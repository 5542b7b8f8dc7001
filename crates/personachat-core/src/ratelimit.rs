//! Fixed-window request limiter keyed by client identity.
//!
//! Each key gets `max_requests` per window. The window starts at the first
//! request after the previous one expired. State is a sharded `DashMap`, so
//! a check never takes a global lock.

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use personachat_types::config::RateLimitConfig;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    reset_at: Instant,
}

/// Outcome of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Unix timestamp (seconds) when the current window resets.
    pub reset_at: u64,
    /// Seconds until the window resets, rounded up.
    pub retry_after_secs: u64,
}

#[derive(Clone)]
pub struct FixedWindowRateLimiter {
    windows: Arc<DashMap<String, Window>>,
    max_requests: u32,
    window: Duration,
}

impl FixedWindowRateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            windows: Arc::new(DashMap::new()),
            max_requests,
            window,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, Duration::from_millis(config.window_ms))
    }

    pub fn check(&self, key: &str) -> RateLimitDecision {
        self.check_at(key, Instant::now())
    }

    /// Count a request for `key` at `now`.
    pub fn check_at(&self, key: &str, now: Instant) -> RateLimitDecision {
        let mut entry = self.windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            reset_at: now + self.window,
        });
        let window = entry.value_mut();

        if now >= window.reset_at {
            window.count = 0;
            window.reset_at = now + self.window;
        }

        let allowed = window.count < self.max_requests;
        if allowed {
            window.count += 1;
        }
        let remaining = self.max_requests.saturating_sub(window.count);
        let until_reset = window.reset_at.saturating_duration_since(now);
        drop(entry);

        let reset_at = (SystemTime::now() + until_reset)
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_secs();
        let retry_after_secs = until_reset.as_millis().div_ceil(1000) as u64;

        RateLimitDecision {
            allowed,
            limit: self.max_requests,
            remaining,
            reset_at,
            retry_after_secs,
        }
    }

    /// Drop windows that have expired. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    pub fn sweep_at(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, w| now < w.reset_at);
        before.saturating_sub(self.windows.len())
    }

    /// Number of tracked keys.
    pub fn tracked(&self) -> usize {
        self.windows.len()
    }

    /// Periodically sweep expired windows on the tokio runtime.
    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let limiter = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = limiter.sweep();
                if removed > 0 {
                    debug!(removed, "Swept expired rate limit windows");
                }
            }
        })
    }
}
