//! Usage statistics accumulation.

use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use arc_swap::ArcSwap;
use serde::Serialize;

use crate::resilience::rate_limit::RateLimitInfo;

/// Weight of history vs. the latest sample in the rolling latency average.
const LATENCY_HISTORY_WEIGHT: f64 = 0.7;

/// A point-in-time view of provider usage.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UsageStatistics {
    /// Calls issued since the tracker was created.
    pub total_requests: u64,
    /// Calls issued in the current rate-limit window.
    pub window_requests: u64,
    pub successes: u64,
    pub failures: u64,
    /// Rolling weighted average (70% history, 30% latest sample).
    pub avg_response_time_ms: f64,
    /// Unix seconds at which the current rate-limit window resets.
    pub window_reset_epoch: Option<u64>,
    /// Last limit/remaining the provider reported, if any.
    pub provider_limit: Option<u64>,
    pub provider_remaining: Option<u64>,
}

/// Accumulates usage statistics for the resilience engine.
///
/// Mutation happens only here, under an internal lock; collaborators read
/// lock-free snapshots.
pub struct UsageTracker {
    inner: Mutex<UsageStatistics>,
    published: ArcSwap<UsageStatistics>,
    window: Duration,
}

impl UsageTracker {
    pub fn new(window: Duration) -> Self {
        Self {
            inner: Mutex::new(UsageStatistics::default()),
            published: ArcSwap::from_pointee(UsageStatistics::default()),
            window,
        }
    }

    /// Record the start of an attempt, rolling the window over if its reset
    /// time has passed.
    pub fn record_attempt(&self) {
        let mut stats = self.lock();
        let now = now_secs();
        match stats.window_reset_epoch {
            Some(reset) if now < reset => {}
            _ => {
                stats.window_requests = 0;
                stats.window_reset_epoch = Some(now + self.window.as_secs());
            }
        }
        stats.total_requests += 1;
        stats.window_requests += 1;
        self.publish(&stats);
    }

    pub fn record_success(&self, elapsed: Duration) {
        let mut stats = self.lock();
        stats.successes += 1;
        let sample = elapsed.as_secs_f64() * 1000.0;
        stats.avg_response_time_ms = if stats.successes == 1 {
            sample
        } else {
            stats.avg_response_time_ms * LATENCY_HISTORY_WEIGHT
                + sample * (1.0 - LATENCY_HISTORY_WEIGHT)
        };
        self.publish(&stats);
    }

    pub fn record_failure(&self) {
        let mut stats = self.lock();
        stats.failures += 1;
        self.publish(&stats);
    }

    /// Fold in whatever backpressure state the provider reported.
    pub fn record_rate_limit(&self, info: &RateLimitInfo) {
        let mut stats = self.lock();
        if info.limit.is_some() {
            stats.provider_limit = info.limit;
        }
        if info.remaining.is_some() {
            stats.provider_remaining = info.remaining;
        }
        if let Some(reset) = info.reset_epoch {
            // The provider's window is authoritative over our local estimate.
            stats.window_reset_epoch = Some(reset);
        }
        self.publish(&stats);
    }

    /// Lock-free snapshot of the current statistics.
    pub fn snapshot(&self) -> Arc<UsageStatistics> {
        self.published.load_full()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, UsageStatistics> {
        self.inner.lock().expect("usage stats mutex poisoned")
    }

    fn publish(&self, stats: &UsageStatistics) {
        self.published.store(Arc::new(stats.clone()));
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
