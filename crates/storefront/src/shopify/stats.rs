//! API call timing and cache effectiveness.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;

const RECENT_CALLS: usize = 100;

/// Records durations of the most recent API calls and cache hit/miss counts.
#[derive(Debug, Default)]
pub struct PerformanceMonitor {
    durations: Mutex<VecDeque<Duration>>,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    stale_fallbacks: AtomicU64,
    failures: AtomicU64,
}

/// Point-in-time view of [`PerformanceMonitor`].
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PerformanceStats {
    pub recent_calls: usize,
    pub average_api_time_ms: f64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_hit_rate: f64,
    pub stale_fallbacks: u64,
    pub failures: u64,
}

impl PerformanceMonitor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the wall time of one network round trip (all attempts).
    pub fn record_call(&self, elapsed: Duration) {
        let mut durations = self
            .durations
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if durations.len() == RECENT_CALLS {
            durations.pop_front();
        }
        durations.push_back(elapsed);
    }

    pub fn record_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale_fallback(&self) {
        self.stale_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> PerformanceStats {
        let durations = self
            .durations
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let recent_calls = durations.len();
        #[allow(clippy::cast_precision_loss)] // at most RECENT_CALLS entries
        let average_api_time_ms = if recent_calls == 0 {
            0.0
        } else {
            durations.iter().map(|d| d.as_secs_f64() * 1000.0).sum::<f64>() / recent_calls as f64
        };
        drop(durations);

        let cache_hits = self.cache_hits.load(Ordering::Relaxed);
        let cache_misses = self.cache_misses.load(Ordering::Relaxed);
        let lookups = cache_hits + cache_misses;
        #[allow(clippy::cast_precision_loss)] // counters stay far below 2^52
        let cache_hit_rate = if lookups == 0 {
            0.0
        } else {
            cache_hits as f64 / lookups as f64
        };

        PerformanceStats {
            recent_calls,
            average_api_time_ms,
            cache_hits,
            cache_misses,
            cache_hit_rate,
            stale_fallbacks: self.stale_fallbacks.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}
