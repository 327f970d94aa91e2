//! Hooks for observing the catalog client.
//!
//! Implement [`ClientMetrics`] to forward cache hits, misses and remote
//! fetches to your monitoring system. The default methods log through the
//! `log` crate; [`NoOpMetrics`] silences them and [`CountingMetrics`] keeps
//! plain counters, which is handy in tests and debug screens.
//!
//! ```
//! use pokedex_kit::observability::{ClientMetrics, CountingMetrics};
//! use std::time::Duration;
//!
//! let metrics = CountingMetrics::default();
//! metrics.record_fetch("pokemon:25", Duration::from_millis(40));
//! assert_eq!(metrics.snapshot().fetches, 1);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub trait ClientMetrics: Send + Sync {
    /// A valid memoized response was returned without a network call.
    fn record_hit(&self, key: &str) {
        debug!("Catalog cache HIT: {}", key);
    }

    /// No valid entry; a network call follows.
    fn record_miss(&self, key: &str) {
        debug!("Catalog cache MISS: {}", key);
    }

    /// A network call succeeded and its payload was memoized.
    fn record_fetch(&self, key: &str, duration: Duration) {
        debug!("Catalog FETCH: {} took {:?}", key, duration);
    }

    /// A network call failed; nothing was memoized.
    fn record_error(&self, key: &str, error: &str) {
        warn!("Catalog ERROR for {}: {}", key, error);
    }
}

#[derive(Clone, Default)]
pub struct NoOpMetrics;

impl ClientMetrics for NoOpMetrics {
    fn record_hit(&self, _key: &str) {}
    fn record_miss(&self, _key: &str) {}
    fn record_fetch(&self, _key: &str, _duration: Duration) {}
    fn record_error(&self, _key: &str, _error: &str) {}
}

/// Counters shared by every clone.
#[derive(Clone, Default)]
pub struct CountingMetrics {
    inner: Arc<Counters>,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    fetches: AtomicU64,
    errors: AtomicU64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub fetches: u64,
    pub errors: u64,
}

impl CountingMetrics {
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            hits: self.inner.hits.load(Ordering::Relaxed),
            misses: self.inner.misses.load(Ordering::Relaxed),
            fetches: self.inner.fetches.load(Ordering::Relaxed),
            errors: self.inner.errors.load(Ordering::Relaxed),
        }
    }
}

impl ClientMetrics for CountingMetrics {
    fn record_hit(&self, _key: &str) {
        self.inner.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_miss(&self, _key: &str) {
        self.inner.misses.fetch_add(1, Ordering::Relaxed);
    }

    fn record_fetch(&self, _key: &str, _duration: Duration) {
        self.inner.fetches.fetch_add(1, Ordering::Relaxed);
    }

    fn record_error(&self, key: &str, error: &str) {
        self.inner.errors.fetch_add(1, Ordering::Relaxed);
        warn!("Catalog ERROR for {}: {}", key, error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_metrics() {
        let metrics = NoOpMetrics;
        metrics.record_hit("pokemon:1");
        metrics.record_miss("pokemon:1");
        metrics.record_error("pokemon:1", "HTTP 500: Internal Server Error");
    }

    #[test]
    fn test_counting_metrics_shared_between_clones() {
        let metrics = CountingMetrics::default();
        let clone = metrics.clone();

        clone.record_miss("pokemon:1");
        clone.record_fetch("pokemon:1", Duration::from_millis(5));
        metrics.record_hit("pokemon:1");
        metrics.record_error("pokemon:2", "HTTP 404: Not Found");

        assert_eq!(
            metrics.snapshot(),
            MetricsSnapshot {
                hits: 1,
                misses: 1,
                fetches: 1,
                errors: 1,
            }
        );
    }
}
