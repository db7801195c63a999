//! Oracle call statistics.
//!
//! Every what-if call is assumed expensive, so the number of calls a
//! selection run issues is its main cost driver. These counters make that
//! visible.
//!
//! # Usage
//!
//! ```rust,ignore
//! let mut algorithm = ExtendAlgorithm::new(evaluation, ExtendConfig::default())?;
//! let indexes = algorithm.best_indexes(&workload)?;
//!
//! let stats = algorithm.evaluation_stats();
//! println!("cost requests: {}", stats.cost_requests);
//! println!("cache hits: {}", stats.cache_hits);
//! ```

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for calls made through a [`CostEvaluation`](super::CostEvaluation).
///
/// All counters are atomic and monotonically increasing.
#[derive(Debug, Default)]
pub struct EvaluationCounters {
    /// Per-query cost lookups, cached or not.
    cost_requests: AtomicU64,
    /// Cost lookups answered from the cost cache.
    cache_hits: AtomicU64,
    /// Query plans requested from the backend.
    plan_requests: AtomicU64,
    /// Index sizes computed by the backend.
    size_requests: AtomicU64,
}

impl EvaluationCounters {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_cost_request(&self, cache_hit: bool) {
        self.cost_requests.fetch_add(1, Ordering::Relaxed);
        if cache_hit {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_plan_request(&self) {
        self.plan_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_size_request(&self) {
        self.size_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of per-query cost lookups.
    pub fn cost_requests(&self) -> u64 {
        self.cost_requests.load(Ordering::Relaxed)
    }

    /// Returns the number of cost lookups served from cache.
    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    /// Returns the number of plan requests.
    pub fn plan_requests(&self) -> u64 {
        self.plan_requests.load(Ordering::Relaxed)
    }

    /// Returns the number of size estimations performed by the backend.
    pub fn size_requests(&self) -> u64 {
        self.size_requests.load(Ordering::Relaxed)
    }

    /// Returns a snapshot of all counters.
    pub fn snapshot(&self) -> EvaluationStats {
        EvaluationStats {
            cost_requests: self.cost_requests(),
            cache_hits: self.cache_hits(),
            plan_requests: self.plan_requests(),
            size_requests: self.size_requests(),
        }
    }
}

/// A point-in-time snapshot of evaluation counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct EvaluationStats {
    /// Per-query cost lookups, cached or not.
    pub cost_requests: u64,
    /// Cost lookups answered from the cost cache.
    pub cache_hits: u64,
    /// Query plans requested from the backend.
    pub plan_requests: u64,
    /// Index sizes computed by the backend.
    pub size_requests: u64,
}

impl EvaluationStats {
    /// Returns the number of cost lookups that reached the backend.
    pub fn backend_cost_calls(&self) -> u64 {
        self.cost_requests - self.cache_hits
    }

    /// Returns the fraction of cost lookups served from cache.
    pub fn cache_hit_ratio(&self) -> f64 {
        if self.cost_requests == 0 {
            return 0.0;
        }
        self.cache_hits as f64 / self.cost_requests as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_counters_are_zero() {
        let counters = EvaluationCounters::new();
        assert_eq!(counters.cost_requests(), 0);
        assert_eq!(counters.snapshot(), EvaluationStats::default());
    }

    #[test]
    fn record_requests() {
        let counters = EvaluationCounters::new();
        counters.record_cost_request(false);
        counters.record_cost_request(true);
        counters.record_cost_request(true);
        counters.record_size_request();
        counters.record_plan_request();

        let snap = counters.snapshot();
        assert_eq!(snap.cost_requests, 3);
        assert_eq!(snap.cache_hits, 2);
        assert_eq!(snap.backend_cost_calls(), 1);
        assert_eq!(snap.size_requests, 1);
        assert_eq!(snap.plan_requests, 1);
        assert!((snap.cache_hit_ratio() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn hit_ratio_without_requests() {
        assert_eq!(EvaluationStats::default().cache_hit_ratio(), 0.0);
    }
}
