//! Index selection algorithms.
//!
//! All algorithms are greedy heuristics over the same ingredients: a
//! workload, a candidate pool and a [`CostEvaluation`]. They differ in the
//! direction of the search:
//!
//! - [`DropHeuristicAlgorithm`]: start from every potential index, remove
//!   the least useful one until `max_indexes` remain.
//! - [`ExtendAlgorithm`]: start empty, add or widen the index with the best
//!   benefit per byte until nothing fits the budget or helps enough.
//! - [`RelaxationAlgorithm`]: start from the per-query optimal indexes,
//!   relax (split, merge, prefix, remove) until the budget is met.
//!
//! Runs are single-threaded and synchronous; every oracle call blocks. An
//! oracle failure aborts the run with the backend's error.

mod drop;
mod extend;
mod relaxation;

pub use drop::DropHeuristicAlgorithm;
pub use extend::ExtendAlgorithm;
pub use relaxation::{RelaxationAlgorithm, RelaxedConfiguration};

use crate::config::AlgorithmConfig;
use crate::cost::{CostEvaluation, EvaluationStats, WhatIfBackend};
use crate::error::CoreResult;
use crate::index::Index;
use crate::workload::Workload;
use std::time::Instant;
use tracing::info;

/// Common contract of all selection algorithms.
pub trait SelectionAlgorithm {
    /// Returns the algorithm name.
    fn name(&self) -> &'static str;

    /// Runs the search and returns the selected indexes.
    fn calculate_best_indexes(&mut self, workload: &Workload) -> CoreResult<Vec<Index>>;

    /// Returns the oracle call statistics accumulated so far.
    fn evaluation_stats(&self) -> EvaluationStats;

    /// Runs the search with timing and oracle statistics logged.
    fn best_indexes(&mut self, workload: &Workload) -> CoreResult<Vec<Index>> {
        info!("Calculating best indexes ({}) for {} queries", self.name(), workload.len());
        let started = Instant::now();

        let indexes = self.calculate_best_indexes(workload)?;

        let stats = self.evaluation_stats();
        info!(
            "{} selected {} indexes in {:?}: {} cost requests, {} cache hits, {} size estimations",
            self.name(),
            indexes.len(),
            started.elapsed(),
            stats.cost_requests,
            stats.cache_hits,
            stats.size_requests
        );
        Ok(indexes)
    }
}

/// Builds the algorithm selected by `config`.
///
/// # Errors
///
/// Fails with [`CoreError::InvalidConfig`](crate::CoreError::InvalidConfig)
/// if the configuration violates a precondition.
pub fn build_algorithm<B>(
    config: AlgorithmConfig,
    evaluation: CostEvaluation<B>,
) -> CoreResult<Box<dyn SelectionAlgorithm>>
where
    B: WhatIfBackend + 'static,
{
    Ok(match config {
        AlgorithmConfig::DropHeuristic(config) => {
            Box::new(DropHeuristicAlgorithm::new(evaluation, config)?)
        }
        AlgorithmConfig::Extend(config) => Box::new(ExtendAlgorithm::new(evaluation, config)?),
        AlgorithmConfig::Relaxation(config) => {
            Box::new(RelaxationAlgorithm::new(evaluation, config)?)
        }
    })
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::config::{DropHeuristicConfig, ExtendConfig, RelaxationConfig};
    use crate::error::CoreError;

    #[test]
    fn builds_every_algorithm() {
        let configs = [
            AlgorithmConfig::DropHeuristic(DropHeuristicConfig::new().max_indexes(2)),
            AlgorithmConfig::Extend(ExtendConfig::new().budget_mb(100.0)),
            AlgorithmConfig::Relaxation(RelaxationConfig::new().budget_mb(100.0)),
        ];
        for config in configs {
            let name = config.name();
            let mut algorithm = build_algorithm(config, evaluation()).unwrap();
            assert_eq!(algorithm.name(), name);

            let indexes = algorithm.best_indexes(&workload()).unwrap();
            assert!(!indexes.is_empty());
            assert!(algorithm.evaluation_stats().cost_requests > 0);
        }
    }

    #[test]
    fn invalid_config_fails_construction() {
        let config = AlgorithmConfig::DropHeuristic(DropHeuristicConfig::new().max_indexes(0));
        let err = build_algorithm(config, evaluation()).err().unwrap();
        assert!(matches!(err, CoreError::InvalidConfig { .. }));
    }
}
