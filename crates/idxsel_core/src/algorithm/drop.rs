//! Drop heuristic: backward elimination from every single-column index.

use crate::algorithm::SelectionAlgorithm;
use crate::config::DropHeuristicConfig;
use crate::cost::{CostEvaluation, EvaluationStats, WhatIfBackend};
use crate::error::CoreResult;
use crate::index::{Index, IndexSet};
use crate::workload::Workload;
use tracing::{debug, info};

/// Greedy backward elimination over the single-column potential indexes.
///
/// Every round costs the working set once per member, with that member
/// removed, and drops the member whose removal is cheapest. This is
/// `O(rounds * remaining^2)` cost requests before caching, and the oracle
/// dominates the runtime.
///
/// The working set is ordered canonically, so ties go to the smallest
/// index and results are reproducible.
pub struct DropHeuristicAlgorithm<B> {
    evaluation: CostEvaluation<B>,
    config: DropHeuristicConfig,
    drop_history: Vec<Index>,
}

impl<B: WhatIfBackend> DropHeuristicAlgorithm<B> {
    /// Creates the algorithm.
    ///
    /// # Errors
    ///
    /// Fails if `config` does not validate.
    pub fn new(mut evaluation: CostEvaluation<B>, config: DropHeuristicConfig) -> CoreResult<Self> {
        config.validate()?;
        evaluation.set_cost_estimation(config.cost_estimation);
        Ok(Self {
            evaluation,
            config,
            drop_history: Vec::new(),
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &DropHeuristicConfig {
        &self.config
    }

    /// Returns the cost evaluation.
    pub fn evaluation(&self) -> &CostEvaluation<B> {
        &self.evaluation
    }

    /// Indexes in the order they were dropped, followed by the survivor.
    ///
    /// Empty unless `log_index_history` is enabled.
    pub fn drop_history(&self) -> &[Index] {
        &self.drop_history
    }
}

impl<B: WhatIfBackend> SelectionAlgorithm for DropHeuristicAlgorithm<B> {
    fn name(&self) -> &'static str {
        "drop_heuristic"
    }

    fn calculate_best_indexes(&mut self, workload: &Workload) -> CoreResult<Vec<Index>> {
        debug!("Parameters: {:?}", self.config);
        self.drop_history.clear();

        let mut remaining: IndexSet = workload.potential_indexes();

        while remaining.len() > self.config.max_indexes {
            let mut lowest: Option<(f64, &Index)> = None;
            for index in &remaining {
                let cost = self.evaluation.estimate_cost(
                    workload,
                    remaining.iter().filter(|other| *other != index),
                    true,
                )?;
                if lowest.map_or(true, |(lowest_cost, _)| cost < lowest_cost) {
                    lowest = Some((cost, index));
                }
            }

            let Some((cost, index)) = lowest else {
                break;
            };
            let index = index.clone();
            remaining.remove(&index);
            info!(
                "Dropping index {}. {} indexes remaining, cost {:.2}",
                index,
                remaining.len(),
                cost
            );

            if self.config.log_index_history {
                self.drop_history.push(index);
            }
        }

        if self.config.log_index_history {
            self.drop_history.extend(remaining.iter().cloned());
        }

        Ok(remaining.into_iter().collect())
    }

    fn evaluation_stats(&self) -> EvaluationStats {
        self.evaluation.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::test_support::*;
    use crate::cost::CostEstimation;

    #[test]
    fn keeps_max_indexes() {
        let mut algorithm =
            DropHeuristicAlgorithm::new(evaluation(), DropHeuristicConfig::new().max_indexes(2))
                .unwrap();
        let indexes = algorithm.calculate_best_indexes(&workload()).unwrap();
        assert_eq!(indexes.len(), 2);
        assert!(indexes.iter().all(Index::is_single_column));
    }

    #[test]
    fn small_pool_is_returned_unchanged() {
        let mut algorithm = DropHeuristicAlgorithm::new(evaluation(), DropHeuristicConfig::new())
            .unwrap();
        let indexes = algorithm.calculate_best_indexes(&workload()).unwrap();
        let expected: Vec<Index> = workload().potential_indexes().into_iter().collect();
        assert_eq!(indexes, expected);
        assert_eq!(algorithm.evaluation_stats().cost_requests, 0);
    }

    #[test]
    fn keeps_the_most_useful_index() {
        // o_status has three distinct values and never beats a scan
        let mut algorithm =
            DropHeuristicAlgorithm::new(evaluation(), DropHeuristicConfig::new().max_indexes(1))
                .unwrap();
        let indexes = algorithm.calculate_best_indexes(&workload()).unwrap();
        assert_eq!(indexes.len(), 1);
        assert_ne!(indexes[0], idx(&["o_status"]));
    }

    #[test]
    fn records_drop_history() {
        let config = DropHeuristicConfig::new()
            .max_indexes(1)
            .log_index_history(true);
        let mut algorithm = DropHeuristicAlgorithm::new(evaluation(), config).unwrap();
        let indexes = algorithm.calculate_best_indexes(&workload()).unwrap();

        let history = algorithm.drop_history();
        assert_eq!(history.len(), 4);
        assert_eq!(history.last(), indexes.first());
    }

    #[test]
    fn history_disabled_by_default() {
        let mut algorithm =
            DropHeuristicAlgorithm::new(evaluation(), DropHeuristicConfig::new().max_indexes(1))
                .unwrap();
        algorithm.calculate_best_indexes(&workload()).unwrap();
        assert!(algorithm.drop_history().is_empty());
    }

    #[test]
    fn applies_cost_estimation_mode() {
        let config = DropHeuristicConfig::new().cost_estimation(CostEstimation::ActualRuntimes);
        let algorithm = DropHeuristicAlgorithm::new(evaluation(), config).unwrap();
        assert_eq!(
            algorithm.evaluation().cost_estimation(),
            CostEstimation::ActualRuntimes
        );
    }

    #[test]
    fn runtime_mode_fails_on_analytic_backend() {
        let config = DropHeuristicConfig::new()
            .max_indexes(1)
            .cost_estimation(CostEstimation::ActualRuntimes);
        let mut algorithm = DropHeuristicAlgorithm::new(evaluation(), config).unwrap();
        assert!(algorithm.calculate_best_indexes(&workload()).is_err());
    }
}
