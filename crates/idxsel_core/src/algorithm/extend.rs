//! Extend: budgeted forward search by benefit per byte.

use crate::algorithm::SelectionAlgorithm;
use crate::config::{bytes_to_mb, ExtendConfig};
use crate::cost::{CostEvaluation, EvaluationStats, WhatIfBackend};
use crate::error::{CoreError, CoreResult};
use crate::index::Index;
use crate::workload::Workload;
use tracing::{debug, info};

/// Best configuration seen during one round.
#[derive(Debug, Default)]
struct Best {
    combination: Vec<Index>,
    ratio: f64,
    cost: f64,
}

/// Greedy forward search by benefit per byte.
///
/// Each round tries every single-column index that still fits the budget,
/// and every one-column extension of an index already selected, then
/// adopts the change with the highest `(cost reduction) / (added bytes)`.
/// The search stops when no change improves the cost by more than
/// `min_cost_improvement` within the budget.
///
/// The combination is kept in append order: a widened index is moved to
/// the end, so the last element is always the most recent change.
pub struct ExtendAlgorithm<B> {
    evaluation: CostEvaluation<B>,
    config: ExtendConfig,
    budget: u64,
    initial_cost: Option<f64>,
    cost_history: Vec<f64>,
}

impl<B: WhatIfBackend> ExtendAlgorithm<B> {
    /// Creates the algorithm.
    ///
    /// # Errors
    ///
    /// Fails if `config` does not validate.
    pub fn new(evaluation: CostEvaluation<B>, config: ExtendConfig) -> CoreResult<Self> {
        config.validate()?;
        Ok(Self {
            evaluation,
            budget: config.budget_bytes(),
            config,
            initial_cost: None,
            cost_history: Vec::new(),
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ExtendConfig {
        &self.config
    }

    /// Returns the cost evaluation.
    pub fn evaluation(&self) -> &CostEvaluation<B> {
        &self.evaluation
    }

    /// Workload cost without any index, once a run started.
    pub fn initial_cost(&self) -> Option<f64> {
        self.initial_cost
    }

    /// Current cost after every round of the last run, starting with the
    /// initial cost. Non-increasing.
    pub fn cost_history(&self) -> &[f64] {
        &self.cost_history
    }

    /// Keeps candidates whose size is unknown or still fits next to the
    /// current combination.
    fn candidates_within_budget(&self, combination_size: u64, candidates: Vec<Index>) -> Vec<Index> {
        candidates
            .into_iter()
            .filter(|candidate| match self.evaluation.size_of(candidate) {
                Some(size) => size + combination_size <= self.budget,
                None => true,
            })
            .collect()
    }

    /// Tries `attribute` appended to every index of `combination`.
    fn attach_to_indexes(
        &mut self,
        workload: &Workload,
        combination: &[Index],
        attribute: &Index,
        best: &mut Best,
        current_cost: f64,
    ) -> CoreResult<()> {
        let column = &attribute.columns()[0];
        for (position, index) in combination.iter().enumerate() {
            if index.width() >= self.config.max_index_width {
                continue;
            }
            let Some(widened) = index.appended(column) else {
                continue;
            };
            if combination.contains(&widened) {
                continue;
            }

            let old_size = self.evaluation.estimate_size(index)?;
            let mut candidate = combination.to_vec();
            candidate.remove(position);
            candidate.push(widened);
            self.evaluate_combination(workload, candidate, best, current_cost, old_size)?;
        }
        Ok(())
    }

    /// Scores `combination`, whose last element is the added or widened
    /// index, and records it in `best` if it wins the round so far.
    fn evaluate_combination(
        &mut self,
        workload: &Workload,
        combination: Vec<Index>,
        best: &mut Best,
        current_cost: f64,
        old_index_size: u64,
    ) -> CoreResult<()> {
        let cost = self.evaluation.estimate_cost(workload, &combination, true)?;
        if cost * self.config.min_cost_improvement >= current_cost {
            return Ok(());
        }
        let benefit = current_cost - cost;

        let Some(new_index) = combination.last() else {
            return Ok(());
        };
        let new_size = self.evaluation.estimate_size(new_index)?;
        let size_difference = new_size as f64 - old_index_size as f64;
        if size_difference == 0.0 {
            return Err(CoreError::invariant_violation(format!(
                "size of {new_index} did not change ({new_size} bytes)"
            )));
        }
        let ratio = benefit / size_difference;

        let total_size = self.evaluation.total_size(&combination)?;
        if ratio > best.ratio && total_size <= self.budget {
            debug!(
                "New best cost and size: {:.2}\t{:.2}MB",
                cost,
                bytes_to_mb(total_size)
            );
            *best = Best {
                combination,
                ratio,
                cost,
            };
        }
        Ok(())
    }
}

impl<B: WhatIfBackend> SelectionAlgorithm for ExtendAlgorithm<B> {
    fn name(&self) -> &'static str {
        "extend"
    }

    fn calculate_best_indexes(&mut self, workload: &Workload) -> CoreResult<Vec<Index>> {
        debug!("Parameters: {:?}", self.config);
        self.cost_history.clear();

        let extension_attributes: Vec<Index> = workload.potential_indexes().into_iter().collect();
        let mut single_column_candidates = extension_attributes.clone();

        let mut combination: Vec<Index> = Vec::new();
        let mut combination_size = 0;

        let mut current_cost = self.evaluation.estimate_cost(workload, &combination, true)?;
        self.initial_cost = Some(current_cost);
        self.cost_history.push(current_cost);

        loop {
            let mut best = Best::default();

            single_column_candidates =
                self.candidates_within_budget(combination_size, single_column_candidates);
            for candidate in &single_column_candidates {
                if combination.contains(candidate) {
                    continue;
                }
                let mut extended = combination.clone();
                extended.push(candidate.clone());
                self.evaluate_combination(workload, extended, &mut best, current_cost, 0)?;
            }

            for attribute in &extension_attributes {
                self.attach_to_indexes(workload, &combination, attribute, &mut best, current_cost)?;
            }

            if best.ratio <= 0.0 {
                break;
            }

            combination = best.combination;
            combination_size = self.evaluation.total_size(&combination)?;
            info!(
                "Adopted {} indexes. Cost savings: {:.3}% (round), {:.3}% (total). Storage: {:.2}MB",
                combination.len(),
                (1.0 - best.cost / current_cost) * 100.0,
                (1.0 - best.cost / self.cost_history[0]) * 100.0,
                bytes_to_mb(combination_size)
            );
            current_cost = best.cost;
            self.cost_history.push(current_cost);
        }

        Ok(combination)
    }

    fn evaluation_stats(&self) -> EvaluationStats {
        self.evaluation.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::test_support::*;
    use crate::config::mb_to_bytes;

    fn run(config: ExtendConfig) -> (ExtendAlgorithm<crate::cost::AnalyticBackend>, Vec<Index>) {
        let mut algorithm = ExtendAlgorithm::new(evaluation(), config).unwrap();
        let indexes = algorithm.calculate_best_indexes(&workload()).unwrap();
        (algorithm, indexes)
    }

    #[test]
    fn respects_budget_and_width() {
        let (mut algorithm, indexes) = run(ExtendConfig::new().budget_mb(60.0));
        assert!(!indexes.is_empty());
        assert!(indexes.iter().all(|index| index.width() <= 2));

        let size = algorithm.evaluation.total_size(&indexes).unwrap();
        assert!(size <= mb_to_bytes(60.0));
    }

    #[test]
    fn cost_never_increases() {
        let (algorithm, indexes) = run(ExtendConfig::new());
        let history = algorithm.cost_history();
        assert_eq!(history.len() >= 2, !indexes.is_empty());
        assert!(history.windows(2).all(|pair| pair[1] < pair[0]));
        assert_eq!(algorithm.initial_cost(), history.first().copied());
    }

    #[test]
    fn tiny_budget_selects_nothing() {
        let (algorithm, indexes) = run(ExtendConfig::new().budget_mb(1.0));
        assert!(indexes.is_empty());
        assert_eq!(algorithm.cost_history().len(), 1);
    }

    #[test]
    fn widens_indexes_when_allowed() {
        let (_, indexes) = run(ExtendConfig::new().budget_mb(1000.0).max_index_width(2));
        // Q2 filters on o_custkey and o_orderdate
        assert!(indexes.iter().any(|index| index.width() == 2));

        let (_, narrow) = run(ExtendConfig::new().budget_mb(1000.0).max_index_width(1));
        assert!(narrow.iter().all(Index::is_single_column));
    }

    #[test]
    fn high_threshold_rejects_marginal_gains() {
        let (_, indexes) = run(ExtendConfig::new().min_cost_improvement(1_000.0));
        assert!(indexes.is_empty());
    }
}
