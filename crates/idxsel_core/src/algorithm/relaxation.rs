//! Relaxation: shrink the per-query optimal configuration into the budget.

use crate::algorithm::SelectionAlgorithm;
use crate::candidate::{candidates_per_query, syntactically_relevant_indexes};
use crate::config::{RelaxationConfig, Transformation};
use crate::cost::{CostEvaluation, EvaluationStats, WhatIfBackend};
use crate::error::{CoreError, CoreResult};
use crate::index::{indexes_by_table, Index, IndexSet};
use crate::workload::Workload;
use tracing::{debug, info, trace};

/// One configuration derived from the current one by a single transformation.
#[derive(Debug, Clone, PartialEq)]
pub struct RelaxedConfiguration {
    /// The transformation that produced it.
    pub transformation: Transformation,
    /// The relaxed configuration.
    pub indexes: IndexSet,
    /// Bytes freed relative to the current configuration. May be zero or
    /// negative; such relaxations are never adopted.
    pub storage_savings: i64,
}

/// Top-down search from the per-query optimal configuration.
///
/// Starts from every syntactically relevant candidate that some query's
/// optimal plan uses, then applies the cheapest transformation (lowest
/// cost increase per byte freed) until the configuration fits the budget.
/// Every adopted step frees a positive number of bytes, so the loop ends.
pub struct RelaxationAlgorithm<B> {
    evaluation: CostEvaluation<B>,
    config: RelaxationConfig,
    budget: u64,
    transformations: Vec<Transformation>,
    applied: Vec<Transformation>,
}

impl<B: WhatIfBackend> RelaxationAlgorithm<B> {
    /// Creates the algorithm.
    ///
    /// # Errors
    ///
    /// Fails if `config` does not validate.
    pub fn new(evaluation: CostEvaluation<B>, config: RelaxationConfig) -> CoreResult<Self> {
        config.validate()?;
        Ok(Self {
            evaluation,
            budget: config.budget_bytes(),
            transformations: config.transformations(),
            config,
            applied: Vec::new(),
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &RelaxationConfig {
        &self.config
    }

    /// Returns the cost evaluation.
    pub fn evaluation(&self) -> &CostEvaluation<B> {
        &self.evaluation
    }

    /// Transformations adopted during the last run, in order.
    pub fn applied_transformations(&self) -> &[Transformation] {
        &self.applied
    }

    /// Enumerates every configuration `transformation` derives from `cp`.
    ///
    /// Newly created indexes are sized before savings are computed.
    pub fn relaxations(
        &mut self,
        cp: &IndexSet,
        transformation: Transformation,
    ) -> CoreResult<Vec<RelaxedConfiguration>> {
        let mut relaxed = Vec::new();
        match transformation {
            Transformation::Prefixing => {
                for index in cp {
                    for prefix in index.prefixes() {
                        let mut indexes = cp.clone();
                        indexes.remove(index);
                        let mut savings = self.size(index)?;
                        // an already present prefix adds nothing back
                        if !indexes.contains(&prefix) {
                            savings -= self.size(&prefix)?;
                            indexes.insert(prefix);
                        }
                        relaxed.push(RelaxedConfiguration {
                            transformation,
                            indexes,
                            storage_savings: savings,
                        });
                    }
                }
            }
            Transformation::Removal => {
                for index in cp {
                    let mut indexes = cp.clone();
                    indexes.remove(index);
                    relaxed.push(RelaxedConfiguration {
                        transformation,
                        indexes,
                        storage_savings: self.size(index)?,
                    });
                }
            }
            Transformation::Merging => {
                for (_, table_indexes) in indexes_by_table(cp) {
                    for (&first, &second) in ordered_pairs(&table_indexes) {
                        let merged = first.merge(second)?.truncated(self.config.max_index_width);
                        let mut indexes = cp.clone();
                        indexes.remove(first);
                        indexes.remove(second);
                        let mut savings = self.size(first)? + self.size(second)?;
                        if !indexes.contains(&merged) {
                            savings -= self.size(&merged)?;
                            indexes.insert(merged);
                        }
                        relaxed.push(RelaxedConfiguration {
                            transformation,
                            indexes,
                            storage_savings: savings,
                        });
                    }
                }
            }
            Transformation::Splitting => {
                for (_, table_indexes) in indexes_by_table(cp) {
                    for (&first, &second) in ordered_pairs(&table_indexes) {
                        let Some(pieces) = first.split(second) else {
                            continue;
                        };
                        let mut indexes = cp.clone();
                        indexes.remove(first);
                        indexes.remove(second);
                        let mut savings = self.size(first)? + self.size(second)?;
                        for piece in pieces {
                            if !indexes.contains(&piece) {
                                savings -= self.size(&piece)?;
                                indexes.insert(piece);
                            }
                        }
                        relaxed.push(RelaxedConfiguration {
                            transformation,
                            indexes,
                            storage_savings: savings,
                        });
                    }
                }
            }
        }
        Ok(relaxed)
    }

    fn size(&mut self, index: &Index) -> CoreResult<i64> {
        let size = self.evaluation.estimate_size(index)?;
        i64::try_from(size)
            .map_err(|_| CoreError::oracle(format!("size of {index} out of range: {size}")))
    }
}

/// All ordered pairs of distinct elements, in slice order.
fn ordered_pairs<'a, T>(items: &'a [T]) -> impl Iterator<Item = (&'a T, &'a T)> + 'a {
    items.iter().enumerate().flat_map(move |(i, first)| {
        items
            .iter()
            .enumerate()
            .filter(move |(j, _)| *j != i)
            .map(move |(_, second)| (first, second))
    })
}

impl<B: WhatIfBackend> SelectionAlgorithm for RelaxationAlgorithm<B> {
    fn name(&self) -> &'static str {
        "relaxation"
    }

    fn calculate_best_indexes(&mut self, workload: &Workload) -> CoreResult<Vec<Index>> {
        debug!("Parameters: {:?}", self.config);
        self.applied.clear();

        let candidates = candidates_per_query(
            workload,
            self.config.max_index_width,
            syntactically_relevant_indexes,
        );
        let mut cp = self.evaluation.utilized_indexes(workload, &candidates)?;
        let mut cp_size = self.evaluation.total_size(&cp)?;
        let mut cp_cost = self.evaluation.estimate_cost(workload, &cp, true)?;
        info!(
            "Initial configuration: {} indexes, {} bytes, cost {:.2}",
            cp.len(),
            cp_size,
            cp_cost
        );

        while cp_size > self.budget {
            debug!("Size of current configuration: {}. Budget: {}", cp_size, self.budget);
            let excess = cp_size - self.budget;

            let mut best: Option<(f64, RelaxedConfiguration, f64)> = None;
            for transformation in self.transformations.clone() {
                for relaxed in self.relaxations(&cp, transformation)? {
                    if relaxed.storage_savings <= 0 {
                        continue;
                    }
                    let savings = relaxed.storage_savings as f64;
                    let relaxed_cost =
                        self.evaluation.estimate_cost(workload, &relaxed.indexes, true)?;
                    let cost_increase = relaxed_cost - cp_cost;

                    let penalty = if cost_increase < 0.0 {
                        cost_increase * savings
                    } else {
                        cost_increase / savings.min(excess as f64)
                    };
                    trace!(
                        "{}: savings {} bytes, cost increase {:.2}, penalty {:.6}",
                        transformation,
                        relaxed.storage_savings,
                        cost_increase,
                        penalty
                    );

                    if best.as_ref().map_or(true, |(lowest, _, _)| penalty < *lowest) {
                        best = Some((penalty, relaxed, relaxed_cost));
                    }
                }
            }

            let Some((penalty, relaxed, relaxed_cost)) = best else {
                return Err(CoreError::BudgetUnreachable {
                    size: cp_size,
                    budget: self.budget,
                });
            };

            let savings = relaxed.storage_savings.unsigned_abs();
            cp_size = cp_size.saturating_sub(savings);
            cp_cost = relaxed_cost;
            cp = relaxed.indexes;
            self.applied.push(relaxed.transformation);
            debug!(
                "Applied {} (penalty {:.6}): {} indexes, {} bytes, cost {:.2}",
                relaxed.transformation,
                penalty,
                cp.len(),
                cp_size,
                cp_cost
            );
        }

        info!(
            "Relaxed in {} steps to {} indexes, {} bytes",
            self.applied.len(),
            cp.len(),
            cp_size
        );
        Ok(cp.into_iter().collect())
    }

    fn evaluation_stats(&self) -> EvaluationStats {
        self.evaluation.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::test_support::*;
    use crate::config::{bytes_to_mb, mb_to_bytes};
    use crate::cost::AnalyticBackend;

    fn algorithm(config: RelaxationConfig) -> RelaxationAlgorithm<AnalyticBackend> {
        RelaxationAlgorithm::new(evaluation(), config).unwrap()
    }

    fn initial_size() -> u64 {
        let mut unconstrained = algorithm(RelaxationConfig::new().budget_mb(1_000_000.0));
        let indexes = unconstrained.calculate_best_indexes(&workload()).unwrap();
        assert!(unconstrained.applied_transformations().is_empty());
        unconstrained.evaluation.total_size(&indexes).unwrap()
    }

    #[test]
    fn budget_equal_to_initial_size_relaxes_nothing() {
        let size = initial_size();
        let mut relaxation = algorithm(RelaxationConfig::new().budget_mb(bytes_to_mb(size)));
        let indexes = relaxation.calculate_best_indexes(&workload()).unwrap();

        assert!(relaxation.applied_transformations().is_empty());
        assert_eq!(relaxation.evaluation.total_size(&indexes).unwrap(), size);
    }

    #[test]
    fn relaxes_into_budget() {
        let size = initial_size();
        let budget_mb = bytes_to_mb(size / 2);
        let mut relaxation = algorithm(RelaxationConfig::new().budget_mb(budget_mb));
        let indexes = relaxation.calculate_best_indexes(&workload()).unwrap();

        assert!(!relaxation.applied_transformations().is_empty());
        assert!(relaxation.evaluation.total_size(&indexes).unwrap() <= mb_to_bytes(budget_mb));
        assert!(indexes.iter().all(|index| index.width() <= 2));
    }

    #[test]
    fn removal_only_reaches_budget() {
        let size = initial_size();
        let config = RelaxationConfig::new()
            .budget_mb(bytes_to_mb(size / 2))
            .allowed_transformations([Transformation::Removal]);
        let mut relaxation = algorithm(config);
        relaxation.calculate_best_indexes(&workload()).unwrap();
        assert!(relaxation
            .applied_transformations()
            .iter()
            .all(|t| *t == Transformation::Removal));
    }

    #[test]
    fn no_transformations_cannot_relax() {
        let config = RelaxationConfig::new()
            .budget_mb(1.0)
            .allowed_transformations(Vec::new());
        let err = algorithm(config)
            .calculate_best_indexes(&workload())
            .unwrap_err();
        assert!(matches!(err, CoreError::BudgetUnreachable { .. }));
    }

    #[test]
    fn prefix_already_present_saves_full_size() {
        let mut relaxation = algorithm(RelaxationConfig::new());
        let wide = idx(&["o_custkey", "o_orderdate"]);
        let prefix = idx(&["o_custkey"]);
        let cp = IndexSet::from([wide.clone(), prefix.clone()]);

        let relaxed = relaxation
            .relaxations(&cp, Transformation::Prefixing)
            .unwrap();
        assert_eq!(relaxed.len(), 1);
        assert_eq!(relaxed[0].indexes, IndexSet::from([prefix]));
        let wide_size = relaxation.evaluation.size_of(&wide).unwrap();
        assert_eq!(relaxed[0].storage_savings, wide_size as i64);
    }

    #[test]
    fn shared_prefix_is_counted_per_source_index() {
        // both wide indexes reach I(o_custkey); each relaxation is scored on its own
        let mut relaxation = algorithm(RelaxationConfig::new());
        let first = idx(&["o_custkey", "o_orderdate"]);
        let second = idx(&["o_custkey", "o_status"]);
        let cp = IndexSet::from([first.clone(), second.clone()]);

        let relaxed = relaxation
            .relaxations(&cp, Transformation::Prefixing)
            .unwrap();
        assert_eq!(relaxed.len(), 2);
        let prefix_size = relaxation.evaluation.size_of(&idx(&["o_custkey"])).unwrap() as i64;
        for (relaxed, source) in relaxed.iter().zip([&first, &second]) {
            let source_size = relaxation.evaluation.size_of(source).unwrap() as i64;
            assert_eq!(relaxed.storage_savings, source_size - prefix_size);
        }
    }

    #[test]
    fn merging_truncates_to_max_width() {
        let ab = idx(&["o_custkey", "o_orderdate"]);
        let ac = idx(&["o_custkey", "o_status"]);
        let cp = IndexSet::from([ab.clone(), ac.clone()]);

        let mut narrow = algorithm(RelaxationConfig::new().max_index_width(2));
        let relaxed = narrow.relaxations(&cp, Transformation::Merging).unwrap();
        assert_eq!(relaxed.len(), 2);
        assert_eq!(relaxed[0].indexes, IndexSet::from([ab.clone()]));

        let mut wide = algorithm(RelaxationConfig::new().max_index_width(3));
        let relaxed = wide.relaxations(&cp, Transformation::Merging).unwrap();
        assert_eq!(
            relaxed[0].indexes,
            IndexSet::from([idx(&["o_custkey", "o_orderdate", "o_status"])])
        );
    }

    #[test]
    fn splitting_shares_common_prefix() {
        let ab = idx(&["o_custkey", "o_orderdate"]);
        let ac = idx(&["o_custkey", "o_status"]);
        let cp = IndexSet::from([ab.clone(), ac.clone()]);

        let mut relaxation = algorithm(RelaxationConfig::new());
        let relaxed = relaxation
            .relaxations(&cp, Transformation::Splitting)
            .unwrap();
        assert_eq!(relaxed.len(), 2);
        let pieces = IndexSet::from([idx(&["o_custkey"]), idx(&["o_orderdate"]), idx(&["o_status"])]);
        assert_eq!(relaxed[0].indexes, pieces);

        let size = |index: &Index| relaxation.evaluation.size_of(index).unwrap() as i64;
        let pieces_size: i64 = pieces.iter().map(size).sum();
        // every piece pays its own entry overhead, so splitting grows this pair
        assert_eq!(relaxed[0].storage_savings, size(&ab) + size(&ac) - pieces_size);
        assert!(relaxed[0].storage_savings < 0);
    }

    #[test]
    fn splitting_skips_pairs_without_common_prefix() {
        let cp = IndexSet::from([idx(&["o_custkey"]), idx(&["o_orderdate"])]);
        let mut relaxation = algorithm(RelaxationConfig::new());
        assert!(relaxation
            .relaxations(&cp, Transformation::Splitting)
            .unwrap()
            .is_empty());
    }
}
