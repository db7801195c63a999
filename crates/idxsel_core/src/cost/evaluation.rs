//! Caching cost evaluation on top of a what-if backend.

use crate::cost::size_cache::SizeCache;
use crate::cost::stats::{EvaluationCounters, EvaluationStats};
use crate::cost::{CostEstimation, WhatIfBackend};
use crate::error::CoreResult;
use crate::index::{Index, IndexSet};
use crate::workload::{Query, Workload};
use std::collections::HashMap;
use tracing::{debug, trace};

/// The cost oracle consumed by the selection algorithms.
///
/// Workload cost is the sum of per-query costs. For each query only the
/// *relevant* indexes, those sharing at least one column with the query,
/// reach the backend, and the answer is cached per `(query, relevant
/// indexes)`. Many configurations explored by a search differ only in
/// indexes a given query cannot use, so most lookups hit the cache.
///
/// Cached costs are keyed by the whole query, not its ID, so one instance
/// can evaluate several workloads. Measured runtimes are never cached.
pub struct CostEvaluation<B> {
    backend: B,
    cost_estimation: CostEstimation,
    cost_cache: HashMap<Query, HashMap<Vec<Index>, f64>>,
    sizes: SizeCache,
    counters: EvaluationCounters,
}

impl<B: WhatIfBackend> CostEvaluation<B> {
    /// Creates an evaluation with a private size cache.
    pub fn new(backend: B) -> Self {
        Self::with_size_cache(backend, SizeCache::new())
    }

    /// Creates an evaluation that records sizes in `sizes`.
    pub fn with_size_cache(backend: B, sizes: SizeCache) -> Self {
        Self {
            backend,
            cost_estimation: CostEstimation::default(),
            cost_cache: HashMap::new(),
            sizes,
            counters: EvaluationCounters::new(),
        }
    }

    /// Sets how costs are obtained.
    #[must_use]
    pub fn with_cost_estimation(mut self, cost_estimation: CostEstimation) -> Self {
        self.cost_estimation = cost_estimation;
        self
    }

    pub(crate) fn set_cost_estimation(&mut self, cost_estimation: CostEstimation) {
        self.cost_estimation = cost_estimation;
    }

    /// Returns how costs are obtained.
    pub fn cost_estimation(&self) -> CostEstimation {
        self.cost_estimation
    }

    /// Returns the backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Returns the backend mutably.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Returns the shared size cache.
    pub fn size_cache(&self) -> &SizeCache {
        &self.sizes
    }

    /// Returns a snapshot of the call counters.
    pub fn stats(&self) -> EvaluationStats {
        self.counters.snapshot()
    }

    /// Estimates the cost of running `workload` with `indexes` materialized.
    ///
    /// With `track_size`, every index of the configuration that has no
    /// size yet is sized first.
    pub fn estimate_cost<'a, I>(
        &mut self,
        workload: &Workload,
        indexes: I,
        track_size: bool,
    ) -> CoreResult<f64>
    where
        I: IntoIterator<Item = &'a Index>,
    {
        let indexes: Vec<&Index> = indexes.into_iter().collect();
        if track_size {
            for index in &indexes {
                self.estimate_size(index)?;
            }
        }

        let mut total = 0.0;
        for query in workload.queries() {
            let mut relevant: Vec<Index> = indexes
                .iter()
                .filter(|index| query.is_relevant(index))
                .map(|index| (*index).clone())
                .collect();
            relevant.sort();
            relevant.dedup();
            total += self.query_cost(query, relevant)?;
        }
        Ok(total)
    }

    fn query_cost(&mut self, query: &Query, relevant: Vec<Index>) -> CoreResult<f64> {
        if self.cost_estimation == CostEstimation::ActualRuntimes {
            self.counters.record_cost_request(false);
            return self.backend.measure_query_runtime(query, &relevant);
        }

        let cached = self
            .cost_cache
            .get(query)
            .and_then(|costs| costs.get(&relevant));
        if let Some(&cost) = cached {
            self.counters.record_cost_request(true);
            return Ok(cost);
        }

        self.counters.record_cost_request(false);
        let cost = self.backend.estimate_query_cost(query, &relevant)?;
        trace!("{} with {} relevant indexes: cost {:.2}", query, relevant.len(), cost);
        self.cost_cache
            .entry(query.clone())
            .or_default()
            .insert(relevant, cost);
        Ok(cost)
    }

    /// Returns the size of `index` in bytes, estimating it on first use.
    pub fn estimate_size(&mut self, index: &Index) -> CoreResult<u64> {
        let backend = &mut self.backend;
        let (size, cached) = self
            .sizes
            .get_or_try_insert_with(index, || backend.estimate_index_size(index))?;
        if !cached {
            self.counters.record_size_request();
            trace!("estimated size of {}: {} bytes", index, size);
        }
        Ok(size)
    }

    /// Returns the size of `index` if it was estimated before.
    pub fn size_of(&self, index: &Index) -> Option<u64> {
        self.sizes.get(index)
    }

    /// Returns the total size of `indexes`, estimating missing sizes.
    pub fn total_size<'a, I>(&mut self, indexes: I) -> CoreResult<u64>
    where
        I: IntoIterator<Item = &'a Index>,
    {
        let mut total = 0;
        for index in indexes {
            total += self.estimate_size(index)?;
        }
        Ok(total)
    }

    /// Returns the candidates that at least one query's plan actually uses.
    ///
    /// Each query is explained under its own candidate list
    /// (`candidates_per_query` follows workload order). Utilized indexes
    /// are sized.
    pub fn utilized_indexes(
        &mut self,
        workload: &Workload,
        candidates_per_query: &[Vec<Index>],
    ) -> CoreResult<IndexSet> {
        let mut utilized = IndexSet::new();
        for (query, candidates) in workload.queries().iter().zip(candidates_per_query) {
            self.counters.record_plan_request();
            let plan = self.backend.explain_query(query, candidates)?;
            let used = plan
                .used_indexes
                .into_iter()
                .filter(|index| candidates.contains(index));
            utilized.extend(used);
        }

        for index in &utilized {
            self.estimate_size(index)?;
        }

        let candidate_count: usize = candidates_per_query.iter().map(Vec::len).sum();
        debug!(
            "{} of {} candidates utilized by {} queries",
            utilized.len(),
            candidate_count,
            workload.len()
        );
        Ok(utilized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::QueryPlan;
    use crate::error::CoreError;
    use crate::cost::{AnalyticBackend, Statistics, TableStatistics};
    use crate::index::Column;
    use crate::workload::{Query, QueryId};

    /// Cost 100 per query, minus 10 per relevant index; size 1000 per column.
    #[derive(Default)]
    struct CountingBackend {
        cost_calls: usize,
        size_calls: usize,
    }

    impl WhatIfBackend for CountingBackend {
        fn estimate_query_cost(&mut self, _query: &Query, indexes: &[Index]) -> CoreResult<f64> {
            self.cost_calls += 1;
            Ok(100.0 - 10.0 * indexes.len() as f64)
        }

        fn explain_query(&mut self, _query: &Query, indexes: &[Index]) -> CoreResult<QueryPlan> {
            Ok(QueryPlan {
                cost: 0.0,
                used_indexes: indexes.iter().filter(|i| i.is_single_column()).cloned().collect(),
            })
        }

        fn estimate_index_size(&mut self, index: &Index) -> CoreResult<u64> {
            self.size_calls += 1;
            Ok(1000 * index.width() as u64)
        }
    }

    fn col(name: &str) -> Column {
        Column::new("t", name)
    }

    fn workload() -> Workload {
        Workload::new(vec![
            Query::new(QueryId::new(1), "", [col("a")]),
            Query::new(QueryId::new(2), "", [col("b")]),
        ])
    }

    #[test]
    fn sums_per_query_costs_over_relevant_indexes() {
        let mut evaluation = CostEvaluation::new(CountingBackend::default());
        let a = Index::single(col("a"));
        let c = Index::single(col("c"));

        // only Q1 sees I(a); I(c) is irrelevant to both
        let cost = evaluation.estimate_cost(&workload(), [&a, &c], false).unwrap();
        assert_eq!(cost, 90.0 + 100.0);
    }

    #[test]
    fn caches_by_relevant_indexes() {
        let mut evaluation = CostEvaluation::new(CountingBackend::default());
        let a = Index::single(col("a"));
        let c = Index::single(col("c"));

        evaluation.estimate_cost(&workload(), [&a], false).unwrap();
        // adding an irrelevant index does not change any cache key
        evaluation.estimate_cost(&workload(), [&a, &c], false).unwrap();

        assert_eq!(evaluation.backend().cost_calls, 2);
        let stats = evaluation.stats();
        assert_eq!(stats.cost_requests, 4);
        assert_eq!(stats.cache_hits, 2);
    }

    #[test]
    fn sizes_are_memoized() {
        let mut evaluation = CostEvaluation::new(CountingBackend::default());
        let ab = Index::new(vec![col("a"), col("b")]).unwrap();

        assert_eq!(evaluation.size_of(&ab), None);
        evaluation.estimate_cost(&workload(), [&ab], true).unwrap();
        assert_eq!(evaluation.size_of(&ab), Some(2000));
        assert_eq!(evaluation.estimate_size(&ab).unwrap(), 2000);
        assert_eq!(evaluation.total_size([&ab, &ab]).unwrap(), 4000);
        assert_eq!(evaluation.backend().size_calls, 1);
        assert_eq!(evaluation.stats().size_requests, 1);
    }

    #[test]
    fn shared_size_cache_spans_evaluations() {
        let sizes = SizeCache::new();
        let a = Index::single(col("a"));

        let mut first = CostEvaluation::with_size_cache(CountingBackend::default(), sizes.clone());
        first.estimate_size(&a).unwrap();

        let second = CostEvaluation::with_size_cache(CountingBackend::default(), sizes);
        assert_eq!(second.size_of(&a), Some(1000));
    }

    #[test]
    fn utilized_indexes_come_from_plans() {
        let mut evaluation = CostEvaluation::new(CountingBackend::default());
        let a = Index::single(col("a"));
        let ab = Index::new(vec![col("a"), col("b")]).unwrap();
        let b = Index::single(col("b"));

        let utilized = evaluation
            .utilized_indexes(&workload(), &[vec![a.clone(), ab.clone()], vec![b.clone()]])
            .unwrap();
        assert_eq!(utilized, IndexSet::from([a.clone(), b]));
        assert_eq!(evaluation.size_of(&a), Some(1000));
        assert_eq!(evaluation.size_of(&ab), None);
        assert_eq!(evaluation.stats().plan_requests, 2);
    }

    #[test]
    fn queries_sharing_an_id_are_costed_separately() {
        let statistics = Statistics::new()
            .with_table("orders", TableStatistics::new(150_000).with_column("o_custkey", 10_000, 8))
            .with_table(
                "lineitem",
                TableStatistics::new(600_000).with_column("l_partkey", 20_000, 8),
            );
        let orders = Query::new(QueryId::new(1), "", [Column::new("orders", "o_custkey")]);
        let lineitem = Query::new(QueryId::new(1), "", [Column::new("lineitem", "l_partkey")]);
        let only = |query: &Query| Workload::new(vec![query.clone()]);

        let mut fresh = CostEvaluation::new(AnalyticBackend::new(statistics.clone()));
        let orders_cost = fresh.estimate_cost(&only(&orders), std::iter::empty(), false).unwrap();
        let mut fresh = CostEvaluation::new(AnalyticBackend::new(statistics.clone()));
        let lineitem_cost = fresh
            .estimate_cost(&only(&lineitem), std::iter::empty(), false)
            .unwrap();
        assert_ne!(orders_cost, lineitem_cost);

        let mut evaluation = CostEvaluation::new(AnalyticBackend::new(statistics));
        let both = Workload::new(vec![orders.clone(), lineitem.clone()]);
        let cost = evaluation.estimate_cost(&both, std::iter::empty(), false).unwrap();
        assert_eq!(cost, orders_cost + lineitem_cost);
        assert_eq!(evaluation.stats().cache_hits, 0);

        // a later workload on the same instance reuses the right entry
        let cost = evaluation
            .estimate_cost(&only(&lineitem), std::iter::empty(), false)
            .unwrap();
        assert_eq!(cost, lineitem_cost);
        assert_eq!(evaluation.stats().cache_hits, 1);
    }

    #[test]
    fn runtimes_need_backend_support() {
        let mut evaluation = CostEvaluation::new(CountingBackend::default())
            .with_cost_estimation(CostEstimation::ActualRuntimes);
        let err = evaluation
            .estimate_cost(&workload(), std::iter::empty(), false)
            .unwrap_err();
        assert!(matches!(err, CoreError::Unsupported { .. }));
    }
}
