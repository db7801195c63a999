//! Deterministic what-if backends for tests.
//!
//! [`ScriptedBackend`] answers from explicit numbers instead of a cost
//! model, so tests can predict every decision an algorithm makes.
//! [`FailingBackend`] stands in for an unreachable database.

use idxsel_core::{Column, CoreError, CoreResult, Index, Query, QueryId, QueryPlan, WhatIfBackend};
use std::collections::HashMap;

/// Number of backend calls a [`ScriptedBackend`] has answered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendCalls {
    /// `estimate_query_cost` calls.
    pub cost: usize,
    /// `explain_query` calls.
    pub explain: usize,
    /// `estimate_index_size` calls.
    pub size: usize,
}

/// A backend whose answers are scripted per query, column and index.
///
/// The cost of a query is its base cost minus the benefit of the single
/// best usable index. An index is usable when the query references its
/// leading column. Its benefit is either scripted explicitly or the sum of
/// the column benefits along the leading columns the query references.
/// Sizes are scripted explicitly or `width * column_bytes`.
#[derive(Debug, Clone)]
pub struct ScriptedBackend {
    default_base_cost: f64,
    base_costs: HashMap<QueryId, f64>,
    column_benefits: HashMap<Column, f64>,
    index_benefits: HashMap<Index, f64>,
    column_bytes: u64,
    sizes: HashMap<Index, u64>,
    calls: BackendCalls,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedBackend {
    /// Base cost of a query without any index.
    pub const DEFAULT_BASE_COST: f64 = 1_000.0;

    /// Bytes per index column (1 MB).
    pub const DEFAULT_COLUMN_BYTES: u64 = 1_000_000;

    /// Creates a backend where no index helps.
    pub fn new() -> Self {
        Self {
            default_base_cost: Self::DEFAULT_BASE_COST,
            base_costs: HashMap::new(),
            column_benefits: HashMap::new(),
            index_benefits: HashMap::new(),
            column_bytes: Self::DEFAULT_COLUMN_BYTES,
            sizes: HashMap::new(),
            calls: BackendCalls::default(),
        }
    }

    /// Sets the base cost of one query.
    #[must_use]
    pub fn with_base_cost(mut self, query: QueryId, cost: f64) -> Self {
        self.base_costs.insert(query, cost);
        self
    }

    /// Sets the benefit an index gains from having `column` in its leading run.
    #[must_use]
    pub fn with_column_benefit(mut self, column: Column, benefit: f64) -> Self {
        self.column_benefits.insert(column, benefit);
        self
    }

    /// Overrides the benefit of one index.
    #[must_use]
    pub fn with_index_benefit(mut self, index: Index, benefit: f64) -> Self {
        self.index_benefits.insert(index, benefit);
        self
    }

    /// Sets the bytes per column used for unscripted sizes.
    #[must_use]
    pub fn with_column_bytes(mut self, bytes: u64) -> Self {
        self.column_bytes = bytes;
        self
    }

    /// Overrides the size of one index.
    #[must_use]
    pub fn with_size(mut self, index: Index, bytes: u64) -> Self {
        self.sizes.insert(index, bytes);
        self
    }

    /// Returns the number of calls answered so far.
    pub fn calls(&self) -> BackendCalls {
        self.calls
    }

    /// Returns the size this backend reports for `index`.
    pub fn size(&self, index: &Index) -> u64 {
        self.sizes
            .get(index)
            .copied()
            .unwrap_or(self.column_bytes * index.width() as u64)
    }

    fn benefit(&self, query: &Query, index: &Index) -> f64 {
        if !index.columns().first().is_some_and(|c| query.references(c)) {
            return 0.0;
        }
        if let Some(&benefit) = self.index_benefits.get(index) {
            return benefit;
        }
        index
            .columns()
            .iter()
            .take_while(|column| query.references(column))
            .map(|column| self.column_benefits.get(column).copied().unwrap_or(0.0))
            .sum()
    }

    fn plan(&self, query: &Query, indexes: &[Index]) -> QueryPlan {
        let base = self
            .base_costs
            .get(&query.id())
            .copied()
            .unwrap_or(self.default_base_cost);

        let mut best: Option<(&Index, f64)> = None;
        for index in indexes {
            let benefit = self.benefit(query, index);
            if benefit > 0.0 && best.map_or(true, |(_, b)| benefit > b) {
                best = Some((index, benefit));
            }
        }

        match best {
            Some((index, benefit)) => QueryPlan {
                cost: (base - benefit).max(0.0),
                used_indexes: vec![index.clone()],
            },
            None => QueryPlan {
                cost: base,
                used_indexes: Vec::new(),
            },
        }
    }
}

impl WhatIfBackend for ScriptedBackend {
    fn estimate_query_cost(&mut self, query: &Query, indexes: &[Index]) -> CoreResult<f64> {
        self.calls.cost += 1;
        Ok(self.plan(query, indexes).cost)
    }

    fn explain_query(&mut self, query: &Query, indexes: &[Index]) -> CoreResult<QueryPlan> {
        self.calls.explain += 1;
        Ok(self.plan(query, indexes))
    }

    fn estimate_index_size(&mut self, index: &Index) -> CoreResult<u64> {
        self.calls.size += 1;
        Ok(self.size(index))
    }
}

/// A backend that fails every request, like an unreachable database.
#[derive(Debug, Clone, Default)]
pub struct FailingBackend {
    attempts: usize,
}

impl FailingBackend {
    /// Creates the backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of requests received.
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    fn fail(&mut self) -> CoreError {
        self.attempts += 1;
        CoreError::oracle("connection refused")
    }
}

impl WhatIfBackend for FailingBackend {
    fn estimate_query_cost(&mut self, _query: &Query, _indexes: &[Index]) -> CoreResult<f64> {
        Err(self.fail())
    }

    fn explain_query(&mut self, _query: &Query, _indexes: &[Index]) -> CoreResult<QueryPlan> {
        Err(self.fail())
    }

    fn estimate_index_size(&mut self, _index: &Index) -> CoreResult<u64> {
        Err(self.fail())
    }
}
