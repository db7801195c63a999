//! What-if cost estimation.
//!
//! Selection algorithms never build indexes. They ask a cost oracle how
//! expensive the workload would be if a set of hypothetical indexes
//! existed, and how large each index would be on disk.
//!
//! The oracle is split in two:
//!
//! - [`WhatIfBackend`]: the external facility, typically a DBMS planner
//!   with hypothetical-index support. Answers per query.
//! - [`CostEvaluation`]: what the algorithms talk to. Sums per-query costs,
//!   caches them, memoizes sizes and counts calls.
//!
//! [`AnalyticBackend`] is a self-contained, statistics-driven backend for
//! offline runs and tests.

mod analytic;
mod evaluation;
mod size_cache;
mod stats;

pub use analytic::{AnalyticBackend, ColumnStatistics, Statistics, TableStatistics};
pub use evaluation::CostEvaluation;
pub use size_cache::SizeCache;
pub use stats::{EvaluationCounters, EvaluationStats};

use crate::error::{CoreError, CoreResult};
use crate::index::Index;
use crate::workload::Query;
use serde::{Deserialize, Serialize};

/// How workload costs are obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CostEstimation {
    /// Optimizer estimates under hypothetical indexes.
    #[default]
    #[serde(rename = "whatif")]
    WhatIf,
    /// Measured execution times.
    #[serde(rename = "actual_runtimes")]
    ActualRuntimes,
}

/// Result of explaining one query under a set of hypothetical indexes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryPlan {
    /// Estimated cost of the chosen plan.
    pub cost: f64,
    /// Indexes the plan actually reads.
    pub used_indexes: Vec<Index>,
}

/// External what-if facility.
///
/// Every call may be slow and may fail. Implementations own any retry or
/// timeout policy; callers in this crate never retry.
pub trait WhatIfBackend {
    /// Estimates the cost of `query` if exactly `indexes` existed.
    fn estimate_query_cost(&mut self, query: &Query, indexes: &[Index]) -> CoreResult<f64>;

    /// Plans `query` under `indexes` and reports which of them the plan uses.
    fn explain_query(&mut self, query: &Query, indexes: &[Index]) -> CoreResult<QueryPlan>;

    /// Estimates the on-disk size of `index` in bytes.
    fn estimate_index_size(&mut self, index: &Index) -> CoreResult<u64>;

    /// Measures the runtime of `query` with `indexes` materialized.
    ///
    /// Backends that cannot execute queries keep the default, which fails
    /// with [`CoreError::Unsupported`].
    fn measure_query_runtime(&mut self, query: &Query, indexes: &[Index]) -> CoreResult<f64> {
        let _ = (query, indexes);
        Err(CoreError::unsupported("measure_query_runtime"))
    }
}

impl<B: WhatIfBackend + ?Sized> WhatIfBackend for Box<B> {
    fn estimate_query_cost(&mut self, query: &Query, indexes: &[Index]) -> CoreResult<f64> {
        (**self).estimate_query_cost(query, indexes)
    }

    fn explain_query(&mut self, query: &Query, indexes: &[Index]) -> CoreResult<QueryPlan> {
        (**self).explain_query(query, indexes)
    }

    fn estimate_index_size(&mut self, index: &Index) -> CoreResult<u64> {
        (**self).estimate_index_size(index)
    }

    fn measure_query_runtime(&mut self, query: &Query, indexes: &[Index]) -> CoreResult<f64> {
        (**self).measure_query_runtime(query, indexes)
    }
}
