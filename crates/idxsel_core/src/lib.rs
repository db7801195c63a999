//! # idxsel Core
//!
//! Index selection engine: given a workload and a storage budget, recommend
//! a set of secondary indexes.
//!
//! This crate provides:
//! - The index algebra (prefixes, merge, split, append)
//! - Syntactic candidate generation per query
//! - A caching what-if cost evaluation over a pluggable backend
//! - Three greedy selection algorithms: drop heuristic, extend, relaxation
//!
//! ## Key Invariants
//!
//! - Every index has at least one column, no column twice, one table
//! - Indexes are immutable; sizes live in a side cache keyed by index value
//! - Configurations iterate in canonical order, so runs are reproducible
//! - Extend and relaxation results never exceed the storage budget
//!
//! ## Usage
//!
//! ```
//! use idxsel_core::{
//!     AnalyticBackend, Column, CostEvaluation, ExtendAlgorithm, ExtendConfig, Query, QueryId,
//!     SelectionAlgorithm, Statistics, TableStatistics, Workload,
//! };
//!
//! let statistics = Statistics::new().with_table(
//!     "orders",
//!     TableStatistics::new(1_000_000).with_column("o_custkey", 100_000, 8),
//! );
//! let workload = Workload::new(vec![Query::new(
//!     QueryId::new(1),
//!     "SELECT * FROM orders WHERE o_custkey = 42",
//!     [Column::new("orders", "o_custkey")],
//! )]);
//!
//! let evaluation = CostEvaluation::new(AnalyticBackend::new(statistics));
//! let mut extend = ExtendAlgorithm::new(evaluation, ExtendConfig::new().budget_mb(100.0)).unwrap();
//! let indexes = extend.best_indexes(&workload).unwrap();
//! assert_eq!(indexes.len(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod algorithm;
pub mod candidate;
pub mod config;
pub mod cost;
mod error;
pub mod index;
pub mod workload;

pub use algorithm::{
    build_algorithm, DropHeuristicAlgorithm, ExtendAlgorithm, RelaxationAlgorithm,
    RelaxedConfiguration, SelectionAlgorithm,
};
pub use candidate::{candidates_per_query, syntactically_relevant_indexes, CandidateGenerator};
pub use config::{
    AlgorithmConfig, DropHeuristicConfig, ExtendConfig, RelaxationConfig, Transformation,
};
pub use cost::{
    AnalyticBackend, ColumnStatistics, CostEstimation, CostEvaluation, EvaluationStats, QueryPlan,
    SizeCache, Statistics, TableStatistics, WhatIfBackend,
};
pub use error::{CoreError, CoreResult};
pub use index::{indexes_by_table, Column, Index, IndexSet};
pub use workload::{Query, QueryId, Workload};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
