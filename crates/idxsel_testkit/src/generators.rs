//! Property-based test generators using proptest.
//!
//! Provides strategies for generating indexes, workloads and scripted
//! backends that maintain the required invariants.

use crate::backend::ScriptedBackend;
use idxsel_core::{Column, Index, Query, QueryId, Workload};
use proptest::prelude::*;
use proptest::sample::subsequence;

/// Table used by the generated workloads.
pub const TABLE: &str = "t";

/// Column names `c0..c{count}` of [`TABLE`].
pub fn column_pool(count: usize) -> Vec<Column> {
    (0..count).map(|i| Column::new(TABLE, format!("c{i}"))).collect()
}

/// Strategy for a valid index over up to `max_width` columns of a pool of
/// `pool` columns, in random order.
pub fn index_strategy(pool: usize, max_width: usize) -> impl Strategy<Value = Index> {
    let columns = column_pool(pool);
    let max_width = max_width.clamp(1, pool);
    subsequence(columns, 1..=max_width)
        .prop_shuffle()
        .prop_map(|columns| Index::new(columns).expect("distinct columns of one table"))
}

/// Strategy for a workload of 1 to `max_queries` queries, each referencing
/// a non-empty subset of a pool of `pool` columns.
pub fn workload_strategy(pool: usize, max_queries: usize) -> impl Strategy<Value = Workload> {
    let columns = column_pool(pool);
    prop::collection::vec(subsequence(columns, 1..=pool), 1..=max_queries).prop_map(|queries| {
        Workload::new(
            queries
                .into_iter()
                .enumerate()
                .map(|(i, columns)| {
                    Query::new(QueryId::new(i as u32 + 1), format!("Q{}", i + 1), columns)
                })
                .collect(),
        )
    })
}

/// Strategy for a scripted backend with random per-column benefits over a
/// pool of `pool` columns. Benefits stay below the default base cost.
pub fn scripted_backend_strategy(pool: usize) -> impl Strategy<Value = ScriptedBackend> {
    prop::collection::vec(0.0f64..300.0, pool).prop_map(move |benefits| {
        column_pool(pool)
            .into_iter()
            .zip(benefits)
            .fold(ScriptedBackend::new(), |backend, (column, benefit)| {
                backend.with_column_benefit(column, benefit)
            })
    })
}

/// Strategy for a storage budget in megabytes, between one and `max`
/// default-sized columns.
pub fn budget_mb_strategy(max: u32) -> impl Strategy<Value = f64> {
    (1..=max.max(1)).prop_map(f64::from)
}
