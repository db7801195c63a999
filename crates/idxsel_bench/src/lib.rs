//! Benchmark utilities.
//!
//! Synthetic schemas are generated deterministically so runs stay
//! comparable across machines.

use idxsel_core::{Column, Query, QueryId, Statistics, TableStatistics, Workload};

/// Statistics for `tables` tables `t0..` with `columns` columns `c0..` each.
///
/// Column `ci` has `rows / (i + 1)^2` distinct values, so lower-numbered
/// columns are more selective.
pub fn synthetic_statistics(tables: usize, columns: usize, rows: u64) -> Statistics {
    (0..tables).fold(Statistics::new(), |statistics, t| {
        let table = (0..columns).fold(TableStatistics::new(rows), |table, c| {
            let divisor = ((c + 1) * (c + 1)) as u64;
            table.with_column(format!("c{c}"), (rows / divisor).max(1), 8)
        });
        statistics.with_table(format!("t{t}"), table)
    })
}

/// A workload of `queries` queries over the synthetic schema.
///
/// Query `q` touches table `q % tables` and references `width` columns
/// starting at column `q % columns`, wrapping around.
pub fn synthetic_workload(tables: usize, columns: usize, queries: usize, width: usize) -> Workload {
    let width = width.clamp(1, columns);
    Workload::new(
        (0..queries)
            .map(|q| {
                let table = format!("t{}", q % tables);
                let referenced = (0..width)
                    .map(|offset| Column::new(table.clone(), format!("c{}", (q + offset) % columns)));
                Query::new(QueryId::new(q as u32 + 1), format!("Q{}", q + 1), referenced)
            })
            .collect(),
    )
}

/// A single query referencing `columns` columns of one table.
pub fn wide_query(columns: usize) -> Query {
    Query::new(
        QueryId::new(1),
        "wide",
        (0..columns).map(|c| Column::new("t0", format!("c{c}"))),
    )
}
