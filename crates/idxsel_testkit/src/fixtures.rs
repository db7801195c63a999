//! Test fixtures: columns, indexes, statistics and workloads.
//!
//! The sample schema is a trimmed TPC-H: `lineitem`, `orders` and
//! `customer`, with statistics at scale factor 1.

use idxsel_core::{Column, Index, Query, QueryId, Statistics, TableStatistics, Workload};

/// Creates a column.
pub fn column(table: &str, name: &str) -> Column {
    Column::new(table, name)
}

/// Creates an index over columns of one table.
///
/// # Panics
///
/// Panics if `names` is empty or repeats a column.
pub fn index(table: &str, names: &[&str]) -> Index {
    Index::new(names.iter().map(|name| column(table, name)).collect())
        .expect("fixture index must be valid")
}

/// Creates a query over `(table, column)` pairs.
pub fn query(id: u32, columns: &[(&str, &str)]) -> Query {
    Query::new(
        QueryId::new(id),
        format!("Q{id}"),
        columns.iter().map(|(table, name)| column(table, name)),
    )
}

/// Creates a workload where every query touches one table.
pub fn single_table_workload(table: &str, queries: &[&[&str]]) -> Workload {
    Workload::new(
        queries
            .iter()
            .enumerate()
            .map(|(position, names)| {
                Query::new(
                    QueryId::new(position as u32 + 1),
                    format!("Q{}", position + 1),
                    names.iter().map(|name| column(table, name)),
                )
            })
            .collect(),
    )
}

/// Statistics for the sample schema.
pub fn tpch_statistics() -> Statistics {
    Statistics::new()
        .with_table(
            "lineitem",
            TableStatistics::new(6_000_000)
                .with_column("l_orderkey", 1_500_000, 8)
                .with_column("l_partkey", 200_000, 8)
                .with_column("l_suppkey", 10_000, 8)
                .with_column("l_quantity", 50, 8)
                .with_column("l_shipdate", 2_526, 4)
                .with_column("l_returnflag", 3, 1)
                .with_column("l_shipmode", 7, 10),
        )
        .with_table(
            "orders",
            TableStatistics::new(1_500_000)
                .with_column("o_orderkey", 1_500_000, 8)
                .with_column("o_custkey", 100_000, 8)
                .with_column("o_orderdate", 2_406, 4)
                .with_column("o_orderstatus", 3, 1)
                .with_column("o_orderpriority", 5, 15),
        )
        .with_table(
            "customer",
            TableStatistics::new(150_000)
                .with_column("c_custkey", 150_000, 8)
                .with_column("c_nationkey", 25, 4)
                .with_column("c_mktsegment", 5, 10),
        )
}

/// A small workload over the sample schema, with the indexable columns of
/// a few TPC-H queries.
pub fn tpch_workload() -> Workload {
    Workload::new(vec![
        query(
            1,
            &[
                ("lineitem", "l_shipdate"),
                ("lineitem", "l_returnflag"),
            ],
        ),
        query(
            3,
            &[
                ("customer", "c_mktsegment"),
                ("customer", "c_custkey"),
                ("orders", "o_custkey"),
                ("orders", "o_orderdate"),
                ("lineitem", "l_orderkey"),
                ("lineitem", "l_shipdate"),
            ],
        ),
        query(
            4,
            &[
                ("orders", "o_orderdate"),
                ("orders", "o_orderkey"),
                ("lineitem", "l_orderkey"),
            ],
        ),
        query(
            6,
            &[
                ("lineitem", "l_shipdate"),
                ("lineitem", "l_quantity"),
            ],
        ),
        query(
            12,
            &[
                ("orders", "o_orderkey"),
                ("lineitem", "l_orderkey"),
                ("lineitem", "l_shipmode"),
                ("lineitem", "l_shipdate"),
            ],
        ),
        query(
            17,
            &[("lineitem", "l_partkey"), ("lineitem", "l_quantity")],
        ),
    ])
}
