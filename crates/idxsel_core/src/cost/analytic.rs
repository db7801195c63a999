//! Statistics-driven what-if backend.
//!
//! Costs follow a small textbook model: a query touching a table either
//! scans it sequentially or descends one index through the longest leading
//! run of index columns the query references, then fetches matching rows.
//! The cheaper path wins. Unit costs mirror common planner defaults.

use crate::cost::{QueryPlan, WhatIfBackend};
use crate::error::{CoreError, CoreResult};
use crate::index::{Column, Index};
use crate::workload::Query;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const PAGE_SIZE: f64 = 8192.0;
const ROW_OVERHEAD: u64 = 24;
const INDEX_ENTRY_OVERHEAD: u64 = 16;
const INDEX_FANOUT: f64 = 256.0;

const SEQ_PAGE_COST: f64 = 1.0;
const RANDOM_PAGE_COST: f64 = 4.0;
const CPU_TUPLE_COST: f64 = 0.01;
const CPU_INDEX_TUPLE_COST: f64 = 0.005;

/// Statistics for one column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnStatistics {
    /// Number of distinct values.
    pub distinct: u64,
    /// Average value width in bytes.
    #[serde(default = "default_width")]
    pub width: u32,
}

fn default_width() -> u32 {
    8
}

/// Statistics for one table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableStatistics {
    /// Number of rows.
    pub rows: u64,
    /// Per-column statistics, by column name.
    pub columns: BTreeMap<String, ColumnStatistics>,
}

impl TableStatistics {
    fn row_width(&self) -> u64 {
        self.columns
            .values()
            .map(|c| u64::from(c.width.max(1)))
            .sum::<u64>()
            + ROW_OVERHEAD
    }

    fn heap_pages(&self) -> f64 {
        (self.rows.max(1) as f64 * self.row_width() as f64 / PAGE_SIZE).ceil()
    }
}

/// Statistics for a schema, by table name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    /// Per-table statistics.
    pub tables: BTreeMap<String, TableStatistics>,
}

impl Statistics {
    /// Creates empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table.
    #[must_use]
    pub fn with_table(mut self, name: impl Into<String>, table: TableStatistics) -> Self {
        self.tables.insert(name.into(), table);
        self
    }

    fn table(&self, name: &str) -> CoreResult<&TableStatistics> {
        self.tables
            .get(name)
            .ok_or_else(|| CoreError::oracle(format!("no statistics for table {name}")))
    }

    fn column(&self, column: &Column) -> CoreResult<&ColumnStatistics> {
        self.table(column.table())?
            .columns
            .get(column.name())
            .ok_or_else(|| CoreError::oracle(format!("no statistics for column {column}")))
    }
}

impl TableStatistics {
    /// Creates table statistics with the given row count.
    pub fn new(rows: u64) -> Self {
        Self {
            rows,
            columns: BTreeMap::new(),
        }
    }

    /// Adds a column.
    #[must_use]
    pub fn with_column(mut self, name: impl Into<String>, distinct: u64, width: u32) -> Self {
        self.columns
            .insert(name.into(), ColumnStatistics { distinct, width });
        self
    }
}

/// What-if backend answering from [`Statistics`] alone.
#[derive(Debug, Clone)]
pub struct AnalyticBackend {
    statistics: Statistics,
}

impl AnalyticBackend {
    /// Creates a backend over `statistics`.
    pub fn new(statistics: Statistics) -> Self {
        Self { statistics }
    }

    /// Returns the statistics.
    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    fn plan(&self, query: &Query, indexes: &[Index]) -> CoreResult<QueryPlan> {
        let mut tables: Vec<&str> = query
            .indexable_columns()
            .iter()
            .map(Column::table)
            .collect();
        tables.dedup();

        let mut plan = QueryPlan::default();
        for table in tables {
            let stats = self.statistics.table(table)?;
            let heap_pages = stats.heap_pages();
            let rows = stats.rows.max(1) as f64;

            let mut best_cost = heap_pages * SEQ_PAGE_COST + rows * CPU_TUPLE_COST;
            let mut best_index = None;

            for index in indexes.iter().filter(|index| index.table() == table) {
                let Some(cost) = self.index_scan_cost(query, index, stats, heap_pages)? else {
                    continue;
                };
                if cost < best_cost {
                    best_cost = cost;
                    best_index = Some(index);
                }
            }

            plan.cost += best_cost;
            plan.used_indexes.extend(best_index.cloned());
        }
        Ok(plan)
    }

    /// Cost of answering the query's predicates on one table through
    /// `index`, or `None` if the query does not reference its leading column.
    fn index_scan_cost(
        &self,
        query: &Query,
        index: &Index,
        table: &TableStatistics,
        heap_pages: f64,
    ) -> CoreResult<Option<f64>> {
        let mut selectivity = 1.0;
        let mut matched = 0;
        for column in index.columns() {
            if !query.references(column) {
                break;
            }
            selectivity /= self.statistics.column(column)?.distinct.max(1) as f64;
            matched += 1;
        }
        if matched == 0 {
            return Ok(None);
        }

        let rows = table.rows.max(1) as f64;
        let matching = (rows * selectivity).max(1.0);
        let entry_width = self.entry_width(index)? as f64;
        let height = rows.log(INDEX_FANOUT).ceil().max(1.0);
        let leaf_pages = (matching * entry_width / PAGE_SIZE).ceil();

        Ok(Some(
            RANDOM_PAGE_COST * (height + matching.min(heap_pages))
                + SEQ_PAGE_COST * leaf_pages
                + (CPU_INDEX_TUPLE_COST + CPU_TUPLE_COST) * matching,
        ))
    }

    fn entry_width(&self, index: &Index) -> CoreResult<u64> {
        let mut width = INDEX_ENTRY_OVERHEAD;
        for column in index.columns() {
            width += u64::from(self.statistics.column(column)?.width.max(1));
        }
        Ok(width)
    }
}

impl WhatIfBackend for AnalyticBackend {
    fn estimate_query_cost(&mut self, query: &Query, indexes: &[Index]) -> CoreResult<f64> {
        Ok(self.plan(query, indexes)?.cost)
    }

    fn explain_query(&mut self, query: &Query, indexes: &[Index]) -> CoreResult<QueryPlan> {
        self.plan(query, indexes)
    }

    fn estimate_index_size(&mut self, index: &Index) -> CoreResult<u64> {
        let rows = self.statistics.table(index.table())?.rows.max(1);
        // one metapage plus one entry per row
        Ok(PAGE_SIZE as u64 + rows * self.entry_width(index)?)
    }
}
