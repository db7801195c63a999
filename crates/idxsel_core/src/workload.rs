//! Workload model: queries and their indexable columns.
//!
//! A [`Workload`] is a frozen snapshot for one selection run. How queries
//! are parsed and which of their columns count as indexable is decided
//! upstream; this module only records the result.

use crate::index::{Column, Index, IndexSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Identifier of a query within a workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QueryId(pub u32);

impl QueryId {
    /// Creates a new query ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{}", self.0)
    }
}

/// A single workload query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Query {
    id: QueryId,
    text: String,
    columns: Vec<Column>,
}

impl Query {
    /// Creates a query with the given indexable columns.
    ///
    /// Duplicate columns are removed; columns are kept in canonical order.
    pub fn new(id: QueryId, text: impl Into<String>, columns: impl IntoIterator<Item = Column>) -> Self {
        let columns: BTreeSet<Column> = columns.into_iter().collect();
        Self {
            id,
            text: text.into(),
            columns: columns.into_iter().collect(),
        }
    }

    /// Returns the query ID.
    #[must_use]
    pub fn id(&self) -> QueryId {
        self.id
    }

    /// Returns the query text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the indexable columns, in canonical order.
    #[must_use]
    pub fn indexable_columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns true if the query references `column` as indexable.
    #[must_use]
    pub fn references(&self, column: &Column) -> bool {
        self.columns.binary_search(column).is_ok()
    }

    /// Returns true if `index` shares at least one column with this query.
    #[must_use]
    pub fn is_relevant(&self, index: &Index) -> bool {
        index.columns().iter().any(|column| self.references(column))
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// An immutable, ordered collection of queries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workload {
    queries: Vec<Query>,
}

impl Workload {
    /// Creates a workload from queries, keeping their order.
    pub fn new(queries: Vec<Query>) -> Self {
        Self { queries }
    }

    /// Returns the queries in workload order.
    #[must_use]
    pub fn queries(&self) -> &[Query] {
        &self.queries
    }

    /// Returns the number of queries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    /// Returns true if the workload has no queries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// Returns every indexable column referenced anywhere in the workload.
    #[must_use]
    pub fn indexable_columns(&self) -> BTreeSet<Column> {
        self.queries
            .iter()
            .flat_map(|query| query.indexable_columns().iter().cloned())
            .collect()
    }

    /// Returns the universal candidate pool: one single-column index per
    /// indexable column of the workload.
    ///
    /// Independent of any width limit.
    #[must_use]
    pub fn potential_indexes(&self) -> IndexSet {
        self.indexable_columns().into_iter().map(Index::single).collect()
    }
}
