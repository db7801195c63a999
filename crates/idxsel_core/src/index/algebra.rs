//! Candidate index value type and its algebra.

use crate::error::{CoreError, CoreResult};
use crate::index::column::Column;
use crate::index::prefix::Prefixes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A candidate secondary index: an ordered, non-empty sequence of distinct
/// columns of a single table.
///
/// Column order is significant: `I(a,b)` and `I(b,a)` are different indexes,
/// because a predicate on the leading column can use a prefix of the index
/// but not a suffix. Equality, hashing and ordering all follow the column
/// sequence.
///
/// Indexes are immutable. Every transformation (prefix, merge, split,
/// append) produces a new value. Estimated sizes are not stored here; they
/// live in the [`SizeCache`](crate::cost::SizeCache) of the cost evaluation
/// layer, keyed by index value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Column>", into = "Vec<Column>")]
pub struct Index {
    columns: Vec<Column>,
}

impl Index {
    /// Creates an index over `columns`, in the given order.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidIndex`] if `columns` is empty, contains a
    /// column twice, or spans more than one table.
    pub fn new(columns: Vec<Column>) -> CoreResult<Self> {
        let Some(first) = columns.first() else {
            return Err(CoreError::invalid_index("an index needs at least one column"));
        };
        let table = first.table();

        for (position, column) in columns.iter().enumerate() {
            if column.table() != table {
                return Err(CoreError::invalid_index(format!(
                    "column {column} does not belong to table {table}"
                )));
            }
            if columns[..position].contains(column) {
                return Err(CoreError::invalid_index(format!(
                    "column {column} appears more than once"
                )));
            }
        }

        Ok(Self { columns })
    }

    /// Creates a single-column index.
    pub fn single(column: Column) -> Self {
        Self {
            columns: vec![column],
        }
    }

    /// Builds an index from columns already known to satisfy the invariants.
    pub(crate) fn from_checked(columns: Vec<Column>) -> Self {
        debug_assert!(Self::new(columns.clone()).is_ok());
        Self { columns }
    }

    /// Returns the indexed columns in key order.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Returns the table this index belongs to.
    #[must_use]
    pub fn table(&self) -> &str {
        self.columns[0].table()
    }

    /// Returns true if this index has exactly one column.
    #[must_use]
    pub fn is_single_column(&self) -> bool {
        self.columns.len() == 1
    }

    /// Returns true if `column` is part of this index.
    #[must_use]
    pub fn contains(&self, column: &Column) -> bool {
        self.columns.contains(column)
    }

    /// Returns all proper leading sub-sequences, longest first.
    ///
    /// `I(a,b,c)` yields `I(a,b)` then `I(a)`. The iterator is lazy and
    /// can be restarted by calling `prefixes()` again.
    pub fn prefixes(&self) -> Prefixes<'_> {
        Prefixes::new(&self.columns)
    }

    /// Returns true if `column` may be appended to grow this index by one:
    /// it belongs to the same table and is not already indexed.
    #[must_use]
    pub fn appendable_by(&self, column: &Column) -> bool {
        column.table() == self.table() && !self.contains(column)
    }

    /// Returns this index with `column` appended, or `None` if the column is
    /// not appendable.
    #[must_use]
    pub fn appended(&self, column: &Column) -> Option<Self> {
        if !self.appendable_by(column) {
            return None;
        }
        let mut columns = self.columns.clone();
        columns.push(column.clone());
        Some(Self { columns })
    }

    /// Merges `other` into this index: this index's columns in order,
    /// followed by the columns of `other` not already present, in `other`'s
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidIndex`] if the indexes belong to different tables.
    pub fn merge(&self, other: &Index) -> CoreResult<Self> {
        if self.table() != other.table() {
            return Err(CoreError::invalid_index(format!(
                "cannot merge {self} and {other}: different tables"
            )));
        }

        let mut columns = self.columns.clone();
        for column in &other.columns {
            if !columns.contains(column) {
                columns.push(column.clone());
            }
        }
        Ok(Self { columns })
    }

    /// Returns this index cut down to at most `max_width` columns.
    ///
    /// At least one column is always kept.
    #[must_use]
    pub fn truncated(&self, max_width: usize) -> Self {
        let width = max_width.clamp(1, self.columns.len());
        Self {
            columns: self.columns[..width].to_vec(),
        }
    }

    /// Returns the length of the longest common leading column sequence.
    #[must_use]
    pub fn common_prefix_len(&self, other: &Index) -> usize {
        self.columns
            .iter()
            .zip(&other.columns)
            .take_while(|(a, b)| a == b)
            .count()
    }

    /// Splits two indexes that share a leading prefix into
    /// `{common prefix, remainder of self, remainder of other}`.
    ///
    /// Empty remainders are omitted. Returns `None` if the indexes share no
    /// leading column.
    #[must_use]
    pub fn split(&self, other: &Index) -> Option<BTreeSet<Index>> {
        let common = self.common_prefix_len(other);
        if common == 0 {
            return None;
        }

        let mut pieces = BTreeSet::new();
        pieces.insert(Self::from_checked(self.columns[..common].to_vec()));
        for index in [self, other] {
            if index.columns.len() > common {
                pieces.insert(Self::from_checked(index.columns[common..].to_vec()));
            }
        }
        Some(pieces)
    }
}

impl TryFrom<Vec<Column>> for Index {
    type Error = CoreError;

    fn try_from(columns: Vec<Column>) -> CoreResult<Self> {
        Self::new(columns)
    }
}

impl From<Index> for Vec<Column> {
    fn from(index: Index) -> Self {
        index.columns
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "I(")?;
        for (position, column) in self.columns.iter().enumerate() {
            if position > 0 {
                write!(f, ",")?;
            }
            write!(f, "{column}")?;
        }
        write!(f, ")")
    }
}
