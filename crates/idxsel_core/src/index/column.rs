//! Column references.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reference to one attribute of one table.
///
/// Two columns are the same column iff table and attribute name match.
/// Columns order by `(table, name)`, which is the canonical order used
/// to iterate configurations deterministically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Column {
    table: String,
    name: String,
}

impl Column {
    /// Creates a new column reference.
    pub fn new(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            name: name.into(),
        }
    }

    /// Returns the table this column belongs to.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns the attribute name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.name)
    }
}

impl FromStr for Column {
    type Err = CoreError;

    /// Parses `table.column`.
    fn from_str(s: &str) -> CoreResult<Self> {
        match s.split_once('.') {
            Some((table, name)) if !table.is_empty() && !name.is_empty() => {
                Ok(Self::new(table, name))
            }
            _ => Err(CoreError::invalid_index(format!(
                "column reference must look like table.column, got {s:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_ordering() {
        let a = Column::new("lineitem", "l_orderkey");
        let b = Column::new("lineitem", "l_partkey");
        let c = Column::new("orders", "o_custkey");
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn column_display() {
        let c = Column::new("orders", "o_orderdate");
        assert_eq!(format!("{c}"), "orders.o_orderdate");
    }

    #[test]
    fn column_parse() {
        let c: Column = "orders.o_orderdate".parse().unwrap();
        assert_eq!(c.table(), "orders");
        assert_eq!(c.name(), "o_orderdate");

        assert!("orders".parse::<Column>().is_err());
        assert!(".o_orderdate".parse::<Column>().is_err());
        assert!("orders.".parse::<Column>().is_err());
    }
}
