//! Workload and configuration files.
//!
//! A workload file carries the schema statistics the analytic backend
//! needs plus the queries with their indexable columns:
//!
//! ```json
//! {
//!   "tables": {
//!     "orders": {"rows": 1500000, "columns": {"o_custkey": {"distinct": 100000, "width": 8}}}
//!   },
//!   "queries": [{"id": 1, "text": "SELECT ...", "columns": ["orders.o_custkey"]}]
//! }
//! ```
//!
//! A configuration file is an [`AlgorithmConfig`]:
//! `{"algorithm": "extend", "parameters": {"budget_MB": 100}}`.

use idxsel_core::{AlgorithmConfig, Column, CoreError, Query, QueryId, Statistics, TableStatistics, Workload};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading input files.
#[derive(Debug, Error)]
pub enum InputError {
    /// The file could not be read.
    #[error("cannot read {path:?}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The file is not valid JSON for the expected format.
    #[error("cannot parse {path:?}: {source}")]
    Json {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },

    /// A query references a malformed column.
    #[error("query {query}: {source}")]
    InvalidColumn {
        /// Query ID.
        query: u32,
        /// Underlying error.
        source: CoreError,
    },

    /// A query references a column without statistics.
    #[error("query {query}: no statistics for column {column}")]
    UnknownColumn {
        /// Query ID.
        query: u32,
        /// Column reference.
        column: String,
    },

    /// Two queries share an ID.
    #[error("duplicate query id {id}")]
    DuplicateQuery {
        /// Query ID.
        id: u32,
    },

    /// The configuration violates an algorithm precondition.
    #[error("invalid configuration in {path:?}: {source}")]
    InvalidConfig {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: CoreError,
    },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WorkloadFile {
    tables: BTreeMap<String, TableStatistics>,
    queries: Vec<QueryEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct QueryEntry {
    id: u32,
    #[serde(default)]
    text: String,
    columns: Vec<String>,
}

/// A loaded workload with the statistics describing its schema.
#[derive(Debug, Clone)]
pub struct WorkloadInput {
    /// Schema statistics.
    pub statistics: Statistics,
    /// Queries in file order.
    pub workload: Workload,
}

impl WorkloadFile {
    fn into_input(self) -> Result<WorkloadInput, InputError> {
        let statistics = Statistics {
            tables: self.tables,
        };

        let mut seen = BTreeSet::new();
        let mut queries = Vec::with_capacity(self.queries.len());
        for entry in self.queries {
            if !seen.insert(entry.id) {
                return Err(InputError::DuplicateQuery { id: entry.id });
            }

            let mut columns = Vec::with_capacity(entry.columns.len());
            for reference in &entry.columns {
                let column: Column = reference.parse().map_err(|source| InputError::InvalidColumn {
                    query: entry.id,
                    source,
                })?;
                let known = statistics
                    .tables
                    .get(column.table())
                    .is_some_and(|table| table.columns.contains_key(column.name()));
                if !known {
                    return Err(InputError::UnknownColumn {
                        query: entry.id,
                        column: reference.clone(),
                    });
                }
                columns.push(column);
            }

            queries.push(Query::new(QueryId::new(entry.id), entry.text, columns));
        }

        Ok(WorkloadInput {
            statistics,
            workload: Workload::new(queries),
        })
    }
}

fn read(path: &Path) -> Result<String, InputError> {
    fs::read_to_string(path).map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads a workload file.
pub fn load_workload(path: &Path) -> Result<WorkloadInput, InputError> {
    let file: WorkloadFile = serde_json::from_str(&read(path)?).map_err(|source| InputError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    file.into_input()
}

/// Loads and validates an algorithm configuration file.
pub fn load_config(path: &Path) -> Result<AlgorithmConfig, InputError> {
    let config: AlgorithmConfig =
        serde_json::from_str(&read(path)?).map_err(|source| InputError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    config.validate().map_err(|source| InputError::InvalidConfig {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const WORKLOAD: &str = r#"{
        "tables": {
            "orders": {
                "rows": 1000,
                "columns": {"o_custkey": {"distinct": 100}, "o_orderdate": {"distinct": 30, "width": 4}}
            }
        },
        "queries": [
            {"id": 1, "text": "SELECT 1", "columns": ["orders.o_custkey"]},
            {"id": 2, "columns": ["orders.o_orderdate", "orders.o_custkey"]}
        ]
    }"#;

    fn file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_workload() {
        let input = load_workload(file(WORKLOAD).path()).unwrap();
        assert_eq!(input.workload.len(), 2);
        assert_eq!(input.workload.queries()[0].text(), "SELECT 1");
        assert_eq!(input.workload.queries()[1].indexable_columns().len(), 2);
        assert_eq!(input.statistics.tables["orders"].columns["o_custkey"].width, 8);
    }

    #[test]
    fn rejects_unknown_columns() {
        let json = WORKLOAD.replace("orders.o_orderdate", "orders.o_comment");
        let err = load_workload(file(&json).path()).unwrap_err();
        assert!(matches!(err, InputError::UnknownColumn { query: 2, .. }));
    }

    #[test]
    fn rejects_malformed_columns() {
        let json = WORKLOAD.replace("orders.o_orderdate", "o_orderdate");
        let err = load_workload(file(&json).path()).unwrap_err();
        assert!(matches!(err, InputError::InvalidColumn { query: 2, .. }));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let json = WORKLOAD.replace("\"id\": 2", "\"id\": 1");
        let err = load_workload(file(&json).path()).unwrap_err();
        assert!(matches!(err, InputError::DuplicateQuery { id: 1 }));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_workload(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, InputError::Io { .. }));
    }

    #[test]
    fn loads_and_validates_config() {
        let config = load_config(
            file(r#"{"algorithm": "extend", "parameters": {"budget_MB": 100}}"#).path(),
        )
        .unwrap();
        assert_eq!(config.name(), "extend");

        let err = load_config(
            file(r#"{"algorithm": "drop_heuristic", "parameters": {"max_indexes": 0}}"#).path(),
        )
        .unwrap_err();
        assert!(matches!(err, InputError::InvalidConfig { .. }));

        let err = load_config(file(r#"{"algorithm": "anneal", "parameters": {}}"#).path())
            .unwrap_err();
        assert!(matches!(err, InputError::Json { .. }));
    }
}
