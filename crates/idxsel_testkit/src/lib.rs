//! # idxsel Testkit
//!
//! Test utilities for idxsel.
//!
//! This crate provides:
//! - Fixtures for a small TPC-H style schema and workload
//! - Scripted and failing what-if backends
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust
//! use idxsel_testkit::prelude::*;
//! use idxsel_core::{CostEvaluation, ExtendAlgorithm, ExtendConfig, SelectionAlgorithm};
//!
//! let workload = single_table_workload("t", &[&["a"], &["a", "b"]]);
//! let backend = ScriptedBackend::new().with_column_benefit(column("t", "a"), 500.0);
//! let mut extend =
//!     ExtendAlgorithm::new(CostEvaluation::new(backend), ExtendConfig::new()).unwrap();
//! assert_eq!(extend.best_indexes(&workload).unwrap(), vec![index("t", &["a"])]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod backend;
pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::backend::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use backend::*;
pub use fixtures::*;
pub use generators::*;
