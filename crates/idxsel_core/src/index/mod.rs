//! Candidate indexes and their algebra.
//!
//! An [`Index`] here is a *hypothetical* index: a column sequence the
//! selection algorithms reason about and hand to the what-if cost oracle.
//! Nothing in this module creates physical structures.
//!
//! # Operations
//!
//! - [`Index::prefixes`]: proper leading sub-sequences, longest first
//! - [`Index::appendable_by`]: whether a column can extend an index
//! - [`Index::merge`]: column union preserving the first index's order
//! - [`Index::split`]: common prefix plus the two remainders
//!
//! # Warning
//!
//! Indexes compare by column *sequence*. `I(a,b)` and `I(b,a)` are distinct
//! candidates with distinct sizes and costs.

mod algebra;
mod column;
mod prefix;
mod set;

pub use algebra::Index;
pub use column::Column;
pub use prefix::Prefixes;
pub use set::{indexes_by_table, IndexSet};
