//! CLI command implementations.

pub mod candidates;
pub mod recommend;
