//! Syntactically relevant candidate generation.
//!
//! For every table a query touches, every ordered arrangement of `1..=w`
//! of the query's indexable columns on that table becomes a candidate.
//! Arrangements are *permutations*, not combinations: `I(a,b)` and
//! `I(b,a)` serve different predicates.
//!
//! # Cost
//!
//! A table with `k` indexable columns yields `k!/(k-L)!` candidates of
//! width `L`. Generation is cheap per candidate but the count explodes with
//! `k` and `max_index_width`; choose the width deliberately.

use crate::index::{Column, Index};
use crate::workload::{Query, Workload};
use std::collections::BTreeMap;
use tracing::debug;

/// Signature of a per-query candidate generator.
pub type CandidateGenerator = fn(&Query, usize) -> Vec<Index>;

/// Generates every syntactically relevant index for `query` with at most
/// `max_index_width` columns.
///
/// Candidates are emitted grouped by table (canonical table order), then
/// by width, then in lexicographic order of column positions.
pub fn syntactically_relevant_indexes(query: &Query, max_index_width: usize) -> Vec<Index> {
    let mut columns_by_table: BTreeMap<&str, Vec<Column>> = BTreeMap::new();
    for column in query.indexable_columns() {
        columns_by_table
            .entry(column.table())
            .or_default()
            .push(column.clone());
    }

    let mut candidates = Vec::new();
    for columns in columns_by_table.values() {
        for width in 1..=max_index_width.min(columns.len()) {
            permutations(columns, width, &mut candidates);
        }
    }

    debug!(
        "{}: {} indexable columns, {} candidates",
        query,
        query.indexable_columns().len(),
        candidates.len()
    );
    candidates
}

/// Applies `generator` to every query, returning one candidate list per
/// query in workload order.
pub fn candidates_per_query(
    workload: &Workload,
    max_index_width: usize,
    generator: CandidateGenerator,
) -> Vec<Vec<Index>> {
    workload
        .queries()
        .iter()
        .map(|query| generator(query, max_index_width))
        .collect()
}

/// Number of width-`length` permutations of `columns` distinct columns.
#[must_use]
pub fn permutation_count(columns: usize, length: usize) -> usize {
    if length > columns {
        return 0;
    }
    (columns - length + 1..=columns).product()
}

fn permutations(columns: &[Column], length: usize, out: &mut Vec<Index>) {
    let mut current = Vec::with_capacity(length);
    let mut used = vec![false; columns.len()];
    permute(columns, length, &mut used, &mut current, out);
}

fn permute(
    columns: &[Column],
    length: usize,
    used: &mut [bool],
    current: &mut Vec<Column>,
    out: &mut Vec<Index>,
) {
    if current.len() == length {
        out.push(Index::from_checked(current.clone()));
        return;
    }

    for position in 0..columns.len() {
        if used[position] {
            continue;
        }
        used[position] = true;
        current.push(columns[position].clone());
        permute(columns, length, used, current, out);
        current.pop();
        used[position] = false;
    }
}
