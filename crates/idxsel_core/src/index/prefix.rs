//! Lazy prefix enumeration.

use crate::index::algebra::Index;
use crate::index::column::Column;
use std::iter::FusedIterator;

/// Iterator over the proper leading sub-sequences of an index, longest first.
///
/// Created by [`Index::prefixes`]. An index of width `w` yields `w - 1`
/// prefixes; a single-column index yields none.
#[derive(Debug, Clone)]
pub struct Prefixes<'a> {
    columns: &'a [Column],
    next_width: usize,
}

impl<'a> Prefixes<'a> {
    pub(crate) fn new(columns: &'a [Column]) -> Self {
        Self {
            columns,
            next_width: columns.len().saturating_sub(1),
        }
    }
}

impl Iterator for Prefixes<'_> {
    type Item = Index;

    fn next(&mut self) -> Option<Index> {
        if self.next_width == 0 {
            return None;
        }
        let prefix = Index::from_checked(self.columns[..self.next_width].to_vec());
        self.next_width -= 1;
        Some(prefix)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.next_width, Some(self.next_width))
    }
}

impl ExactSizeIterator for Prefixes<'_> {}

impl FusedIterator for Prefixes<'_> {}
