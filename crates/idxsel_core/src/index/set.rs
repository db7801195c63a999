//! Index configurations.

use crate::index::algebra::Index;
use std::collections::{BTreeMap, BTreeSet};

/// One candidate physical design: an unordered set of indexes.
///
/// A `BTreeSet` keeps iteration in canonical index order, so every
/// algorithm that scans a configuration visits indexes the same way on
/// every run.
pub type IndexSet = BTreeSet<Index>;

/// Groups indexes by the table they belong to.
///
/// Tables and the indexes within each table keep canonical order.
pub fn indexes_by_table<'a, I>(indexes: I) -> BTreeMap<&'a str, Vec<&'a Index>>
where
    I: IntoIterator<Item = &'a Index>,
{
    let mut by_table: BTreeMap<&str, Vec<&Index>> = BTreeMap::new();
    for index in indexes {
        by_table.entry(index.table()).or_default().push(index);
    }
    for indexes in by_table.values_mut() {
        indexes.sort();
    }
    by_table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::Column;

    #[test]
    fn groups_by_table() {
        let a = Index::single(Column::new("orders", "o_custkey"));
        let b = Index::single(Column::new("lineitem", "l_partkey"));
        let c = Index::single(Column::new("orders", "o_orderdate"));
        let set: IndexSet = [a.clone(), b.clone(), c.clone()].into();

        let by_table = indexes_by_table(&set);
        assert_eq!(by_table.keys().copied().collect::<Vec<_>>(), ["lineitem", "orders"]);
        assert_eq!(by_table["orders"], vec![&a, &c]);
        assert_eq!(by_table["lineitem"], vec![&b]);
    }
}
