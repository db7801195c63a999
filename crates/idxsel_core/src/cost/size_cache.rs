//! Memoized index sizes.

use crate::error::CoreResult;
use crate::index::Index;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Estimated on-disk sizes, keyed by index value.
///
/// A size is computed at most once per distinct column sequence and never
/// overwritten. The cache is cheap to clone; clones share storage, so a
/// host running several selections over the same schema can hand every
/// run the same cache.
///
/// If two callers race to size the same index, the first insertion wins
/// and both observe that value.
#[derive(Debug, Clone, Default)]
pub struct SizeCache {
    sizes: Arc<RwLock<HashMap<Index, u64>>>,
}

impl SizeCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached size of `index`, if it was estimated before.
    pub fn get(&self, index: &Index) -> Option<u64> {
        self.sizes.read().get(index).copied()
    }

    /// Returns the cached size of `index`, computing it with `estimate` on
    /// a miss.
    ///
    /// `estimate` runs without holding the lock. The boolean is true if
    /// the value was already cached.
    pub fn get_or_try_insert_with<F>(&self, index: &Index, estimate: F) -> CoreResult<(u64, bool)>
    where
        F: FnOnce() -> CoreResult<u64>,
    {
        if let Some(size) = self.get(index) {
            return Ok((size, true));
        }

        let size = estimate()?;
        let mut sizes = self.sizes.write();
        Ok((*sizes.entry(index.clone()).or_insert(size), false))
    }

    /// Returns the number of sized indexes.
    pub fn len(&self) -> usize {
        self.sizes.read().len()
    }

    /// Returns true if no index has been sized yet.
    pub fn is_empty(&self) -> bool {
        self.sizes.read().is_empty()
    }
}
