//! LFU (Least Frequently Used) eviction.
//!
//! Each entry carries a [`CountedMeta`] incremented on every hit. The entry
//! with the smallest `use_count` is the victim; among equal counts the one
//! admitted earliest goes first.
//!
//! ## Architecture
//!
//! ```text
//!   index: RankedIndex<u64>      (use_count, seq, id) ascending
//!
//!     (0, 0, A)   ◄── EVICT
//!     (1, 2, C)
//!     (3, 1, B)
//!
//!   hit(A) ×2 → (2, 0, A) moves past C:
//!
//!     (1, 2, C)   ◄── EVICT
//!     (2, 0, A)
//!     (3, 1, B)
//! ```
//!
//! Counts are never decayed. An entry that was hot long ago keeps its count
//! until it is removed explicitly or the cache is cleared.
//!
//! ## Operations
//!
//! | Operation     | Time      |
//! |---------------|-----------|
//! | `on_admit`    | O(log n)  |
//! | `on_hit`      | O(log n)  |
//! | `on_remove`   | O(log n)  |
//! | `pop_victim`  | O(log n)  |

use crate::entry::CountedMeta;
use crate::policy::ranked::RankedIndex;
use crate::policy::EvictionPolicy;

/// Frequency policy evicting the least used entry.
#[derive(Debug, Default)]
pub struct LfuPolicy {
    index: RankedIndex<u64>,
}

impl LfuPolicy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EvictionPolicy for LfuPolicy {
    type Meta = CountedMeta;

    fn name(&self) -> &'static str {
        "LFU"
    }

    #[inline]
    fn on_admit(&mut self, id: u64, meta: &CountedMeta) {
        self.index.insert(id, meta.use_count());
    }

    #[inline]
    fn on_hit(&mut self, id: u64, meta: &CountedMeta) {
        self.index.rerank(id, meta.use_count());
    }

    #[inline]
    fn on_remove(&mut self, id: u64) {
        self.index.remove(id);
    }

    #[inline]
    fn pop_victim(&mut self) -> Option<u64> {
        self.index.pop_first()
    }

    fn clear(&mut self) {
        self.index.clear();
    }

    fn len(&self) -> usize {
        self.index.len()
    }
}
