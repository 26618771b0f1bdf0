//! MRU (Most Recently Used) eviction.
//!
//! The opposite of LRU: the entry touched or admitted most recently is the
//! victim. Useful for cyclic scans larger than the cache, where the item just
//! served is the one least likely to be requested again soon.
//!
//! ```text
//!   (last_used_nanos, seq, id) ascending
//!
//!     (1_000, 0, A)
//!     (2_000, 1, B)
//!     (3_000, 2, C)   ◄── EVICT (most recent)
//! ```

use crate::entry::TimedMeta;
use crate::policy::ranked::RankedIndex;
use crate::policy::EvictionPolicy;

/// Recency policy evicting the most recently used entry.
#[derive(Debug, Default)]
pub struct MruPolicy {
    index: RankedIndex<i64>,
}

impl MruPolicy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EvictionPolicy for MruPolicy {
    type Meta = TimedMeta;

    fn name(&self) -> &'static str {
        "MRU"
    }

    #[inline]
    fn on_admit(&mut self, id: u64, meta: &TimedMeta) {
        self.index.insert(id, meta.last_used_nanos());
    }

    #[inline]
    fn on_hit(&mut self, id: u64, meta: &TimedMeta) {
        self.index.rerank(id, meta.last_used_nanos());
    }

    #[inline]
    fn on_remove(&mut self, id: u64) {
        self.index.remove(id);
    }

    #[inline]
    fn pop_victim(&mut self) -> Option<u64> {
        self.index.pop_last()
    }

    fn clear(&mut self) {
        self.index.clear();
    }

    fn len(&self) -> usize {
        self.index.len()
    }
}
