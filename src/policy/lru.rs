//! LRU (Least Recently Used) eviction.
//!
//! Each entry carries a [`TimedMeta`] stamped at admission and refreshed on
//! every hit. The entry with the smallest `last_used_nanos` is the victim.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         LruPolicy Layout                            │
//! │                                                                     │
//! │   index: RankedIndex<i64>                                           │
//! │                                                                     │
//! │     (last_used_nanos, seq, id)  ordered ascending                   │
//! │                                                                     │
//! │     (  1_000, 0, A )   ◄── EVICT (least recent)                     │
//! │     (  2_000, 1, B )                                                │
//! │     (  3_000, 2, C )                                                │
//! │                                                                     │
//! │   hit(A) at t=4_000:                                                │
//! │                                                                     │
//! │     (  2_000, 1, B )   ◄── EVICT                                    │
//! │     (  3_000, 2, C )                                                │
//! │     (  4_000, 0, A )                                                │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The timestamp lives in the entry, not in the policy: the cache calls
//! `was_used()` on the entry first and then hands the updated metadata to
//! [`on_hit`](EvictionPolicy::on_hit), which re-ranks the id.
//!
//! ## Operations
//!
//! | Operation     | Time      |
//! |---------------|-----------|
//! | `on_admit`    | O(log n)  |
//! | `on_hit`      | O(log n)  |
//! | `on_remove`   | O(log n)  |
//! | `pop_victim`  | O(log n)  |
//!
//! ## Example Usage
//!
//! ```
//! use tiercache::cache::BoundedCache;
//! use tiercache::image::{ImageSize, StoreImage};
//! use tiercache::policy::LruPolicy;
//! use tiercache::store::DataStorage;
//! use tiercache::traits::DataCache;
//!
//! let cache: BoundedCache<StoreImage, LruPolicy> = BoundedCache::new(30).unwrap();
//! for id in 1..=3 {
//!     cache.cache_data(StoreImage::new(id, vec![0; 10], ImageSize::FULL));
//! }
//!
//! // Touch 1 so that 2 becomes the least recently used
//! assert!(cache.load_data(1).is_some());
//! cache.cache_data(StoreImage::new(4, vec![0; 10], ImageSize::FULL));
//!
//! assert!(cache.data_is_in_cache(1));
//! assert!(!cache.data_is_in_cache(2));
//! ```

use crate::entry::TimedMeta;
use crate::policy::ranked::RankedIndex;
use crate::policy::EvictionPolicy;

/// Recency policy evicting the least recently used entry.
#[derive(Debug, Default)]
pub struct LruPolicy {
    index: RankedIndex<i64>,
}

impl LruPolicy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EvictionPolicy for LruPolicy {
    type Meta = TimedMeta;

    fn name(&self) -> &'static str {
        "LRU"
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
        self.index.pop_first()
    }

    fn clear(&mut self) {
        self.index.clear();
    }

    fn len(&self) -> usize {
        self.index.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryMeta;

    #[test]
    fn evicts_least_recent_first() {
        let mut policy = LruPolicy::new();
        let metas: Vec<TimedMeta> = (0..3).map(|_| TimedMeta::fresh()).collect();
        for (id, meta) in metas.iter().enumerate() {
            policy.on_admit(id as u64, meta);
        }
        assert_eq!(policy.pop_victim(), Some(0));
        assert_eq!(policy.pop_victim(), Some(1));
    }

    #[test]
    fn hit_moves_entry_to_back() {
        let mut policy = LruPolicy::new();
        let a = TimedMeta::fresh();
        let b = TimedMeta::fresh();
        let c = TimedMeta::fresh();
        policy.on_admit(1, &a);
        policy.on_admit(2, &b);
        policy.on_admit(3, &c);

        a.was_used();
        policy.on_hit(1, &a);

        assert_eq!(policy.pop_victim(), Some(2));
        assert_eq!(policy.pop_victim(), Some(3));
        assert_eq!(policy.pop_victim(), Some(1));
    }

    #[test]
    fn explicit_timestamps_order_victims() {
        // Ranks are read from metadata, so admission order does not matter
        let mut policy = LruPolicy::new();
        policy.index.insert(10, 300);
        policy.index.insert(11, 100);
        policy.index.insert(12, 200);
        assert_eq!(policy.pop_victim(), Some(11));
        assert_eq!(policy.pop_victim(), Some(12));
        assert_eq!(policy.pop_victim(), Some(10));
    }

    #[test]
    fn removed_entry_is_not_a_victim() {
        let mut policy = LruPolicy::new();
        let a = TimedMeta::fresh();
        let b = TimedMeta::fresh();
        policy.on_admit(1, &a);
        policy.on_admit(2, &b);
        policy.on_remove(1);
        assert_eq!(policy.pop_victim(), Some(2));
        assert_eq!(policy.pop_victim(), None);
    }
}
