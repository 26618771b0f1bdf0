//! FIFO (First In, First Out) eviction.
//!
//! Evicts the entry that was admitted earliest. Hits do not change the order.
//!
//! ```text
//!   admitted:  A ── B ── C ── D
//!              ▲
//!            EVICT (oldest)
//! ```
//!
//! ## Operations
//!
//! | Operation     | Time      |
//! |---------------|-----------|
//! | `on_admit`    | O(log n)  |
//! | `on_hit`      | O(1)      |
//! | `on_remove`   | O(log n)  |
//! | `pop_victim`  | O(log n)  |
//!
//! ## Example Usage
//!
//! ```
//! use tiercache::cache::BoundedCache;
//! use tiercache::image::{ImageSize, StoreImage};
//! use tiercache::policy::FifoPolicy;
//! use tiercache::traits::DataCache;
//!
//! let cache: BoundedCache<StoreImage, FifoPolicy> = BoundedCache::new(20).unwrap();
//! for id in 1..=3 {
//!     cache.cache_data(StoreImage::new(id, vec![0; 10], ImageSize::FULL));
//! }
//!
//! // Admitting id 3 pushed out the oldest entry
//! assert!(!cache.data_is_in_cache(1));
//! assert!(cache.data_is_in_cache(2));
//! assert!(cache.data_is_in_cache(3));
//! ```

use crate::entry::SimpleMeta;
use crate::policy::ranked::RankedIndex;
use crate::policy::EvictionPolicy;

/// Insertion-ordered policy evicting the oldest entry.
#[derive(Debug, Default)]
pub struct FifoPolicy {
    queue: RankedIndex<()>,
}

impl FifoPolicy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EvictionPolicy for FifoPolicy {
    type Meta = SimpleMeta;

    fn name(&self) -> &'static str {
        "FIFO"
    }

    fn reorders_on_hit(&self) -> bool {
        false
    }

    #[inline]
    fn on_admit(&mut self, id: u64, _meta: &SimpleMeta) {
        self.queue.insert(id, ());
    }

    #[inline]
    fn on_hit(&mut self, _id: u64, _meta: &SimpleMeta) {}

    #[inline]
    fn on_remove(&mut self, id: u64) {
        self.queue.remove(id);
    }

    #[inline]
    fn pop_victim(&mut self) -> Option<u64> {
        self.queue.pop_first()
    }

    fn clear(&mut self) {
        self.queue.clear();
    }

    fn len(&self) -> usize {
        self.queue.len()
    }
}
