//! Byte-bounded cache in front of a storage tier.
//!
//! ## Architecture
//!
//! ```text
//!   ┌───────────────────────────────────────────────────────────────────────┐
//!   │                      BoundedCache<T, P, S>                            │
//!   │                                                                       │
//!   │   state: RwLock<CacheState>                                           │
//!   │   ┌───────────────────────────────────────────────────────────────┐   │
//!   │   │  entries: FxHashMap<id, CacheEntry<T, P::Meta>>               │   │
//!   │   │  policy:  P            (which id goes next)                   │   │
//!   │   │  max_bytes, current_bytes                                     │   │
//!   │   └───────────────────────────────────────────────────────────────┘   │
//!   │                                                                       │
//!   │   caching_rule: Fn(&T) -> bool        storage: S (write-through)      │
//!   └───────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Read path
//!
//! ```text
//!   load_data(id)
//!     │
//!     ├─ cached?  yes ─► entry.was_used(), policy.on_hit() ─► clone
//!     │
//!     └─ no ─► storage.load_data(id)   (no cache lock held)
//!                 │
//!                 ├─ None ─► None
//!                 └─ Some(item) ─► cache_data(item.clone()) ─► Some(item)
//! ```
//!
//! Two threads missing on the same id may both read storage. The second
//! `cache_data` finds the id already present and does nothing, so the cache
//! still holds one entry.
//!
//! ## Locking
//!
//! One readers-writer lock per cache. Size queries and `data_is_in_cache`
//! take it shared. Admission, removal, resize and clear take it exclusively
//! for the whole operation, eviction loop included. Hits take it shared for
//! policies whose order ignores hits (FIFO, LIFO, Random) and exclusively
//! otherwise.
//!
//! ## Budget invariant
//!
//! `current_cache_size() <= max_cache_size()` holds whenever no write lock is
//! held. Items larger than the whole budget are refused up front, so the
//! eviction loop in `cache_data` always ends with room or an empty cache.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::{debug, error, info, trace};

use crate::entry::CacheEntry;
use crate::error::{CacheError, Result};
use crate::metrics::{CacheCounters, CacheMetrics};
use crate::policy::EvictionPolicy;
use crate::rules;
use crate::store::none::NoStorage;
use crate::store::traits::{DataStorage, ItemRule};
use crate::traits::{Cachable, DataCache};

struct CacheState<T, P: EvictionPolicy> {
    entries: FxHashMap<u64, CacheEntry<T, P::Meta>>,
    policy: P,
    max_bytes: u64,
    current_bytes: u64,
}

impl<T: Cachable, P: EvictionPolicy> CacheState<T, P> {
    #[inline]
    fn free_bytes(&self) -> u64 {
        self.max_bytes.saturating_sub(self.current_bytes)
    }

    fn insert(&mut self, item: T) {
        let entry = CacheEntry::<T, P::Meta>::new(item);
        let id = entry.id();
        self.current_bytes += entry.byte_size();
        self.policy.on_admit(id, entry.meta());
        self.entries.insert(id, entry);
    }

    fn remove(&mut self, id: u64) -> Option<CacheEntry<T, P::Meta>> {
        let entry = self.entries.remove(&id)?;
        self.current_bytes = self.current_bytes.saturating_sub(entry.byte_size());
        self.policy.on_remove(id);
        Some(entry)
    }

    /// Removes the policy's next victim. `None` once nothing is left.
    fn evict_one(&mut self) -> Option<CacheEntry<T, P::Meta>> {
        while let Some(id) = self.policy.pop_victim() {
            if let Some(entry) = self.entries.remove(&id) {
                self.current_bytes = self.current_bytes.saturating_sub(entry.byte_size());
                return Some(entry);
            }
        }
        None
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.policy.clear();
        self.current_bytes = 0;
    }

    #[cfg(debug_assertions)]
    fn validate_invariants(&self) {
        let total: u64 = self.entries.values().map(|e| e.byte_size()).sum();
        debug_assert_eq!(total, self.current_bytes, "size counter drifted");
        debug_assert!(self.current_bytes <= self.max_bytes, "budget exceeded");
        debug_assert_eq!(
            self.entries.len(),
            self.policy.len(),
            "policy tracks a different entry set"
        );
    }
}

/// Generic byte-bounded cache with a pluggable eviction policy.
///
/// # Example
///
/// ```
/// use tiercache::cache::BoundedCache;
/// use tiercache::image::{ImageSize, StoreImage};
/// use tiercache::policy::LfuPolicy;
/// use tiercache::store::DataStorage;
/// use tiercache::traits::DataCache;
///
/// let cache: BoundedCache<StoreImage, LfuPolicy> = BoundedCache::new(100).unwrap();
/// cache.cache_data(StoreImage::new(1, vec![0; 60], ImageSize::FULL));
/// cache.cache_data(StoreImage::new(2, vec![0; 30], ImageSize::ICON));
///
/// assert_eq!(cache.current_cache_size(), 90);
/// assert!(cache.load_data(2).is_some());
///
/// // Needs 40 bytes: item 1 was never used, so it goes
/// cache.cache_data(StoreImage::new(3, vec![0; 40], ImageSize::ICON));
/// assert!(!cache.data_is_in_cache(1));
/// assert_eq!(cache.current_cache_size(), 70);
/// ```
pub struct BoundedCache<T, P, S = NoStorage>
where
    P: EvictionPolicy,
{
    state: RwLock<CacheState<T, P>>,
    storage: S,
    caching_rule: ItemRule<T>,
    hit_reorders: bool,
    policy_name: &'static str,
    counters: CacheCounters,
}

impl<T, P> BoundedCache<T, P, NoStorage>
where
    T: Cachable + Clone + Send + Sync + 'static,
    P: EvictionPolicy + Default,
{
    /// Memory-only cache admitting everything up to `max_bytes`.
    pub fn new(max_bytes: u64) -> Result<Self> {
        Self::with_storage(NoStorage, max_bytes)
    }
}

impl<T, P, S> BoundedCache<T, P, S>
where
    T: Cachable + Clone + Send + Sync + 'static,
    P: EvictionPolicy,
    S: DataStorage<T>,
{
    /// Cache admitting everything, backed by `storage`.
    pub fn with_storage(storage: S, max_bytes: u64) -> Result<Self>
    where
        P: Default,
    {
        Self::from_parts(storage, max_bytes, Arc::new(rules::cache_all::<T>), P::default())
    }

    /// Fully specified constructor.
    ///
    /// Returns [`CacheError::InvalidArgument`] if `max_bytes` is zero.
    pub fn from_parts(
        storage: S,
        max_bytes: u64,
        caching_rule: ItemRule<T>,
        policy: P,
    ) -> Result<Self> {
        if max_bytes == 0 {
            error!("Cache size must be positive");
            return Err(CacheError::invalid_argument("cache size must be positive"));
        }
        let policy_name = policy.name();
        info!("Created {} cache with {} byte budget", policy_name, max_bytes);
        Ok(Self {
            hit_reorders: policy.reorders_on_hit(),
            policy_name,
            state: RwLock::new(CacheState {
                entries: FxHashMap::default(),
                policy,
                max_bytes,
                current_bytes: 0,
            }),
            storage,
            caching_rule,
            counters: CacheCounters::default(),
        })
    }

    /// Name of the eviction policy.
    pub fn policy_name(&self) -> &'static str {
        self.policy_name
    }

    /// The storage tier behind this cache.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ids currently cached, in no particular order.
    pub fn cached_ids(&self) -> Vec<u64> {
        self.state.read().entries.keys().copied().collect()
    }

    pub fn metrics(&self) -> CacheMetrics {
        self.counters.snapshot()
    }

    /// Returns a clone of the cached item and records the hit.
    fn lookup(&self, id: u64) -> Option<T> {
        if self.hit_reorders {
            let mut guard = self.state.write();
            let state = &mut *guard;
            let entry = state.entries.get(&id)?;
            entry.was_used();
            state.policy.on_hit(id, entry.meta());
            Some(entry.data().clone())
        } else {
            let state = self.state.read();
            let entry = state.entries.get(&id)?;
            entry.was_used();
            Some(entry.data().clone())
        }
    }

    fn refuse(&self, id: u64, reason: &str) {
        self.counters.inc_refusal();
        debug!("Refused item {} for {} cache: {}", id, self.policy_name, reason);
    }
}

impl<T, P, S> DataCache<T> for BoundedCache<T, P, S>
where
    T: Cachable + Clone + Send + Sync + 'static,
    P: EvictionPolicy,
    S: DataStorage<T>,
{
    fn max_cache_size(&self) -> u64 {
        self.state.read().max_bytes
    }

    fn set_max_cache_size(&self, max_bytes: u64) -> Result<()> {
        if max_bytes == 0 {
            error!("Cache size must be positive");
            return Err(CacheError::invalid_argument("cache size must be positive"));
        }

        let mut state = self.state.write();
        state.max_bytes = max_bytes;
        let mut evicted = 0u64;
        while state.current_bytes > state.max_bytes {
            let Some(entry) = state.evict_one() else {
                break;
            };
            trace!("Evicted item {} ({} bytes) on resize", entry.id(), entry.byte_size());
            self.counters.inc_eviction();
            evicted += 1;
        }
        debug!(
            "Resized {} cache to {} bytes, evicted {} entries",
            self.policy_name, max_bytes, evicted
        );

        #[cfg(debug_assertions)]
        state.validate_invariants();

        Ok(())
    }

    fn current_cache_size(&self) -> u64 {
        self.state.read().current_bytes
    }

    fn free_space(&self) -> u64 {
        self.state.read().free_bytes()
    }

    fn cache_data(&self, item: T) {
        let id = item.id();
        if !self.data_is_cachable(&item) {
            self.refuse(id, "rejected by caching rule");
            return;
        }
        let size = item.byte_size();

        let mut state = self.state.write();
        if state.entries.contains_key(&id) {
            return;
        }
        if size > state.max_bytes {
            drop(state);
            self.refuse(id, "larger than the whole cache");
            return;
        }

        while state.free_bytes() < size {
            match state.evict_one() {
                Some(victim) => {
                    trace!(
                        "Evicted item {} ({} bytes) to admit item {}",
                        victim.id(),
                        victim.byte_size(),
                        id
                    );
                    self.counters.inc_eviction();
                },
                None => {
                    drop(state);
                    self.refuse(id, "no entry left to evict");
                    return;
                },
            }
        }

        state.insert(item);
        self.counters.inc_admission();

        #[cfg(debug_assertions)]
        state.validate_invariants();
    }

    fn uncache_data(&self, item: &T) {
        let mut state = self.state.write();
        if state.remove(item.id()).is_some() {
            trace!("Uncached item {}", item.id());
        }
    }

    fn data_is_cachable(&self, item: &T) -> bool {
        (self.caching_rule)(item)
    }

    fn data_is_in_cache(&self, id: u64) -> bool {
        self.state.read().entries.contains_key(&id)
    }

    fn clear_cache(&self) {
        self.state.write().clear();
        debug!("Cleared {} cache", self.policy_name);
    }
}

impl<T, P, S> DataStorage<T> for BoundedCache<T, P, S>
where
    T: Cachable + Clone + Send + Sync + 'static,
    P: EvictionPolicy,
    S: DataStorage<T>,
{
    fn data_exists(&self, id: u64) -> bool {
        self.data_is_in_cache(id) || self.storage.data_exists(id)
    }

    fn load_data(&self, id: u64) -> Option<T> {
        if let Some(item) = self.lookup(id) {
            self.counters.inc_hit();
            return Some(item);
        }
        self.counters.inc_miss();

        let item = self.storage.load_data(id)?;
        self.counters.inc_storage_hit();
        self.cache_data(item.clone());
        Some(item)
    }

    fn save_data(&self, item: &T) -> bool {
        self.cache_data(item.clone());
        self.storage.save_data(item)
    }

    fn data_is_storable(&self, item: &T) -> bool {
        self.storage.data_is_storable(item)
    }

    fn delete_data(&self, item: &T) -> bool {
        self.uncache_data(item);
        self.storage.delete_data(item)
    }
}

impl<T, P, S> fmt::Debug for BoundedCache<T, P, S>
where
    P: EvictionPolicy,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("BoundedCache")
            .field("policy", &self.policy_name)
            .field("len", &state.entries.len())
            .field("current_bytes", &state.current_bytes)
            .field("max_bytes", &state.max_bytes)
            .finish_non_exhaustive()
    }
}
