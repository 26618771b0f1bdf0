//! # Cache Trait Hierarchy
//!
//! This module defines the capability every cacheable item exposes and the
//! operation set of a byte-bounded cache sitting in front of a storage tier.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────┐
//!   │          Cachable            │   implemented by domain items
//!   │                              │   (e.g. StoreImage)
//!   │  id() → u64                  │
//!   │  byte_size() → u64           │
//!   └──────────────┬───────────────┘
//!                  │ T: Cachable
//!                  ▼
//!   ┌──────────────────────────────┐          ┌──────────────────────────────┐
//!   │       DataStorage<T>         │          │         DataCache<T>         │
//!   │   (crate::store::traits)     │◄─────────│                              │
//!   │                              │ extends  │  max_cache_size()            │
//!   │  data_exists(id)             │          │  set_max_cache_size(n)       │
//!   │  load_data(id) → Option<T>   │          │  current_cache_size()        │
//!   │  save_data(&T) → bool        │          │  free_space()                │
//!   │  data_is_storable(&T)        │          │  has_storage_for(n)          │
//!   │  delete_data(&T) → bool      │          │  cache_data(T)               │
//!   └──────────────────────────────┘          │  uncache_data(&T)            │
//!                                             │  data_is_cachable(&T)        │
//!                                             │  data_is_in_cache(id)        │
//!                                             │  clear_cache()               │
//!                                             └──────────────────────────────┘
//! ```
//!
//! A cache is itself a storage tier: loads consult the cache first and fall
//! back to the wrapped tier, saves write through. This lets caches be stacked
//! and lets callers hold a `dyn DataStorage<T>` without caring whether a
//! cache is in front of the disk.
//!
//! ## Budget Accounting
//!
//! [`Cachable::byte_size`] is the only unit of accounting. The cache never
//! measures an item itself, so the declared size must stay fixed for the
//! lifetime of the item.

use crate::error::Result;
use crate::store::traits::DataStorage;

/// Minimal capability an item needs to be held by a cache.
///
/// # Example
///
/// ```
/// use tiercache::traits::Cachable;
///
/// #[derive(Clone)]
/// struct Thumbnail {
///     id: u64,
///     pixels: Vec<u8>,
/// }
///
/// impl Cachable for Thumbnail {
///     fn id(&self) -> u64 {
///         self.id
///     }
///
///     fn byte_size(&self) -> u64 {
///         self.pixels.len() as u64
///     }
/// }
///
/// let t = Thumbnail { id: 7, pixels: vec![0; 64] };
/// assert_eq!(t.id(), 7);
/// assert_eq!(t.byte_size(), 64);
/// ```
pub trait Cachable {
    /// Unique, immutable identifier of the item.
    fn id(&self) -> u64;

    /// Declared size in bytes, fixed at construction.
    fn byte_size(&self) -> u64;
}

impl<T: Cachable + ?Sized> Cachable for std::sync::Arc<T> {
    #[inline]
    fn id(&self) -> u64 {
        (**self).id()
    }

    #[inline]
    fn byte_size(&self) -> u64 {
        (**self).byte_size()
    }
}

/// Operations of a byte-bounded cache in front of a [`DataStorage`] tier.
///
/// All methods take `&self`; implementations synchronize internally so a
/// single instance can be shared across request-handling threads.
pub trait DataCache<T: Cachable>: DataStorage<T> {
    /// Maximum number of bytes the cache may hold.
    fn max_cache_size(&self) -> u64;

    /// Changes the byte budget, evicting entries until the new budget holds.
    ///
    /// Returns [`CacheError::InvalidArgument`](crate::error::CacheError) for a
    /// zero budget.
    fn set_max_cache_size(&self, max_bytes: u64) -> Result<()>;

    /// Sum of the declared sizes of all cached entries.
    fn current_cache_size(&self) -> u64;

    /// Bytes left before the budget is reached.
    fn free_space(&self) -> u64 {
        self.max_cache_size()
            .saturating_sub(self.current_cache_size())
    }

    /// Returns `true` if strictly more than `bytes` are free.
    fn has_storage_for(&self, bytes: u64) -> bool {
        self.free_space() > bytes
    }

    /// Admits `item` if the caching rule accepts it, it is not already cached,
    /// and it can ever fit. Evicts entries as needed. Never fails.
    fn cache_data(&self, item: T);

    /// Drops the entry with `item`'s id, if present.
    fn uncache_data(&self, item: &T);

    /// Evaluates the caching rule.
    fn data_is_cachable(&self, item: &T) -> bool;

    /// Returns `true` if an entry with `id` is cached. Does not mark it used.
    fn data_is_in_cache(&self, id: u64) -> bool;

    /// Drops every entry and resets the size counter.
    fn clear_cache(&self);
}
