//! Runtime selection of the eviction policy and storage tier.
//!
//! [`BoundedCache`] is generic over its policy, which is what you want when
//! the policy is known at compile time. Services that pick the policy from
//! configuration use [`Cache`] instead: one type wrapping any of the six
//! policies, or no cache at all, behind the same [`DataCache`] /
//! [`DataStorage`] API.
//!
//! ## Example
//!
//! ```rust
//! use tiercache::builder::{CacheBuilder, CachePolicy};
//! use tiercache::image::{ImageSize, StoreImage};
//! use tiercache::store::DataStorage;
//! use tiercache::traits::DataCache;
//!
//! let cache = CacheBuilder::<StoreImage>::new(1024).build(CachePolicy::Lru).unwrap();
//! cache.cache_data(StoreImage::new(1, vec![0; 100], ImageSize::FULL));
//! assert!(cache.load_data(1).is_some());
//! assert_eq!(cache.policy_name(), "LRU");
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::info;

use crate::cache::BoundedCache;
use crate::config::{CacheConfig, CachingMode, StorageMode};
use crate::error::{CacheError, Result};
use crate::image::{ImageCodec, ImageDb, StoreImage};
use crate::metrics::CacheMetrics;
use crate::policy::{FifoPolicy, LfuPolicy, LifoPolicy, LruPolicy, MruPolicy, RandomPolicy};
use crate::rules;
use crate::store::drive::DriveStorage;
use crate::store::limited::LimitedDriveStorage;
use crate::store::none::NoStorage;
use crate::store::traits::{DataStorage, ItemCodec, ItemRule};
use crate::traits::{Cachable, DataCache};

/// Available eviction policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// First In, First Out eviction.
    Fifo,
    /// Last In, First Out eviction.
    Lifo,
    /// Uniformly random eviction; `seed` makes the sequence reproducible.
    Random { seed: Option<u64> },
    /// Least Recently Used eviction.
    Lru,
    /// Most Recently Used eviction.
    Mru,
    /// Least Frequently Used eviction.
    Lfu,
    /// No cache; every call goes straight to storage.
    Disabled,
}

impl From<CachingMode> for CachePolicy {
    fn from(mode: CachingMode) -> Self {
        match mode {
            CachingMode::Fifo => CachePolicy::Fifo,
            CachingMode::Lifo => CachePolicy::Lifo,
            CachingMode::Rr => CachePolicy::Random { seed: None },
            CachingMode::Lfu => CachePolicy::Lfu,
            CachingMode::Lru => CachePolicy::Lru,
            CachingMode::Mru => CachePolicy::Mru,
            CachingMode::None => CachePolicy::Disabled,
        }
    }
}

/// Cache whose policy was chosen at runtime.
pub struct Cache<T, S = NoStorage> {
    inner: CacheInner<T, S>,
}

enum CacheInner<T, S> {
    Fifo(BoundedCache<T, FifoPolicy, S>),
    Lifo(BoundedCache<T, LifoPolicy, S>),
    Random(BoundedCache<T, RandomPolicy, S>),
    Lru(BoundedCache<T, LruPolicy, S>),
    Mru(BoundedCache<T, MruPolicy, S>),
    Lfu(BoundedCache<T, LfuPolicy, S>),
    Disabled(S),
}

/// Runs `$cached` against whichever `BoundedCache` is inside, or `$disabled`
/// against the bare storage.
macro_rules! dispatch {
    ($self:expr, $c:ident => $cached:expr, $s:ident => $disabled:expr) => {
        match &$self.inner {
            CacheInner::Fifo($c) => $cached,
            CacheInner::Lifo($c) => $cached,
            CacheInner::Random($c) => $cached,
            CacheInner::Lru($c) => $cached,
            CacheInner::Mru($c) => $cached,
            CacheInner::Lfu($c) => $cached,
            CacheInner::Disabled($s) => $disabled,
        }
    };
}

impl<T, S> Cache<T, S>
where
    T: Cachable + Clone + Send + Sync + 'static,
    S: DataStorage<T>,
{
    /// Name of the eviction policy, `"Disabled"` without a cache.
    pub fn policy_name(&self) -> &'static str {
        dispatch!(self, c => c.policy_name(), _s => CachingMode::None.as_str())
    }

    /// Returns `true` if a cache sits in front of the storage.
    pub fn is_enabled(&self) -> bool {
        !matches!(self.inner, CacheInner::Disabled(_))
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        dispatch!(self, c => c.len(), _s => 0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn metrics(&self) -> CacheMetrics {
        dispatch!(self, c => c.metrics(), _s => CacheMetrics::default())
    }

    /// The storage tier behind the cache.
    pub fn storage(&self) -> &S {
        dispatch!(self, c => c.storage(), s => s)
    }
}

impl<T, S> DataCache<T> for Cache<T, S>
where
    T: Cachable + Clone + Send + Sync + 'static,
    S: DataStorage<T>,
{
    fn max_cache_size(&self) -> u64 {
        dispatch!(self, c => c.max_cache_size(), _s => 0)
    }

    fn set_max_cache_size(&self, max_bytes: u64) -> Result<()> {
        dispatch!(self, c => c.set_max_cache_size(max_bytes), _s => {
            if max_bytes == 0 {
                Err(CacheError::invalid_argument("cache size must be positive"))
            } else {
                Ok(())
            }
        })
    }

    fn current_cache_size(&self) -> u64 {
        dispatch!(self, c => c.current_cache_size(), _s => 0)
    }

    fn free_space(&self) -> u64 {
        dispatch!(self, c => c.free_space(), _s => 0)
    }

    fn cache_data(&self, item: T) {
        dispatch!(self, c => c.cache_data(item), _s => drop(item))
    }

    fn uncache_data(&self, item: &T) {
        dispatch!(self, c => c.uncache_data(item), _s => {})
    }

    fn data_is_cachable(&self, item: &T) -> bool {
        dispatch!(self, c => c.data_is_cachable(item), _s => false)
    }

    fn data_is_in_cache(&self, id: u64) -> bool {
        dispatch!(self, c => c.data_is_in_cache(id), _s => false)
    }

    fn clear_cache(&self) {
        dispatch!(self, c => c.clear_cache(), _s => {})
    }
}

impl<T, S> DataStorage<T> for Cache<T, S>
where
    T: Cachable + Clone + Send + Sync + 'static,
    S: DataStorage<T>,
{
    fn data_exists(&self, id: u64) -> bool {
        dispatch!(self, c => c.data_exists(id), s => s.data_exists(id))
    }

    fn load_data(&self, id: u64) -> Option<T> {
        dispatch!(self, c => c.load_data(id), s => s.load_data(id))
    }

    fn save_data(&self, item: &T) -> bool {
        dispatch!(self, c => c.save_data(item), s => s.save_data(item))
    }

    fn data_is_storable(&self, item: &T) -> bool {
        dispatch!(self, c => c.data_is_storable(item), s => s.data_is_storable(item))
    }

    fn delete_data(&self, item: &T) -> bool {
        dispatch!(self, c => c.delete_data(item), s => s.delete_data(item))
    }
}

impl<T, S> fmt::Debug for Cache<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner: &dyn fmt::Debug = match &self.inner {
            CacheInner::Fifo(c) => c,
            CacheInner::Lifo(c) => c,
            CacheInner::Random(c) => c,
            CacheInner::Lru(c) => c,
            CacheInner::Mru(c) => c,
            CacheInner::Lfu(c) => c,
            CacheInner::Disabled(_) => &"Disabled",
        };
        f.debug_tuple("Cache").field(inner).finish()
    }
}

/// Builder for creating cache instances.
pub struct CacheBuilder<T, S = NoStorage> {
    max_bytes: u64,
    caching_rule: ItemRule<T>,
    storage: S,
}

impl<T> CacheBuilder<T, NoStorage>
where
    T: Cachable + Clone + Send + Sync + 'static,
{
    /// Starts a builder for a cache of `max_bytes`, admitting everything and
    /// backed by no storage.
    pub fn new(max_bytes: u64) -> Self {
        Self {
            max_bytes,
            caching_rule: Arc::new(rules::cache_all::<T>),
            storage: NoStorage,
        }
    }
}

impl<T, S> CacheBuilder<T, S>
where
    T: Cachable + Clone + Send + Sync + 'static,
    S: DataStorage<T>,
{
    /// Sets the admission predicate.
    pub fn caching_rule(mut self, rule: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        self.caching_rule = Arc::new(rule);
        self
    }

    /// Puts `storage` behind the cache.
    pub fn storage<S2: DataStorage<T>>(self, storage: S2) -> CacheBuilder<T, S2> {
        CacheBuilder {
            max_bytes: self.max_bytes,
            caching_rule: self.caching_rule,
            storage,
        }
    }

    /// Builds a cache with the specified policy.
    ///
    /// Fails with [`CacheError::InvalidArgument`] on a zero budget unless the
    /// policy is [`CachePolicy::Disabled`].
    ///
    /// # Example
    ///
    /// ```rust
    /// use tiercache::builder::{CacheBuilder, CachePolicy};
    /// use tiercache::image::StoreImage;
    ///
    /// // LFU cache
    /// let cache = CacheBuilder::<StoreImage>::new(100).build(CachePolicy::Lfu).unwrap();
    ///
    /// // Reproducible random eviction
    /// let cache = CacheBuilder::<StoreImage>::new(100)
    ///     .build(CachePolicy::Random { seed: Some(7) })
    ///     .unwrap();
    ///
    /// // Images under 1 KiB only
    /// let cache = CacheBuilder::<StoreImage>::new(100)
    ///     .caching_rule(|img: &StoreImage| img.bytes().len() < 1024)
    ///     .build(CachePolicy::Fifo)
    ///     .unwrap();
    /// ```
    pub fn build(self, policy: CachePolicy) -> Result<Cache<T, S>> {
        let Self {
            max_bytes,
            caching_rule,
            storage,
        } = self;
        let inner = match policy {
            CachePolicy::Fifo => CacheInner::Fifo(BoundedCache::from_parts(
                storage,
                max_bytes,
                caching_rule,
                FifoPolicy::new(),
            )?),
            CachePolicy::Lifo => CacheInner::Lifo(BoundedCache::from_parts(
                storage,
                max_bytes,
                caching_rule,
                LifoPolicy::new(),
            )?),
            CachePolicy::Random { seed } => {
                let policy = match seed {
                    Some(seed) => RandomPolicy::with_seed(seed),
                    None => RandomPolicy::new(),
                };
                CacheInner::Random(BoundedCache::from_parts(
                    storage,
                    max_bytes,
                    caching_rule,
                    policy,
                )?)
            },
            CachePolicy::Lru => CacheInner::Lru(BoundedCache::from_parts(
                storage,
                max_bytes,
                caching_rule,
                LruPolicy::new(),
            )?),
            CachePolicy::Mru => CacheInner::Mru(BoundedCache::from_parts(
                storage,
                max_bytes,
                caching_rule,
                MruPolicy::new(),
            )?),
            CachePolicy::Lfu => CacheInner::Lfu(BoundedCache::from_parts(
                storage,
                max_bytes,
                caching_rule,
                LfuPolicy::new(),
            )?),
            CachePolicy::Disabled => {
                info!("Caching disabled, serving directly from storage");
                CacheInner::Disabled(storage)
            },
        };

        Ok(Cache { inner })
    }
}

/// Disk tier chosen at runtime.
pub enum StorageTier<T, C> {
    Drive(DriveStorage<T, C>),
    DriveLimited(LimitedDriveStorage<T, C>),
}

impl<T, C> DataStorage<T> for StorageTier<T, C>
where
    T: Cachable,
    C: ItemCodec<T>,
{
    fn data_exists(&self, id: u64) -> bool {
        match self {
            StorageTier::Drive(s) => s.data_exists(id),
            StorageTier::DriveLimited(s) => s.data_exists(id),
        }
    }

    fn load_data(&self, id: u64) -> Option<T> {
        match self {
            StorageTier::Drive(s) => s.load_data(id),
            StorageTier::DriveLimited(s) => s.load_data(id),
        }
    }

    fn save_data(&self, item: &T) -> bool {
        match self {
            StorageTier::Drive(s) => s.save_data(item),
            StorageTier::DriveLimited(s) => s.save_data(item),
        }
    }

    fn data_is_storable(&self, item: &T) -> bool {
        match self {
            StorageTier::Drive(s) => s.data_is_storable(item),
            StorageTier::DriveLimited(s) => s.data_is_storable(item),
        }
    }

    fn delete_data(&self, item: &T) -> bool {
        match self {
            StorageTier::Drive(s) => s.delete_data(item),
            StorageTier::DriveLimited(s) => s.delete_data(item),
        }
    }
}

impl<T, C> fmt::Debug for StorageTier<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageTier::Drive(s) => f.debug_tuple("Drive").field(s).finish(),
            StorageTier::DriveLimited(s) => f.debug_tuple("DriveLimited").field(s).finish(),
        }
    }
}

/// The cache the image service runs with.
pub type ImageCache = Cache<StoreImage, StorageTier<StoreImage, ImageCodec>>;

/// Assembles the image cache described by `config`.
///
/// Image files live under `config.working_dir`; their sizes are looked up in
/// `db` when read back.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tiercache::builder::build_image_cache;
/// use tiercache::config::CacheConfig;
/// use tiercache::image::{ImageDb, ImageKey, ImageSize, StoreImage};
/// use tiercache::store::DataStorage;
/// use tiercache::traits::DataCache;
///
/// let dir = tempfile::tempdir().unwrap();
/// let config = CacheConfig {
///     working_dir: dir.path().to_path_buf(),
///     ..CacheConfig::default()
/// };
/// let db = Arc::new(ImageDb::new());
/// let cache = build_image_cache(&config, Arc::clone(&db)).unwrap();
///
/// db.set_image_mapping(ImageKey::Product(3), 30, ImageSize::FULL);
/// cache.save_data(&StoreImage::new(30, vec![7; 64], ImageSize::FULL));
/// cache.clear_cache();
///
/// // Served from disk, then cached again
/// let id = db.image_id(&ImageKey::Product(3), ImageSize::FULL).unwrap();
/// assert_eq!(cache.load_data(id).unwrap().bytes(), &[7; 64][..]);
/// assert!(cache.data_is_in_cache(id));
/// ```
pub fn build_image_cache(config: &CacheConfig, db: Arc<ImageDb>) -> Result<ImageCache> {
    config.validate()?;

    let codec = ImageCodec::new(db);
    let rule = config.storage_rule;
    let accepts = move |image: &StoreImage| rule.accepts(image);
    let storage = match config.storage_mode {
        StorageMode::Drive => {
            StorageTier::Drive(DriveStorage::new(&config.working_dir, codec, accepts)?)
        },
        StorageMode::DriveLimited => StorageTier::DriveLimited(LimitedDriveStorage::new(
            &config.working_dir,
            codec,
            accepts,
            config.max_images_on_drive,
        )?),
    };

    let cache = CacheBuilder::new(config.cache_size)
        .storage(storage)
        .build(config.caching_mode.into())?;
    info!("Image cache ready: {}", config);
    Ok(cache)
}
