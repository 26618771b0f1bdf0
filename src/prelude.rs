pub use crate::builder::{
    build_image_cache, Cache, CacheBuilder, CachePolicy, ImageCache, StorageTier,
};
pub use crate::cache::BoundedCache;
pub use crate::config::{CacheConfig, CachingMode, StorageMode, StorageRule};
pub use crate::entry::{CacheEntry, CountedMeta, EntryMeta, SimpleMeta, TimedMeta};
pub use crate::error::{CacheError, ConfigError};
pub use crate::image::{ImageCodec, ImageDb, ImageKey, ImageSize, StoreImage};
pub use crate::metrics::CacheMetrics;
pub use crate::policy::{
    EvictionPolicy, FifoPolicy, LfuPolicy, LifoPolicy, LruPolicy, MruPolicy, RandomPolicy,
};
pub use crate::store::{
    DataStorage, DriveStorage, ItemCodec, ItemRule, LimitedDriveStorage, NoStorage,
};
pub use crate::traits::{Cachable, DataCache};
