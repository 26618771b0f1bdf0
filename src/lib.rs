//! tiercache: byte-bounded item caches with pluggable eviction over
//! memory and disk storage tiers.
//!
//! ```text
//!   load_data(id)
//!        │
//!        ▼
//!   ┌──────────────────────┐   miss   ┌──────────────────────────────┐
//!   │ BoundedCache<T, P>   │ ───────► │ DataStorage<T>               │
//!   │  budget in bytes     │ ◄─────── │  NoStorage / DriveStorage /  │
//!   │  EvictionPolicy P    │  fill    │  LimitedDriveStorage         │
//!   └──────────────────────┘          └──────────────────────────────┘
//! ```
//!
//! Pick a policy at compile time with [`cache::BoundedCache`], or at runtime
//! with [`builder::CacheBuilder`]. The image service assembles its cache from
//! a [`config::CacheConfig`] via [`builder::build_image_cache`].

pub mod builder;
pub mod cache;
pub mod config;
pub mod entry;
pub mod error;
pub mod image;
pub mod metrics;
pub mod policy;
pub mod prelude;
pub mod rules;
pub mod store;
pub mod traits;
