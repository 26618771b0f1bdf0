//! Storage tiers behind a cache.
//!
//! | Tier                    | Persistence                  | Capacity           |
//! |-------------------------|------------------------------|--------------------|
//! | [`NoStorage`]           | none                         | n/a                |
//! | [`DriveStorage`]        | one file per id              | unbounded          |
//! | [`LimitedDriveStorage`] | one file per `id % capacity` | `capacity` files   |
//!
//! Disk tiers serialize I/O per file through [`KeyedLocks`] and turn every
//! runtime I/O failure into a `false` / `None` result.

pub mod drive;
pub mod limited;
pub mod locks;
pub mod none;
pub mod traits;

pub use drive::DriveStorage;
pub use limited::{LimitedDriveStorage, DEFAULT_MAX_FILES_ON_DRIVE};
pub use locks::KeyedLocks;
pub use none::NoStorage;
pub use traits::{DataStorage, ItemCodec, ItemRule};
