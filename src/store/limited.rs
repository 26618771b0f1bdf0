//! Disk tier with a fixed number of file slots.
//!
//! Ids map onto `capacity` physical files by `id % capacity`. Several ids
//! can share a slot, so the store remembers which id currently owns each
//! occupied slot:
//!
//! ```text
//!   capacity = 4
//!
//!   id:    3     8     12    5
//!          │     │     │     │
//!   slot:  3     0     0 ✗   1         12 collides with 8: refused (no-op)
//!
//!   occupancy: { 0 → 8, 1 → 5, 3 → 3 }
//!
//!   working_dir/
//!     ├── 0   (item 8)
//!     ├── 1   (item 5)
//!     └── 3   (item 3)
//! ```
//!
//! - A save into a slot owned by another id is a successful no-op; the first
//!   owner keeps the slot until it is deleted.
//! - A load for an id that does not own its slot misses, so a colliding id
//!   never reads another item's bytes.
//! - Once every slot is occupied, further saves are successful no-ops.
//!
//! Locks are taken per slot, so ids sharing a slot serialize their I/O. The
//! ownership check and the file access happen under the same slot lock.

use std::fmt;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::{debug, error};

use crate::error::{CacheError, Result};
use crate::store::drive::{DriveStorage, WriteMode, WriteOutcome};
use crate::store::traits::{DataStorage, ItemCodec};
use crate::traits::Cachable;

/// Default number of slots.
pub const DEFAULT_MAX_FILES_ON_DRIVE: u64 = 10;

/// Slot-bounded disk storage tier.
pub struct LimitedDriveStorage<T, C> {
    drive: DriveStorage<T, C>,
    capacity: u64,
    occupancy: Mutex<FxHashMap<u64, u64>>,
}

impl<T, C> LimitedDriveStorage<T, C>
where
    T: Cachable,
    C: ItemCodec<T>,
{
    /// Opens a store under `working_dir` holding at most `capacity` files.
    ///
    /// Returns [`CacheError::InvalidArgument`] if `capacity` is zero.
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use tiercache::image::{ImageCodec, ImageDb, ImageSize, StoreImage};
    /// use tiercache::rules;
    /// use tiercache::store::{DataStorage, LimitedDriveStorage};
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let db = Arc::new(ImageDb::new());
    /// let store =
    ///     LimitedDriveStorage::new(dir.path(), ImageCodec::new(db), rules::store_all, 2).unwrap();
    ///
    /// for id in 0..5 {
    ///     assert!(store.save_data(&StoreImage::new(id, vec![1, 2, 3], ImageSize::FULL)));
    /// }
    /// assert_eq!(store.files_on_drive(), 2);
    /// ```
    pub fn new(
        working_dir: impl Into<PathBuf>,
        codec: C,
        storage_rule: impl Fn(&T) -> bool + Send + Sync + 'static,
        capacity: u64,
    ) -> Result<Self> {
        if capacity == 0 {
            error!("Maximum number of files on drive must be positive");
            return Err(CacheError::invalid_argument(
                "maximum number of files on drive must be positive",
            ));
        }
        let drive = DriveStorage::new(working_dir, codec, storage_rule)?;
        Ok(Self {
            drive,
            capacity,
            occupancy: Mutex::new(FxHashMap::default()),
        })
    }

    /// Number of slots.
    pub fn max_files_on_drive(&self) -> u64 {
        self.capacity
    }

    /// Number of occupied slots.
    pub fn files_on_drive(&self) -> u64 {
        self.occupancy.lock().len() as u64
    }

    pub fn working_dir(&self) -> &Path {
        self.drive.working_dir()
    }

    #[inline]
    fn slot_of(&self, id: u64) -> u64 {
        id % self.capacity
    }

    fn owns_slot(&self, id: u64) -> bool {
        self.occupancy.lock().get(&self.slot_of(id)) == Some(&id)
    }
}

impl<T, C> DataStorage<T> for LimitedDriveStorage<T, C>
where
    T: Cachable,
    C: ItemCodec<T>,
{
    fn data_exists(&self, id: u64) -> bool {
        let slot = self.slot_of(id);
        self.drive
            .with_slot_read(slot, || self.owns_slot(id) && self.drive.slot_exists(slot))
    }

    fn load_data(&self, id: u64) -> Option<T> {
        let slot = self.slot_of(id);
        self.drive.with_slot_read(slot, || {
            if !self.owns_slot(id) {
                return None;
            }
            self.drive.read_slot_file(slot, id)
        })
    }

    fn save_data(&self, item: &T) -> bool {
        if !self.drive.rule_accepts(item) {
            return true;
        }
        let id = item.id();
        let slot = self.slot_of(id);

        // Ownership is recorded only after the file holds `id`
        self.drive.with_slot_write(slot, || {
            match self.occupancy.lock().get(&slot) {
                Some(&owner) if owner == id => return true,
                Some(&owner) => {
                    debug!("Slot {} held by item {}, not storing item {}", slot, owner, id);
                    return true;
                },
                None => {},
            }

            // Stale files from an earlier owner are replaced
            match self.drive.write_slot_file(slot, item, WriteMode::Replace) {
                WriteOutcome::Written | WriteOutcome::AlreadyPresent => {
                    self.occupancy.lock().insert(slot, id);
                    true
                },
                WriteOutcome::Failed => false,
            }
        })
    }

    fn data_is_storable(&self, item: &T) -> bool {
        self.drive.rule_accepts(item)
    }

    fn delete_data(&self, item: &T) -> bool {
        let id = item.id();
        let slot = self.slot_of(id);
        self.drive.with_slot_write(slot, || {
            if !self.owns_slot(id) {
                return true;
            }
            if !self.drive.delete_slot_file(slot) {
                return false;
            }
            self.occupancy.lock().remove(&slot);
            true
        })
    }
}

impl<T, C> fmt::Debug for LimitedDriveStorage<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LimitedDriveStorage")
            .field("drive", &self.drive)
            .field("capacity", &self.capacity)
            .field("files_on_drive", &self.occupancy.lock().len())
            .finish()
    }
}
