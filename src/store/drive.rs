//! Unbounded disk tier: one file per item, named by its decimal id.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────┐
//!   │                      DriveStorage<T, C>                          │
//!   │                                                                  │
//!   │   storage_rule ──► save_data accepts?  no ─► true (no-op)        │
//!   │                                                                  │
//!   │   locks: KeyedLocks          working_dir/                        │
//!   │   ┌──────┬─────────┐           ├── 17      ◄── codec.encode(17)  │
//!   │   │  17  │ RwLock  │──────────►├── 42                          │
//!   │   │  42  │ RwLock  │           └── 99                          │
//!   │   └──────┴─────────┘                                             │
//!   └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Reads of one id share its lock; writes and deletes take it exclusively.
//! Different ids never contend beyond the lock table itself.
//!
//! ## Semantics
//!
//! | Operation      | Returns                                               |
//! |----------------|-------------------------------------------------------|
//! | `save_data`    | `true` if rejected by the rule, already on disk, or   |
//! |                | written; `false` on I/O failure                       |
//! | `load_data`    | `None` if missing, unreadable, or undecodable         |
//! | `delete_data`  | `true` if the file is gone afterwards                 |
//!
//! Existing files are never rewritten: an id's record is immutable once
//! saved, and a second save of the same id leaves the file untouched.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{CacheError, Result};
use crate::store::locks::KeyedLocks;
use crate::store::traits::{DataStorage, ItemCodec, ItemRule};
use crate::traits::Cachable;

/// Result of writing one slot file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WriteOutcome {
    Written,
    AlreadyPresent,
    Failed,
}

/// How a slot write treats an existing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WriteMode {
    /// Leave an existing file untouched.
    CreateNew,
    /// Truncate and rewrite an existing file.
    Replace,
}

/// Disk-backed storage tier.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tiercache::image::{ImageCodec, ImageDb, ImageSize, StoreImage};
/// use tiercache::rules;
/// use tiercache::store::{DataStorage, DriveStorage};
///
/// let dir = tempfile::tempdir().unwrap();
/// let db = Arc::new(ImageDb::new());
/// db.set_image_size(5, ImageSize::FULL);
///
/// let store = DriveStorage::new(dir.path(), ImageCodec::new(db), rules::store_all).unwrap();
/// let image = StoreImage::new(5, b"png-bytes".to_vec(), ImageSize::FULL);
///
/// assert!(store.save_data(&image));
/// assert!(store.data_exists(5));
/// assert_eq!(store.load_data(5).unwrap().bytes(), b"png-bytes");
/// ```
pub struct DriveStorage<T, C> {
    working_dir: PathBuf,
    codec: C,
    storage_rule: ItemRule<T>,
    locks: KeyedLocks,
}

impl<T, C> DriveStorage<T, C>
where
    T: Cachable,
    C: ItemCodec<T>,
{
    /// Opens a store under `working_dir`, creating the directory if needed.
    pub fn new(
        working_dir: impl Into<PathBuf>,
        codec: C,
        storage_rule: impl Fn(&T) -> bool + Send + Sync + 'static,
    ) -> Result<Self> {
        let working_dir = working_dir.into();
        fs::create_dir_all(&working_dir).map_err(|source| CacheError::Io {
            path: working_dir.clone(),
            source,
        })?;
        info!("Disk storage opened at {}", working_dir.display());
        Ok(Self {
            working_dir,
            codec,
            storage_rule: Arc::new(storage_rule),
            locks: KeyedLocks::new(),
        })
    }

    /// Directory holding the item files.
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub(crate) fn slot_path(&self, slot: u64) -> PathBuf {
        self.working_dir.join(slot.to_string())
    }

    pub(crate) fn slot_exists(&self, slot: u64) -> bool {
        self.slot_path(slot).is_file()
    }

    /// Runs `f` under the shared lock of `slot`.
    pub(crate) fn with_slot_read<R>(&self, slot: u64, f: impl FnOnce() -> R) -> R {
        self.locks.with_read(slot, f)
    }

    /// Runs `f` under the exclusive lock of `slot`.
    pub(crate) fn with_slot_write<R>(&self, slot: u64, f: impl FnOnce() -> R) -> R {
        self.locks.with_write(slot, f)
    }

    /// Reads the file in `slot` and decodes it as item `id`.
    pub(crate) fn load_slot(&self, slot: u64, id: u64) -> Option<T> {
        self.with_slot_read(slot, || self.read_slot_file(slot, id))
    }

    /// Writes `item` into `slot` under the slot's exclusive lock.
    pub(crate) fn write_slot(&self, slot: u64, item: &T, mode: WriteMode) -> WriteOutcome {
        self.with_slot_write(slot, || self.write_slot_file(slot, item, mode))
    }

    /// Removes the file in `slot`. Returns `true` if it is gone afterwards.
    pub(crate) fn delete_slot(&self, slot: u64) -> bool {
        self.with_slot_write(slot, || self.delete_slot_file(slot))
    }

    /// Caller holds at least the shared lock of `slot`.
    pub(crate) fn read_slot_file(&self, slot: u64, id: u64) -> Option<T> {
        let path = self.slot_path(slot);
        match fs::read(&path) {
            Ok(bytes) => {
                let item = self.codec.decode(id, bytes);
                if item.is_none() {
                    debug!("File {} could not be decoded as item {}", path.display(), id);
                }
                item
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!("Failed to read {} from disk: {}", path.display(), e);
                None
            },
        }
    }

    /// Caller holds the exclusive lock of `slot`.
    pub(crate) fn write_slot_file(&self, slot: u64, item: &T, mode: WriteMode) -> WriteOutcome {
        let path = self.slot_path(slot);
        let bytes = self.codec.encode(item);
        let mut options = OpenOptions::new();
        options.write(true);
        match mode {
            WriteMode::CreateNew => options.create_new(true),
            WriteMode::Replace => options.create(true).truncate(true),
        };

        let result = options.open(&path).and_then(|mut file| {
            file.write_all(&bytes)?;
            file.flush()
        });
        match result {
            Ok(()) => WriteOutcome::Written,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => WriteOutcome::AlreadyPresent,
            Err(e) => {
                warn!("Failed to write {} to disk: {}", path.display(), e);
                // Do not leave a truncated record behind
                let _ = fs::remove_file(&path);
                WriteOutcome::Failed
            },
        }
    }

    /// Caller holds the exclusive lock of `slot`.
    pub(crate) fn delete_slot_file(&self, slot: u64) -> bool {
        let path = self.slot_path(slot);
        match fs::remove_file(&path) {
            Ok(()) => true,
            Err(e) if e.kind() == io::ErrorKind::NotFound => true,
            Err(e) => {
                warn!("Failed to delete {} from disk: {}", path.display(), e);
                false
            },
        }
    }

    pub(crate) fn rule_accepts(&self, item: &T) -> bool {
        (self.storage_rule)(item)
    }
}

impl<T, C> DataStorage<T> for DriveStorage<T, C>
where
    T: Cachable,
    C: ItemCodec<T>,
{
    fn data_exists(&self, id: u64) -> bool {
        self.slot_exists(id)
    }

    fn load_data(&self, id: u64) -> Option<T> {
        self.load_slot(id, id)
    }

    fn save_data(&self, item: &T) -> bool {
        if !self.rule_accepts(item) {
            return true;
        }
        let id = item.id();
        if self.slot_exists(id) {
            return true;
        }
        self.write_slot(id, item, WriteMode::CreateNew) != WriteOutcome::Failed
    }

    fn data_is_storable(&self, item: &T) -> bool {
        self.rule_accepts(item)
    }

    fn delete_data(&self, item: &T) -> bool {
        self.delete_slot(item.id())
    }
}

impl<T, C> fmt::Debug for DriveStorage<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriveStorage")
            .field("working_dir", &self.working_dir)
            .field("locks_in_use", &self.locks.len())
            .finish_non_exhaustive()
    }
}
