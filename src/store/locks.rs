//! Per-key reader/writer locks created on demand.
//!
//! ```text
//!   table: Mutex<FxHashMap<key, Arc<RwLock<()>>>>
//!
//!   with_write(7, f):
//!     1. table.lock()  → get or insert lock for 7, clone the Arc, unlock
//!     2. lock.write()  → run f
//!     3. table.lock()  → drop the entry if only the table and we hold it
//! ```
//!
//! Operations on the same key are serialized (many readers or one writer);
//! operations on different keys only meet on the short table critical
//! section. Entries are pruned as soon as nobody holds them, so the table
//! never grows past the number of keys in flight.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;

#[derive(Debug, Default)]
pub struct KeyedLocks {
    table: Mutex<FxHashMap<u64, Arc<RwLock<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` while holding the shared lock for `key`.
    pub fn with_read<R>(&self, key: u64, f: impl FnOnce() -> R) -> R {
        let lock = self.acquire(key);
        let out = {
            let _guard = lock.read();
            f()
        };
        self.release(key, lock);
        out
    }

    /// Runs `f` while holding the exclusive lock for `key`.
    pub fn with_write<R>(&self, key: u64, f: impl FnOnce() -> R) -> R {
        let lock = self.acquire(key);
        let out = {
            let _guard = lock.write();
            f()
        };
        self.release(key, lock);
        out
    }

    /// Number of keys with a live lock.
    pub fn len(&self) -> usize {
        self.table.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn acquire(&self, key: u64) -> Arc<RwLock<()>> {
        let mut table = self.table.lock();
        Arc::clone(table.entry(key).or_default())
    }

    fn release(&self, key: u64, lock: Arc<RwLock<()>>) {
        let mut table = self.table.lock();
        // Clones are only made under the table mutex, so the count is stable here
        if Arc::strong_count(&lock) == 2 {
            table.remove(&key);
        }
    }
}
