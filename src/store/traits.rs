//! Storage tier contracts.
//!
//! A storage tier is the authority consulted on a cache miss. It outlives the
//! in-memory entries and is written through on every save.
//!
//! Stores never return errors at runtime. An I/O failure degrades to `false`
//! or `None` so the cache keeps serving in a best-effort mode; the failure is
//! logged by the store that hit it.

use std::borrow::Cow;
use std::sync::Arc;

/// Key-value persistence keyed by item id.
pub trait DataStorage<T>: Send + Sync {
    /// Returns `true` if a record for `id` exists.
    fn data_exists(&self, id: u64) -> bool;

    /// Reads the record for `id`.
    fn load_data(&self, id: u64) -> Option<T>;

    /// Persists `item`. Returns `true` on success, including the no-op cases
    /// a store defines as success (rule rejection, record already present).
    fn save_data(&self, item: &T) -> bool;

    /// Evaluates the store's storage rule.
    fn data_is_storable(&self, item: &T) -> bool;

    /// Removes the record for `item`. Returns `true` if no record remains.
    fn delete_data(&self, item: &T) -> bool;
}

impl<T, S: DataStorage<T> + ?Sized> DataStorage<T> for Box<S> {
    fn data_exists(&self, id: u64) -> bool {
        (**self).data_exists(id)
    }

    fn load_data(&self, id: u64) -> Option<T> {
        (**self).load_data(id)
    }

    fn save_data(&self, item: &T) -> bool {
        (**self).save_data(item)
    }

    fn data_is_storable(&self, item: &T) -> bool {
        (**self).data_is_storable(item)
    }

    fn delete_data(&self, item: &T) -> bool {
        (**self).delete_data(item)
    }
}

impl<T, S: DataStorage<T> + ?Sized> DataStorage<T> for Arc<S> {
    fn data_exists(&self, id: u64) -> bool {
        (**self).data_exists(id)
    }

    fn load_data(&self, id: u64) -> Option<T> {
        (**self).load_data(id)
    }

    fn save_data(&self, item: &T) -> bool {
        (**self).save_data(item)
    }

    fn data_is_storable(&self, item: &T) -> bool {
        (**self).data_is_storable(item)
    }

    fn delete_data(&self, item: &T) -> bool {
        (**self).delete_data(item)
    }
}

/// Converts items to and from the bytes a disk store writes.
pub trait ItemCodec<T>: Send + Sync {
    /// Bytes to persist for `item`.
    fn encode<'a>(&self, item: &'a T) -> Cow<'a, [u8]>;

    /// Rebuilds the item with `id` from its file contents. `None` if the bytes
    /// cannot be turned back into an item.
    fn decode(&self, id: u64, bytes: Vec<u8>) -> Option<T>;
}

/// Predicate shared by caches and stores to accept or reject items.
pub type ItemRule<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;
