//! Storage tier that persists nothing.

use crate::store::traits::DataStorage;

/// Tier used when no persistence is configured. Every lookup misses and every
/// write reports failure.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NoStorage;

impl<T> DataStorage<T> for NoStorage {
    #[inline]
    fn data_exists(&self, _id: u64) -> bool {
        false
    }

    #[inline]
    fn load_data(&self, _id: u64) -> Option<T> {
        None
    }

    #[inline]
    fn save_data(&self, _item: &T) -> bool {
        false
    }

    #[inline]
    fn data_is_storable(&self, _item: &T) -> bool {
        false
    }

    #[inline]
    fn delete_data(&self, _item: &T) -> bool {
        false
    }
}
