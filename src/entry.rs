//! Cache entry wrappers carrying eviction metadata.
//!
//! A [`CacheEntry`] exclusively owns one item for as long as it lives in a
//! cache and decorates it with whatever the active eviction policy needs to
//! rank it:
//!
//! | Alias            | Metadata      | `was_used()` effect                   |
//! |------------------|---------------|---------------------------------------|
//! | [`SimpleEntry`]  | [`SimpleMeta`]  | nothing                             |
//! | [`CountedEntry`] | [`CountedMeta`] | atomically increments `use_count`   |
//! | [`TimedEntry`]   | [`TimedMeta`]   | stores a fresh [`monotonic_nanos`]  |
//!
//! `was_used()` is called exactly once per observed cache hit, never on a
//! miss or an eviction.
//!
//! Absence of the wrapped item is unrepresentable: an entry can only be built
//! from an owned item.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Instant;

use once_cell::sync::Lazy;

use crate::traits::Cachable;

static CLOCK_ANCHOR: Lazy<Instant> = Lazy::new(Instant::now);
static LAST_READING: AtomicI64 = AtomicI64::new(i64::MIN);

/// Process-wide monotonic clock in nanoseconds.
///
/// Readings are strictly increasing across all threads, so two timed entries
/// never share a timestamp even on coarse clocks.
pub fn monotonic_nanos() -> i64 {
    let now = i64::try_from(CLOCK_ANCHOR.elapsed().as_nanos()).unwrap_or(i64::MAX);
    let mut prev = LAST_READING.load(Ordering::Relaxed);
    loop {
        let next = if now > prev { now } else { prev.saturating_add(1) };
        match LAST_READING.compare_exchange_weak(prev, next, Ordering::AcqRel, Ordering::Relaxed)
        {
            Ok(_) => return next,
            Err(actual) => prev = actual,
        }
    }
}

/// Policy-specific metadata attached to each entry.
pub trait EntryMeta: Send + Sync {
    /// Metadata for a freshly admitted entry.
    fn fresh() -> Self;

    /// Records one cache hit.
    fn was_used(&self);
}

/// No metadata; used by insertion-order and random policies.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SimpleMeta;

impl EntryMeta for SimpleMeta {
    #[inline]
    fn fresh() -> Self {
        SimpleMeta
    }

    #[inline]
    fn was_used(&self) {}
}

/// Hit counter; used by LFU.
#[derive(Debug, Default)]
pub struct CountedMeta {
    use_count: AtomicU64,
}

impl CountedMeta {
    /// Number of hits recorded so far.
    #[inline]
    pub fn use_count(&self) -> u64 {
        self.use_count.load(Ordering::Acquire)
    }
}

impl EntryMeta for CountedMeta {
    #[inline]
    fn fresh() -> Self {
        Self::default()
    }

    #[inline]
    fn was_used(&self) {
        self.use_count.fetch_add(1, Ordering::AcqRel);
    }
}

/// Last-use timestamp; used by LRU and MRU.
#[derive(Debug)]
pub struct TimedMeta {
    last_used: AtomicI64,
}

impl TimedMeta {
    /// Clock reading taken at admission or at the latest hit.
    #[inline]
    pub fn last_used_nanos(&self) -> i64 {
        self.last_used.load(Ordering::Acquire)
    }
}

impl EntryMeta for TimedMeta {
    #[inline]
    fn fresh() -> Self {
        Self {
            last_used: AtomicI64::new(monotonic_nanos()),
        }
    }

    #[inline]
    fn was_used(&self) {
        self.last_used.store(monotonic_nanos(), Ordering::Release);
    }
}

/// An owned item plus eviction metadata.
///
/// Equality is by item id, which is how the cache detects duplicates.
///
/// # Example
///
/// ```
/// use tiercache::entry::CountedEntry;
/// use tiercache::image::{ImageSize, StoreImage};
///
/// let image = StoreImage::new(1, vec![0u8; 16], ImageSize::FULL);
/// let entry = CountedEntry::new(image);
/// entry.was_used();
/// entry.was_used();
/// assert_eq!(entry.use_count(), 2);
/// assert_eq!(entry.byte_size(), 16);
/// ```
#[derive(Debug)]
pub struct CacheEntry<T, M> {
    item: T,
    meta: M,
}

/// Entry without metadata.
pub type SimpleEntry<T> = CacheEntry<T, SimpleMeta>;
/// Entry counting its hits.
pub type CountedEntry<T> = CacheEntry<T, CountedMeta>;
/// Entry remembering when it was last used.
pub type TimedEntry<T> = CacheEntry<T, TimedMeta>;

impl<T: Cachable, M: EntryMeta> CacheEntry<T, M> {
    /// Wraps `item` with fresh metadata.
    #[inline]
    pub fn new(item: T) -> Self {
        Self {
            item,
            meta: M::fresh(),
        }
    }

    /// Borrows the owned item.
    #[inline]
    pub fn data(&self) -> &T {
        &self.item
    }

    /// Consumes the entry, returning the item.
    #[inline]
    pub fn into_data(self) -> T {
        self.item
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.item.id()
    }

    #[inline]
    pub fn byte_size(&self) -> u64 {
        self.item.byte_size()
    }

    /// Records a cache hit on this entry.
    #[inline]
    pub fn was_used(&self) {
        self.meta.was_used();
    }

    #[inline]
    pub fn meta(&self) -> &M {
        &self.meta
    }
}

impl<T: Cachable> CacheEntry<T, CountedMeta> {
    #[inline]
    pub fn use_count(&self) -> u64 {
        self.meta.use_count()
    }
}

impl<T: Cachable> CacheEntry<T, TimedMeta> {
    #[inline]
    pub fn last_used_nanos(&self) -> i64 {
        self.meta.last_used_nanos()
    }
}

impl<T: Cachable, M> PartialEq for CacheEntry<T, M> {
    fn eq(&self, other: &Self) -> bool {
        self.item.id() == other.item.id()
    }
}

impl<T: Cachable, M> Eq for CacheEntry<T, M> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Dummy {
        id: u64,
        size: u64,
    }

    impl Cachable for Dummy {
        fn id(&self) -> u64 {
            self.id
        }

        fn byte_size(&self) -> u64 {
            self.size
        }
    }

    fn dummy(id: u64) -> Dummy {
        Dummy { id, size: 10 }
    }

    mod clock {
        use super::*;

        #[test]
        fn readings_strictly_increase() {
            let mut prev = monotonic_nanos();
            for _ in 0..1_000 {
                let next = monotonic_nanos();
                assert!(next > prev);
                prev = next;
            }
        }

        #[test]
        fn readings_unique_across_threads() {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    std::thread::spawn(|| (0..500).map(|_| monotonic_nanos()).collect::<Vec<_>>())
                })
                .collect();
            let mut all: Vec<i64> = handles
                .into_iter()
                .flat_map(|h| h.join().unwrap())
                .collect();
            let total = all.len();
            all.sort_unstable();
            all.dedup();
            assert_eq!(all.len(), total);
        }
    }

    mod simple_entry {
        use super::*;

        #[test]
        fn forwards_item_capability() {
            let entry = SimpleEntry::new(Dummy { id: 4, size: 99 });
            assert_eq!(entry.id(), 4);
            assert_eq!(entry.byte_size(), 99);
            assert_eq!(entry.data(), &Dummy { id: 4, size: 99 });
        }

        #[test]
        fn was_used_is_noop() {
            let entry = SimpleEntry::new(dummy(1));
            entry.was_used();
            assert_eq!(entry.meta(), &SimpleMeta);
        }

        #[test]
        fn into_data_returns_item() {
            let entry = SimpleEntry::new(dummy(2));
            assert_eq!(entry.into_data(), dummy(2));
        }
    }

    mod counted_entry {
        use super::*;

        #[test]
        fn starts_at_zero() {
            let entry = CountedEntry::new(dummy(1));
            assert_eq!(entry.use_count(), 0);
        }

        #[test]
        fn counts_each_use() {
            let entry = CountedEntry::new(dummy(1));
            for _ in 0..5 {
                entry.was_used();
            }
            assert_eq!(entry.use_count(), 5);
        }

        #[test]
        fn concurrent_uses_are_not_lost() {
            let entry = std::sync::Arc::new(CountedEntry::new(dummy(1)));
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let entry = entry.clone();
                    std::thread::spawn(move || {
                        for _ in 0..1_000 {
                            entry.was_used();
                        }
                    })
                })
                .collect();
            for h in handles {
                h.join().unwrap();
            }
            assert_eq!(entry.use_count(), 8_000);
        }
    }

    mod timed_entry {
        use super::*;

        #[test]
        fn stamped_at_construction() {
            let before = monotonic_nanos();
            let entry = TimedEntry::new(dummy(1));
            assert!(entry.last_used_nanos() > before);
        }

        #[test]
        fn was_used_refreshes_timestamp() {
            let entry = TimedEntry::new(dummy(1));
            let first = entry.last_used_nanos();
            entry.was_used();
            assert!(entry.last_used_nanos() > first);
        }

        #[test]
        fn later_entries_are_newer() {
            let a = TimedEntry::new(dummy(1));
            let b = TimedEntry::new(dummy(2));
            assert!(a.last_used_nanos() < b.last_used_nanos());
        }
    }

    #[test]
    fn equality_is_by_id() {
        let a = SimpleEntry::new(Dummy { id: 1, size: 10 });
        let b = SimpleEntry::new(Dummy { id: 1, size: 20 });
        let c = SimpleEntry::new(Dummy { id: 2, size: 10 });
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
