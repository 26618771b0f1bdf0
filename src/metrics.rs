//! Cache counters.
//!
//! Counters are relaxed atomics bumped on the hot path; [`CacheMetrics`] is a
//! plain snapshot for logging or export. Counters only grow; `clear_cache`
//! does not reset them.

use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of cache activity since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheMetrics {
    /// Loads served from memory.
    pub hits: u64,
    /// Loads not found in memory.
    pub misses: u64,
    /// Misses answered by the storage tier.
    pub storage_hits: u64,
    /// Items that entered the cache.
    pub admissions: u64,
    /// Items refused by the caching rule or for not fitting.
    pub refusals: u64,
    /// Entries removed to make room.
    pub evictions: u64,
}

impl CacheMetrics {
    /// Fraction of loads served from memory, or `0.0` before the first load.
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    storage_hits: AtomicU64,
    admissions: AtomicU64,
    refusals: AtomicU64,
    evictions: AtomicU64,
}

impl CacheCounters {
    pub(crate) fn snapshot(&self) -> CacheMetrics {
        CacheMetrics {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            storage_hits: self.storage_hits.load(Ordering::Relaxed),
            admissions: self.admissions.load(Ordering::Relaxed),
            refusals: self.refusals.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn inc_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_storage_hit(&self) {
        self.storage_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_admission(&self) {
        self.admissions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_refusal(&self) {
        self.refusals.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_increments() {
        let counters = CacheCounters::default();
        counters.inc_hit();
        counters.inc_hit();
        counters.inc_miss();
        counters.inc_storage_hit();
        counters.inc_admission();
        counters.inc_refusal();
        counters.inc_eviction();

        assert_eq!(
            counters.snapshot(),
            CacheMetrics {
                hits: 2,
                misses: 1,
                storage_hits: 1,
                admissions: 1,
                refusals: 1,
                evictions: 1,
            }
        );
    }

    #[test]
    fn hit_ratio() {
        assert_eq!(CacheMetrics::default().hit_ratio(), 0.0);
        let m = CacheMetrics {
            hits: 3,
            misses: 1,
            ..CacheMetrics::default()
        };
        assert!((m.hit_ratio() - 0.75).abs() < f64::EPSILON);
    }
}
