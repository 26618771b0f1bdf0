//! Eviction policies for [`BoundedCache`](crate::cache::BoundedCache).
//!
//! A policy never owns entries. It keeps an index over entry ids and answers
//! one question: which id should go next. The cache calls the hooks below
//! while holding its write lock, so policies need no synchronization of their
//! own.
//!
//! | Policy         | Victim                          | Entry metadata  |
//! |----------------|---------------------------------|-----------------|
//! | [`FifoPolicy`]   | oldest admitted               | [`SimpleMeta`]  |
//! | [`LifoPolicy`]   | newest admitted               | [`SimpleMeta`]  |
//! | [`RandomPolicy`] | uniformly random              | [`SimpleMeta`]  |
//! | [`LruPolicy`]    | smallest `last_used_nanos`    | [`TimedMeta`]   |
//! | [`MruPolicy`]    | largest `last_used_nanos`     | [`TimedMeta`]   |
//! | [`LfuPolicy`]    | smallest `use_count`          | [`CountedMeta`] |
//!
//! ## Tie-breaking
//!
//! Ordered policies rank by `(metric, admission sequence)`. Policies that
//! evict the minimum (FIFO, LRU, LFU) therefore pick the earliest-admitted
//! entry among equal metrics; policies that evict the maximum (LIFO, MRU)
//! pick the latest-admitted. Random eviction is reproducible through
//! [`RandomPolicy::with_seed`].
//!
//! [`SimpleMeta`]: crate::entry::SimpleMeta
//! [`TimedMeta`]: crate::entry::TimedMeta
//! [`CountedMeta`]: crate::entry::CountedMeta

use crate::entry::EntryMeta;

pub mod fifo;
pub mod lfu;
pub mod lifo;
pub mod lru;
pub mod mru;
pub mod random;

mod ranked;

pub use fifo::FifoPolicy;
pub use lfu::LfuPolicy;
pub use lifo::LifoPolicy;
pub use lru::LruPolicy;
pub use mru::MruPolicy;
pub use random::RandomPolicy;

/// Selection rule deciding which cached entry to sacrifice.
///
/// # Contract
///
/// - Every id passed to [`on_admit`](Self::on_admit) is tracked until it is
///   returned by [`pop_victim`](Self::pop_victim), passed to
///   [`on_remove`](Self::on_remove), or [`clear`](Self::clear) is called.
/// - `pop_victim` stops tracking the id it returns and returns `None` only
///   when nothing is tracked. The cache relies on this to bound its eviction
///   loop.
pub trait EvictionPolicy: Send + Sync {
    /// Metadata the policy reads from entries.
    type Meta: EntryMeta;

    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Whether hits change the eviction order. Policies returning `false`
    /// let the cache serve hits under its read lock.
    fn reorders_on_hit(&self) -> bool {
        true
    }

    /// A new entry was admitted.
    fn on_admit(&mut self, id: u64, meta: &Self::Meta);

    /// A cached entry was hit; `meta` already reflects the hit.
    fn on_hit(&mut self, id: u64, meta: &Self::Meta);

    /// An entry left the cache for a reason other than eviction.
    fn on_remove(&mut self, id: u64);

    /// Chooses the next victim and stops tracking it.
    fn pop_victim(&mut self) -> Option<u64>;

    /// Forgets every tracked id.
    fn clear(&mut self);

    /// Number of tracked ids.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
