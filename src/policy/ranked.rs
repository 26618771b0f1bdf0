//! Ordered id index shared by the rank-based policies.
//!
//! ```text
//!   positions: FxHashMap<id, (rank, seq)>      order: BTreeSet<(rank, seq, id)>
//!
//!   ┌──────┬────────────┐                      first ─► (1, 0, 7)
//!   │  7   │ (1, 0)     │──────────────────────►        (1, 2, 9)
//!   │  9   │ (1, 2)     │──────────────────────►        (4, 1, 8)  ◄─ last
//!   │  8   │ (4, 1)     │──────────────────────►
//!   └──────┴────────────┘
//! ```
//!
//! `seq` is assigned once at admission and survives re-ranking, so entries
//! with equal rank stay in admission order.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;

#[derive(Debug)]
pub(crate) struct RankedIndex<R> {
    order: BTreeSet<(R, u64, u64)>,
    positions: FxHashMap<u64, (R, u64)>,
    next_seq: u64,
}

impl<R: Ord + Copy> Default for RankedIndex<R> {
    fn default() -> Self {
        Self {
            order: BTreeSet::new(),
            positions: FxHashMap::default(),
            next_seq: 0,
        }
    }
}

impl<R: Ord + Copy> RankedIndex<R> {
    /// Tracks `id` with `rank`. Re-admitting a tracked id only re-ranks it.
    pub(crate) fn insert(&mut self, id: u64, rank: R) {
        if self.positions.contains_key(&id) {
            self.rerank(id, rank);
            return;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.positions.insert(id, (rank, seq));
        self.order.insert((rank, seq, id));
    }

    /// Moves `id` to `rank`, keeping its admission sequence.
    pub(crate) fn rerank(&mut self, id: u64, rank: R) {
        if let Some(pos) = self.positions.get_mut(&id) {
            let (old_rank, seq) = *pos;
            self.order.remove(&(old_rank, seq, id));
            self.order.insert((rank, seq, id));
            pos.0 = rank;
        }
    }

    pub(crate) fn remove(&mut self, id: u64) -> bool {
        match self.positions.remove(&id) {
            Some((rank, seq)) => self.order.remove(&(rank, seq, id)),
            None => false,
        }
    }

    pub(crate) fn pop_first(&mut self) -> Option<u64> {
        let (_, _, id) = self.order.pop_first()?;
        self.positions.remove(&id);
        Some(id)
    }

    pub(crate) fn pop_last(&mut self) -> Option<u64> {
        let (_, _, id) = self.order.pop_last()?;
        self.positions.remove(&id);
        Some(id)
    }

    pub(crate) fn clear(&mut self) {
        self.order.clear();
        self.positions.clear();
    }

    pub(crate) fn len(&self) -> usize {
        debug_assert_eq!(self.order.len(), self.positions.len());
        self.positions.len()
    }

    #[cfg(test)]
    pub(crate) fn rank_of(&self, id: u64) -> Option<R> {
        self.positions.get(&id).map(|&(rank, _)| rank)
    }
}
