//! Random replacement policy.
//!
//! Victims are selected uniformly at random among the tracked entries. There
//! is no access-pattern tracking, which makes this the cheapest policy and a
//! common baseline.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  slots: FxHashMap<id, index>       ids: Vec<u64>                    │
//! │                                                                     │
//! │  ┌──────┬───────┐                  ┌─────┬─────┬─────┬─────┐        │
//! │  │  id  │ index │                  │  0  │  1  │  2  │  3  │        │
//! │  ├──────┼───────┤                  ├─────┼─────┼─────┼─────┤        │
//! │  │  17  │   0   │─────────────────►│ 17  │ 42  │  8  │ 99  │        │
//! │  │  42  │   1   │                  └─────┴─────┴─────┴─────┘        │
//! │  │   8  │   2   │                                                   │
//! │  │  99  │   3   │                                                   │
//! │  └──────┴───────┘                                                   │
//! └─────────────────────────────────────────────────────────────────────┘
//!
//!   pop_victim():
//!     1. i = rng.gen_range(0..len)
//!     2. swap ids[i] with ids[len - 1], fix the moved id's index
//!     3. pop the last id, drop it from `slots`
//! ```
//!
//! ## Operations
//!
//! | Operation     | Time  | Notes                            |
//! |---------------|-------|----------------------------------|
//! | `on_admit`    | O(1)  | push + map insert                |
//! | `on_hit`      | O(1)  | no-op                            |
//! | `on_remove`   | O(1)  | swap-remove                      |
//! | `pop_victim`  | O(1)  | swap-remove at a random index    |
//!
//! ## Reproducibility
//!
//! [`RandomPolicy::new`] seeds from OS entropy. Tests and benchmarks that need
//! a repeatable eviction sequence use [`RandomPolicy::with_seed`].

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;

use crate::entry::SimpleMeta;
use crate::policy::EvictionPolicy;

/// Policy evicting a uniformly random entry.
#[derive(Debug)]
pub struct RandomPolicy {
    /// Maps id to its position in `ids`
    slots: FxHashMap<u64, usize>,
    /// Dense array of ids for O(1) random access
    ids: Vec<u64>,
    rng: SmallRng,
}

impl RandomPolicy {
    /// Creates a policy seeded from OS entropy.
    pub fn new() -> Self {
        Self::from_rng(SmallRng::from_entropy())
    }

    /// Creates a policy whose eviction sequence is determined by `seed`.
    ///
    /// # Example
    ///
    /// ```
    /// use tiercache::entry::SimpleMeta;
    /// use tiercache::policy::{EvictionPolicy, RandomPolicy};
    ///
    /// let run = |seed| {
    ///     let mut policy = RandomPolicy::with_seed(seed);
    ///     for id in 0..16 {
    ///         policy.on_admit(id, &SimpleMeta);
    ///     }
    ///     std::iter::from_fn(|| policy.pop_victim()).collect::<Vec<_>>()
    /// };
    ///
    /// assert_eq!(run(42), run(42));
    /// ```
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(SmallRng::seed_from_u64(seed))
    }

    fn from_rng(rng: SmallRng) -> Self {
        Self {
            slots: FxHashMap::default(),
            ids: Vec::new(),
            rng,
        }
    }

    /// Reseeds the generator; already tracked ids are kept.
    pub fn set_seed(&mut self, seed: u64) {
        self.rng = SmallRng::seed_from_u64(seed);
    }

    fn swap_remove_at(&mut self, index: usize) -> u64 {
        let victim = self.ids.swap_remove(index);
        if let Some(&moved) = self.ids.get(index) {
            if let Some(slot) = self.slots.get_mut(&moved) {
                *slot = index;
            }
        }
        self.slots.remove(&victim);

        #[cfg(debug_assertions)]
        self.validate_invariants();

        victim
    }

    /// Checks that `slots` and `ids` describe the same set.
    #[cfg(debug_assertions)]
    fn validate_invariants(&self) {
        debug_assert_eq!(
            self.slots.len(),
            self.ids.len(),
            "slot map and id vector have different sizes"
        );
        for (&id, &index) in &self.slots {
            debug_assert!(index < self.ids.len(), "index out of bounds");
            debug_assert_eq!(self.ids[index], id, "slot points to wrong position");
        }
    }
}

impl Default for RandomPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl EvictionPolicy for RandomPolicy {
    type Meta = SimpleMeta;

    fn name(&self) -> &'static str {
        "RR"
    }

    fn reorders_on_hit(&self) -> bool {
        false
    }

    fn on_admit(&mut self, id: u64, _meta: &SimpleMeta) {
        if self.slots.contains_key(&id) {
            return;
        }
        self.slots.insert(id, self.ids.len());
        self.ids.push(id);
    }

    #[inline]
    fn on_hit(&mut self, _id: u64, _meta: &SimpleMeta) {}

    fn on_remove(&mut self, id: u64) {
        if let Some(&index) = self.slots.get(&id) {
            self.swap_remove_at(index);
        }
    }

    fn pop_victim(&mut self) -> Option<u64> {
        if self.ids.is_empty() {
            return None;
        }
        let index = self.rng.gen_range(0..self.ids.len());
        Some(self.swap_remove_at(index))
    }

    fn clear(&mut self) {
        self.slots.clear();
        self.ids.clear();
    }

    fn len(&self) -> usize {
        self.ids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn filled(seed: u64, n: u64) -> RandomPolicy {
        let mut policy = RandomPolicy::with_seed(seed);
        for id in 0..n {
            policy.on_admit(id, &SimpleMeta);
        }
        policy
    }

    mod basic_operations {
        use super::*;

        #[test]
        fn new_policy_is_empty() {
            let policy = RandomPolicy::new();
            assert!(policy.is_empty());
        }

        #[test]
        fn duplicate_admit_is_ignored() {
            let mut policy = RandomPolicy::with_seed(1);
            policy.on_admit(1, &SimpleMeta);
            policy.on_admit(1, &SimpleMeta);
            assert_eq!(policy.len(), 1);
        }

        #[test]
        fn remove_missing_is_noop() {
            let mut policy = filled(1, 3);
            policy.on_remove(99);
            assert_eq!(policy.len(), 3);
        }
    }

    mod eviction_behavior {
        use super::*;

        #[test]
        fn each_victim_is_returned_once() {
            let mut policy = filled(3, 100);
            let victims: Vec<_> = std::iter::from_fn(|| policy.pop_victim()).collect();
            let unique: HashSet<_> = victims.iter().copied().collect();
            assert_eq!(victims.len(), 100);
            assert_eq!(unique.len(), 100);
        }

        #[test]
        fn same_seed_same_sequence() {
            let mut a = filled(11, 32);
            let mut b = filled(11, 32);
            for _ in 0..32 {
                assert_eq!(a.pop_victim(), b.pop_victim());
            }
        }

        #[test]
        fn different_seeds_usually_differ() {
            let mut a = filled(1, 64);
            let mut b = filled(2, 64);
            let seq_a: Vec<_> = (0..8).filter_map(|_| a.pop_victim()).collect();
            let seq_b: Vec<_> = (0..8).filter_map(|_| b.pop_victim()).collect();
            assert_ne!(seq_a, seq_b);
        }

        #[test]
        fn set_seed_restarts_sequence() {
            let mut a = filled(0, 16);
            a.set_seed(5);
            let mut b = filled(0, 16);
            b.set_seed(5);
            assert_eq!(a.pop_victim(), b.pop_victim());
        }

        #[test]
        fn victims_are_spread_out() {
            // Each of 4 ids should be picked first at least once across many seeds
            let mut firsts = HashSet::new();
            for seed in 0..200 {
                let mut policy = filled(seed, 4);
                firsts.insert(policy.pop_victim().unwrap());
            }
            assert_eq!(firsts.len(), 4);
        }
    }

    #[test]
    fn removal_keeps_index_consistent() {
        let mut policy = filled(9, 10);
        for id in [0, 9, 4, 5] {
            policy.on_remove(id);
        }
        let rest: HashSet<_> = std::iter::from_fn(|| policy.pop_victim()).collect();
        assert_eq!(rest, HashSet::from([1, 2, 3, 6, 7, 8]));
    }
}
