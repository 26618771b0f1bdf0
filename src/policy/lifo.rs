//! LIFO (Last In, First Out) eviction.
//!
//! Implements a stack-based policy where the most recently admitted entry is
//! evicted first. This is the opposite of FIFO and keeps a long-lived base set
//! resident while newcomers churn on top of it.
//!
//! ```text
//!   Stack (bottom → top):  [A] [B] [C] [D]
//!                                       ▲
//!                                     EVICT (newest)
//! ```
//!
//! Hits do not move entries. Removing an entry from the middle of the stack
//! leaves the relative order of the rest intact.

use crate::entry::SimpleMeta;
use crate::policy::ranked::RankedIndex;
use crate::policy::EvictionPolicy;

/// Insertion-ordered policy evicting the newest entry.
#[derive(Debug, Default)]
pub struct LifoPolicy {
    stack: RankedIndex<()>,
}

impl LifoPolicy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EvictionPolicy for LifoPolicy {
    type Meta = SimpleMeta;

    fn name(&self) -> &'static str {
        "LIFO"
    }

    fn reorders_on_hit(&self) -> bool {
        false
    }

    #[inline]
    fn on_admit(&mut self, id: u64, _meta: &SimpleMeta) {
        self.stack.insert(id, ());
    }

    #[inline]
    fn on_hit(&mut self, _id: u64, _meta: &SimpleMeta) {}

    #[inline]
    fn on_remove(&mut self, id: u64) {
        self.stack.remove(id);
    }

    #[inline]
    fn pop_victim(&mut self) -> Option<u64> {
        self.stack.pop_last()
    }

    fn clear(&mut self) {
        self.stack.clear();
    }

    fn len(&self) -> usize {
        self.stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod lifo_behavior {
        use super::*;

        #[test]
        fn evicts_most_recently_admitted() {
            let mut policy = LifoPolicy::new();
            for id in 1..=4 {
                policy.on_admit(id, &SimpleMeta);
            }
            assert_eq!(policy.pop_victim(), Some(4));
            assert_eq!(policy.pop_victim(), Some(3));
        }

        #[test]
        fn oldest_survives_churn() {
            let mut policy = LifoPolicy::new();
            policy.on_admit(1, &SimpleMeta);
            for id in 2..50 {
                policy.on_admit(id, &SimpleMeta);
                assert_eq!(policy.pop_victim(), Some(id));
            }
            assert_eq!(policy.len(), 1);
            assert_eq!(policy.pop_victim(), Some(1));
        }

        #[test]
        fn removal_from_middle_keeps_stack_order() {
            let mut policy = LifoPolicy::new();
            for id in 1..=3 {
                policy.on_admit(id, &SimpleMeta);
            }
            policy.on_remove(2);
            assert_eq!(policy.pop_victim(), Some(3));
            assert_eq!(policy.pop_victim(), Some(1));
        }
    }

    #[test]
    fn empty_policy_has_no_victim() {
        let mut policy = LifoPolicy::new();
        assert_eq!(policy.pop_victim(), None);
    }
}
