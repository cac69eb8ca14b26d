//! Message Queue
//!
//! No-repeat-until-exhausted draw of post templates. The queue holds
//! template indices into the catalog; when empty it is refilled with a
//! fresh uniform permutation of the whole catalog.

use std::collections::VecDeque;

use serde::{Serialize, Deserialize};

use crate::core::rng::DeterministicRng;

/// Shuffled draw-without-replacement buffer of template indices.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MessageQueue {
    pending: VecDeque<usize>,
}

impl MessageQueue {
    /// Create an empty queue. The first draw triggers a shuffle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw the next template index out of `template_count`.
    ///
    /// Returns `None` only when `template_count` is zero.
    pub fn next_post(&mut self, template_count: usize, rng: &mut DeterministicRng) -> Option<usize> {
        if self.pending.is_empty() {
            self.refill(template_count, rng);
        }
        self.pending.pop_front()
    }

    /// Number of templates left before the next reshuffle.
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    /// Drop any buffered draws.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Buffered indices in draw order (for hashing).
    pub fn pending(&self) -> impl Iterator<Item = usize> + '_ {
        self.pending.iter().copied()
    }

    fn refill(&mut self, template_count: usize, rng: &mut DeterministicRng) {
        let mut order: Vec<usize> = (0..template_count).collect();
        rng.shuffle(&mut order);
        self.pending = order.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_full_cycle_is_permutation() {
        let mut rng = DeterministicRng::new(7);
        let mut queue = MessageQueue::new();

        let drawn: Vec<usize> = (0..10).map(|_| queue.next_post(10, &mut rng).unwrap()).collect();
        let unique: BTreeSet<_> = drawn.iter().copied().collect();

        assert_eq!(unique.len(), 10);
        assert_eq!(queue.remaining(), 0);
    }

    #[test]
    fn test_refills_after_exhaustion() {
        let mut rng = DeterministicRng::new(7);
        let mut queue = MessageQueue::new();

        for _ in 0..3 {
            queue.next_post(3, &mut rng);
        }
        assert_eq!(queue.remaining(), 0);

        assert!(queue.next_post(3, &mut rng).is_some());
        assert_eq!(queue.remaining(), 2);
    }

    #[test]
    fn test_empty_catalog() {
        let mut rng = DeterministicRng::new(7);
        let mut queue = MessageQueue::new();
        assert_eq!(queue.next_post(0, &mut rng), None);
    }

    #[test]
    fn test_clear() {
        let mut rng = DeterministicRng::new(7);
        let mut queue = MessageQueue::new();
        queue.next_post(5, &mut rng);
        queue.clear();
        assert_eq!(queue.remaining(), 0);
    }
}
