//! RNG module - 7-bag random piece generation
//!
//! Implements the "7-bag" randomization algorithm used in modern Tetris.
//! The bag holds the kinds not yet handed out in the current 7-piece cycle;
//! every draw pops the front of the next queue and refills its back with one
//! kind removed uniformly at random from the bag. An empty bag is refilled
//! with all seven kinds.
//!
//! The queue starts as the first six kinds of a shuffled permutation and the
//! bag starts holding the seventh, so the very first seven draws are already
//! one full permutation.

use arrayvec::ArrayVec;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::types::{PieceKind, BAG_SIZE, NEXT_QUEUE_LEN};

pub type Bag = ArrayVec<PieceKind, BAG_SIZE>;

/// 7-bag piece generator with a fixed-length lookahead queue
#[derive(Debug, Clone)]
pub struct Randomizer {
    /// Kinds not yet queued in the current cycle
    bag: Bag,
    /// Upcoming kinds, front first
    next: [PieceKind; NEXT_QUEUE_LEN],
    rng: Pcg32,
}

impl Randomizer {
    /// Create a new randomizer with the given seed
    pub fn new(seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let (next, bag) = Self::initial_fill(&mut rng);
        Self { bag, next, rng }
    }

    fn initial_fill(rng: &mut Pcg32) -> ([PieceKind; NEXT_QUEUE_LEN], Bag) {
        let mut permutation = PieceKind::ALL;
        permutation.shuffle(rng);

        let mut next = [PieceKind::O; NEXT_QUEUE_LEN];
        next.copy_from_slice(&permutation[..NEXT_QUEUE_LEN]);
        let bag = permutation[NEXT_QUEUE_LEN..].iter().copied().collect();
        (next, bag)
    }

    /// Start a fresh sequence, continuing the same random stream.
    pub fn restart(&mut self) {
        let (next, bag) = Self::initial_fill(&mut self.rng);
        self.next = next;
        self.bag = bag;
    }

    /// Draw the next piece and refill the queue one-for-one
    pub fn draw(&mut self) -> PieceKind {
        let piece = self.next[0];
        self.next.copy_within(1.., 0);

        if self.bag.is_empty() {
            self.bag.extend(PieceKind::ALL);
        }
        let pick = self.rng.random_range(0..self.bag.len());
        self.next[NEXT_QUEUE_LEN - 1] = self.bag.remove(pick);

        piece
    }

    /// Peek at the next piece without removing it
    pub fn peek(&self) -> PieceKind {
        self.next[0]
    }

    /// The upcoming kinds, front first
    pub fn next_queue(&self) -> &[PieceKind; NEXT_QUEUE_LEN] {
        &self.next
    }

    /// Kinds remaining in the current bag cycle
    pub fn bag(&self) -> &[PieceKind] {
        &self.bag
    }

    /// Replace queue and bag (used when loading a saved game).
    pub(crate) fn set_state(&mut self, next: [PieceKind; NEXT_QUEUE_LEN], bag: Bag) {
        self.next = next;
        self.bag = bag;
    }
}

impl Default for Randomizer {
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn assert_permutation(draws: &[PieceKind]) {
        let set: HashSet<PieceKind> = draws.iter().copied().collect();
        assert_eq!(draws.len(), 7);
        assert_eq!(set.len(), 7, "repeat in {draws:?}");
    }

    #[test]
    fn test_randomizer_deterministic() {
        let mut a = Randomizer::new(12345);
        let mut b = Randomizer::new(12345);
        for _ in 0..50 {
            assert_eq!(a.draw(), b.draw());
        }
    }

    #[test]
    fn test_initial_state() {
        let rng = Randomizer::new(1);
        assert_eq!(rng.next_queue().len(), 6);
        assert_eq!(rng.bag().len(), 1);

        let mut all: Vec<PieceKind> = rng.next_queue().to_vec();
        all.extend_from_slice(rng.bag());
        assert_permutation(&all);
    }

    #[test]
    fn test_first_seven_draws_are_a_permutation() {
        let mut rng = Randomizer::new(99);
        let draws: Vec<PieceKind> = (0..7).map(|_| rng.draw()).collect();
        assert_permutation(&draws);
    }

    #[test]
    fn test_every_aligned_cycle_is_a_permutation() {
        let mut rng = Randomizer::new(7);
        for _ in 0..20 {
            let draws: Vec<PieceKind> = (0..7).map(|_| rng.draw()).collect();
            assert_permutation(&draws);
        }
    }

    #[test]
    fn test_peek_matches_draw() {
        let mut rng = Randomizer::new(3);
        for _ in 0..15 {
            let peeked = rng.peek();
            assert_eq!(rng.draw(), peeked);
            assert_eq!(rng.next_queue().len(), NEXT_QUEUE_LEN);
        }
    }

    #[test]
    fn test_queue_shifts_one_for_one() {
        let mut rng = Randomizer::new(5);
        let before = *rng.next_queue();
        rng.draw();
        assert_eq!(&rng.next_queue()[..5], &before[1..]);
    }

    #[test]
    fn test_restart_refills() {
        let mut rng = Randomizer::new(5);
        for _ in 0..4 {
            rng.draw();
        }
        rng.restart();
        let draws: Vec<PieceKind> = (0..7).map(|_| rng.draw()).collect();
        assert_permutation(&draws);
    }
}
