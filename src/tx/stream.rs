//! Forkable seeded draw stream.
//!
//! The random transaction never records which positions it produced. Instead
//! it forks the live stream: a fork is an independent copy positioned at the
//! same draw, so replaying it yields exactly the draws the live stream made
//! (for eviction) or is about to make (for prefetch).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Uniform draws from `[left, left + range)`.
#[derive(Clone, Debug)]
pub struct DrawStream {
    rng: StdRng,
    left: u64,
    range: u64,
    pos: u64,
}

impl DrawStream {
    pub fn new(seed: u64, left: u64, range: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            left,
            range,
            pos: 0,
        }
    }

    /// Next position. A zero-width range always yields `left`.
    pub fn draw(&mut self) -> u64 {
        self.pos += 1;
        if self.range == 0 {
            return self.left;
        }
        self.left + self.rng.gen_range(0..self.range)
    }

    /// Independent stream positioned at the current draw.
    pub fn fork(&self) -> Self {
        self.clone()
    }

    /// Discard `n` draws.
    pub fn skip(&mut self, n: u64) {
        for _ in 0..n {
            self.draw();
        }
    }

    /// Draws made so far.
    pub fn position(&self) -> u64 {
        self.pos
    }

    pub fn bounds(&self) -> (u64, u64) {
        (self.left, self.left + self.range)
    }
}
