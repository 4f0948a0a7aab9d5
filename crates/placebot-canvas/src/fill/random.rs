use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::PositionSequence;

/// Smallest modulus the generator will use, so the parameter ranges are never empty.
const MIN_MODULUS: u64 = 8;

/// Pseudo-random permutation of the box built on a full-period LCG.
///
/// The modulus `m` is a power of two no smaller than the cell count, the
/// multiplier is `1 mod 4` and the increment is odd, so the generator
/// cycles through all of `[0, m)` before repeating. Values past the cell
/// count are rejected, leaving every cell visited exactly once.
/// Parameters are redrawn on each reset, so every traversal has a new order.
#[derive(Debug, Clone)]
pub struct RandomFill {
    rng: StdRng,
    width: u64,
    len: u64,
    state: u64,
    multiplier: u64,
    increment: u64,
    modulus: u64,
    remaining: u64,
}

impl Default for RandomFill {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomFill {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Use a caller-provided RNG, e.g. a seeded one for reproducible orders.
    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            rng,
            width: 0,
            len: 0,
            state: 0,
            multiplier: 1,
            increment: 1,
            modulus: MIN_MODULUS,
            remaining: 0,
        }
    }

    fn step(&self, x: u64) -> u64 {
        self.multiplier
            .wrapping_mul(x)
            .wrapping_add(self.increment)
            & (self.modulus - 1)
    }
}

impl PositionSequence for RandomFill {
    fn reset(&mut self, width: usize, height: usize) {
        let len = (width * height) as u64;
        let m = len.next_power_of_two().max(MIN_MODULUS);

        let increment = (m / 6 + self.rng.random_range(0..m * 5 / 6)) | 1;
        let multiplier = 4 * self.rng.random_range(m / 24..m / 4) + 1;
        let seed = self.rng.random_range(0..m);

        self.width = width as u64;
        self.len = len;
        self.state = seed;
        self.multiplier = multiplier;
        self.increment = increment;
        self.modulus = m;
        self.remaining = len;
    }

    fn next(&mut self) -> Option<(usize, usize)> {
        if self.remaining == 0 {
            return None;
        }

        let mut x = self.step(self.state);
        while x >= self.len {
            x = self.step(x);
        }

        self.state = x;
        self.remaining -= 1;
        Some(((x % self.width) as usize, (x / self.width) as usize))
    }
}
