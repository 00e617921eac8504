//! The two randomness sources used by the simulation.
//!
//! [`SeededRandom`] drives every decision that affects growth and must be consumed identically by
//! all replicas of a scene. [`CosmeticRandom`] feeds decisions whose call count depends on which
//! cracks a replica happens to draw, so it is entropy-seeded and never touches the seeded stream.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Deterministic, portable stream seeded from a scene seed.
#[derive(Clone, Debug)]
pub struct SeededRandom {
    seed: u64,
    rng: ChaCha8Rng,
}

impl SeededRandom {
    /// Create a stream positioned at the start of `seed`'s sequence.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// The seed this stream was created from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform float in `[0, 1)`.
    pub fn next_float(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    /// Uniform float in `[min, max)`. Returns `min` for an empty range.
    pub fn next_range(&mut self, min: f64, max: f64) -> f64 {
        let t = self.next_float();
        if max <= min {
            return min;
        }
        min + (max - min) * t
    }

    /// Fair coin flip.
    pub fn next_boolean(&mut self) -> bool {
        self.next_float() < 0.5
    }

    /// Uniform index in `[0, len)`. `len` must be non-zero.
    pub fn next_index(&mut self, len: usize) -> usize {
        let i = self.next_range(0.0, len as f64).trunc() as usize;
        i.min(len.saturating_sub(1))
    }
}

/// Entropy-seeded, thread-local stream for cosmetic jitter.
#[derive(Debug, Default, Clone, Copy)]
pub struct CosmeticRandom;

impl CosmeticRandom {
    /// Uniform float in `[min, max)`.
    pub fn range(self, min: f64, max: f64) -> f64 {
        if max <= min {
            return min;
        }
        rand::rng().random_range(min..max)
    }
}

/// Derive a scene seed from a human-readable phrase.
pub fn seed_from_str(text: &str) -> u64 {
    xxhash_rust::xxh3::xxh3_64(text.as_bytes())
}
