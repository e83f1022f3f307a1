//! Per-instance deterministic random streams.
//!
//! Every spawner or lifecycle instance that needs randomness owns a
//! [`RandomStream`] inside its component data. There is no process-global
//! generator: two instances seeded alike produce identical sequences, and the
//! stream's position travels with the entity that owns it.
//!
//! # Determinism
//!
//! The generator is ChaCha8, seeded once from a stable per-instance seed. The
//! same seed and the same sequence of calls always give the same values, on
//! every platform.
//!
//! # Non-goals
//!
//! Not suitable for anything security-sensitive.

use std::f32::consts::TAU;

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;


/// Multiplier mixed into per-instance seeds so neighbouring indices diverge.
pub const SEED_SPREAD: u64 = 0xDBC19;

/// Seeded pseudo-random stream owned by a single component instance.
#[derive(Clone, Debug)]
pub struct RandomStream {
    rng: ChaCha8Rng,
}

impl RandomStream {
    /// Creates a stream from an explicit seed.
    pub fn from_seed(seed: u64) -> Self {
        Self { rng: ChaCha8Rng::seed_from_u64(seed) }
    }

    /// Derives a stream from a stable instance number such as an entity index.
    ///
    /// Instance 0 still receives a non-zero seed.
    pub fn for_instance(instance: u64) -> Self {
        Self::from_seed(SEED_SPREAD.wrapping_mul(instance.wrapping_add(1)))
    }

    /// Uniform sample in `[low, high)`; returns `low` for an empty range.
    pub fn range(&mut self, low: f32, high: f32) -> f32 {
        if high > low { self.rng.gen_range(low..high) } else { low }
    }

    /// Uniform unit vector in the XY plane.
    pub fn planar_direction(&mut self) -> Vec3 {
        let angle: f32 = self.rng.gen_range(0.0..TAU);
        Vec3::new(angle.cos(), angle.sin(), 0.0)
    }

    /// Raw 64-bit sample.
    pub fn next_u64(&mut self) -> u64 {
        self.rng.gen()
    }
}
