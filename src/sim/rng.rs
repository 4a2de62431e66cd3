//! Seedable random source for the simulation
//!
//! All randomness in a tick (spawn direction, size, course deviation) flows
//! through [`RandomSource`], so a fixed seed replays an identical episode and
//! tests can substitute scripted draws.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::consts::MIN_DIRECTION_LENGTH_SQ;

/// Uniform random draws used by the simulation
pub trait RandomSource {
    /// Uniform sample in [0, 1)
    fn unit(&mut self) -> f32;

    /// Uniform sample in [min, max]
    fn range(&mut self, min: f32, max: f32) -> f32 {
        if max <= min {
            return min;
        }
        min + (max - min) * self.unit()
    }

    /// Uniform point inside the unit disc (may be the origin)
    fn in_unit_disc(&mut self) -> Vec2 {
        loop {
            let p = Vec2::new(self.range(-1.0, 1.0), self.range(-1.0, 1.0));
            if p.length_squared() <= 1.0 {
                return p;
            }
        }
    }

    /// Uniform unit direction.
    ///
    /// Samples the disc and normalizes; a sample too close to the origin to
    /// normalize is drawn again rather than producing a zero or NaN vector.
    fn unit_direction(&mut self) -> Vec2 {
        loop {
            let p = self.in_unit_disc();
            if p.length_squared() > MIN_DIRECTION_LENGTH_SQ {
                return p.normalize();
            }
        }
    }
}

/// PCG-backed random source with its seed kept for logging and replays
#[derive(Debug, Clone)]
pub struct SimRng {
    seed: u64,
    rng: Pcg32,
}

impl SimRng {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl RandomSource for SimRng {
    fn unit(&mut self) -> f32 {
        self.rng.random::<f32>()
    }
}

/// Replays a fixed list of unit samples, cycling when exhausted
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct ScriptedRng {
    values: Vec<f32>,
    cursor: usize,
}

#[cfg(test)]
impl ScriptedRng {
    pub fn new(values: Vec<f32>) -> Self {
        assert!(!values.is_empty(), "scripted rng needs at least one value");
        Self { values, cursor: 0 }
    }
}

#[cfg(test)]
impl RandomSource for ScriptedRng {
    fn unit(&mut self) -> f32 {
        let v = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        v
    }
}
