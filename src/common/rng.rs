//! Seeded randomness for aim inaccuracy and spread.
//!
//! Every random draw in the combat core goes through `CombatRng` so a run can be
//! replayed from its seed.

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Resource, Debug, Clone)]
pub struct CombatRng(StdRng);

impl CombatRng {
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }

    /// Uniform in `[-bound, bound]`. A non-positive bound always yields zero.
    pub fn symmetric(&mut self, bound: f32) -> f32 {
        if bound <= 0.0 {
            return 0.0;
        }
        self.0.gen_range(-bound..=bound)
    }

    /// Uniform point inside the unit ball (rejection sampled).
    pub fn in_unit_sphere(&mut self) -> Vec3 {
        loop {
            let p = Vec3::new(
                self.0.gen_range(-1.0..=1.0),
                self.0.gen_range(-1.0..=1.0),
                self.0.gen_range(-1.0..=1.0),
            );
            if p.length_squared() <= 1.0 {
                return p;
            }
        }
    }
}

impl Default for CombatRng {
    fn default() -> Self {
        Self::seeded(0x5EED_A2CA_4E00)
    }
}
