//! Sustained piercing beam.
//!
//! The beam belongs to its caster (`EffectOf`) and lives until the trigger is released,
//! the mode is switched, or the caster dies. Whoever owns the aim re-points it every tick
//! with [`Beam::aim`]; [`tick_beams`] then walks the pierce ray and applies damage at
//! `tick_rate`, each damage tick with a fresh exclusion set.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::common::error::{ensure_positive, ConfigError};
use crate::plugins::combat::{DamageEvent, EffectOf, ExclusionSet, HitResolver};
use crate::plugins::spatial::{AvianSpatial, SpatialQueries};
use crate::plugins::targeting::{resolve_pierce, PierceOutcome};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BeamSpec {
    pub damage_per_tick: f32,
    /// Damage ticks per second.
    pub tick_rate: f32,
    pub max_pierces: u32,
    pub max_range: f32,
    /// An aim point closer than this to the muzzle is ignored.
    pub min_aim_distance: f32,
}

impl Default for BeamSpec {
    fn default() -> Self {
        Self { damage_per_tick: 5.0, tick_rate: 10.0, max_pierces: 2, max_range: 100.0, min_aim_distance: 1.5 }
    }
}

impl BeamSpec {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("beam.tick_rate", self.tick_rate)?;
        ensure_positive("beam.max_range", self.max_range)
    }

    /// Beam direction from `muzzle` toward `aim_point`.
    ///
    /// Hugging a wall puts the aim point right at the muzzle, where the direction is
    /// meaningless; then the beam follows the aim ray out to `max_range` instead.
    pub fn direction(&self, muzzle: Vec3, aim_point: Vec3, aim_origin: Vec3, aim_direction: Dir3) -> Dir3 {
        let target = if muzzle.distance(aim_point) < self.min_aim_distance {
            aim_origin + *aim_direction * self.max_range
        } else {
            aim_point
        };
        Dir3::new(target - muzzle).unwrap_or(aim_direction)
    }
}

#[derive(Component, Debug, Clone)]
pub struct Beam {
    pub spec: BeamSpec,
    origin: Vec3,
    direction: Dir3,
    stop_point: Vec3,
    since_damage: f32,
}

impl Beam {
    pub fn new(spec: BeamSpec, origin: Vec3, direction: Dir3) -> Self {
        Self { spec, origin, direction, stop_point: origin + *direction * spec.max_range, since_damage: 0.0 }
    }

    pub fn aim(&mut self, origin: Vec3, direction: Dir3) {
        self.origin = origin;
        self.direction = direction;
    }

    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    #[inline]
    pub fn direction(&self) -> Dir3 {
        self.direction
    }

    /// Visible length after the last pierce walk.
    #[inline]
    pub fn length(&self) -> f32 {
        self.origin.distance(self.stop_point)
    }

    #[inline]
    pub fn stop_point(&self) -> Vec3 {
        self.stop_point
    }

    /// Walk the pierce ray from the current pose and clamp the visible length.
    pub fn sweep(&mut self, spatial: &impl SpatialQueries) -> PierceOutcome {
        let outcome = resolve_pierce(spatial, self.origin, self.direction, self.spec.max_range, self.spec.max_pierces);
        self.stop_point = outcome.stop_point;
        outcome
    }

    /// Advance the damage clock. True when a damage tick is due.
    pub fn damage_due(&mut self, dt: f32) -> bool {
        let interval = 1.0 / self.spec.tick_rate;
        self.since_damage += dt;
        if self.since_damage >= interval {
            self.since_damage -= interval;
            return true;
        }
        false
    }
}

pub fn tick_beams(
    time: Res<Time<Fixed>>,
    spatial: AvianSpatial,
    mut resolver: HitResolver,
    mut q: Query<(&mut Beam, &mut Transform, &EffectOf)>,
) {
    let dt = time.delta_secs();

    for (mut beam, mut tf, owner) in &mut q {
        let outcome = beam.sweep(&spatial);
        *tf = Transform::from_translation(beam.origin()).looking_to(*beam.direction(), Vec3::Y);

        if !beam.damage_due(dt) {
            continue;
        }
        let mut exclusion = ExclusionSet::new();
        for target in outcome.targets {
            resolver.resolve(DamageEvent::new(Some(owner.0), target, beam.spec.damage_per_tick), &mut exclusion);
        }
    }
}
