//! Lingering areas (icy patch, poison puddle).
//!
//! An area grows from `initial_radius` to `max_radius` over `growth_duration`, and every
//! `tick_interval` runs one resolution with a fresh exclusion set: the hostile team is
//! harmed (damage and/or chill), the allied team is mended. It expires after `duration`.

use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;
use serde::{Deserialize, Serialize};

use crate::common::error::{ensure_ordered, ensure_positive, ConfigError};
use crate::common::state::GameState;
use crate::plugins::combat::{DamageEvent, ExclusionSet, HitResolver, PendingDespawn, StatusPayload, Team};
use crate::plugins::spatial::{AvianSpatial, SpatialQueries};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AreaSpec {
    pub duration: f32,
    pub initial_radius: f32,
    pub max_radius: f32,
    pub growth_duration: f32,
    pub tick_interval: f32,
    #[serde(default)]
    pub damage: f32,
    #[serde(default)]
    pub chill: Option<f32>,
    #[serde(default)]
    pub mend: f32,
}

impl AreaSpec {
    pub fn icy_patch() -> Self {
        Self {
            duration: 5.0,
            initial_radius: 1.5,
            max_radius: 1.5,
            growth_duration: 0.0,
            tick_interval: 1.0,
            damage: 0.0,
            chill: Some(20.0),
            mend: 0.0,
        }
    }

    pub fn poison_puddle() -> Self {
        Self {
            duration: 8.0,
            initial_radius: 0.5,
            max_radius: 5.0,
            growth_duration: 0.5,
            tick_interval: 1.0,
            damage: 5.0,
            chill: None,
            mend: 3.0,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("area duration", self.duration)?;
        ensure_positive("area tick_interval", self.tick_interval)?;
        ensure_positive("area max_radius", self.max_radius)?;
        ensure_ordered("area radius", self.initial_radius, self.max_radius)
    }

    /// Radius `age` seconds after placement.
    pub fn radius_at(&self, age: f32) -> f32 {
        if self.growth_duration <= 0.0 || age >= self.growth_duration {
            return self.max_radius;
        }
        let t = (age / self.growth_duration).clamp(0.0, 1.0);
        let s = t * t * (3.0 - 2.0 * t);
        self.initial_radius + (self.max_radius - self.initial_radius) * s
    }

    #[inline]
    fn harms(&self) -> bool {
        self.damage > 0.0 || self.chill.is_some()
    }
}

#[derive(Component, Debug, Clone)]
pub struct AreaEffect {
    pub spec: AreaSpec,
    pub team: Team,
    pub source: Option<Entity>,
    age: f32,
    since_tick: f32,
}

impl AreaEffect {
    pub fn new(spec: AreaSpec, team: Team, source: Option<Entity>) -> Self {
        Self { spec, team, source, age: 0.0, since_tick: 0.0 }
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.spec.radius_at(self.age)
    }

    #[inline]
    pub fn age(&self) -> f32 {
        self.age
    }

    /// Advance the clock. Returns `(expired, tick_due)`.
    pub fn advance(&mut self, dt: f32) -> (bool, bool) {
        self.age += dt;
        self.since_tick += dt;
        if self.age >= self.spec.duration {
            return (true, false);
        }
        if self.since_tick >= self.spec.tick_interval {
            self.since_tick -= self.spec.tick_interval;
            return (false, true);
        }
        (false, false)
    }
}

pub fn spawn_area(commands: &mut Commands, spec: AreaSpec, team: Team, source: Option<Entity>, at: Vec3) -> Entity {
    commands
        .spawn((
            Name::new("AreaEffect"),
            AreaEffect::new(spec, team, source),
            Transform::from_translation(at),
            DespawnOnExit(GameState::InGame),
        ))
        .id()
}

/// One area tick: harm hostiles, mend allies. Returns `(harmed, mended)`.
pub fn pulse(
    spatial: &impl SpatialQueries,
    resolver: &mut HitResolver,
    area: &AreaEffect,
    center: Vec3,
) -> (usize, usize) {
    let radius = area.radius();
    let spec = area.spec;
    let mut harmed = 0;
    let mut mended = 0;

    if spec.harms() {
        let mut exclusion = ExclusionSet::new();
        for target in spatial.overlap_sphere(center, radius, area.team.hostiles()) {
            let event = DamageEvent::new(area.source, target.entity, spec.damage).with_status(spec.chill.map(StatusPayload::Chill));
            if resolver.resolve(event, &mut exclusion).landed() {
                harmed += 1;
            }
        }
    }

    if spec.mend > 0.0 {
        let mut exclusion = ExclusionSet::new();
        for target in spatial.overlap_sphere(center, radius, area.team.allies()) {
            if resolver.heal(target.entity, spec.mend, &mut exclusion) {
                mended += 1;
            }
        }
    }

    (harmed, mended)
}

pub fn tick_areas(
    time: Res<Time<Fixed>>,
    spatial: AvianSpatial,
    mut resolver: HitResolver,
    mut commands: Commands,
    mut q: Query<(Entity, &mut AreaEffect, &Transform), Without<PendingDespawn>>,
) {
    let dt = time.delta_secs();

    for (entity, mut area, tf) in &mut q {
        let (expired, due) = area.advance(dt);
        if expired {
            commands.entity(entity).insert(PendingDespawn);
            continue;
        }
        if due {
            let (harmed, mended) = pulse(&spatial, &mut resolver, &area, tf.translation);
            if harmed + mended > 0 {
                debug!(?entity, harmed, mended, "area pulse");
            }
        }
    }
}
