//! Melee swing: windup, an active damage window, recovery.
//!
//! The hurt sphere is tested every tick of the active window, but one swing is one
//! exclusion-set lifetime, so a target standing in it is hit once.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::common::error::{ensure_positive, ConfigError};
use crate::plugins::combat::{DamageEvent, EffectOf, ExclusionSet, HitResolver, PendingDespawn, Team};
use crate::plugins::spatial::{AvianSpatial, SpatialQueries};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SwingSpec {
    pub damage: f32,
    pub windup: f32,
    pub active: f32,
    pub recovery: f32,
    /// Strike point distance in front of the caster.
    pub reach: f32,
    pub radius: f32,
}

impl Default for SwingSpec {
    fn default() -> Self {
        Self { damage: 40.0, windup: 0.05, active: 0.35, recovery: 0.1, reach: 1.5, radius: 0.5 }
    }
}

impl SwingSpec {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("swing.active", self.active)?;
        ensure_positive("swing.radius", self.radius)
    }

    #[inline]
    pub fn total(&self) -> f32 {
        self.windup + self.active + self.recovery
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwingPhase {
    Windup,
    Active,
    Recovery,
    Done,
}

#[derive(Component, Debug, Clone)]
pub struct Swing {
    pub spec: SwingSpec,
    phase: SwingPhase,
    remaining: f32,
    exclusion: ExclusionSet,
}

impl Swing {
    pub fn new(spec: SwingSpec) -> Self {
        Self { spec, phase: SwingPhase::Windup, remaining: spec.windup, exclusion: ExclusionSet::new() }
    }

    #[inline]
    pub fn phase(&self) -> SwingPhase {
        self.phase
    }

    #[inline]
    pub fn is_done(&self) -> bool {
        self.phase == SwingPhase::Done
    }

    /// Advance the sequence; zero-length phases are skipped. Returns the phase now in effect.
    pub fn advance(&mut self, dt: f32) -> SwingPhase {
        self.remaining -= dt;
        while self.remaining <= 0.0 && self.phase != SwingPhase::Done {
            let (next, length) = match self.phase {
                SwingPhase::Windup => (SwingPhase::Active, self.spec.active),
                SwingPhase::Active => (SwingPhase::Recovery, self.spec.recovery),
                SwingPhase::Recovery | SwingPhase::Done => (SwingPhase::Done, 0.0),
            };
            self.phase = next;
            self.remaining += length;
        }
        self.phase
    }

    pub fn strike_point(&self, caster: &Transform) -> Vec3 {
        caster.translation + *caster.forward() * self.spec.reach
    }

    /// Test the hurt sphere once. Returns how many new targets were hit.
    pub fn strike(
        &mut self,
        spatial: &impl SpatialQueries,
        resolver: &mut HitResolver,
        source: Entity,
        center: Vec3,
        team: Team,
    ) -> usize {
        let mut hit = 0;
        for target in spatial.overlap_sphere(center, self.spec.radius, team.hostiles()) {
            let event = DamageEvent::new(Some(source), target.entity, self.spec.damage);
            if resolver.resolve(event, &mut self.exclusion).landed() {
                hit += 1;
            }
        }
        hit
    }
}

pub fn tick_swings(
    time: Res<Time<Fixed>>,
    spatial: AvianSpatial,
    mut resolver: HitResolver,
    mut commands: Commands,
    mut swings: Query<(Entity, &mut Swing, &EffectOf), Without<PendingDespawn>>,
    casters: Query<(&Transform, &Team), Without<Swing>>,
) {
    let dt = time.delta_secs();

    for (entity, mut swing, owner) in &mut swings {
        match swing.advance(dt) {
            SwingPhase::Active => {
                let Ok((tf, team)) = casters.get(owner.0) else {
                    continue;
                };
                let center = swing.strike_point(tf);
                let hit = swing.strike(&spatial, &mut resolver, owner.0, center, *team);
                if hit > 0 {
                    debug!(caster = ?owner.0, hit, "swing connected");
                }
            }
            SwingPhase::Done => {
                commands.entity(entity).insert(PendingDespawn);
            }
            SwingPhase::Windup | SwingPhase::Recovery => {}
        }
    }
}
