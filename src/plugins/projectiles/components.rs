//! Projectile data: the authored definition and the in-flight component.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::common::error::{ensure_ordered, ensure_positive, ConfigError};
use crate::plugins::combat::{ExclusionSet, StatusPayload, Team};
use crate::plugins::effects::AreaSpec;

/// What happens where a projectile stops.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Impact {
    #[default]
    Vanish,
    /// Leave a chilling area where the projectile hits level geometry.
    IcyPatch { area: AreaSpec },
    /// Damage everything hostile in `radius` once, then settle a puddle on the ground.
    Burst {
        radius: f32,
        damage: f32,
        puddle: Option<AreaSpec>,
        /// A puddle further than this from the ground is discarded.
        settle_distance: f32,
    },
}

/// Steering toward the nearest hostile that this projectile has not hit yet.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HomingSpec {
    pub range: f32,
    /// Radians per second.
    pub turn_speed: f32,
    /// Seconds of straight flight before homing starts.
    #[serde(default)]
    pub grace_period: f32,
}

impl Default for HomingSpec {
    fn default() -> Self {
        Self { range: 10.0, turn_speed: 5.0, grace_period: 0.5 }
    }
}

impl HomingSpec {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("homing range", self.range)?;
        ensure_positive("homing turn_speed", self.turn_speed)?;
        ensure_ordered("homing grace_period", 0.0, self.grace_period)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectileSpec {
    pub speed: f32,
    pub damage: f32,
    pub lifetime: f32,
    /// Combatants one projectile can damage before it stops. `1` means no pierce.
    #[serde(default = "one")]
    pub max_hits: u32,
    #[serde(default)]
    pub gravity_scale: f32,
    #[serde(default)]
    pub chill: Option<f32>,
    #[serde(default)]
    pub impact: Impact,
    #[serde(default)]
    pub homing: Option<HomingSpec>,
}

fn one() -> u32 {
    1
}

impl ProjectileSpec {
    pub fn enemy_bolt() -> Self {
        Self {
            speed: 15.0,
            damage: 10.0,
            lifetime: 4.0,
            max_hits: 1,
            gravity_scale: 0.0,
            chill: None,
            impact: Impact::Vanish,
            homing: None,
        }
    }

    pub fn magic_missile() -> Self {
        Self {
            speed: 20.0,
            damage: 15.0,
            lifetime: 5.0,
            max_hits: 2,
            gravity_scale: 0.0,
            chill: None,
            impact: Impact::Vanish,
            homing: None,
        }
    }

    pub fn ice_shard() -> Self {
        Self {
            speed: 30.0,
            damage: 10.0,
            lifetime: 5.0,
            max_hits: 1,
            gravity_scale: 0.0,
            chill: Some(15.0),
            impact: Impact::IcyPatch { area: AreaSpec::icy_patch() },
            homing: None,
        }
    }

    /// Thrown, not fired: the launch speed comes from the charge.
    pub fn poison_bomb() -> Self {
        Self {
            speed: 20.0,
            damage: 0.0,
            lifetime: 10.0,
            max_hits: 1,
            gravity_scale: 1.0,
            chill: None,
            impact: Impact::Burst {
                radius: 5.0,
                damage: 25.0,
                puddle: Some(AreaSpec::poison_puddle()),
                settle_distance: 1.0,
            },
            homing: None,
        }
    }

    pub fn with_homing(mut self, homing: HomingSpec) -> Self {
        self.homing = Some(homing);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("projectile speed", self.speed)?;
        ensure_positive("projectile lifetime", self.lifetime)?;
        ensure_positive("projectile max_hits", self.max_hits as f32)?;
        if let Some(homing) = &self.homing {
            homing.validate()?;
        }
        match self.impact {
            Impact::Vanish => Ok(()),
            Impact::IcyPatch { area } => area.validate(),
            Impact::Burst { radius, puddle, .. } => {
                ensure_positive("burst radius", radius)?;
                puddle.map_or(Ok(()), |p| p.validate())
            }
        }
    }

    /// Inert projectiles stop on a combatant without resolving a hit; their impact does
    /// the work.
    #[inline]
    pub fn is_inert(&self) -> bool {
        self.damage <= 0.0 && self.chill.is_none()
    }

    #[inline]
    pub fn status(&self) -> Option<StatusPayload> {
        self.chill.map(StatusPayload::Chill)
    }
}

/// A projectile in flight. Moved by its own sweep, not by the physics world.
#[derive(Component, Debug, Clone)]
pub struct Projectile {
    pub spec: ProjectileSpec,
    pub team: Team,
    pub owner: Option<Entity>,
    pub velocity: Vec3,
    age: f32,
    hits: u32,
    /// One lifetime for the whole flight: a pierce never hits the same body twice.
    exclusion: ExclusionSet,
}

impl Projectile {
    pub fn new(spec: ProjectileSpec, team: Team, owner: Option<Entity>, velocity: Vec3) -> Self {
        Self { spec, team, owner, velocity, age: 0.0, hits: 0, exclusion: ExclusionSet::new() }
    }

    #[inline]
    pub fn age(&self) -> f32 {
        self.age
    }

    #[inline]
    pub fn hits(&self) -> u32 {
        self.hits
    }

    #[inline]
    pub fn expired(&self) -> bool {
        self.age >= self.spec.lifetime
    }

    pub(crate) fn advance(&mut self, dt: f32, gravity: f32) -> Vec3 {
        self.age += dt;
        self.velocity.y -= gravity * self.spec.gravity_scale * dt;
        self.velocity * dt
    }

    #[inline]
    pub fn has_hit(&self, target: Entity) -> bool {
        self.exclusion.contains(target)
    }

    pub(crate) fn exclusion_mut(&mut self) -> &mut ExclusionSet {
        &mut self.exclusion
    }

    /// Count a landed hit. True once the budget is spent.
    pub(crate) fn record_hit(&mut self) -> bool {
        self.hits += 1;
        self.hits >= self.spec.max_hits
    }
}

/// Launch direction for a thrown projectile: `aim` pitched up by `degrees`.
pub fn pitched_up(aim: Dir3, degrees: f32) -> Dir3 {
    let right = aim.cross(Vec3::Y).normalize_or(Vec3::X);
    Dir3::new(Quat::from_axis_angle(right, degrees.to_radians()) * *aim).unwrap_or(aim)
}
