//! Enemies plugin: three behaviors sharing one contract.
//!
//! ---------------------------
//! HOW A BRAIN TICKS
//! ---------------------------
//! 1) SENSE: the system builds a [`Perception`] (own position, grounded, the nearest live
//!    player with distance, velocity and line of sight).
//! 2) DECIDE: the brain's pure `tick` advances its state machine, steers its
//!    [`Navigator`], and returns [`Orders`].
//! 3) ACT: the system carries the orders out: facing, cues, a [`Strike`] for the damage
//!    pipeline, a projectile request, or a raw velocity change for a leap.
//!
//! Brains never touch health directly; every attack goes through `Strike` (melee, leap
//! contact) or `SpawnProjectile` (ranged). A frozen enemy skips step 2 entirely, so its
//! timers hold until it thaws. A dying enemy, or one whose profile failed validation
//! (`BehaviorDisabled`), never ticks.
//!
//! Keeping `tick` pure means every transition is testable with a hand-built
//! `Perception` and a bare `Navigator`.

pub mod leaper;
pub mod melee;
pub mod ranged;

use avian3d::prelude::*;
use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::error::ConfigError;
use crate::common::layers::{self, Layer};
use crate::common::state::GameState;
use crate::common::tunables::Tunables;
use crate::plugins::combat::{
    BehaviorDisabled, Cue, CueKind, Health, LifeState, Strike, StrikeEffect, StrikeShape, Team,
};
use crate::plugins::core::{CombatConfig, CombatSet};
use crate::plugins::navigation::{facing, Navigator, PlanarDrive, TrackedVelocity};
use crate::plugins::spatial::{grounded, segment_blocked, SpatialQueries};
use crate::plugins::status::{ChillProfile, StatusEffects};

pub use leaper::{Leaper, LeaperProfile, LeaperState};
pub use melee::{ChargePhase, MeleeCharger, MeleeProfile, MeleeState};
pub use ranged::{RangedKiter, RangedProfile};

/// Capsule: radius 0.5, segment 1.0. The transform sits at the capsule's center.
pub const BODY_RADIUS: f32 = 0.5;
pub const BODY_HALF_HEIGHT: f32 = 1.0;

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Enemy;

// -----------------------------------------------------------------------------
// Perception
// -----------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sighting {
    pub entity: Entity,
    /// Center of the target's body.
    pub position: Vec3,
    pub velocity: Vec3,
    pub distance: f32,
    pub line_of_sight: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Perception {
    pub position: Vec3,
    pub grounded: bool,
    pub target: Option<Sighting>,
}

impl Perception {
    /// `eye_height` is where line of sight is measured from, relative to `position`.
    pub fn sense(
        spatial: &impl SpatialQueries,
        tunables: &Tunables,
        position: Vec3,
        eye_height: f32,
        target: Option<(Entity, Vec3, Vec3)>,
    ) -> Self {
        let feet = position - Vec3::Y * (BODY_HALF_HEIGHT - 0.1);
        let grounded = grounded(spatial, feet, tunables.ground_probe, layers::blocking());

        let target = target.map(|(entity, target_position, velocity)| {
            let eye = position + Vec3::Y * eye_height;
            Sighting {
                entity,
                position: target_position,
                velocity,
                distance: position.distance(target_position),
                line_of_sight: !segment_blocked(spatial, eye, target_position, layers::obstacles()),
            }
        });

        Self { position, grounded, target }
    }
}

/// Every live player an enemy could pick as its target.
#[derive(SystemParam)]
pub struct Quarry<'w, 's> {
    candidates: Query<
        'w,
        's,
        (Entity, &'static Transform, Option<&'static TrackedVelocity>, &'static LifeState, &'static Team),
        Without<Enemy>,
    >,
}

impl Quarry<'_, '_> {
    /// Nearest live player: `(entity, position, velocity)`.
    pub fn nearest(&self, from: Vec3) -> Option<(Entity, Vec3, Vec3)> {
        self.candidates
            .iter()
            .filter(|(_, _, _, life, team)| life.is_alive() && **team == Team::Player)
            .map(|(entity, tf, tracked, _, _)| {
                (entity, tf.translation, tracked.map_or(Vec3::ZERO, |t| t.velocity))
            })
            .min_by(|a, b| a.1.distance_squared(from).total_cmp(&b.1.distance_squared(from)))
    }
}

// -----------------------------------------------------------------------------
// Orders
// -----------------------------------------------------------------------------

/// Damage a brain wants resolved this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Blow {
    pub shape: StrikeShape,
    pub damage: f32,
}

/// A projectile a brain wants fired this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Shot {
    pub origin: Vec3,
    pub direction: Dir3,
}

/// What a brain asks of the world after one tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Orders {
    /// Turn (yaw only) toward this point.
    pub face: Option<Vec3>,
    pub cues: Vec<CueKind>,
    pub blow: Option<Blow>,
    pub shot: Option<Shot>,
    /// Replace the body's velocity outright.
    pub velocity: Option<Vec3>,
}

impl Orders {
    pub fn cue(&mut self, kind: CueKind) {
        self.cues.push(kind);
    }
}

/// Apply everything except shots, which need the brain's projectile definition.
pub(crate) fn carry_out(
    entity: Entity,
    orders: &Orders,
    transform: &mut Transform,
    velocity: Option<&mut LinearVelocity>,
    cues: &mut MessageWriter<Cue>,
    strikes: &mut MessageWriter<Strike>,
) {
    if let Some(rotation) = orders.face.and_then(|p| facing(transform.translation, p)) {
        transform.rotation = rotation;
    }

    for kind in &orders.cues {
        cues.write(Cue::new(entity, *kind));
    }

    if let Some(blow) = orders.blow {
        strikes.write(Strike {
            source: Some(entity),
            shape: blow.shape,
            interest: Team::Enemy.hostiles(),
            effect: StrikeEffect::Harm { damage: blow.damage, status: None },
        });
    }

    if let (Some(v), Some(velocity)) = (orders.velocity, velocity) {
        velocity.0 = v;
    }
}

#[inline]
pub(crate) fn is_frozen(status: Option<&StatusEffects>) -> bool {
    status.is_some_and(StatusEffects::is_frozen)
}

// -----------------------------------------------------------------------------
// Plugin wiring
// -----------------------------------------------------------------------------

pub fn plugin(app: &mut App) {
    app.add_systems(
        FixedUpdate,
        (melee::think_melee, ranged::think_ranged, leaper::think_leaper).in_set(CombatSet::Decide),
    );
}

// -----------------------------------------------------------------------------
// Spawn
// -----------------------------------------------------------------------------

/// Enemies collide with level geometry, players and each other.
#[inline]
pub fn enemy_layers() -> CollisionLayers {
    CollisionLayers::new(
        Layer::Enemy,
        [Layer::Ground, Layer::Obstacle, Layer::Player, Layer::Enemy, Layer::PlayerProjectile],
    )
}

fn combatant(name: &str, max_health: f32, chill: ChillProfile, position: Vec3) -> impl Bundle {
    (
        Name::new(name.to_string()),
        Enemy,
        Team::Enemy,
        Health::new(max_health),
        StatusEffects::new(chill),
        LifeState::Alive,
        TrackedVelocity::default(),
        Transform::from_translation(position),
        Collider::capsule(BODY_RADIUS, BODY_HALF_HEIGHT * 2.0 - BODY_RADIUS * 2.0),
        enemy_layers(),
        LinearVelocity::ZERO,
        DespawnOnExit(GameState::InGame),
    )
}

/// A rejected profile still spawns the body, but it never behaves.
fn disable_if_invalid(commands: &mut Commands, entity: Entity, name: &str, checked: Result<(), ConfigError>) {
    if let Err(err) = checked {
        warn!(%name, %err, "enemy profile rejected; behavior disabled");
        commands.entity(entity).insert(BehaviorDisabled);
    }
}

pub fn spawn_melee(commands: &mut Commands, config: &CombatConfig, position: Vec3) -> Entity {
    let profile = config.melee;
    let entity = commands
        .spawn((
            combatant("MeleeCharger", profile.max_health, config.chill, position),
            MeleeCharger::new(profile),
            Navigator::new(profile.move_speed, profile.acceleration).with_stopping_distance(profile.stopping_distance),
            RigidBody::Kinematic,
        ))
        .id();
    disable_if_invalid(commands, entity, "MeleeCharger", profile.validate().and_then(|()| config.chill.validate()));
    entity
}

pub fn spawn_ranged(commands: &mut Commands, config: &CombatConfig, position: Vec3) -> Entity {
    let profile = config.ranged;
    let entity = commands
        .spawn((
            combatant("RangedKiter", profile.max_health, config.chill, position),
            RangedKiter::new(profile),
            Navigator::new(profile.move_speed, profile.acceleration).with_stopping_distance(0.5),
            RigidBody::Kinematic,
        ))
        .id();
    disable_if_invalid(commands, entity, "RangedKiter", profile.validate().and_then(|()| config.chill.validate()));
    entity
}

pub fn spawn_leaper(commands: &mut Commands, config: &CombatConfig, position: Vec3) -> Entity {
    let profile = config.leaper;
    let entity = commands
        .spawn((
            combatant("Leaper", profile.max_health, config.chill, position),
            Leaper::new(profile),
            Navigator::new(profile.move_speed, profile.acceleration).with_stopping_distance(profile.stop_distance),
            PlanarDrive,
            RigidBody::Dynamic,
            LockedAxes::ROTATION_LOCKED,
            Friction::new(0.8),
        ))
        .id();
    disable_if_invalid(commands, entity, "Leaper", profile.validate().and_then(|()| config.chill.validate()));
    entity
}
