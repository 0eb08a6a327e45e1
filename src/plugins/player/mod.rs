//! Player plugin.
//!
//! Pipeline:
//! - outside the core: device polling and camera write [`AttackInput`]
//! - FixedUpdate / Decide: mode selection, then attack dispatch
//!
//! The player's own locomotion is not simulated here; the body is kinematic and whatever
//! moves it is an external collaborator. Enemies read its motion through `TrackedVelocity`.
//!
//! API note (Bevy >= 0.18):
//! - Systems reach the single player through `Query::single_mut`, which fails softly when
//!   there is no player (defeated, not yet spawned) and the system simply does nothing.

pub mod dispatch;
pub mod input;

use avian3d::prelude::*;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;
use serde::{Deserialize, Serialize};

use crate::common::error::{ensure_positive, ConfigError};
use crate::common::layers::Layer;
use crate::common::state::GameState;
use crate::plugins::combat::{BehaviorDisabled, Health, LifeState, Team};
use crate::plugins::core::{CombatConfig, CombatSet};
use crate::plugins::enemies::{BODY_HALF_HEIGHT, BODY_RADIUS};
use crate::plugins::navigation::TrackedVelocity;

pub use dispatch::{
    default_arsenal, release_charge, burst_directions, Arsenal, AttackDefinition, AttackMode, AttackModeChanged,
    BurstSpec, ChargeOrb, ChargeRelease, ChargeSpec, Delivery, Sustained,
};
pub use input::{resolve_aim_point, AttackInput, ModeSelect, Trigger};

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Player;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerProfile {
    pub max_health: f32,
    /// Muzzle offset from the body center, in the player's local frame.
    pub muzzle_height: f32,
    pub muzzle_forward: f32,
    pub muzzle_side: f32,
    pub arsenal: Vec<AttackDefinition>,
}

impl Default for PlayerProfile {
    fn default() -> Self {
        Self { max_health: 100.0, muzzle_height: 0.5, muzzle_forward: 0.6, muzzle_side: 0.3, arsenal: default_arsenal() }
    }
}

impl PlayerProfile {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("player.max_health", self.max_health)?;
        if self.arsenal.is_empty() {
            return Err(ConfigError::EmptyArsenal);
        }
        self.arsenal.iter().try_for_each(AttackDefinition::validate)
    }

    /// Local-space muzzle offset. Bevy's forward is -Z.
    #[inline]
    pub fn muzzle(&self) -> Vec3 {
        Vec3::new(self.muzzle_side, self.muzzle_height, -self.muzzle_forward)
    }
}

pub fn plugin(app: &mut App) {
    app.init_resource::<AttackInput>().add_message::<AttackModeChanged>();

    app.add_systems(
        FixedUpdate,
        (dispatch::select_attack_mode, dispatch::dispatch_attacks).chain().in_set(CombatSet::Decide),
    );
}

/// Players collide with level geometry, enemies and enemy projectiles.
#[inline]
pub fn player_layers() -> CollisionLayers {
    CollisionLayers::new(Layer::Player, [Layer::Ground, Layer::Obstacle, Layer::Enemy, Layer::EnemyProjectile])
}

pub fn spawn_player(commands: &mut Commands, config: &CombatConfig, position: Vec3) -> Entity {
    let profile = &config.player;
    let entity = commands
        .spawn((
            Name::new("Player"),
            Player,
            Team::Player,
            Health::new(profile.max_health),
            LifeState::Alive,
            TrackedVelocity::default(),
            Arsenal::new(profile.arsenal.clone(), profile.muzzle()),
            Transform::from_translation(position),
            RigidBody::Kinematic,
            Collider::capsule(BODY_RADIUS, BODY_HALF_HEIGHT * 2.0 - BODY_RADIUS * 2.0),
            player_layers(),
            LinearVelocity::ZERO,
            DespawnOnExit(GameState::InGame),
        ))
        .id();

    if let Err(err) = profile.validate() {
        warn!(%err, "player profile rejected; attacks disabled");
        commands.entity(entity).insert(BehaviorDisabled);
    }
    entity
}
