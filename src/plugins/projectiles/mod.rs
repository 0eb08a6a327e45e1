//! Projectiles plugin: **message-based producer → consumer** spawning and swept flight.
//!
//! # Data flow
//! ```text
//!   FixedUpdate
//!┌────────────────────────────────────────────────────────────────────────────┐
//!│  Decide   producers: ranged brains, player dispatch                        │
//!│           - write: SpawnProjectile                                         │
//!│           - charge release inserts `Projectile` on the detached charge orb │
//!│                                                                            │
//!│  Act      (A) spawn_projectiles   SpawnProjectile -> entity                │
//!│           (B) fly_projectiles     age, gravity, swept ray, hits, bounds    │
//!│               - resolves hostile hits through HitResolver                  │
//!│               - writes: ProjectileImpact, marks PendingDespawn             │
//!│           (C) resolve_impacts     burst damage, icy patches, puddles       │
//!└────────────────────────────────────────────────────────────────────────────┘
//!   PostUpdate: PendingDespawn -> despawn (combat lifecycle)
//! ```
//!
//! # Why sweep instead of a physics body?
//! Fast projectiles tunnel through thin targets if they only check where they end up.
//! Each tick casts a ray over the distance travelled, so every body crossed is seen,
//! nearest first. Projectiles carry no collider of their own.
//!
//! # Where do we still branch?
//! - A hit on a dying combatant (or one this projectile already hit) is passed through.
//! - An impact that finds no ground discards its puddle.

pub mod components;
pub mod flight;
pub mod impact;
pub mod messages;

use bevy::prelude::*;

use crate::plugins::core::CombatSet;

pub use components::{pitched_up, HomingSpec, Impact, Projectile, ProjectileSpec};
pub use messages::{ImpactSurface, ProjectileImpact, SpawnProjectile};

pub struct ProjectilesPlugin;

impl Plugin for ProjectilesPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<SpawnProjectile>().add_message::<ProjectileImpact>();

        app.add_systems(
            FixedUpdate,
            (flight::spawn_projectiles, flight::fly_projectiles, impact::resolve_impacts)
                .chain()
                .in_set(CombatSet::Act),
        );
    }
}

#[cfg(test)]
mod tests;
