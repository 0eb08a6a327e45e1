//! Buffered projectile traffic.
//!
//! Producers (enemy brains, player dispatch) only write intent; the spawn consumer is the
//! single place projectile entities are created. Flight reports where projectiles stop;
//! the impact consumer turns that into bursts and areas.

use bevy::prelude::*;

use super::components::{Impact, ProjectileSpec};
use crate::plugins::combat::Team;

#[derive(Message, Clone, Copy, Debug)]
pub struct SpawnProjectile {
    pub owner: Option<Entity>,
    pub team: Team,
    pub origin: Vec3,
    pub velocity: Vec3,
    pub spec: ProjectileSpec,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImpactSurface {
    Environment,
    Combatant(Entity),
}

#[derive(Message, Clone, Copy, Debug)]
pub struct ProjectileImpact {
    pub projectile: Entity,
    pub owner: Option<Entity>,
    pub team: Team,
    pub point: Vec3,
    pub normal: Vec3,
    pub surface: ImpactSurface,
    pub impact: Impact,
}
