//! Chain casts: resolved in one tick, visible for a moment after.

use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::state::GameState;
use crate::plugins::combat::{DamageEvent, ExclusionSet, HitResolver, PendingDespawn};
use crate::plugins::spatial::{AvianSpatial, SpatialQueries};
use crate::plugins::targeting::{resolve_chain, ChainOutcome, ChainSpec};

/// How long the bolt's path stays around for presentation.
pub const CHAIN_VISUAL_SECONDS: f32 = 0.25;

#[derive(Message, Clone, Copy, Debug)]
pub struct CastChain {
    pub caster: Option<Entity>,
    pub origin: Vec3,
    pub direction: Dir3,
    pub spec: ChainSpec,
}

/// The drawn remains of a cast.
#[derive(Component, Debug, Clone)]
pub struct ChainCast {
    pub path: Vec<Vec3>,
    pub remaining: f32,
}

/// Plan one cast and apply it with a single exclusion set. Returns the plan and how many
/// strikes landed.
pub fn cast(
    spatial: &impl SpatialQueries,
    resolver: &mut HitResolver,
    caster: Option<Entity>,
    origin: Vec3,
    direction: Dir3,
    spec: &ChainSpec,
) -> (ChainOutcome, usize) {
    let plan = resolve_chain(spatial, origin, direction, spec);
    let mut exclusion = ExclusionSet::new();
    let landed = plan
        .strikes
        .iter()
        .filter(|s| resolver.resolve(DamageEvent::new(caster, s.target, s.damage), &mut exclusion).landed())
        .count();
    (plan, landed)
}

pub fn cast_chains(
    mut commands: Commands,
    mut requests: MessageReader<CastChain>,
    spatial: AvianSpatial,
    mut resolver: HitResolver,
) {
    for req in requests.read() {
        let (plan, landed) = cast(&spatial, &mut resolver, req.caster, req.origin, req.direction, &req.spec);
        debug!(planned = plan.strikes.len(), landed, "chain cast");

        commands.spawn((
            Name::new("ChainCast"),
            ChainCast { path: plan.path, remaining: CHAIN_VISUAL_SECONDS },
            Transform::from_translation(req.origin),
            DespawnOnExit(GameState::InGame),
        ));
    }
}

pub fn fade_chains(
    time: Res<Time<Fixed>>,
    mut commands: Commands,
    mut q: Query<(Entity, &mut ChainCast), Without<PendingDespawn>>,
) {
    let dt = time.delta_secs();
    for (entity, mut chain) in &mut q {
        chain.remaining -= dt;
        if chain.remaining <= 0.0 {
            commands.entity(entity).insert(PendingDespawn);
        }
    }
}
