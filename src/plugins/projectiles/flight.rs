//! Projectile spawning and flight.

use avian3d::prelude::LayerMask;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use super::components::Projectile;
use super::messages::{ImpactSurface, ProjectileImpact, SpawnProjectile};
use crate::common::layers;
use crate::common::state::GameState;
use crate::common::tunables::Tunables;
use crate::plugins::combat::{DamageEvent, HitOutcome, HitResolver, PendingDespawn};
use crate::plugins::spatial::{AvianSpatial, SpatialQueries};

/// Consumer: the only place projectile entities are created.
pub fn spawn_projectiles(mut commands: Commands, mut requests: MessageReader<SpawnProjectile>) {
    for req in requests.read() {
        commands.spawn((
            Name::new("Projectile"),
            Projectile::new(req.spec, req.team, req.owner, req.velocity),
            Transform::from_translation(req.origin).looking_to(req.velocity, Vec3::Y),
            DespawnOnExit(GameState::InGame),
        ));
    }
}

/// Where a sweep ended this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stop {
    pub point: Vec3,
    pub normal: Vec3,
    pub surface: ImpactSurface,
}

/// Sweep one projectile from `from` along `step`.
///
/// Hostile combatants along the segment are resolved nearest first through `hit` (which
/// returns whether the hit landed); the sweep stops at the first level geometry, or at the
/// combatant that spends the hit budget. Inert projectiles stop on the first combatant
/// without resolving anything.
pub fn sweep(
    spatial: &impl SpatialQueries,
    projectile: &mut Projectile,
    from: Vec3,
    step: Vec3,
    mut hit: impl FnMut(&mut Projectile, Entity) -> HitOutcome,
) -> Option<Stop> {
    let Ok(direction) = Dir3::new(step) else {
        return None;
    };
    let hostiles = projectile.team.hostiles();
    let hits = spatial.ray_cast_all(from, direction, step.length(), layers::blocking() | hostiles);

    for ray_hit in hits {
        let is_combatant = (ray_hit.membership & hostiles) != LayerMask::NONE;
        if !is_combatant {
            return Some(Stop { point: ray_hit.point, normal: ray_hit.normal, surface: ImpactSurface::Environment });
        }

        let stop = Stop {
            point: ray_hit.point,
            normal: ray_hit.normal,
            surface: ImpactSurface::Combatant(ray_hit.entity),
        };
        if projectile.spec.is_inert() {
            return Some(stop);
        }

        // Dying bodies and repeat contacts are passed through.
        if let HitOutcome::Landed(_) = hit(projectile, ray_hit.entity)
            && projectile.record_hit()
        {
            return Some(stop);
        }
    }

    None
}

/// Turn a homing projectile toward the nearest hostile in range that it has not hit yet
/// and that `eligible` accepts. The turn is capped at `turn_speed * dt` radians and the
/// speed is kept. Returns the target steered toward.
pub fn home(
    spatial: &impl SpatialQueries,
    projectile: &mut Projectile,
    position: Vec3,
    dt: f32,
    eligible: impl Fn(Entity) -> bool,
) -> Option<Entity> {
    let homing = projectile.spec.homing?;
    if projectile.age() < homing.grace_period {
        return None;
    }

    let target = spatial
        .overlap_sphere(position, homing.range, projectile.team.hostiles())
        .into_iter()
        .filter(|o| !projectile.has_hit(o.entity) && eligible(o.entity))
        .min_by(|a, b| a.position.distance_squared(position).total_cmp(&b.position.distance_squared(position)))?;

    let to_target = Dir3::new(target.position - position).ok()?;
    projectile.velocity = turn_toward(projectile.velocity, to_target, homing.turn_speed * dt);
    Some(target.entity)
}

/// Rotate `velocity` toward `to` by at most `max_angle` radians, keeping its length.
fn turn_toward(velocity: Vec3, to: Dir3, max_angle: f32) -> Vec3 {
    let Ok(current) = Dir3::new(velocity) else {
        return velocity;
    };
    let speed = velocity.length();
    let angle = current.angle_between(*to);
    if angle <= max_angle {
        return *to * speed;
    }
    let axis = current.cross(*to).try_normalize().unwrap_or_else(|| current.any_orthonormal_vector());
    Quat::from_axis_angle(axis, max_angle) * velocity
}

pub fn fly_projectiles(
    time: Res<Time<Fixed>>,
    tunables: Res<Tunables>,
    spatial: AvianSpatial,
    mut resolver: HitResolver,
    mut commands: Commands,
    mut q: Query<(Entity, &mut Projectile, &mut Transform), Without<PendingDespawn>>,
    mut impacts: MessageWriter<ProjectileImpact>,
) {
    let dt = time.delta_secs();
    let bound = tunables.arena_half_extent;

    for (entity, mut projectile, mut tf) in &mut q {
        home(&spatial, &mut projectile, tf.translation, dt, |e| resolver.is_alive(e));
        let step = projectile.advance(dt, tunables.gravity);
        if projectile.expired() {
            commands.entity(entity).insert(PendingDespawn);
            continue;
        }

        let from = tf.translation;
        let stop = sweep(&spatial, &mut projectile, from, step, |p, target| {
            let event = DamageEvent::new(p.owner, target, p.spec.damage).with_status(p.spec.status());
            resolver.resolve(event, p.exclusion_mut())
        });

        if let Some(stop) = stop {
            tf.translation = stop.point;
            impacts.write(ProjectileImpact {
                projectile: entity,
                owner: projectile.owner,
                team: projectile.team,
                point: stop.point,
                normal: stop.normal,
                surface: stop.surface,
                impact: projectile.spec.impact,
            });
            commands.entity(entity).insert(PendingDespawn);
            continue;
        }

        tf.translation = from + step;
        if step.length_squared() > 1e-8 {
            tf.look_to(step, Vec3::Y);
        }

        let p = tf.translation;
        if p.x.abs() > bound || p.y.abs() > bound || p.z.abs() > bound {
            debug!(?entity, "projectile left the arena");
            commands.entity(entity).insert(PendingDespawn);
        }
    }
}
