//! Impact consumer: bursts and the areas they leave behind.

use avian3d::prelude::LayerMask;
use bevy::prelude::*;

use super::components::Impact;
use super::messages::{ImpactSurface, ProjectileImpact};
use crate::common::layers::Layer;
use crate::plugins::combat::{DamageEvent, ExclusionSet, HitResolver};
use crate::plugins::effects::area::spawn_area;
use crate::plugins::spatial::{AvianSpatial, SpatialQueries};

/// Falling search used when a burst goes off on a combatant instead of on the floor.
const GROUND_SEARCH: f32 = 50.0;

/// Where a puddle from an impact at `point` comes to rest, if anywhere.
///
/// - on level geometry: the nearest ground surface, if within `settle_distance`
/// - on a combatant: straight down to the ground below it
pub fn settle_point(
    spatial: &impl SpatialQueries,
    point: Vec3,
    surface: ImpactSurface,
    settle_distance: f32,
) -> Option<Vec3> {
    let ground = LayerMask::from(Layer::Ground);
    match surface {
        ImpactSurface::Environment => spatial
            .closest_point(point, ground)
            .filter(|p| p.distance(point) <= settle_distance),
        ImpactSurface::Combatant(_) => spatial.ray_cast(point, Dir3::NEG_Y, GROUND_SEARCH, ground).map(|h| h.point),
    }
}

pub fn resolve_impacts(
    mut commands: Commands,
    mut impacts: MessageReader<ProjectileImpact>,
    spatial: AvianSpatial,
    mut resolver: HitResolver,
) {
    for hit in impacts.read() {
        match hit.impact {
            Impact::Vanish => {}

            Impact::IcyPatch { area } => {
                if hit.surface == ImpactSurface::Environment {
                    spawn_area(&mut commands, area, hit.team, hit.owner, hit.point);
                }
            }

            Impact::Burst { radius, damage, puddle, settle_distance } => {
                let mut exclusion = ExclusionSet::new();
                let caught = spatial.overlap_sphere(hit.point, radius, hit.team.hostiles());
                for target in &caught {
                    resolver.resolve(DamageEvent::new(hit.owner, target.entity, damage), &mut exclusion);
                }
                debug!(caught = caught.len(), "burst");

                let Some(puddle) = puddle else {
                    continue;
                };
                match settle_point(&spatial, hit.point, hit.surface, settle_distance) {
                    Some(at) => {
                        spawn_area(&mut commands, puddle, hit.team, hit.owner, at);
                    }
                    None => debug!(point = ?hit.point, "no ground to settle a puddle on"),
                }
            }
        }
    }
}
