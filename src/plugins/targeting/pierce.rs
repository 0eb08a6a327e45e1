//! Piercing ray: damage enemies in depth order until a blocker or the pierce budget stops it.

use bevy::prelude::*;

use crate::common::layers::{self, Layer};
use crate::plugins::spatial::SpatialQueries;

#[derive(Clone, Debug, PartialEq)]
pub struct PierceOutcome {
    /// Enemies to damage, nearest first.
    pub targets: Vec<Entity>,
    /// Where the ray visibly ends.
    pub stop_point: Vec3,
}

impl PierceOutcome {
    pub fn length_from(&self, origin: Vec3) -> f32 {
        origin.distance(self.stop_point)
    }
}

/// Walk the sorted hits along the ray.
///
/// - enemy with budget left: damaged, ray continues
/// - enemy with the budget spent: ray stops at its hit point
/// - anything else: ray stops at the blocker
/// - nothing: ray ends at `max_distance`
pub fn resolve_pierce(
    spatial: &impl SpatialQueries,
    origin: Vec3,
    direction: Dir3,
    max_distance: f32,
    max_pierces: u32,
) -> PierceOutcome {
    let hits = spatial.ray_cast_all(origin, direction, max_distance, layers::blocking() | layers::enemies());

    let mut targets: Vec<Entity> = Vec::new();
    let mut stop_point = origin + *direction * max_distance;

    for hit in hits {
        if !hit.is(Layer::Enemy) {
            stop_point = hit.point;
            break;
        }
        if targets.contains(&hit.entity) {
            // Several colliders on one body.
            continue;
        }
        if targets.len() as u32 >= max_pierces {
            stop_point = hit.point;
            break;
        }
        targets.push(hit.entity);
    }

    PierceOutcome { targets, stop_point }
}
