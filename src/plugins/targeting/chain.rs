//! Chain resolution: one bolt, an optional ricochet, then hops to the nearest fresh enemy.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::common::error::{ensure_positive, ensure_unit, ConfigError};
use crate::common::layers::{self, Layer};
use crate::plugins::combat::ExclusionSet;
use crate::plugins::spatial::SpatialQueries;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChainSpec {
    pub damage: f32,
    /// Reach of the initial bolt.
    pub max_distance: f32,
    /// Search radius for each hop, and reach of the ricochet ray.
    pub chain_range: f32,
    pub max_chains: u32,
    /// Per-hop damage multiplier in `[0, 1]`.
    pub falloff: f32,
    pub ricochet: bool,
}

impl Default for ChainSpec {
    fn default() -> Self {
        Self { damage: 20.0, max_distance: 50.0, chain_range: 15.0, max_chains: 2, falloff: 0.75, ricochet: true }
    }
}

impl ChainSpec {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("chain.damage", self.damage)?;
        ensure_positive("chain.max_distance", self.max_distance)?;
        ensure_positive("chain.chain_range", self.chain_range)?;
        ensure_unit("chain.falloff", self.falloff)
    }

    /// Damage of the `index`-th hop (0 = the bolt or its ricochet).
    #[inline]
    pub fn damage_at(&self, index: u32) -> f32 {
        self.damage * self.falloff.powi(index as i32)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChainStrike {
    pub target: Entity,
    pub damage: f32,
    /// 0 for the bolt/ricochet, `i` for the i-th hop.
    pub index: u32,
    pub point: Vec3,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChainOutcome {
    /// Planned hits in order. Each target appears once.
    pub strikes: Vec<ChainStrike>,
    /// Polyline of the bolt for presentation, starting at the origin.
    pub path: Vec<Vec3>,
}

/// Plan a chain cast from `origin` along `direction`.
///
/// The planner is pure: it only queries the world. The caller applies `strikes` through
/// the hit resolver with one exclusion set for the whole cast.
pub fn resolve_chain(
    spatial: &impl SpatialQueries,
    origin: Vec3,
    direction: Dir3,
    spec: &ChainSpec,
) -> ChainOutcome {
    let mut out = ChainOutcome { strikes: Vec::new(), path: vec![origin] };
    let mut seen = ExclusionSet::new();

    let Some(hit) = spatial.ray_cast(origin, direction, spec.max_distance, layers::blocking() | layers::enemies())
    else {
        // Nothing to chain from.
        out.path.push(origin + *direction * spec.max_distance);
        return out;
    };

    out.path.push(hit.point);
    let mut current = hit.point;

    if hit.is(Layer::Enemy) {
        seen.admit(hit.entity);
        out.strikes.push(ChainStrike { target: hit.entity, damage: spec.damage_at(0), index: 0, point: hit.point });
    } else if spec.ricochet {
        let d = *direction;
        let reflected = d - 2.0 * d.dot(hit.normal) * hit.normal;
        if let Ok(bounce_dir) = Dir3::new(reflected) {
            if let Some(bounce) = spatial.ray_cast(hit.point, bounce_dir, spec.chain_range, layers::enemies()) {
                seen.admit(bounce.entity);
                out.path.push(bounce.point);
                current = bounce.point;
                out.strikes.push(ChainStrike {
                    target: bounce.entity,
                    damage: spec.damage_at(0),
                    index: 0,
                    point: bounce.point,
                });
            }
        }
    }

    for index in 1..=spec.max_chains {
        let next = spatial
            .overlap_sphere(current, spec.chain_range, layers::enemies())
            .into_iter()
            .filter(|o| !seen.contains(o.entity))
            .min_by(|a, b| a.position.distance_squared(current).total_cmp(&b.position.distance_squared(current)));

        let Some(next) = next else {
            break;
        };

        seen.admit(next.entity);
        current = next.position;
        out.path.push(current);
        out.strikes.push(ChainStrike { target: next.entity, damage: spec.damage_at(index), index, point: current });
    }

    out
}
