//! Tunable world constants.

use bevy::prelude::*;

#[derive(Resource, Debug, Clone)]
pub struct Tunables {
    /// Gravity magnitude (m/s^2). Used by the physics world and the leap solver.
    pub gravity: f32,
    /// Anything farther than this from the origin on any axis is out of bounds.
    pub arena_half_extent: f32,
    /// Fallback aim distance when the aim ray hits nothing.
    pub far_aim_distance: f32,
    /// Length of the downward probe that decides whether a body is grounded.
    pub ground_probe: f32,
}

impl Default for Tunables {
    fn default() -> Self {
        Self { gravity: 9.81, arena_half_extent: 200.0, far_aim_distance: 100.0, ground_probe: 0.6 }
    }
}
