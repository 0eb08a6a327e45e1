//! Collision layers and the interest masks spatial queries filter on.

use avian3d::prelude::*;

#[derive(PhysicsLayer, Default, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layer {
    #[default]
    Default,
    Ground,
    Obstacle,
    Player,
    Enemy,
    PlayerProjectile,
    EnemyProjectile,
    Effect,
}

/// Surfaces that stop rays, projectiles and beams.
#[inline]
pub fn blocking() -> LayerMask {
    LayerMask::from([Layer::Ground, Layer::Obstacle])
}

/// Line-of-sight blockers. Ground is excluded so a sloped floor never hides the target.
#[inline]
pub fn obstacles() -> LayerMask {
    LayerMask::from(Layer::Obstacle)
}

#[inline]
pub fn enemies() -> LayerMask {
    LayerMask::from(Layer::Enemy)
}

#[inline]
pub fn players() -> LayerMask {
    LayerMask::from(Layer::Player)
}

/// Everything the player's aim ray can rest on.
#[inline]
pub fn aim_surfaces() -> LayerMask {
    LayerMask::from([Layer::Ground, Layer::Obstacle, Layer::Enemy])
}
