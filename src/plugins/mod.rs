//! Feature plugins.

use bevy::prelude::*;

use crate::plugins::projectiles::ProjectilesPlugin;

pub mod combat;
pub mod core;
pub mod effects;
pub mod enemies;
pub mod navigation;
pub mod physics;
pub mod player;
pub mod projectiles;
pub mod spatial;
pub mod status;
pub mod targeting;
pub mod world;

/// Register gameplay plugins. Everything here runs headless.
///
/// `core` goes first: the rest read its resources while building.
pub fn register_gameplay(app: &mut App) {
    core::plugin(app);
    physics::plugin(app);
    combat::plugin(app);
    status::plugin(app);
    navigation::plugin(app);
    effects::plugin(app);
    enemies::plugin(app);
    player::plugin(app);
    world::plugin(app);
    app.add_plugins(ProjectilesPlugin);
}
