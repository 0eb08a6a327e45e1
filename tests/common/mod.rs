//! Integration test harness.
//!
//! Keep integration tests headless:
//! - `MinimalPlugins` provides core ECS runtime.
//! - we then call `arcane_arena::game::configure_headless` to install gameplay plugins.
//! - time advances by exactly one fixed step per `app.update()`.

use std::time::Duration;

use bevy::asset::AssetPlugin;
use bevy::prelude::*;
use bevy::scene::ScenePlugin;
use bevy::state::app::StatesPlugin;
use bevy::time::TimeUpdateStrategy;

/// Default fixed timestep (64 Hz).
pub const STEP: Duration = Duration::from_micros(15_625);

pub fn app_headless() -> App {
    let mut app = App::new();

    // Add AssetPlugin + ScenePlugin so SceneSpawner exists.
    app.add_plugins((MinimalPlugins, StatesPlugin, AssetPlugin::default(), ScenePlugin));
    app.insert_resource(TimeUpdateStrategy::ManualDuration(STEP));

    arcane_arena::game::configure_headless(&mut app);

    // `App::run` does this for the binary; tests drive `app.update()` directly, so finish
    // plugin setup here (avian registers resources such as `CollisionDiagnostics` in `finish`).
    app.finish();
    app.cleanup();
    app
}

pub fn tick(app: &mut App, n: usize) {
    for _ in 0..n {
        app.update();
    }
}
