//! Game composition root.
//!
//! - `configure_headless`: gameplay only, on top of whatever runtime plugins the caller added.
//! - `run`: the headless demo loop used by the binary.

use std::path::Path;
use std::time::Duration;

use bevy::app::ScheduleRunnerPlugin;
use bevy::asset::AssetPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::scene::ScenePlugin;
use bevy::state::app::StatesPlugin;

use crate::common::error::ConfigError;
use crate::common::state::GameState;
use crate::plugins;
use crate::plugins::core::CombatConfig;

/// Runs the arena headless at 60 frames per second until the process is stopped.
///
/// A config path, if given, replaces the built-in definitions. A config that cannot be read
/// or fails validation is logged and the defaults are used instead.
pub fn run(config_path: Option<&Path>) {
    let mut app = App::new();
    app.add_plugins((
        MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(1.0 / 60.0))),
        LogPlugin::default(),
        StatesPlugin,
        AssetPlugin::default(),
        ScenePlugin,
    ));

    if let Some(path) = config_path {
        match load_config(path) {
            Ok(config) => {
                info!(path = %path.display(), "combat config loaded");
                app.insert_resource(config);
            }
            Err(err) => warn!(path = %path.display(), %err, "falling back to the default combat config"),
        }
    }

    configure_headless(&mut app);
    app.run();
}

fn load_config(path: &Path) -> Result<CombatConfig, ConfigError> {
    let config = CombatConfig::load(path)?;
    config.validate()?;
    Ok(config)
}

/// Headless configuration.
///
/// Notes:
/// - Do NOT add DefaultPlugins.
/// - Resources inserted before this call (config, seed) are kept.
pub fn configure_headless(app: &mut App) {
    app.init_state::<GameState>();
    plugins::register_gameplay(app);
}
