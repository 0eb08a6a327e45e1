//! Core plugin: the combat tick ordering and the shared resources every feature reads.
//!
//! One fixed tick runs the combat stages in order:
//!
//! ```text
//!   Sense    status countdowns, velocity tracking
//!   Decide   enemy brains, player attack dispatch
//!   Act      navigation -> velocity, projectile flight, beams, areas, swings
//!   Resolve  one-shot strikes from behaviors
//!   Settle   freezes that landed this tick reach locomotion
//! ```
//!
//! Physics steps afterwards in `FixedPostUpdate`.

pub mod config;

use bevy::prelude::*;

use crate::common::rng::CombatRng;
use crate::common::state::GameState;
use crate::common::tunables::Tunables;

pub use config::CombatConfig;

#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CombatSet {
    Sense,
    Decide,
    Act,
    Resolve,
    Settle,
}

pub fn plugin(app: &mut App) {
    // `init_resource` keeps anything the binary inserted before the plugins (a loaded
    // config, a fixed seed).
    app.init_resource::<Tunables>();
    app.init_resource::<CombatConfig>();
    app.init_resource::<CombatRng>();

    app.configure_sets(
        FixedUpdate,
        (
            CombatSet::Sense,
            CombatSet::Decide,
            CombatSet::Act,
            CombatSet::Resolve,
            CombatSet::Settle,
        )
            .chain()
            .run_if(in_state(GameState::InGame)),
    );
}
