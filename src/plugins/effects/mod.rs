//! Transient attack entities other than projectiles.
//!
//! | effect      | lifetime                         | exclusion-set lifetime |
//! |-------------|----------------------------------|------------------------|
//! | area        | `duration`                       | one pulse              |
//! | chain cast  | resolved at once, drawn briefly  | the whole cast         |
//! | beam        | until released or cancelled      | one damage tick        |
//! | swing       | windup + active + recovery       | the whole swing        |
//!
//! Beams and swings belong to their caster through `EffectOf`, so the caster's death or a
//! mode switch removes them along with any pending timers.

pub mod area;
pub mod beam;
pub mod chain;
pub mod swing;

use bevy::prelude::*;

use crate::plugins::core::CombatSet;

pub use area::{spawn_area, AreaEffect, AreaSpec};
pub use beam::{Beam, BeamSpec};
pub use chain::{CastChain, ChainCast};
pub use swing::{Swing, SwingPhase, SwingSpec};

pub fn plugin(app: &mut App) {
    app.add_message::<CastChain>();

    app.add_systems(
        FixedUpdate,
        (chain::cast_chains, beam::tick_beams, swing::tick_swings, area::tick_areas).chain().in_set(CombatSet::Act),
    );
    app.add_systems(FixedUpdate, chain::fade_chains.in_set(CombatSet::Settle));
}
