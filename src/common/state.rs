//! Session state machine.
//!
//! `InGame` owns every arena entity (they are spawned with `DespawnOnExit(InGame)`).
//! The player's death moves the session to `Defeated`, which tears the arena down.

use bevy::prelude::*;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, States, Default)]
pub enum GameState {
    #[default]
    InGame,
    Defeated,
}
