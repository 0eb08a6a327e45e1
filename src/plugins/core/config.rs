//! Authored combat definitions.
//!
//! `CombatConfig::default()` is a playable set. A JSON file with the same shape can replace
//! any part of it; missing sections fall back to their defaults.
//!
//! Loading only parses. Each combatant validates its own section when it is spawned, so a
//! bad enemy profile disables that enemy and nothing else.

use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::common::error::ConfigError;
use crate::plugins::enemies::{LeaperProfile, MeleeProfile, RangedProfile};
use crate::plugins::player::PlayerProfile;
use crate::plugins::status::ChillProfile;

#[derive(Resource, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    pub chill: ChillProfile,
    pub player: PlayerProfile,
    pub melee: MeleeProfile,
    pub ranged: RangedProfile,
    pub leaper: LeaperProfile,
}

impl CombatConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every section. Spawning does the same per combatant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.chill.validate()?;
        self.player.validate()?;
        self.melee.validate()?;
        self.ranged.validate()?;
        self.leaper.validate()
    }
}
