//! Configuration errors.
//!
//! These are the only errors in the combat core. They are raised once, when
//! definitions are loaded or when a combatant is spawned, and the affected
//! behavior is disabled instead of failing every tick.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be positive (got {value})")]
    NonPositive { field: &'static str, value: f32 },

    #[error("{field} must lie in [0, 1] (got {value})")]
    NotUnit { field: &'static str, value: f32 },

    #[error(
        "positioning bands must satisfy retreat < optimal < attack <= sight \
         (got {retreat} / {optimal} / {attack} / {sight})"
    )]
    BandsOutOfOrder { retreat: f32, optimal: f32, attack: f32, sight: f32 },

    #[error("{what}: minimum {min} exceeds maximum {max}")]
    InvertedRange { what: &'static str, min: f32, max: f32 },

    #[error("arsenal has no attack definitions")]
    EmptyArsenal,

    #[error("could not read combat config: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not parse combat config: {0}")]
    Parse(#[from] serde_json::Error),
}

pub fn ensure_positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

pub fn ensure_unit(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::NotUnit { field, value })
    }
}

pub fn ensure_ordered(what: &'static str, min: f32, max: f32) -> Result<(), ConfigError> {
    if min <= max {
        Ok(())
    } else {
        Err(ConfigError::InvertedRange { what, min, max })
    }
}
