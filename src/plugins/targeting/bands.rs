//! Ranged positioning bands.
//!
//! ```text
//!   0 ── retreat ── optimal ── attack_range ── sight_range ──►
//!   │ Retreat │   Hold   │        Advance          │  OutOfSight
//! ```
//!
//! Attack eligibility (`distance <= attack_range`, plus line of sight checked by the
//! caller) is independent of the movement decision.

use serde::{Deserialize, Serialize};

use crate::common::error::ConfigError;

/// What to do inside `(optimal, attack_range]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptimalBandPolicy {
    /// Close to `optimal` and hold there.
    #[default]
    HoldAtOptimal,
    /// Stop advancing once inside attack range.
    AdvanceToAttackRange,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BandMove {
    OutOfSight,
    Retreat,
    Advance,
    Hold,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PositioningBands {
    pub retreat: f32,
    pub optimal: f32,
    pub attack_range: f32,
    pub sight_range: f32,
    #[serde(default)]
    pub policy: OptimalBandPolicy,
}

impl Default for PositioningBands {
    fn default() -> Self {
        Self { retreat: 10.0, optimal: 20.0, attack_range: 30.0, sight_range: 35.0, policy: OptimalBandPolicy::default() }
    }
}

impl PositioningBands {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ordered = 0.0 < self.retreat
            && self.retreat < self.optimal
            && self.optimal < self.attack_range
            && self.attack_range <= self.sight_range;
        if ordered {
            Ok(())
        } else {
            Err(ConfigError::BandsOutOfOrder {
                retreat: self.retreat,
                optimal: self.optimal,
                attack: self.attack_range,
                sight: self.sight_range,
            })
        }
    }

    pub fn movement(&self, distance: f32) -> BandMove {
        if distance > self.sight_range {
            return BandMove::OutOfSight;
        }
        if distance < self.retreat {
            return BandMove::Retreat;
        }

        let advance_beyond = match self.policy {
            OptimalBandPolicy::HoldAtOptimal => self.optimal,
            OptimalBandPolicy::AdvanceToAttackRange => self.attack_range,
        };
        if distance > advance_beyond {
            BandMove::Advance
        } else {
            BandMove::Hold
        }
    }

    #[inline]
    pub fn in_attack_range(&self, distance: f32) -> bool {
        distance <= self.attack_range
    }
}
