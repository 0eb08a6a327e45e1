//! Status effects: chill stacks toward a freeze, the freeze holds for a fixed time, then
//! thaws to a baseline chill.
//!
//! ```text
//!   Normal ──apply_chill──► Chilled ──chill reaches threshold──► Frozen
//!      ▲                       │  ▲                                 │
//!      └──(chill back to 0)────┘  └──── freeze_duration elapsed ────┘
//!                                       chill = post_freeze_chill
//! ```
//!
//! `StatusEffects` is the only writer of chill/freeze state. Attack code never touches it
//! directly; it forwards a `StatusPayload` through the hit resolver, which calls
//! [`StatusEffects::apply_chill`].
//!
//! The freeze is a countdown advanced once per fixed tick by [`tick_status`], so a
//! freeze lasts exactly `freeze_duration` of simulated time and thaws once.
//! While frozen the owner's navigator is held at zero speed and its behavior skips
//! decision-making (see `enemies`).

use avian3d::prelude::*;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::common::error::{ensure_positive, ConfigError};
use crate::plugins::combat::{Cue, CueKind};
use crate::plugins::core::CombatSet;
use crate::plugins::navigation::Navigator;

/// Authored chill tuning shared by every combatant that can be chilled.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChillProfile {
    pub freeze_threshold: f32,
    pub freeze_duration: f32,
    /// Chill left behind after a thaw. Re-freezing a thawed target takes less chill.
    pub post_freeze_chill: f32,
}

impl Default for ChillProfile {
    fn default() -> Self {
        Self { freeze_threshold: 100.0, freeze_duration: 3.0, post_freeze_chill: 25.0 }
    }
}

impl ChillProfile {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("freeze_threshold", self.freeze_threshold)?;
        ensure_positive("freeze_duration", self.freeze_duration)?;
        if !(0.0..self.freeze_threshold).contains(&self.post_freeze_chill) {
            return Err(ConfigError::InvertedRange {
                what: "post_freeze_chill",
                min: self.post_freeze_chill,
                max: self.freeze_threshold,
            });
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusPhase {
    Normal,
    Chilled,
    Frozen,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChillOutcome {
    /// Target was frozen; nothing changed.
    Ignored,
    Chilled,
    /// This application crossed the threshold.
    Froze,
}

#[derive(Component, Debug, Clone)]
pub struct StatusEffects {
    profile: ChillProfile,
    chill: f32,
    frozen_remaining: Option<f32>,
}

impl StatusEffects {
    pub fn new(profile: ChillProfile) -> Self {
        Self { profile, chill: 0.0, frozen_remaining: None }
    }

    #[inline]
    pub fn chill(&self) -> f32 {
        self.chill
    }

    #[inline]
    pub fn profile(&self) -> &ChillProfile {
        &self.profile
    }

    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.frozen_remaining.is_some()
    }

    pub fn phase(&self) -> StatusPhase {
        if self.is_frozen() {
            StatusPhase::Frozen
        } else if self.chill > 0.0 {
            StatusPhase::Chilled
        } else {
            StatusPhase::Normal
        }
    }

    /// Locomotion multiplier: `1 - chill/threshold`, or 0 while frozen.
    pub fn speed_multiplier(&self) -> f32 {
        if self.is_frozen() {
            return 0.0;
        }
        (1.0 - self.chill / self.profile.freeze_threshold).clamp(0.0, 1.0)
    }

    /// Add chill. Ignored entirely while frozen (no refresh, no stacking).
    pub fn apply_chill(&mut self, amount: f32) -> ChillOutcome {
        if self.is_frozen() {
            return ChillOutcome::Ignored;
        }

        self.chill = (self.chill + amount).clamp(0.0, self.profile.freeze_threshold);

        if self.chill >= self.profile.freeze_threshold {
            self.frozen_remaining = Some(self.profile.freeze_duration);
            ChillOutcome::Froze
        } else {
            ChillOutcome::Chilled
        }
    }

    /// Advance the freeze countdown. Returns `true` on the tick the target thaws.
    pub fn tick(&mut self, dt: f32) -> bool {
        let Some(remaining) = self.frozen_remaining.as_mut() else {
            return false;
        };

        *remaining -= dt;
        if *remaining > 0.0 {
            return false;
        }

        self.frozen_remaining = None;
        self.chill = self.profile.post_freeze_chill;
        true
    }
}

pub fn plugin(app: &mut App) {
    app.add_systems(
        FixedUpdate,
        (tick_status, sync_navigators.after(tick_status)).in_set(CombatSet::Sense),
    );
    // Freezes land during resolution; settle them before the physics step.
    app.add_systems(FixedUpdate, sync_navigators.in_set(CombatSet::Settle));
}

/// Advance freeze countdowns and announce thaws.
pub fn tick_status(
    time: Res<Time<Fixed>>,
    mut cues: MessageWriter<Cue>,
    mut q: Query<(Entity, &mut StatusEffects)>,
) {
    let dt = time.delta_secs();

    for (entity, mut status) in &mut q {
        if !status.is_frozen() {
            continue;
        }
        if status.tick(dt) {
            info!(?entity, chill = status.chill(), "thawed");
            cues.write(Cue::new(entity, CueKind::Thawed));
        }
    }
}

/// Feed the chill multiplier and freeze suspension into locomotion.
pub fn sync_navigators(
    mut q: Query<(&StatusEffects, &mut Navigator, Option<&mut LinearVelocity>), Changed<StatusEffects>>,
) {
    for (status, mut nav, velocity) in &mut q {
        nav.set_speed_multiplier(status.speed_multiplier());
        nav.set_suspended(status.is_frozen());

        if status.is_frozen() {
            if let Some(mut v) = velocity {
                v.x = 0.0;
                v.z = 0.0;
            }
        }
    }
}
