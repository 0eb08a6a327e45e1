//! Closed-form leap ballistics and lead prediction.
//!
//! Travel time is distance over a fixed horizontal speed, clamped to
//! `[min_leap_time, max_leap_time]`. The vertical launch speed is
//!
//! ```text
//!   v_y = (Δh + arc_height) / t + ½·g·t
//! ```
//!
//! so the body's height at time `t` is `Δh + arc_height` above the start: the leap comes
//! down onto its target from above rather than skimming the ground.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::common::error::{ensure_ordered, ensure_positive, ensure_unit, ConfigError};
use crate::plugins::navigation::planar;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeapSolver {
    pub horizontal_speed: f32,
    pub arc_height: f32,
    pub min_leap_time: f32,
    pub max_leap_time: f32,
    pub max_leap_distance: f32,
}

impl Default for LeapSolver {
    fn default() -> Self {
        Self {
            horizontal_speed: 10.0,
            arc_height: 3.0,
            min_leap_time: 0.3,
            max_leap_time: 2.0,
            max_leap_distance: 20.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LeapPlan {
    pub velocity: Vec3,
    pub time: f32,
    /// End point after clamping to `max_leap_distance`.
    pub landing: Vec3,
}

/// How strongly to lead a moving target.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeadProfile {
    /// Blend between the target's current position (0) and its predicted one (1).
    pub prediction_strength: f32,
    /// Target speeds above this are clamped before predicting.
    pub max_used_velocity: f32,
}

impl Default for LeadProfile {
    fn default() -> Self {
        Self { prediction_strength: 0.65, max_used_velocity: 12.0 }
    }
}

impl LeadProfile {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_unit("prediction_strength", self.prediction_strength)?;
        ensure_positive("max_used_velocity", self.max_used_velocity)
    }
}

impl LeapSolver {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("horizontal_speed", self.horizontal_speed)?;
        ensure_positive("min_leap_time", self.min_leap_time)?;
        ensure_positive("max_leap_distance", self.max_leap_distance)?;
        ensure_ordered("leap time", self.min_leap_time, self.max_leap_time)
    }

    /// Travel time for a horizontal distance.
    #[inline]
    pub fn travel_time(&self, horizontal_distance: f32) -> f32 {
        (horizontal_distance / self.horizontal_speed.max(0.01)).clamp(self.min_leap_time, self.max_leap_time)
    }

    /// Launch velocity from `start` toward `end` under gravity magnitude `gravity`.
    pub fn solve(&self, start: Vec3, end: Vec3, gravity: f32) -> LeapPlan {
        let mut flat = planar(end - start);
        let mut landing = end;

        if flat.length() > self.max_leap_distance {
            flat = flat.normalize() * self.max_leap_distance;
            landing = Vec3::new(start.x + flat.x, end.y, start.z + flat.z);
        }

        let time = self.travel_time(flat.length());
        let vertical = (landing.y - start.y + self.arc_height) / time + 0.5 * gravity * time;

        let mut velocity = flat.normalize_or_zero() * self.horizontal_speed;
        velocity.y = vertical;

        LeapPlan { velocity, time, landing }
    }

    /// Where to aim a leap at a moving target.
    ///
    /// The target's planar velocity (clamped) is projected over the leap time, then blended
    /// with its current position. The blend weakens when the target is running back
    /// toward the attacker (negative dot with attacker->target): half-hearted at
    /// `dot < -0.3`, abandoned at `dot < -0.7`. The result keeps the target's height and
    /// never lies farther than `max_leap_distance` from the attacker.
    pub fn predict(&self, attacker: Vec3, target: Vec3, target_velocity: Vec3, lead: &LeadProfile) -> Vec3 {
        let velocity = planar(target_velocity).clamp_length_max(lead.max_used_velocity);

        let to_target = planar(target - attacker);
        let distance = to_target.length();
        let heading = if velocity.length() > 0.05 {
            velocity.normalize().dot(to_target.normalize_or_zero())
        } else {
            0.0
        };

        let time = self.travel_time(distance);
        let mut predicted = target + velocity * time;
        predicted.y = target.y;

        let strength = if heading < -0.7 {
            0.0
        } else if heading < -0.3 {
            lead.prediction_strength * 0.3
        } else {
            lead.prediction_strength
        };

        let mut result = target.lerp(predicted, strength);

        let reach = planar(result - attacker);
        if reach.length() > self.max_leap_distance {
            let clamped = reach.normalize() * self.max_leap_distance;
            result = Vec3::new(attacker.x + clamped.x, target.y, attacker.z + clamped.z);
        }

        result
    }
}
