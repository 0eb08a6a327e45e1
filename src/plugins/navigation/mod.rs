//! Navigation collaborator.
//!
//! Behaviors never write velocity themselves. They hand a destination (and optionally a
//! speed/acceleration override) to a [`Navigator`], and [`drive_navigators`] turns that
//! into a planar `LinearVelocity` once per fixed tick. The arena is open ground, so the
//! "path" is the straight line to the destination.
//!
//! Status effects feed in from outside: a chill multiplier scales the effective speed and
//! a suspension (freeze) pins it at zero.

use avian3d::prelude::*;
use bevy::prelude::*;

use crate::plugins::core::CombatSet;

#[derive(Clone, Copy, Debug, PartialEq)]
struct MotionOverride {
    speed: f32,
    acceleration: f32,
}

#[derive(Component, Debug, Clone)]
pub struct Navigator {
    destination: Option<Vec3>,
    base_speed: f32,
    base_acceleration: f32,
    motion_override: Option<MotionOverride>,
    pub stopping_distance: f32,
    velocity: Vec3,
    stopped: bool,
    suspended: bool,
    speed_multiplier: f32,
}

impl Navigator {
    pub fn new(speed: f32, acceleration: f32) -> Self {
        Self {
            destination: None,
            base_speed: speed,
            base_acceleration: acceleration,
            motion_override: None,
            stopping_distance: 0.1,
            velocity: Vec3::ZERO,
            stopped: false,
            suspended: false,
            speed_multiplier: 1.0,
        }
    }

    pub fn with_stopping_distance(mut self, d: f32) -> Self {
        self.stopping_distance = d.max(0.0);
        self
    }

    #[inline]
    pub fn destination(&self) -> Option<Vec3> {
        self.destination
    }

    pub fn set_destination(&mut self, destination: Vec3) {
        self.destination = Some(destination);
        self.stopped = false;
    }

    pub fn clear_destination(&mut self) {
        self.destination = None;
    }

    /// Stop issuing motion; keeps the destination. Velocity decays under acceleration.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    pub fn resume(&mut self) {
        self.stopped = false;
    }

    /// Stop and zero the current velocity. No momentum carries over.
    pub fn hard_stop(&mut self) {
        self.stopped = true;
        self.velocity = Vec3::ZERO;
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn override_motion(&mut self, speed: f32, acceleration: f32) {
        self.motion_override = Some(MotionOverride { speed, acceleration });
    }

    pub fn clear_override(&mut self) {
        self.motion_override = None;
    }

    pub fn set_speed_multiplier(&mut self, m: f32) {
        self.speed_multiplier = m.clamp(0.0, 1.0);
    }

    /// Hold the navigator still from outside (a freeze). Suspension is separate from
    /// `stop`, so lifting it hands motion back to whatever the behavior last asked for.
    pub fn set_suspended(&mut self, suspended: bool) {
        if suspended {
            self.velocity = Vec3::ZERO;
        }
        self.suspended = suspended;
    }

    #[inline]
    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Planar velocity produced by the last `steer`.
    #[inline]
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn effective_speed(&self) -> f32 {
        if self.suspended {
            return 0.0;
        }
        let speed = self.motion_override.map_or(self.base_speed, |o| o.speed);
        speed * self.speed_multiplier
    }

    fn acceleration(&self) -> f32 {
        self.motion_override.map_or(self.base_acceleration, |o| o.acceleration)
    }

    /// Planar distance to the destination, or `None` without one.
    pub fn remaining_distance(&self, from: Vec3) -> Option<f32> {
        self.destination.map(|d| planar(d - from).length())
    }

    /// True once within stopping distance of the destination.
    pub fn arrived(&self, from: Vec3) -> bool {
        self.remaining_distance(from).is_some_and(|d| d <= self.stopping_distance)
    }

    /// Advance one tick and return the planar velocity to apply.
    ///
    /// Accelerates toward `desired = dir * effective_speed` at the current acceleration.
    /// Desired velocity is zero when stopped, suspended, without a destination, or within
    /// stopping distance.
    pub fn steer(&mut self, position: Vec3, dt: f32) -> Vec3 {
        let desired = match self.destination {
            Some(dest) if !self.stopped && !self.suspended => {
                let to = planar(dest - position);
                let dist = to.length();
                if dist <= self.stopping_distance || dist < 1e-4 {
                    Vec3::ZERO
                } else {
                    // Do not overshoot within a single tick.
                    let speed = self.effective_speed().min(dist / dt.max(1e-4));
                    to / dist * speed
                }
            }
            _ => Vec3::ZERO,
        };

        if self.suspended {
            self.velocity = Vec3::ZERO;
            return self.velocity;
        }

        let max_delta = self.acceleration() * dt;
        let delta = desired - self.velocity;
        self.velocity += delta.clamp_length_max(max_delta);
        self.velocity
    }
}

/// Velocity estimated from position deltas, refreshed every fixed tick.
#[derive(Component, Debug, Clone, Default)]
pub struct TrackedVelocity {
    last: Option<Vec3>,
    pub velocity: Vec3,
}

impl TrackedVelocity {
    pub fn observe(&mut self, position: Vec3, dt: f32) {
        if let Some(last) = self.last {
            self.velocity = (position - last) / dt.max(0.001);
        }
        self.last = Some(position);
    }
}

/// Marker: the body is dynamic and only its horizontal velocity belongs to the navigator.
#[derive(Component, Debug, Clone, Copy)]
pub struct PlanarDrive;

#[inline]
pub fn planar(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Yaw-only rotation looking from `from` toward `to`. `None` when they coincide.
pub fn facing(from: Vec3, to: Vec3) -> Option<Quat> {
    let dir = planar(to - from);
    if dir.length_squared() < 1e-4 {
        return None;
    }
    Some(Transform::IDENTITY.looking_to(dir, Vec3::Y).rotation)
}

pub fn plugin(app: &mut App) {
    app.add_systems(FixedUpdate, track_velocity.in_set(CombatSet::Sense));
    app.add_systems(FixedUpdate, drive_navigators.in_set(CombatSet::Act));
}

pub fn track_velocity(time: Res<Time<Fixed>>, mut q: Query<(&Transform, &mut TrackedVelocity)>) {
    let dt = time.delta_secs();
    for (tf, mut tracked) in &mut q {
        tracked.observe(tf.translation, dt);
    }
}

/// Write navigator output into physics velocity.
///
/// Kinematic bodies get the full planar velocity. `PlanarDrive` bodies keep their vertical
/// component (gravity) and are only driven while the navigator has somewhere to go, so an
/// airborne leap is never overwritten.
pub fn drive_navigators(
    time: Res<Time<Fixed>>,
    mut q: Query<(&Transform, &mut Navigator, &mut LinearVelocity, Has<PlanarDrive>)>,
) {
    let dt = time.delta_secs();

    for (tf, mut nav, mut velocity, planar_drive) in &mut q {
        if planar_drive && (nav.is_stopped() || nav.destination().is_none()) {
            continue;
        }

        let v = nav.steer(tf.translation, dt);
        if planar_drive {
            velocity.x = v.x;
            velocity.z = v.z;
        } else {
            velocity.0 = v;
        }
    }
}
