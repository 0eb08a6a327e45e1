//! Leaping predator.
//!
//! ```text
//!   Chasing ──in leap range & grounded──► Charging ──telegraph over──► Leaping ──launch──► Cooldown
//!      ▲                                  (landing locked)             (one tick)            │
//!      └──────────────────────────── cooldown over & grounded ◄───────────────────────────────┘
//! ```
//!
//! The body is dynamic. The navigator drives it only while chasing; the leap itself is a
//! single velocity change and gravity does the rest.
//!
//! Contact damage is armed at launch and disarmed on the first connection or on landing
//! (grounded again after having left the ground). `hit_cooldown` stops one landing from
//! counting twice.

use avian3d::prelude::*;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::{carry_out, is_frozen, Blow, Enemy, Orders, Perception, Quarry};
use crate::common::error::{ensure_positive, ConfigError};
use crate::common::tunables::Tunables;
use crate::plugins::combat::{BehaviorDisabled, Cue, CueKind, LifeState, Strike, StrikeShape};
use crate::plugins::navigation::Navigator;
use crate::plugins::spatial::AvianSpatial;
use crate::plugins::status::StatusEffects;
use crate::plugins::targeting::{LeadProfile, LeapSolver};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeaperProfile {
    pub max_health: f32,
    pub move_speed: f32,
    pub acceleration: f32,
    pub stop_distance: f32,
    pub leap_range: f32,
    pub charge_time: f32,
    pub leap_cooldown: f32,
    /// Wait before retrying a launch that found no ground underfoot.
    pub retry_delay: f32,
    pub solver: LeapSolver,
    pub lead: LeadProfile,
    pub damage: f32,
    pub damage_cooldown: f32,
    /// Center-to-center distance that counts as touching the target.
    pub contact_range: f32,
}

impl Default for LeaperProfile {
    fn default() -> Self {
        Self {
            max_health: 40.0,
            move_speed: 3.0,
            acceleration: 25.0,
            stop_distance: 1.5,
            leap_range: 8.0,
            charge_time: 0.7,
            leap_cooldown: 2.0,
            retry_delay: 0.1,
            solver: LeapSolver::default(),
            lead: LeadProfile::default(),
            damage: 10.0,
            damage_cooldown: 0.25,
            contact_range: 1.5,
        }
    }
}

impl LeaperProfile {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("max_health", self.max_health)?;
        ensure_positive("move_speed", self.move_speed)?;
        ensure_positive("leap_range", self.leap_range)?;
        ensure_positive("charge_time", self.charge_time)?;
        ensure_positive("retry_delay", self.retry_delay)?;
        ensure_positive("contact_range", self.contact_range)?;
        self.solver.validate()?;
        self.lead.validate()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum LeaperState {
    #[default]
    Chasing,
    Charging { remaining: f32, landing: Vec3 },
    Leaping { landing: Vec3 },
    Cooldown { remaining: f32 },
}

#[derive(Component, Debug, Clone)]
pub struct Leaper {
    profile: LeaperProfile,
    state: LeaperState,
    contact_armed: bool,
    left_ground: bool,
    hit_cooldown: f32,
}

impl Leaper {
    pub fn new(profile: LeaperProfile) -> Self {
        Self { profile, state: LeaperState::Chasing, contact_armed: false, left_ground: false, hit_cooldown: 0.0 }
    }

    #[inline]
    pub fn state(&self) -> LeaperState {
        self.state
    }

    #[inline]
    pub fn contact_armed(&self) -> bool {
        self.contact_armed
    }

    /// Advance one tick. `gravity` is the magnitude the physics world uses.
    pub fn tick(&mut self, dt: f32, sense: &Perception, nav: &mut Navigator, gravity: f32) -> Orders {
        let mut orders = Orders::default();
        let p = self.profile;
        let here = sense.position;

        self.hit_cooldown = (self.hit_cooldown - dt).max(0.0);
        self.update_contact(sense, &mut orders);

        if let Some(t) = sense.target {
            orders.face = Some(t.position);
        }

        match self.state {
            LeaperState::Chasing => {
                let Some(target) = sense.target else {
                    nav.stop();
                    return orders;
                };

                if target.distance <= p.leap_range && sense.grounded {
                    let landing = p.solver.predict(here, target.position, target.velocity, &p.lead);
                    nav.hard_stop();
                    orders.velocity = Some(Vec3::ZERO);
                    orders.cue(CueKind::Telegraph);
                    debug!(?landing, "leap charging");
                    self.state = LeaperState::Charging { remaining: p.charge_time, landing };
                } else {
                    nav.set_destination(target.position);
                }
            }

            LeaperState::Charging { remaining, landing } => {
                let remaining = remaining - dt;
                self.state = if remaining > 0.0 {
                    LeaperState::Charging { remaining, landing }
                } else if sense.grounded {
                    LeaperState::Leaping { landing }
                } else {
                    LeaperState::Charging { remaining: p.retry_delay, landing }
                };
            }

            LeaperState::Leaping { landing } => {
                let plan = p.solver.solve(here, landing, gravity);
                orders.velocity = Some(plan.velocity);
                orders.cue(CueKind::Launch);
                self.contact_armed = true;
                self.left_ground = false;
                debug!(velocity = ?plan.velocity, time = plan.time, "leap");
                self.state = LeaperState::Cooldown { remaining: p.leap_cooldown };
            }

            LeaperState::Cooldown { remaining } => {
                let remaining = (remaining - dt).max(0.0);
                self.state = if remaining <= 0.0 && sense.grounded {
                    if let Some(t) = sense.target {
                        nav.set_destination(t.position);
                    } else {
                        nav.resume();
                    }
                    LeaperState::Chasing
                } else {
                    LeaperState::Cooldown { remaining }
                };
            }
        }

        orders
    }

    fn update_contact(&mut self, sense: &Perception, orders: &mut Orders) {
        if !self.contact_armed {
            return;
        }

        if !sense.grounded {
            self.left_ground = true;
        }

        if let Some(target) = sense.target
            && target.distance <= self.profile.contact_range
            && self.hit_cooldown <= 0.0
        {
            orders.blow = Some(Blow { shape: StrikeShape::Direct(target.entity), damage: self.profile.damage });
            orders.cue(CueKind::Attack);
            self.contact_armed = false;
            self.hit_cooldown = self.profile.damage_cooldown;
            return;
        }

        if sense.grounded && self.left_ground && matches!(self.state, LeaperState::Cooldown { .. }) {
            self.contact_armed = false;
        }
    }
}

pub fn think_leaper(
    time: Res<Time<Fixed>>,
    tunables: Res<Tunables>,
    spatial: AvianSpatial,
    quarry: Quarry,
    mut q: Query<
        (
            Entity,
            &mut Transform,
            &mut Leaper,
            &mut Navigator,
            &mut LinearVelocity,
            Option<&StatusEffects>,
            &LifeState,
        ),
        (With<Enemy>, Without<BehaviorDisabled>),
    >,
    mut cues: MessageWriter<Cue>,
    mut strikes: MessageWriter<Strike>,
) {
    let dt = time.delta_secs();

    for (entity, mut tf, mut brain, mut nav, mut velocity, status, life) in &mut q {
        if !life.is_alive() || is_frozen(status) {
            continue;
        }

        let here = tf.translation;
        let sense = Perception::sense(&spatial, &tunables, here, 0.0, quarry.nearest(here));
        let orders = brain.tick(dt, &sense, &mut nav, tunables.gravity);
        carry_out(entity, &orders, &mut tf, Some(&mut *velocity), &mut cues, &mut strikes);
    }
}
