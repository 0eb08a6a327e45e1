//! Melee charger: chase, then commit to a charge at a snapshotted point and stab.
//!
//! ```text
//!   Idle ──target in sight──► Chase ──within charge range──► ChargeStab ──► Cooldown ──► Chase
//!                               ▲                          Rushing                       │
//!                               │                          Striking (stab delay)         │
//!                               │                          Recovering (post-stab pause)  │
//!                               └────────────────────────────────────────────────────────┘
//! ```
//!
//! The charge destination is the target's position when the charge starts; it is never
//! updated. The rush ends on arrival or after `max_charge_time`, and a stab follows either
//! way. `busy` is held from the start of the charge until the cooldown ends.

use avian3d::prelude::*;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::{carry_out, is_frozen, Blow, Enemy, Orders, Perception, Quarry};
use crate::common::error::{ensure_positive, ConfigError};
use crate::common::tunables::Tunables;
use crate::plugins::combat::{BehaviorDisabled, Cue, CueKind, LifeState, Strike, StrikeShape};
use crate::plugins::navigation::{planar, Navigator};
use crate::plugins::spatial::AvianSpatial;
use crate::plugins::status::StatusEffects;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeleeProfile {
    pub max_health: f32,
    pub move_speed: f32,
    pub acceleration: f32,
    pub stopping_distance: f32,
    pub sight_range: f32,
    /// Start a charge once the target is this close.
    pub charge_range: f32,
    pub charge_speed: f32,
    pub charge_acceleration: f32,
    pub max_charge_time: f32,
    /// The rush counts as arrived within this planar distance of the locked point.
    pub arrive_distance: f32,
    pub stab_delay: f32,
    /// Distance from the body center to the weapon's strike point.
    pub stab_reach: f32,
    pub stab_range: f32,
    pub damage: f32,
    pub post_stab_pause: f32,
    pub cooldown: f32,
}

impl Default for MeleeProfile {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            move_speed: 3.5,
            acceleration: 20.0,
            stopping_distance: 1.5,
            sight_range: 20.0,
            charge_range: 8.0,
            charge_speed: 18.0,
            charge_acceleration: 200.0,
            max_charge_time: 2.0,
            arrive_distance: 1.2,
            stab_delay: 0.15,
            stab_reach: 1.0,
            stab_range: 1.5,
            damage: 15.0,
            post_stab_pause: 0.4,
            cooldown: 1.5,
        }
    }
}

impl MeleeProfile {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("max_health", self.max_health)?;
        ensure_positive("move_speed", self.move_speed)?;
        ensure_positive("charge_speed", self.charge_speed)?;
        ensure_positive("max_charge_time", self.max_charge_time)?;
        ensure_positive("stab_range", self.stab_range)?;
        ensure_positive("sight_range", self.sight_range)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ChargePhase {
    Rushing { locked: Vec3, elapsed: f32 },
    Striking { remaining: f32, facing: Vec3 },
    Recovering { remaining: f32 },
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum MeleeState {
    #[default]
    Idle,
    Chase,
    ChargeStab(ChargePhase),
    Cooldown { remaining: f32 },
}

#[derive(Component, Debug, Clone)]
pub struct MeleeCharger {
    profile: MeleeProfile,
    state: MeleeState,
    busy: bool,
}

impl MeleeCharger {
    pub fn new(profile: MeleeProfile) -> Self {
        Self { profile, state: MeleeState::Idle, busy: false }
    }

    #[inline]
    pub fn state(&self) -> MeleeState {
        self.state
    }

    #[inline]
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    #[inline]
    pub fn profile(&self) -> &MeleeProfile {
        &self.profile
    }

    /// Try to start a charge toward `locked`. Rejected while a sequence is in flight.
    pub fn begin_charge(&mut self, locked: Vec3, nav: &mut Navigator) -> bool {
        if self.busy {
            return false;
        }
        self.busy = true;
        self.state = MeleeState::ChargeStab(ChargePhase::Rushing { locked, elapsed: 0.0 });
        nav.override_motion(self.profile.charge_speed, self.profile.charge_acceleration);
        nav.set_destination(locked);
        true
    }

    pub fn tick(&mut self, dt: f32, sense: &Perception, nav: &mut Navigator) -> Orders {
        let mut orders = Orders::default();
        let p = self.profile;
        let here = sense.position;
        let target = sense.target.filter(|t| t.distance <= p.sight_range);

        match self.state {
            MeleeState::Idle => {
                nav.stop();
                if target.is_some() {
                    self.state = MeleeState::Chase;
                }
            }

            MeleeState::Chase => {
                let Some(target) = target else {
                    nav.stop();
                    self.state = MeleeState::Idle;
                    return orders;
                };

                nav.set_destination(target.position);
                orders.face = Some(target.position);

                if target.distance <= p.charge_range && self.begin_charge(target.position, nav) {
                    debug!(locked = ?target.position, "melee charge");
                    orders.cue(CueKind::Telegraph);
                }
            }

            MeleeState::ChargeStab(ChargePhase::Rushing { locked, elapsed }) => {
                let elapsed = elapsed + dt;
                let reach = p.arrive_distance.max(nav.stopping_distance);
                let arrived = planar(locked - here).length() <= reach;

                if arrived || elapsed >= p.max_charge_time {
                    nav.hard_stop();
                    nav.clear_override();

                    // Face whoever is there now, not the stale snapshot.
                    let look_at = sense.target.map_or(locked, |t| t.position);
                    let facing = planar(look_at - here).normalize_or(Vec3::NEG_Z);
                    orders.face = Some(look_at);
                    orders.cue(CueKind::Attack);
                    self.state = MeleeState::ChargeStab(ChargePhase::Striking { remaining: p.stab_delay, facing });
                } else {
                    orders.face = Some(locked);
                    self.state = MeleeState::ChargeStab(ChargePhase::Rushing { locked, elapsed });
                }
            }

            MeleeState::ChargeStab(ChargePhase::Striking { remaining, facing }) => {
                let remaining = remaining - dt;
                if remaining <= 0.0 {
                    orders.blow = Some(Blow {
                        shape: StrikeShape::Sphere { center: here + facing * p.stab_reach, radius: p.stab_range },
                        damage: p.damage,
                    });
                    nav.hard_stop();
                    orders.velocity = Some(Vec3::ZERO);
                    self.state = MeleeState::ChargeStab(ChargePhase::Recovering { remaining: p.post_stab_pause });
                } else {
                    self.state = MeleeState::ChargeStab(ChargePhase::Striking { remaining, facing });
                }
            }

            MeleeState::ChargeStab(ChargePhase::Recovering { remaining }) => {
                let remaining = remaining - dt;
                self.state = if remaining <= 0.0 {
                    MeleeState::Cooldown { remaining: p.cooldown }
                } else {
                    MeleeState::ChargeStab(ChargePhase::Recovering { remaining })
                };
            }

            MeleeState::Cooldown { remaining } => {
                let remaining = remaining - dt;
                if let Some(t) = target {
                    orders.face = Some(t.position);
                }
                if remaining <= 0.0 {
                    self.busy = false;
                    nav.resume();
                    self.state = MeleeState::Chase;
                } else {
                    self.state = MeleeState::Cooldown { remaining };
                }
            }
        }

        orders
    }
}

pub fn think_melee(
    time: Res<Time<Fixed>>,
    tunables: Res<Tunables>,
    spatial: AvianSpatial,
    quarry: Quarry,
    mut q: Query<
        (
            Entity,
            &mut Transform,
            &mut MeleeCharger,
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
        let orders = brain.tick(dt, &sense, &mut nav);
        carry_out(entity, &orders, &mut tf, Some(&mut *velocity), &mut cues, &mut strikes);
    }
}
