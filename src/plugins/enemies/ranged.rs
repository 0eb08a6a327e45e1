//! Ranged kiter: keep its distance and shoot.
//!
//! Movement comes from the positioning bands; firing is decided separately (rate limit,
//! attack range, line of sight), so it can back away and shoot in the same tick.

use avian3d::prelude::*;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::{carry_out, is_frozen, Enemy, Orders, Perception, Quarry, Shot};
use crate::common::error::{ensure_positive, ConfigError};
use crate::common::rng::CombatRng;
use crate::common::tunables::Tunables;
use crate::plugins::combat::{BehaviorDisabled, Cue, CueKind, LifeState, Strike, Team};
use crate::plugins::navigation::{planar, Navigator};
use crate::plugins::projectiles::{ProjectileSpec, SpawnProjectile};
use crate::plugins::spatial::AvianSpatial;
use crate::plugins::status::StatusEffects;
use crate::plugins::targeting::{BandMove, PositioningBands};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RangedProfile {
    pub max_health: f32,
    pub move_speed: f32,
    pub acceleration: f32,
    pub bands: PositioningBands,
    pub time_between_attacks: f32,
    /// Radius of the random offset added to the aim point.
    pub aim_inaccuracy: f32,
    /// How far one retreat step moves away from the target.
    pub retreat_step: f32,
    /// Fire point relative to the body center.
    pub muzzle_height: f32,
    pub muzzle_forward: f32,
    pub projectile: ProjectileSpec,
}

impl Default for RangedProfile {
    fn default() -> Self {
        Self {
            max_health: 60.0,
            move_speed: 3.5,
            acceleration: 30.0,
            bands: PositioningBands::default(),
            time_between_attacks: 2.0,
            aim_inaccuracy: 0.5,
            retreat_step: 5.0,
            muzzle_height: 0.5,
            muzzle_forward: 0.7,
            projectile: ProjectileSpec::enemy_bolt(),
        }
    }
}

impl RangedProfile {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("max_health", self.max_health)?;
        ensure_positive("move_speed", self.move_speed)?;
        ensure_positive("time_between_attacks", self.time_between_attacks)?;
        ensure_positive("retreat_step", self.retreat_step)?;
        self.bands.validate()?;
        self.projectile.validate()
    }
}

#[derive(Component, Debug, Clone)]
pub struct RangedKiter {
    profile: RangedProfile,
    /// Seconds until the next shot is allowed. Starts ready.
    reload: f32,
    last_move: Option<BandMove>,
}

impl RangedKiter {
    pub fn new(profile: RangedProfile) -> Self {
        Self { profile, reload: 0.0, last_move: None }
    }

    #[inline]
    pub fn profile(&self) -> &RangedProfile {
        &self.profile
    }

    #[inline]
    pub fn last_move(&self) -> Option<BandMove> {
        self.last_move
    }

    pub fn tick(&mut self, dt: f32, sense: &Perception, nav: &mut Navigator, rng: &mut CombatRng) -> Orders {
        let mut orders = Orders::default();
        let p = self.profile;
        let here = sense.position;

        self.reload = (self.reload - dt).max(0.0);

        let Some(target) = sense.target else {
            nav.stop();
            self.last_move = None;
            return orders;
        };

        let movement = p.bands.movement(target.distance);
        self.last_move = Some(movement);

        match movement {
            BandMove::OutOfSight => {
                nav.stop();
                return orders;
            }
            BandMove::Retreat => {
                let away = planar(here - target.position).normalize_or(Vec3::Z);
                nav.set_destination(here + away * p.retreat_step);
            }
            BandMove::Advance => nav.set_destination(target.position),
            BandMove::Hold => nav.stop(),
        }

        orders.face = Some(target.position);

        if self.reload <= 0.0 && p.bands.in_attack_range(target.distance) && target.line_of_sight {
            let forward = planar(target.position - here).normalize_or(Vec3::NEG_Z);
            let origin = here + Vec3::Y * p.muzzle_height + forward * p.muzzle_forward;
            let aim = target.position + rng.in_unit_sphere() * p.aim_inaccuracy;

            if let Ok(direction) = Dir3::new(aim - origin) {
                self.reload = p.time_between_attacks;
                orders.shot = Some(Shot { origin, direction });
                orders.cue(CueKind::Attack);
            }
        }

        orders
    }
}

pub fn think_ranged(
    time: Res<Time<Fixed>>,
    tunables: Res<Tunables>,
    spatial: AvianSpatial,
    quarry: Quarry,
    mut rng: ResMut<CombatRng>,
    mut q: Query<
        (Entity, &mut Transform, &mut RangedKiter, &mut Navigator, Option<&StatusEffects>, &LifeState),
        (With<Enemy>, Without<BehaviorDisabled>),
    >,
    mut cues: MessageWriter<Cue>,
    mut strikes: MessageWriter<Strike>,
    mut shots: MessageWriter<SpawnProjectile>,
) {
    let dt = time.delta_secs();

    for (entity, mut tf, mut brain, mut nav, status, life) in &mut q {
        if !life.is_alive() || is_frozen(status) {
            continue;
        }

        let here = tf.translation;
        let eye = brain.profile().muzzle_height;
        let sense = Perception::sense(&spatial, &tunables, here, eye, quarry.nearest(here));
        let orders = brain.tick(dt, &sense, &mut nav, &mut rng);
        carry_out(entity, &orders, &mut tf, None, &mut cues, &mut strikes);

        if let Some(shot) = orders.shot {
            let spec = brain.profile().projectile;
            shots.write(SpawnProjectile {
                owner: Some(entity),
                team: Team::Enemy,
                origin: shot.origin,
                velocity: *shot.direction * spec.speed,
                spec,
            });
        }
    }
}
