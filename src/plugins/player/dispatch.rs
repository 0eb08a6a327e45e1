//! Attack dispatch: one active mode, driven by the trigger.
//!
//! [`Arsenal::step`] is the whole state machine. It reads the trigger and the resolved aim
//! for one tick and returns [`Intent`]s; the systems below turn those into messages and
//! entities. Anything sustained (beam, charge orb, swing) is tracked in [`Sustained`] and
//! is the only such effect the arsenal owns at a time.
//!
//! | mode    | press                       | held                | release                 |
//! |---------|-----------------------------|---------------------|-------------------------|
//! | instant | fire (cooldown permitting)  |                     |                         |
//! | beam    | spawn the beam              | re-aim              | dismiss the beam        |
//! | charge  | spawn the orb               | grow the orb        | fizzle or launch        |
//! | burst   | fire N spread projectiles   |                     |                         |
//! | swing   | start a swing (if idle)     |                     |                         |

use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;
use serde::{Deserialize, Serialize};

use super::input::{resolve_aim_point, AttackInput, ModeSelect, Trigger};
use super::Player;
use crate::common::error::{ensure_ordered, ensure_positive, ConfigError};
use crate::common::rng::CombatRng;
use crate::common::state::GameState;
use crate::common::tunables::Tunables;
use crate::plugins::combat::{BehaviorDisabled, Cue, CueKind, EffectOf, LifeState, Team};
use crate::plugins::effects::{Beam, BeamSpec, CastChain, Swing, SwingSpec};
use crate::plugins::projectiles::{pitched_up, Projectile, ProjectileSpec, SpawnProjectile};
use crate::plugins::spatial::AvianSpatial;
use crate::plugins::targeting::ChainSpec;

/// How far in front of the muzzle a fully charged orb sits.
const ORB_REACH: f32 = 0.5;

// -----------------------------------------------------------------------------
// Definitions
// -----------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delivery {
    Projectile(ProjectileSpec),
    Chain(ChainSpec),
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChargeSpec {
    pub min_charge_time: f32,
    pub max_charge_time: f32,
    pub min_launch_speed: f32,
    pub max_launch_speed: f32,
    /// Degrees above the aim direction.
    pub launch_angle: f32,
    pub projectile: ProjectileSpec,
}

impl Default for ChargeSpec {
    fn default() -> Self {
        Self {
            min_charge_time: 0.3,
            max_charge_time: 2.0,
            min_launch_speed: 10.0,
            max_launch_speed: 30.0,
            launch_angle: 30.0,
            projectile: ProjectileSpec::poison_bomb(),
        }
    }
}

impl ChargeSpec {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("charge.max_charge_time", self.max_charge_time)?;
        ensure_ordered("charge time", self.min_charge_time, self.max_charge_time)?;
        ensure_ordered("launch speed", self.min_launch_speed, self.max_launch_speed)?;
        self.projectile.validate()
    }

    pub fn launch_velocity(&self, aim: Dir3, power: f32) -> Vec3 {
        let speed = self.min_launch_speed + (self.max_launch_speed - self.min_launch_speed) * power;
        *pitched_up(aim, self.launch_angle) * speed
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ChargeRelease {
    Fizzle,
    Launch { power: f32 },
}

/// Below `min_charge_time` a release does nothing; at or above it, power scales with the
/// charge up to `max_charge_time`.
pub fn release_charge(elapsed: f32, spec: &ChargeSpec) -> ChargeRelease {
    if elapsed < spec.min_charge_time {
        return ChargeRelease::Fizzle;
    }
    ChargeRelease::Launch { power: (elapsed / spec.max_charge_time).clamp(0.0, 1.0) }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BurstSpec {
    pub count: u32,
    /// Degrees either side of the aim, horizontally.
    pub horizontal_spread: f32,
    /// Degrees above or below the aim.
    pub vertical_spread: f32,
    pub projectile: ProjectileSpec,
}

impl Default for BurstSpec {
    fn default() -> Self {
        Self { count: 8, horizontal_spread: 15.0, vertical_spread: 10.0, projectile: ProjectileSpec::ice_shard() }
    }
}

impl BurstSpec {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("burst.count", self.count as f32)?;
        self.projectile.validate()
    }
}

/// One independently jittered direction per projectile.
pub fn burst_directions(aim: Dir3, spec: &BurstSpec, rng: &mut CombatRng) -> Vec<Dir3> {
    (0..spec.count)
        .map(|_| {
            let yaw = rng.symmetric(spec.horizontal_spread).to_radians();
            let pitch = rng.symmetric(spec.vertical_spread);
            let pitched = pitched_up(aim, pitch);
            Dir3::new(Quat::from_rotation_y(yaw) * *pitched).unwrap_or(aim)
        })
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttackMode {
    Instant { delivery: Delivery },
    Beam { beam: BeamSpec },
    Charge { charge: ChargeSpec },
    Burst { burst: BurstSpec },
    Swing { swing: SwingSpec },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttackDefinition {
    pub name: String,
    /// Attacks per second.
    pub attack_speed: f32,
    pub mode: AttackMode,
}

impl AttackDefinition {
    pub fn new(name: impl Into<String>, attack_speed: f32, mode: AttackMode) -> Self {
        Self { name: name.into(), attack_speed, mode }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("attack_speed", self.attack_speed)?;
        match &self.mode {
            AttackMode::Instant { delivery: Delivery::Projectile(spec) } => spec.validate(),
            AttackMode::Instant { delivery: Delivery::Chain(spec) } => spec.validate(),
            AttackMode::Beam { beam } => beam.validate(),
            AttackMode::Charge { charge } => charge.validate(),
            AttackMode::Burst { burst } => burst.validate(),
            AttackMode::Swing { swing } => swing.validate(),
        }
    }

    #[inline]
    pub fn cooldown(&self) -> f32 {
        1.0 / self.attack_speed
    }
}

pub fn default_arsenal() -> Vec<AttackDefinition> {
    vec![
        AttackDefinition::new(
            "Magic Missile",
            2.0,
            AttackMode::Instant { delivery: Delivery::Projectile(ProjectileSpec::magic_missile()) },
        ),
        AttackDefinition::new(
            "Chain Lightning",
            1.0,
            AttackMode::Instant { delivery: Delivery::Chain(ChainSpec::default()) },
        ),
        AttackDefinition::new("Laser", 1.0, AttackMode::Beam { beam: BeamSpec::default() }),
        AttackDefinition::new("Poison Bomb", 1.0, AttackMode::Charge { charge: ChargeSpec::default() }),
        AttackDefinition::new("Ice Shards", 1.0, AttackMode::Burst { burst: BurstSpec::default() }),
        AttackDefinition::new("Sword", 1.0, AttackMode::Swing { swing: SwingSpec::default() }),
    ]
}

// -----------------------------------------------------------------------------
// State machine
// -----------------------------------------------------------------------------

/// The one sustained effect the arsenal currently owns.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Sustained {
    #[default]
    Idle,
    Beam(Entity),
    Charging { orb: Entity, elapsed: f32 },
    Swinging(Entity),
}

/// Where the attack comes from and where it is going this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aim {
    pub muzzle: Vec3,
    /// Resolved aim point (see [`resolve_aim_point`]).
    pub point: Vec3,
    pub ray_origin: Vec3,
    pub ray_direction: Dir3,
}

impl Aim {
    /// Muzzle toward the aim point; the raw aim ray if they coincide.
    pub fn direction(&self) -> Dir3 {
        Dir3::new(self.point - self.muzzle).unwrap_or(self.ray_direction)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Intent {
    Cue(CueKind),
    Projectile { origin: Vec3, velocity: Vec3, spec: ProjectileSpec },
    Chain { origin: Vec3, direction: Dir3, spec: ChainSpec },
    SpawnBeam { spec: BeamSpec, origin: Vec3, direction: Dir3 },
    AimBeam { beam: Entity, origin: Vec3, direction: Dir3 },
    SpawnOrb { origin: Vec3 },
    GrowOrb { orb: Entity, progress: f32 },
    Launch { orb: Entity, velocity: Vec3, spec: ProjectileSpec },
    SpawnSwing { spec: SwingSpec },
    /// Remove a sustained effect (beam released, charge fizzled, mode switched).
    Dismiss(Entity),
}

/// Result of a mode switch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModeSwitch {
    pub index: usize,
    pub cancelled: Option<Entity>,
    /// The cancelled effect was a charge in progress.
    pub fizzled: bool,
}

#[derive(Component, Debug, Clone)]
pub struct Arsenal {
    definitions: Vec<AttackDefinition>,
    current: usize,
    cooldown: f32,
    sustained: Sustained,
    /// Muzzle offset in the owner's local space.
    pub muzzle: Vec3,
}

impl Arsenal {
    pub fn new(definitions: Vec<AttackDefinition>, muzzle: Vec3) -> Self {
        Self { definitions, current: 0, cooldown: 0.0, sustained: Sustained::Idle, muzzle }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.definitions.is_empty() {
            return Err(ConfigError::EmptyArsenal);
        }
        self.definitions.iter().try_for_each(AttackDefinition::validate)
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> Option<&AttackDefinition> {
        self.definitions.get(self.current)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    #[inline]
    pub fn sustained(&self) -> Sustained {
        self.sustained
    }

    #[inline]
    pub fn ready(&self) -> bool {
        self.cooldown <= 0.0
    }

    /// Switch modes. Whatever the old mode was sustaining is cancelled.
    ///
    /// Returns `None` for the current index or an index outside the arsenal.
    pub fn select(&mut self, selection: ModeSelect) -> Option<ModeSwitch> {
        let len = self.definitions.len();
        if len == 0 {
            return None;
        }
        let index = match selection {
            ModeSelect::Index(i) if i < len => i,
            ModeSelect::Index(i) => {
                warn!(index = i, len, "no attack mode at that index");
                return None;
            }
            ModeSelect::Next => (self.current + 1) % len,
            ModeSelect::Previous => (self.current + len - 1) % len,
        };
        if index == self.current {
            return None;
        }

        let fizzled = matches!(self.sustained, Sustained::Charging { .. });
        let cancelled = self.cancel();
        self.current = index;
        Some(ModeSwitch { index, cancelled, fizzled })
    }

    /// Drop the sustained effect, returning its entity.
    pub fn cancel(&mut self) -> Option<Entity> {
        match std::mem::take(&mut self.sustained) {
            Sustained::Idle => None,
            Sustained::Beam(e) | Sustained::Swinging(e) => Some(e),
            Sustained::Charging { orb, .. } => Some(orb),
        }
    }

    /// Record the entity spawned for the last `Spawn*` intent.
    pub fn attach(&mut self, entity: Entity) {
        self.sustained = match self.current().map(|d| d.mode) {
            Some(AttackMode::Beam { .. }) => Sustained::Beam(entity),
            Some(AttackMode::Charge { .. }) => Sustained::Charging { orb: entity, elapsed: 0.0 },
            Some(AttackMode::Swing { .. }) => Sustained::Swinging(entity),
            _ => return,
        };
    }

    /// Release the busy flag once the swing has run its course.
    pub fn settle_swing(&mut self, finished: bool) {
        if finished && matches!(self.sustained, Sustained::Swinging(_)) {
            self.sustained = Sustained::Idle;
        }
    }

    fn start_cooldown(&mut self, definition: &AttackDefinition) {
        self.cooldown = definition.cooldown();
    }

    /// Advance one tick.
    pub fn step(&mut self, dt: f32, trigger: Trigger, aim: &Aim, rng: &mut CombatRng) -> Vec<Intent> {
        self.cooldown = (self.cooldown - dt).max(0.0);
        let mut out = Vec::new();
        let Some(definition) = self.current().cloned() else {
            return out;
        };

        match definition.mode {
            AttackMode::Instant { delivery } => {
                if trigger.pressed && self.ready() {
                    self.start_cooldown(&definition);
                    out.push(Intent::Cue(CueKind::Attack));
                    let direction = aim.direction();
                    out.push(match delivery {
                        Delivery::Projectile(spec) => {
                            Intent::Projectile { origin: aim.muzzle, velocity: *direction * spec.speed, spec }
                        }
                        Delivery::Chain(spec) => Intent::Chain { origin: aim.muzzle, direction, spec },
                    });
                }
            }

            AttackMode::Beam { beam } => {
                let direction = beam.direction(aim.muzzle, aim.point, aim.ray_origin, aim.ray_direction);
                let sustained = self.sustained;
                match sustained {
                    Sustained::Idle if trigger.pressed => {
                        out.push(Intent::Cue(CueKind::SpinUp));
                        out.push(Intent::SpawnBeam { spec: beam, origin: aim.muzzle, direction });
                    }
                    Sustained::Beam(entity) if trigger.released || !trigger.held => {
                        self.sustained = Sustained::Idle;
                        out.push(Intent::Dismiss(entity));
                    }
                    Sustained::Beam(entity) => {
                        out.push(Intent::AimBeam { beam: entity, origin: aim.muzzle, direction });
                    }
                    _ => {}
                }
            }

            AttackMode::Charge { charge } => match self.sustained() {
                Sustained::Idle if trigger.pressed && self.ready() => {
                    out.push(Intent::Cue(CueKind::SpinUp));
                    out.push(Intent::SpawnOrb { origin: aim.muzzle });
                }
                Sustained::Charging { orb, elapsed } => {
                    let elapsed = elapsed + dt;
                    if trigger.released || !trigger.held {
                        self.sustained = Sustained::Idle;
                        match release_charge(elapsed, &charge) {
                            ChargeRelease::Fizzle => {
                                debug!(elapsed, "charge fizzled");
                                out.push(Intent::Cue(CueKind::Fizzle));
                                out.push(Intent::Dismiss(orb));
                            }
                            ChargeRelease::Launch { power } => {
                                self.start_cooldown(&definition);
                                out.push(Intent::Cue(CueKind::Launch));
                                out.push(Intent::Launch {
                                    orb,
                                    velocity: charge.launch_velocity(aim.direction(), power),
                                    spec: charge.projectile,
                                });
                            }
                        }
                    } else {
                        self.sustained = Sustained::Charging { orb, elapsed };
                        let progress = (elapsed / charge.max_charge_time).clamp(0.0, 1.0);
                        out.push(Intent::GrowOrb { orb, progress });
                    }
                }
                _ => {}
            },

            AttackMode::Burst { burst } => {
                if trigger.pressed && self.ready() {
                    self.start_cooldown(&definition);
                    out.push(Intent::Cue(CueKind::Attack));
                    for direction in burst_directions(aim.direction(), &burst, rng) {
                        out.push(Intent::Projectile {
                            origin: aim.muzzle,
                            velocity: *direction * burst.projectile.speed,
                            spec: burst.projectile,
                        });
                    }
                }
            }

            AttackMode::Swing { swing } => {
                if trigger.pressed && self.sustained == Sustained::Idle && self.ready() {
                    self.start_cooldown(&definition);
                    out.push(Intent::Cue(CueKind::Attack));
                    out.push(Intent::SpawnSwing { spec: swing });
                }
            }
        }

        out
    }
}

// -----------------------------------------------------------------------------
// Systems
// -----------------------------------------------------------------------------

/// Observer notification for the UI.
#[derive(Message, Clone, Debug)]
pub struct AttackModeChanged {
    pub entity: Entity,
    pub index: usize,
    pub name: String,
}

/// Visual state of a charge in progress.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct ChargeOrb {
    pub progress: f32,
}

impl ChargeOrb {
    #[inline]
    pub fn scale(&self) -> f32 {
        0.1 + 0.9 * self.progress
    }
}

pub fn select_attack_mode(
    mut commands: Commands,
    mut input: ResMut<AttackInput>,
    mut players: Query<(Entity, &mut Arsenal), (With<Player>, Without<BehaviorDisabled>)>,
    mut cues: MessageWriter<Cue>,
    mut changed: MessageWriter<AttackModeChanged>,
) {
    let Some(selection) = input.take_selection() else {
        return;
    };
    let Ok((entity, mut arsenal)) = players.single_mut() else {
        return;
    };
    let Some(switch) = arsenal.select(selection) else {
        return;
    };

    if let Some(effect) = switch.cancelled {
        commands.entity(effect).try_despawn();
        if switch.fizzled {
            cues.write(Cue::new(entity, CueKind::Fizzle));
        }
    }

    let name = arsenal.current().map(|d| d.name.clone()).unwrap_or_default();
    info!(index = switch.index, %name, "attack mode changed");
    changed.write(AttackModeChanged { entity, index: switch.index, name });
}

pub fn dispatch_attacks(
    time: Res<Time<Fixed>>,
    tunables: Res<Tunables>,
    spatial: AvianSpatial,
    mut input: ResMut<AttackInput>,
    mut rng: ResMut<CombatRng>,
    mut commands: Commands,
    mut players: Query<(Entity, &Transform, &mut Arsenal, &LifeState), (With<Player>, Without<BehaviorDisabled>)>,
    mut beams: Query<&mut Beam>,
    mut orbs: Query<(&mut ChargeOrb, &mut Transform), Without<Player>>,
    swings: Query<&Swing>,
    mut projectiles: MessageWriter<SpawnProjectile>,
    mut chains: MessageWriter<CastChain>,
    mut cues: MessageWriter<Cue>,
) {
    let trigger = input.take_trigger();
    let Ok((player, tf, mut arsenal, life)) = players.single_mut() else {
        return;
    };
    if !life.is_alive() {
        return;
    }

    if let Sustained::Swinging(swing) = arsenal.sustained() {
        arsenal.settle_swing(swings.get(swing).map_or(true, Swing::is_done));
    }

    let muzzle = tf.transform_point(arsenal.muzzle);
    let aim = Aim {
        muzzle,
        point: resolve_aim_point(&spatial, input.aim_origin, input.aim_direction, tunables.far_aim_distance),
        ray_origin: input.aim_origin,
        ray_direction: input.aim_direction,
    };

    for intent in arsenal.step(time.delta_secs(), trigger, &aim, &mut rng) {
        match intent {
            Intent::Cue(kind) => {
                cues.write(Cue::new(player, kind));
            }
            Intent::Projectile { origin, velocity, spec } => {
                projectiles.write(SpawnProjectile { owner: Some(player), team: Team::Player, origin, velocity, spec });
            }
            Intent::Chain { origin, direction, spec } => {
                chains.write(CastChain { caster: Some(player), origin, direction, spec });
            }
            Intent::SpawnBeam { spec, origin, direction } => {
                let beam = commands
                    .spawn((
                        Name::new("Beam"),
                        Beam::new(spec, origin, direction),
                        Transform::from_translation(origin).looking_to(*direction, Vec3::Y),
                        EffectOf(player),
                        DespawnOnExit(GameState::InGame),
                    ))
                    .id();
                arsenal.attach(beam);
            }
            Intent::AimBeam { beam, origin, direction } => {
                if let Ok(mut beam) = beams.get_mut(beam) {
                    beam.aim(origin, direction);
                } else {
                    arsenal.cancel();
                }
            }
            Intent::SpawnOrb { origin } => {
                let orb = commands
                    .spawn((
                        Name::new("ChargeOrb"),
                        ChargeOrb::default(),
                        Transform::from_translation(origin).with_scale(Vec3::splat(ChargeOrb::default().scale())),
                        EffectOf(player),
                        DespawnOnExit(GameState::InGame),
                    ))
                    .id();
                arsenal.attach(orb);
            }
            Intent::GrowOrb { orb, progress } => {
                if let Ok((mut state, mut orb_tf)) = orbs.get_mut(orb) {
                    state.progress = progress;
                    orb_tf.translation = muzzle + *tf.forward() * ORB_REACH * progress;
                    orb_tf.scale = Vec3::splat(state.scale());
                }
            }
            Intent::Launch { orb, velocity, spec } => {
                info!(speed = velocity.length(), "charge released");
                commands.entity(orb).remove::<(EffectOf, ChargeOrb)>().insert((
                    Name::new("ChargedProjectile"),
                    Projectile::new(spec, Team::Player, Some(player), velocity),
                ));
            }
            Intent::SpawnSwing { spec } => {
                let swing = commands
                    .spawn((Name::new("Swing"), Swing::new(spec), EffectOf(player), DespawnOnExit(GameState::InGame)))
                    .id();
                arsenal.attach(swing);
            }
            Intent::Dismiss(effect) => {
                commands.entity(effect).try_despawn();
            }
        }
    }
}
