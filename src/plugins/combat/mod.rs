//! Combat plugin: who can be hurt, how a hit is applied, and what happens at zero health.
//!
//! ---------------------------
//! DATA FLOW
//! ---------------------------
//! ```text
//!   attack code (projectile sweep, beam tick, area tick, chain cast, swing)
//!        │  DamageEvent + its own ExclusionSet
//!        ▼
//!   HitResolver::resolve ──► Health::take_damage ──► StatusEffects::apply_chill
//!        │
//!        ├─► HitLanded / HealthChanged      (observers: UI, sound)
//!        ├─► Cue { Hit | Frozen | Death }   (fire-and-forget presentation)
//!        └─► CombatantDied (exactly once)   ──► DefeatLedger, GameState::Defeated
//!
//!   enemy behaviors ──Strike message──► resolve_strikes ──► HitResolver
//! ```
//!
//! Behaviors cannot hold a `HitResolver` (they read `StatusEffects` to know whether they
//! are frozen), so they describe a one-shot resolution as a [`Strike`] and let
//! [`resolve::resolve_strikes`] run it with a fresh exclusion set.
//!
//! Death does not despawn. The lifecycle (see [`lifecycle`]) moves a combatant through
//! `Alive -> Dying -> Dead`, strips its collision interest, cancels the sustained effects
//! it owns, and despawns it in `PostUpdate`.

pub mod lifecycle;
pub mod resolve;

use avian3d::prelude::*;
use bevy::platform::collections::HashSet;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::common::layers::{self, Layer};
use crate::plugins::core::CombatSet;

pub use lifecycle::{DefeatLedger, LifeState, PendingDespawn};
pub use resolve::{resolve_hit, HitOutcome, HitReport, HitResolver};

// -----------------------------------------------------------------------------
// Components
// -----------------------------------------------------------------------------

#[derive(Component, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Team {
    Player,
    Enemy,
}

impl Team {
    /// Interest mask of the combatants this team attacks.
    pub fn hostiles(self) -> LayerMask {
        match self {
            Team::Player => layers::enemies(),
            Team::Enemy => layers::players(),
        }
    }

    /// Interest mask of this team's own combatants.
    pub fn allies(self) -> LayerMask {
        match self {
            Team::Player => layers::players(),
            Team::Enemy => layers::enemies(),
        }
    }

    pub fn layer(self) -> Layer {
        match self {
            Team::Player => Layer::Player,
            Team::Enemy => Layer::Enemy,
        }
    }
}

/// Result of a single damage application.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DamageOutcome {
    /// Health actually removed (never more than what was left).
    pub applied: f32,
    /// True only on the application that crossed to zero.
    pub killed: bool,
}

/// What the damage pipeline needs from anything with health.
pub trait HealthReceiver {
    fn take_damage(&mut self, amount: f32) -> DamageOutcome;
    /// Returns the amount actually restored.
    fn heal(&mut self, amount: f32) -> f32;
}

#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct Health {
    current: f32,
    max: f32,
}

impl Health {
    /// `max` is taken as authored; profiles reject non-positive values before spawning.
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    #[inline]
    pub fn current(&self) -> f32 {
        self.current
    }

    #[inline]
    pub fn max(&self) -> f32 {
        self.max
    }

    #[inline]
    pub fn is_depleted(&self) -> bool {
        self.current <= 0.0
    }

    #[inline]
    pub fn fraction(&self) -> f32 {
        if self.max > 0.0 { self.current / self.max } else { 0.0 }
    }
}

impl HealthReceiver for Health {
    fn take_damage(&mut self, amount: f32) -> DamageOutcome {
        if self.is_depleted() {
            return DamageOutcome { applied: 0.0, killed: false };
        }
        let applied = amount.max(0.0).min(self.current);
        self.current -= applied;
        DamageOutcome { applied, killed: self.current <= 0.0 }
    }

    fn heal(&mut self, amount: f32) -> f32 {
        // The dead stay dead.
        if self.is_depleted() {
            return 0.0;
        }
        let restored = amount.max(0.0).min(self.max - self.current);
        self.current += restored;
        restored
    }
}

/// Marker: configuration for this combatant's behavior was rejected; it never ticks.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct BehaviorDisabled;

/// A sustained effect (beam, charge, swing) belongs to the combatant that cast it.
/// Despawning the caster despawns its effects.
#[derive(Component, Clone, Debug, PartialEq, Eq)]
#[relationship(relationship_target = OwnedEffects)]
pub struct EffectOf(pub Entity);

#[derive(Component, Debug, Default)]
#[relationship_target(relationship = EffectOf, linked_spawn)]
pub struct OwnedEffects(Vec<Entity>);

// -----------------------------------------------------------------------------
// Resolution inputs
// -----------------------------------------------------------------------------

/// Targets already affected by one resolution (one swing, one missile's flight, one area
/// tick, one chain cast). A target is admitted at most once.
#[derive(Clone, Debug, Default)]
pub struct ExclusionSet(HashSet<Entity>);

impl ExclusionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `target`. Returns `false` if it was already present.
    #[inline]
    pub fn admit(&mut self, target: Entity) -> bool {
        self.0.insert(target)
    }

    #[inline]
    pub fn contains(&self, target: Entity) -> bool {
        self.0.contains(&target)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Start a new resolution lifetime.
    pub fn reset(&mut self) {
        self.0.clear();
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum StatusPayload {
    Chill(f32),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DamageEvent {
    pub source: Option<Entity>,
    pub target: Entity,
    pub amount: f32,
    pub status: Option<StatusPayload>,
}

impl DamageEvent {
    pub fn new(source: Option<Entity>, target: Entity, amount: f32) -> Self {
        Self { source, target, amount, status: None }
    }

    pub fn with_status(mut self, status: Option<StatusPayload>) -> Self {
        self.status = status;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StrikeShape {
    Sphere { center: Vec3, radius: f32 },
    Capsule { a: Vec3, b: Vec3, radius: f32 },
    Direct(Entity),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StrikeEffect {
    Harm { damage: f32, status: Option<StatusPayload> },
    Mend { amount: f32 },
}

/// One-shot resolution request. Each strike is its own exclusion-set lifetime.
#[derive(Message, Clone, Copy, Debug)]
pub struct Strike {
    pub source: Option<Entity>,
    pub shape: StrikeShape,
    pub interest: LayerMask,
    pub effect: StrikeEffect,
}

// -----------------------------------------------------------------------------
// Notifications
// -----------------------------------------------------------------------------

#[derive(Message, Clone, Copy, Debug)]
pub struct HitLanded {
    pub source: Option<Entity>,
    pub target: Entity,
    pub amount: f32,
}

#[derive(Message, Clone, Copy, Debug)]
pub struct HealthChanged {
    pub entity: Entity,
    pub current: f32,
    pub max: f32,
}

/// Fired exactly once per combatant, on the hit that takes it to zero.
#[derive(Message, Clone, Copy, Debug)]
pub struct CombatantDied {
    pub entity: Entity,
    pub team: Option<Team>,
    pub source: Option<Entity>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CueKind {
    Attack,
    Telegraph,
    Hit,
    SpinUp,
    Launch,
    Fizzle,
    Frozen,
    Thawed,
    Death,
}

/// Fire-and-forget presentation trigger. Nothing in the core waits on it.
#[derive(Message, Clone, Copy, Debug)]
pub struct Cue {
    pub entity: Entity,
    pub kind: CueKind,
}

impl Cue {
    pub fn new(entity: Entity, kind: CueKind) -> Self {
        Self { entity, kind }
    }
}

// -----------------------------------------------------------------------------
// Plugin wiring
// -----------------------------------------------------------------------------

pub fn plugin(app: &mut App) {
    app.add_message::<Strike>()
        .add_message::<HitLanded>()
        .add_message::<HealthChanged>()
        .add_message::<CombatantDied>()
        .add_message::<Cue>();

    app.init_resource::<DefeatLedger>();

    app.add_systems(FixedUpdate, resolve::resolve_strikes.in_set(CombatSet::Resolve));

    lifecycle::plugin(app);
}
