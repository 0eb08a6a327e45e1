//! The single damage entry point.
//!
//! [`resolve_hit`] is the pure rule (exclusion check, health, status forwarding).
//! [`HitResolver`] binds it to the ECS and publishes the resulting notifications.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use super::{
    CombatantDied, Cue, CueKind, DamageEvent, ExclusionSet, Health, HealthChanged, HealthReceiver,
    HitLanded, LifeState, StatusPayload, Strike, StrikeEffect, StrikeShape, Team,
};
use crate::plugins::spatial::{AvianSpatial, SpatialQueries};
use crate::plugins::status::{ChillOutcome, StatusEffects};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HitReport {
    pub applied: f32,
    pub killed: bool,
    pub chill: Option<ChillOutcome>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HitOutcome {
    /// Already affected within this exclusion-set lifetime.
    Excluded,
    /// Not a live combatant (no health, dying, or gone).
    Ineligible,
    Landed(HitReport),
}

impl HitOutcome {
    #[inline]
    pub fn landed(&self) -> bool {
        matches!(self, HitOutcome::Landed(_))
    }
}

/// Apply one damage event.
///
/// 1. A target already in `exclusion` is a no-op.
/// 2. Otherwise it is recorded, damaged (health floors at 0), and the status payload is
///    forwarded to its status effects, if it has any.
pub fn resolve_hit(
    event: &DamageEvent,
    exclusion: &mut ExclusionSet,
    health: &mut impl HealthReceiver,
    status: Option<&mut StatusEffects>,
) -> HitOutcome {
    if !exclusion.admit(event.target) {
        return HitOutcome::Excluded;
    }

    let damage = health.take_damage(event.amount);

    let chill = match (event.status, status) {
        (Some(StatusPayload::Chill(amount)), Some(status)) => Some(status.apply_chill(amount)),
        _ => None,
    };

    HitOutcome::Landed(HitReport { applied: damage.applied, killed: damage.killed, chill })
}

#[derive(SystemParam)]
pub struct HitResolver<'w, 's> {
    combatants: Query<
        'w,
        's,
        (&'static mut Health, Option<&'static mut StatusEffects>, &'static LifeState, Option<&'static Team>),
    >,
    landed: MessageWriter<'w, HitLanded>,
    health_changed: MessageWriter<'w, HealthChanged>,
    died: MessageWriter<'w, CombatantDied>,
    cues: MessageWriter<'w, Cue>,
}

impl HitResolver<'_, '_> {
    /// Is `target` a live combatant?
    pub fn is_alive(&self, target: Entity) -> bool {
        self.combatants.get(target).is_ok_and(|(health, _, life, _)| life.is_alive() && !health.is_depleted())
    }

    pub fn team_of(&self, target: Entity) -> Option<Team> {
        self.combatants.get(target).ok().and_then(|(_, _, _, team)| team.copied())
    }

    pub fn resolve(&mut self, event: DamageEvent, exclusion: &mut ExclusionSet) -> HitOutcome {
        let Ok((mut health, status, life, team)) = self.combatants.get_mut(event.target) else {
            return HitOutcome::Ineligible;
        };
        // Depleted but not yet dying: the killing blow already landed this tick.
        if !life.is_alive() || health.is_depleted() {
            return HitOutcome::Ineligible;
        }
        let team = team.copied();

        // Only touch status effects when there is a payload, so change detection stays quiet.
        let status = if event.status.is_some() { status.map(Mut::into_inner) } else { None };
        let outcome = resolve_hit(&event, exclusion, &mut *health, status);
        let HitOutcome::Landed(report) = outcome else {
            return outcome;
        };

        debug!(victim = ?event.target, amount = report.applied, "hit landed");
        self.landed.write(HitLanded { source: event.source, target: event.target, amount: report.applied });
        self.health_changed.write(HealthChanged {
            entity: event.target,
            current: health.current(),
            max: health.max(),
        });
        self.cues.write(Cue::new(event.target, CueKind::Hit));

        if report.chill == Some(ChillOutcome::Froze) {
            info!(victim = ?event.target, "frozen");
            self.cues.write(Cue::new(event.target, CueKind::Frozen));
        }

        if report.killed {
            info!(victim = ?event.target, ?team, "combatant died");
            self.died.write(CombatantDied { entity: event.target, team, source: event.source });
            self.cues.write(Cue::new(event.target, CueKind::Death));
        }

        outcome
    }

    /// Restore health to a live combatant, once per exclusion lifetime.
    pub fn heal(&mut self, target: Entity, amount: f32, exclusion: &mut ExclusionSet) -> bool {
        let Ok((mut health, _, life, _)) = self.combatants.get_mut(target) else {
            return false;
        };
        if !life.is_alive() || !exclusion.admit(target) {
            return false;
        }

        let restored = health.heal(amount);
        if restored > 0.0 {
            self.health_changed.write(HealthChanged { entity: target, current: health.current(), max: health.max() });
        }
        true
    }

    /// Run one `Strike` with its own exclusion set. Returns how many targets it affected.
    pub fn strike(&mut self, spatial: &impl SpatialQueries, strike: &Strike) -> usize {
        let targets: Vec<Entity> = match strike.shape {
            StrikeShape::Direct(target) => vec![target],
            StrikeShape::Sphere { center, radius } => {
                spatial.overlap_sphere(center, radius, strike.interest).into_iter().map(|o| o.entity).collect()
            }
            StrikeShape::Capsule { a, b, radius } => {
                spatial.overlap_capsule(a, b, radius, strike.interest).into_iter().map(|o| o.entity).collect()
            }
        };

        let mut exclusion = ExclusionSet::new();
        let mut affected = 0;
        for target in targets {
            let hit = match strike.effect {
                StrikeEffect::Harm { damage, status } => self
                    .resolve(DamageEvent::new(strike.source, target, damage).with_status(status), &mut exclusion)
                    .landed(),
                StrikeEffect::Mend { amount } => self.heal(target, amount, &mut exclusion),
            };
            if hit {
                affected += 1;
            }
        }
        affected
    }
}

/// Consume `Strike` requests from behaviors.
pub fn resolve_strikes(mut strikes: MessageReader<Strike>, spatial: AvianSpatial, mut hits: HitResolver) {
    for strike in strikes.read() {
        let affected = hits.strike(&spatial, strike);
        if affected == 0 {
            debug!(source = ?strike.source, "strike found no targets");
        }
    }
}
