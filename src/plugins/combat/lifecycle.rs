//! Combatant lifecycle: `Alive -> Dying -> Dead`, then despawn.
//!
//! We avoid despawning physics entities inside the fixed step. A dead combatant is marked
//! `PendingDespawn` and removed in `PostUpdate`, after every fixed-step system that might
//! still hold its id has run.

use avian3d::prelude::*;
use bevy::prelude::*;

use super::{CombatantDied, Health, OwnedEffects, Team};
use crate::common::layers::Layer;
use crate::common::state::GameState;
use crate::plugins::navigation::Navigator;

const DYING_SECONDS: f32 = 0.35;

#[derive(Component, Debug, Clone, Default)]
pub enum LifeState {
    #[default]
    Alive,
    Dying {
        timer: Timer,
    },
    Dead,
}

impl LifeState {
    #[inline]
    pub fn is_alive(&self) -> bool {
        matches!(self, LifeState::Alive)
    }
}

/// Marker: remove from the world in `PostUpdate`.
#[derive(Component, Debug, Clone, Copy)]
pub struct PendingDespawn;

/// Bookkeeping collaborator for death notifications.
#[derive(Resource, Debug, Default, Clone)]
pub struct DefeatLedger {
    pub enemies_defeated: u32,
    pub player_defeated: bool,
    /// Most recent deaths first; bounded.
    pub recent: Vec<Entity>,
}

impl DefeatLedger {
    const RECENT: usize = 16;

    pub fn record(&mut self, died: &CombatantDied) {
        match died.team {
            Some(Team::Player) => self.player_defeated = true,
            Some(Team::Enemy) => self.enemies_defeated += 1,
            None => {}
        }
        self.recent.insert(0, died.entity);
        self.recent.truncate(Self::RECENT);
    }
}

pub fn plugin(app: &mut App) {
    app.add_systems(
        FixedPostUpdate,
        (record_defeats, begin_dying, advance_dying.after(begin_dying)).run_if(in_state(GameState::InGame)),
    );

    app.add_systems(PostUpdate, despawn_pending);
}

/// A dying body keeps colliding with level geometry (so it does not fall through the
/// floor) but leaves every gameplay interest mask.
#[inline]
pub fn dying_layers() -> CollisionLayers {
    CollisionLayers::new(Layer::Default, [Layer::Ground, Layer::Obstacle])
}

/// Alive -> Dying once health is gone. Cancels owned sustained effects immediately.
pub fn begin_dying(
    mut commands: Commands,
    mut q: Query<
        (Entity, &Health, &mut LifeState, &mut CollisionLayers, Option<&mut LinearVelocity>, Option<&mut Navigator>),
        Without<PendingDespawn>,
    >,
) {
    for (entity, health, mut life, mut layers, velocity, nav) in &mut q {
        if !life.is_alive() || !health.is_depleted() {
            continue;
        }

        *life = LifeState::Dying { timer: Timer::from_seconds(DYING_SECONDS, TimerMode::Once) };
        *layers = dying_layers();

        if let Some(mut v) = velocity {
            v.x = 0.0;
            v.z = 0.0;
        }
        if let Some(mut nav) = nav {
            nav.hard_stop();
        }

        commands.entity(entity).despawn_related::<OwnedEffects>();
        debug!(?entity, "dying");
    }
}

/// Dying -> Dead after the fade, then mark for despawn.
pub fn advance_dying(
    time: Res<Time<Fixed>>,
    mut commands: Commands,
    mut q: Query<(Entity, &mut LifeState), Without<PendingDespawn>>,
) {
    for (entity, mut life) in &mut q {
        let LifeState::Dying { timer } = &mut *life else {
            continue;
        };

        timer.tick(time.delta());
        if timer.is_finished() {
            *life = LifeState::Dead;
            commands.entity(entity).insert(PendingDespawn);
        }
    }
}

pub fn record_defeats(
    mut died: MessageReader<CombatantDied>,
    mut ledger: ResMut<DefeatLedger>,
    mut next: ResMut<NextState<GameState>>,
) {
    for ev in died.read() {
        ledger.record(ev);
        if ev.team == Some(Team::Player) {
            warn!(entity = ?ev.entity, "player defeated");
            next.set(GameState::Defeated);
        }
    }
}

pub fn despawn_pending(mut commands: Commands, q: Query<Entity, With<PendingDespawn>>) {
    for e in &q {
        commands.entity(e).despawn();
    }
}
