//! World plugin: the demo arena.
//!
//! A flat floor ringed by four walls, the player at the center and one enemy of each
//! behavior, so a headless run exercises the whole combat core.

use avian3d::prelude::*;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::layers::Layer;
use crate::common::state::GameState;
use crate::plugins::core::CombatConfig;
use crate::plugins::{enemies, player};

const HALF_EXTENT: f32 = 30.0;
const WALL_HEIGHT: f32 = 4.0;
const WALL_THICKNESS: f32 = 1.0;
const FLOOR_THICKNESS: f32 = 1.0;

pub fn plugin(app: &mut App) {
    app.add_systems(OnEnter(GameState::InGame), (spawn_arena, spawn_combatants));
}

fn spawn_arena(mut commands: Commands) {
    commands.spawn((
        Name::new("Floor"),
        Transform::from_xyz(0.0, -FLOOR_THICKNESS * 0.5, 0.0),
        RigidBody::Static,
        Collider::cuboid(HALF_EXTENT * 2.0, FLOOR_THICKNESS, HALF_EXTENT * 2.0),
        CollisionLayers::new(Layer::Ground, LayerMask::ALL),
        DespawnOnExit(GameState::InGame),
    ));

    let wall_layers = CollisionLayers::new(Layer::Obstacle, LayerMask::ALL);
    let span = HALF_EXTENT * 2.0 + WALL_THICKNESS * 2.0;
    let offset = HALF_EXTENT + WALL_THICKNESS * 0.5;

    let mut spawn_wall = |name: &'static str, center: Vec3, size: Vec3| {
        commands.spawn((
            Name::new(name),
            Transform::from_translation(center),
            RigidBody::Static,
            Collider::cuboid(size.x, size.y, size.z),
            wall_layers,
            DespawnOnExit(GameState::InGame),
        ));
    };

    let y = WALL_HEIGHT * 0.5;
    spawn_wall("WallNorth", Vec3::new(0.0, y, -offset), Vec3::new(span, WALL_HEIGHT, WALL_THICKNESS));
    spawn_wall("WallSouth", Vec3::new(0.0, y, offset), Vec3::new(span, WALL_HEIGHT, WALL_THICKNESS));
    spawn_wall("WallWest", Vec3::new(-offset, y, 0.0), Vec3::new(WALL_THICKNESS, WALL_HEIGHT, span));
    spawn_wall("WallEast", Vec3::new(offset, y, 0.0), Vec3::new(WALL_THICKNESS, WALL_HEIGHT, span));
}

/// Bodies stand on the floor: capsule centers sit one half-height above it.
fn spawn_combatants(mut commands: Commands, config: Res<CombatConfig>) {
    let feet = enemies::BODY_HALF_HEIGHT;
    player::spawn_player(&mut commands, &config, Vec3::new(0.0, feet, 0.0));
    enemies::spawn_melee(&mut commands, &config, Vec3::new(0.0, feet, -16.0));
    enemies::spawn_ranged(&mut commands, &config, Vec3::new(15.0, feet, -15.0));
    enemies::spawn_leaper(&mut commands, &config, Vec3::new(-15.0, feet, -15.0));
    info!("arena populated");
}
