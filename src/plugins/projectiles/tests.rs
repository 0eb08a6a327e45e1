use bevy::prelude::*;

use super::flight::{home, sweep, Stop};
use super::impact::settle_point;
use super::*;
use crate::common::layers::Layer;
use crate::common::test_utils::{entities, run_system_once, ShapeWorld};
use crate::plugins::combat::{HitOutcome, HitReport, Team};

const DT: f32 = 1.0 / 60.0;

fn landed() -> HitOutcome {
    HitOutcome::Landed(HitReport { applied: 1.0, killed: false, chill: None })
}

/// Admits every target once, like the hit resolver does with the projectile's exclusion set.
fn admit_once(p: &mut Projectile, target: Entity) -> HitOutcome {
    if p.exclusion_mut().admit(target) { landed() } else { HitOutcome::Excluded }
}

#[test]
fn sweep_hits_the_nearest_enemy_first() {
    let mut world = World::new();
    let [near, far] = entities(&mut world);
    let mut shapes = ShapeWorld::default();
    shapes
        .sphere(far, Vec3::new(8.0, 0.0, 0.0), 0.5, Layer::Enemy)
        .sphere(near, Vec3::new(4.0, 0.0, 0.0), 0.5, Layer::Enemy);

    let mut p = Projectile::new(ProjectileSpec::enemy_bolt(), Team::Player, None, Vec3::X * 15.0);
    let mut order = Vec::new();
    let stop = sweep(&shapes, &mut p, Vec3::ZERO, Vec3::X * 10.0, |p, t| {
        order.push(t);
        admit_once(p, t)
    });

    assert_eq!(order, vec![near]);
    let stop = stop.unwrap();
    assert_eq!(stop.surface, ImpactSurface::Combatant(near));
    assert!((stop.point.x - 3.5).abs() < 1e-4);
}

#[test]
fn sweep_ignores_allies() {
    let mut world = World::new();
    let [friend] = entities(&mut world);
    let mut shapes = ShapeWorld::default();
    shapes.sphere(friend, Vec3::new(4.0, 0.0, 0.0), 0.5, Layer::Player);

    let mut p = Projectile::new(ProjectileSpec::magic_missile(), Team::Player, None, Vec3::X * 20.0);
    let stop = sweep(&shapes, &mut p, Vec3::ZERO, Vec3::X * 10.0, admit_once);
    assert_eq!(stop, None);
}

#[test]
fn missile_pierces_until_its_budget_is_spent() {
    let mut world = World::new();
    let [a, b, c] = entities(&mut world);
    let mut shapes = ShapeWorld::default();
    shapes
        .sphere(a, Vec3::new(2.0, 0.0, 0.0), 0.5, Layer::Enemy)
        .sphere(b, Vec3::new(4.0, 0.0, 0.0), 0.5, Layer::Enemy)
        .sphere(c, Vec3::new(6.0, 0.0, 0.0), 0.5, Layer::Enemy);

    let mut p = Projectile::new(ProjectileSpec::magic_missile(), Team::Player, None, Vec3::X * 20.0);
    let mut order = Vec::new();
    let stop = sweep(&shapes, &mut p, Vec3::ZERO, Vec3::X * 10.0, |p, t| {
        order.push(t);
        admit_once(p, t)
    });

    assert_eq!(order, vec![a, b]);
    assert_eq!(p.hits(), 2);
    assert_eq!(stop.unwrap().surface, ImpactSurface::Combatant(b));
}

#[test]
fn pierce_budget_carries_across_ticks_and_never_rehits() {
    let mut world = World::new();
    let [a, b] = entities(&mut world);
    let mut shapes = ShapeWorld::default();
    shapes
        .sphere(a, Vec3::new(1.0, 0.0, 0.0), 0.5, Layer::Enemy)
        .sphere(b, Vec3::new(5.0, 0.0, 0.0), 0.5, Layer::Enemy);

    let mut p = Projectile::new(ProjectileSpec::magic_missile(), Team::Player, None, Vec3::X * 20.0);

    // First tick passes through `a`; the next starts inside it again.
    assert_eq!(sweep(&shapes, &mut p, Vec3::ZERO, Vec3::X * 2.0, admit_once), None);
    assert_eq!(p.hits(), 1);
    assert_eq!(sweep(&shapes, &mut p, Vec3::X * 0.8, Vec3::X * 2.0, admit_once), None);
    assert_eq!(p.hits(), 1);

    let stop = sweep(&shapes, &mut p, Vec3::X * 2.0, Vec3::X * 4.0, admit_once).unwrap();
    assert_eq!(stop.surface, ImpactSurface::Combatant(b));
    assert_eq!(p.hits(), 2);
}

#[test]
fn dying_targets_are_passed_through() {
    let mut world = World::new();
    let [dying, alive] = entities(&mut world);
    let mut shapes = ShapeWorld::default();
    shapes
        .sphere(dying, Vec3::new(2.0, 0.0, 0.0), 0.5, Layer::Enemy)
        .sphere(alive, Vec3::new(5.0, 0.0, 0.0), 0.5, Layer::Enemy);

    let mut p = Projectile::new(ProjectileSpec::enemy_bolt(), Team::Player, None, Vec3::X * 15.0);
    let stop = sweep(&shapes, &mut p, Vec3::ZERO, Vec3::X * 10.0, |p, t| {
        if t == dying { HitOutcome::Ineligible } else { admit_once(p, t) }
    });
    assert_eq!(stop.unwrap().surface, ImpactSurface::Combatant(alive));
}

#[test]
fn walls_stop_projectiles_before_enemies_behind_them() {
    let mut world = World::new();
    let [wall, enemy] = entities(&mut world);
    let mut shapes = ShapeWorld::default();
    shapes
        .cuboid(wall, Vec3::new(3.0, 0.0, 0.0), Vec3::new(0.5, 3.0, 3.0), Layer::Obstacle)
        .sphere(enemy, Vec3::new(6.0, 0.0, 0.0), 0.5, Layer::Enemy);

    let mut p = Projectile::new(ProjectileSpec::magic_missile(), Team::Player, None, Vec3::X * 20.0);
    let mut touched = false;
    let stop = sweep(&shapes, &mut p, Vec3::ZERO, Vec3::X * 10.0, |p, t| {
        touched = true;
        admit_once(p, t)
    });

    assert!(!touched);
    let stop = stop.unwrap();
    assert_eq!(stop.surface, ImpactSurface::Environment);
    assert!((stop.point.x - 2.5).abs() < 1e-4);
    assert_eq!(stop.normal, Vec3::NEG_X);
}

#[test]
fn inert_projectiles_stop_on_combatants_without_resolving() {
    let mut world = World::new();
    let [enemy] = entities(&mut world);
    let mut shapes = ShapeWorld::default();
    shapes.sphere(enemy, Vec3::new(3.0, 0.0, 0.0), 0.5, Layer::Enemy);

    let spec = ProjectileSpec::poison_bomb();
    assert!(spec.is_inert());
    let mut p = Projectile::new(spec, Team::Player, None, Vec3::X * 20.0);
    let mut resolved = 0;
    let stop = sweep(&shapes, &mut p, Vec3::ZERO, Vec3::X * 5.0, |p, t| {
        resolved += 1;
        admit_once(p, t)
    });

    assert_eq!(resolved, 0);
    assert_eq!(
        stop,
        Some(Stop { point: Vec3::new(2.5, 0.0, 0.0), normal: Vec3::NEG_X, surface: ImpactSurface::Combatant(enemy) })
    );
}

#[test]
fn zero_step_sweeps_nothing() {
    let shapes = ShapeWorld::default();
    let mut p = Projectile::new(ProjectileSpec::enemy_bolt(), Team::Enemy, None, Vec3::ZERO);
    assert_eq!(sweep(&shapes, &mut p, Vec3::ZERO, Vec3::ZERO, admit_once), None);
}

#[test]
fn gravity_bends_only_scaled_projectiles() {
    let mut bolt = Projectile::new(ProjectileSpec::enemy_bolt(), Team::Enemy, None, Vec3::X * 15.0);
    let mut bomb = Projectile::new(ProjectileSpec::poison_bomb(), Team::Player, None, Vec3::X * 15.0);

    for _ in 0..60 {
        bolt.advance(DT, 9.81);
        bomb.advance(DT, 9.81);
    }

    assert_eq!(bolt.velocity, Vec3::X * 15.0);
    assert!((bomb.velocity.y + 9.81).abs() < 1e-3);
    assert_eq!(bomb.velocity.x, 15.0);
}

#[test]
fn projectiles_expire_after_their_lifetime() {
    let mut p = Projectile::new(ProjectileSpec::enemy_bolt(), Team::Enemy, None, Vec3::X);
    p.advance(3.9, 9.81);
    assert!(!p.expired());
    p.advance(0.2, 9.81);
    assert!(p.expired());
    assert!((p.age() - 4.1).abs() < 1e-5);
}

#[test]
fn pitched_launch_rises_and_keeps_its_heading() {
    for aim in [Dir3::X, Dir3::NEG_Z, Dir3::new(Vec3::new(1.0, 0.0, 1.0)).unwrap()] {
        let launch = pitched_up(aim, 30.0);
        assert!((launch.y - 0.5).abs() < 1e-4, "{launch:?}");

        let flat = Vec3::new(launch.x, 0.0, launch.z).normalize();
        assert!(flat.dot(*aim) > 0.999);
    }
}

#[test]
fn pitched_launch_survives_a_vertical_aim() {
    let launch = pitched_up(Dir3::Y, 30.0);
    assert!(launch.is_normalized());
}

#[test]
fn puddles_settle_on_nearby_ground() {
    let mut world = World::new();
    let [ground, enemy] = entities(&mut world);
    let mut shapes = ShapeWorld::default();
    shapes.ground(ground, 0.0);

    let near = settle_point(&shapes, Vec3::new(2.0, 0.5, 3.0), ImpactSurface::Environment, 1.0);
    assert_eq!(near, Some(Vec3::new(2.0, 0.0, 3.0)));

    let high = settle_point(&shapes, Vec3::new(2.0, 4.0, 3.0), ImpactSurface::Environment, 1.0);
    assert_eq!(high, None);

    // A burst on a body drops its puddle straight down.
    let below = settle_point(&shapes, Vec3::new(1.0, 4.0, -1.0), ImpactSurface::Combatant(enemy), 1.0);
    assert_eq!(below, Some(Vec3::new(1.0, 0.0, -1.0)));
}

#[test]
fn puddles_without_ground_are_discarded() {
    let mut world = World::new();
    let [enemy] = entities(&mut world);
    let shapes = ShapeWorld::default();

    assert_eq!(settle_point(&shapes, Vec3::ZERO, ImpactSurface::Environment, 1.0), None);
    assert_eq!(settle_point(&shapes, Vec3::Y, ImpactSurface::Combatant(enemy), 1.0), None);
}

// -----------------------------------------------------------------------------
// Homing
// -----------------------------------------------------------------------------

fn homing_missile() -> Projectile {
    let spec = ProjectileSpec::magic_missile().with_homing(HomingSpec::default());
    Projectile::new(spec, Team::Player, None, Vec3::X * 20.0)
}

/// Past the straight-flight grace period.
fn aged(mut p: Projectile) -> Projectile {
    p.advance(0.6, 0.0);
    p
}

#[test]
fn homing_turn_is_capped_per_tick() {
    let mut world = World::new();
    let [foe] = entities(&mut world);
    let mut shapes = ShapeWorld::default();
    shapes.sphere(foe, Vec3::new(0.0, 0.0, 5.0), 0.5, Layer::Enemy);

    let mut p = aged(homing_missile());
    assert_eq!(home(&shapes, &mut p, Vec3::ZERO, 0.1, |_| true), Some(foe));

    // 5 rad/s for 0.1 s.
    assert!((p.velocity.angle_between(Vec3::X) - 0.5).abs() < 1e-4);
    assert!(p.velocity.z > 0.0);
    assert!((p.velocity.length() - 20.0).abs() < 1e-3);
}

#[test]
fn homing_lines_up_when_the_turn_fits() {
    let mut world = World::new();
    let [foe] = entities(&mut world);
    let mut shapes = ShapeWorld::default();
    shapes.sphere(foe, Vec3::new(8.0, 0.0, 0.5), 0.5, Layer::Enemy);

    let mut p = aged(homing_missile());
    home(&shapes, &mut p, Vec3::ZERO, 0.1, |_| true);
    let expected = Vec3::new(8.0, 0.0, 0.5).normalize() * 20.0;
    assert!((p.velocity - expected).length() < 1e-3);
}

#[test]
fn homing_waits_out_the_grace_period() {
    let mut world = World::new();
    let [foe] = entities(&mut world);
    let mut shapes = ShapeWorld::default();
    shapes.sphere(foe, Vec3::new(0.0, 0.0, 5.0), 0.5, Layer::Enemy);

    let mut p = homing_missile();
    assert_eq!(home(&shapes, &mut p, Vec3::ZERO, 0.1, |_| true), None);
    assert_eq!(p.velocity, Vec3::X * 20.0);
}

#[test]
fn homing_picks_the_nearest_fresh_eligible_hostile() {
    let mut world = World::new();
    let [already_hit, dying, fresh, distant, friend] = entities(&mut world);
    let mut shapes = ShapeWorld::default();
    shapes
        .sphere(already_hit, Vec3::new(2.0, 0.0, 1.0), 0.5, Layer::Enemy)
        .sphere(dying, Vec3::new(3.0, 0.0, -1.0), 0.5, Layer::Enemy)
        .sphere(fresh, Vec3::new(6.0, 0.0, 2.0), 0.5, Layer::Enemy)
        .sphere(distant, Vec3::new(30.0, 0.0, 0.0), 0.5, Layer::Enemy)
        .sphere(friend, Vec3::new(1.0, 0.0, 0.0), 0.5, Layer::Player);

    let mut p = aged(homing_missile());
    admit_once(&mut p, already_hit);
    assert!(p.has_hit(already_hit));

    assert_eq!(home(&shapes, &mut p, Vec3::ZERO, 0.1, |e| e != dying), Some(fresh));
    assert_eq!(home(&shapes, &mut p, Vec3::ZERO, 0.1, |e| e != dying && e != fresh), None);
}

#[test]
fn plain_projectiles_never_home() {
    let mut world = World::new();
    let [foe] = entities(&mut world);
    let mut shapes = ShapeWorld::default();
    shapes.sphere(foe, Vec3::new(0.0, 0.0, 5.0), 0.5, Layer::Enemy);

    let mut p = aged(Projectile::new(ProjectileSpec::magic_missile(), Team::Player, None, Vec3::X * 20.0));
    assert_eq!(home(&shapes, &mut p, Vec3::ZERO, 0.1, |_| true), None);
    assert_eq!(p.velocity, Vec3::X * 20.0);
}

#[test]
fn homing_settings_are_validated_and_read_from_json() {
    let bad = ProjectileSpec::magic_missile().with_homing(HomingSpec { turn_speed: 0.0, ..default() });
    assert!(bad.validate().is_err());
    let bad = ProjectileSpec::magic_missile().with_homing(HomingSpec { grace_period: -1.0, ..default() });
    assert!(bad.validate().is_err());

    let spec: ProjectileSpec = serde_json::from_str(
        r#"{ "speed": 20.0, "damage": 15.0, "lifetime": 5.0, "homing": { "range": 8.0, "turn_speed": 3.0 } }"#,
    )
    .unwrap();
    assert_eq!(spec.homing, Some(HomingSpec { range: 8.0, turn_speed: 3.0, grace_period: 0.0 }));
    spec.validate().unwrap();
}

#[test]
fn stock_projectiles_validate() {
    for spec in [
        ProjectileSpec::enemy_bolt(),
        ProjectileSpec::magic_missile(),
        ProjectileSpec::ice_shard(),
        ProjectileSpec::poison_bomb(),
    ] {
        spec.validate().unwrap();
    }

    let broken = ProjectileSpec { max_hits: 0, ..ProjectileSpec::magic_missile() };
    assert!(broken.validate().is_err());
}

#[test]
fn projectile_specs_read_from_json() {
    let spec: ProjectileSpec = serde_json::from_str(
        r#"{ "speed": 12.0, "damage": 4.0, "lifetime": 2.0,
             "impact": { "kind": "burst", "radius": 3.0, "damage": 9.0, "puddle": null, "settle_distance": 1.0 } }"#,
    )
    .unwrap();

    assert_eq!(spec.max_hits, 1);
    assert_eq!(spec.gravity_scale, 0.0);
    assert!(matches!(spec.impact, Impact::Burst { radius, puddle: None, .. } if radius == 3.0));
}

#[test]
fn spawn_requests_become_projectiles() {
    let mut world = World::new();
    world.init_resource::<Messages<SpawnProjectile>>();
    let [owner] = entities(&mut world);

    world.write_message(SpawnProjectile {
        owner: Some(owner),
        team: Team::Enemy,
        origin: Vec3::new(0.0, 1.0, 0.0),
        velocity: Vec3::Z * 15.0,
        spec: ProjectileSpec::enemy_bolt(),
    });
    run_system_once(&mut world, flight::spawn_projectiles);

    let mut q = world.query::<(&Projectile, &Transform)>();
    let (p, tf) = q.single(&world).unwrap();
    assert_eq!(p.owner, Some(owner));
    assert_eq!(p.team, Team::Enemy);
    assert_eq!(tf.translation, Vec3::new(0.0, 1.0, 0.0));
    assert!(tf.forward().dot(Vec3::Z) > 0.999);
}
