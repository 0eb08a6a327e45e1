use bevy::prelude::*;

use super::*;
use crate::common::layers::Layer;
use crate::common::test_utils::{entities, ShapeWorld, TestRng};

const G: f32 = 9.81;

// -----------------------------------------------------------------------------
// Chain
// -----------------------------------------------------------------------------

fn chain_spec() -> ChainSpec {
    ChainSpec { damage: 20.0, max_distance: 50.0, chain_range: 15.0, max_chains: 2, falloff: 0.75, ricochet: true }
}

#[test]
fn chain_hits_bolt_target_then_nearest_fresh_enemies() {
    let mut world = World::new();
    let [first, near, far, out_of_range] = entities(&mut world);
    let mut shapes = ShapeWorld::default();
    shapes
        .sphere(first, Vec3::new(10.0, 0.0, 0.0), 0.5, Layer::Enemy)
        .sphere(far, Vec3::new(10.0, 0.0, 12.0), 0.5, Layer::Enemy)
        .sphere(near, Vec3::new(10.0, 0.0, 5.0), 0.5, Layer::Enemy)
        .sphere(out_of_range, Vec3::new(60.0, 0.0, 0.0), 0.5, Layer::Enemy);

    let out = resolve_chain(&shapes, Vec3::ZERO, Dir3::X, &chain_spec());
    let order: Vec<Entity> = out.strikes.iter().map(|s| s.target).collect();
    assert_eq!(order, vec![first, near, far]);

    let damages: Vec<f32> = out.strikes.iter().map(|s| s.damage).collect();
    assert_eq!(damages, vec![20.0, 15.0, 11.25]);
    assert_eq!(out.path.len(), 4);
}

#[test]
fn chain_ricochets_off_walls_onto_enemies() {
    let mut world = World::new();
    let [wall, enemy] = entities(&mut world);
    let mut shapes = ShapeWorld::default();
    // Wall face at x = 10, facing -X. Bolt travels diagonally (+X, +Z).
    shapes
        .cuboid(wall, Vec3::new(11.0, 0.0, 0.0), Vec3::new(1.0, 5.0, 50.0), Layer::Obstacle)
        .sphere(enemy, Vec3::new(5.0, 0.0, 15.0), 0.5, Layer::Enemy);

    let dir = Dir3::new(Vec3::new(1.0, 0.0, 1.0)).unwrap();
    let out = resolve_chain(&shapes, Vec3::ZERO, dir, &chain_spec());

    assert_eq!(out.strikes.len(), 1);
    assert_eq!(out.strikes[0].target, enemy);
    assert_eq!(out.strikes[0].damage, 20.0);
    assert_eq!(out.strikes[0].index, 0);
}

#[test]
fn chain_without_ricochet_still_hops_from_the_wall() {
    let mut world = World::new();
    let [wall, enemy] = entities(&mut world);
    let mut shapes = ShapeWorld::default();
    shapes
        .cuboid(wall, Vec3::new(11.0, 0.0, 0.0), Vec3::new(1.0, 5.0, 5.0), Layer::Obstacle)
        .sphere(enemy, Vec3::new(8.0, 0.0, 3.0), 0.5, Layer::Enemy);

    let spec = ChainSpec { ricochet: false, ..chain_spec() };
    let out = resolve_chain(&shapes, Vec3::ZERO, Dir3::X, &spec);
    assert_eq!(out.strikes.len(), 1);
    assert_eq!(out.strikes[0].index, 1);
    assert_eq!(out.strikes[0].damage, 15.0);
}

#[test]
fn chain_that_hits_nothing_does_not_hop() {
    let mut world = World::new();
    let [behind] = entities(&mut world);
    let mut shapes = ShapeWorld::default();
    shapes.sphere(behind, Vec3::new(-3.0, 0.0, 0.0), 0.5, Layer::Enemy);

    let out = resolve_chain(&shapes, Vec3::ZERO, Dir3::X, &chain_spec());
    assert!(out.strikes.is_empty());
    assert_eq!(out.path, vec![Vec3::ZERO, Vec3::new(50.0, 0.0, 0.0)]);
}

#[test]
fn chain_is_bounded_unique_and_non_increasing() {
    let mut rng = TestRng::new(0xC4A1_0001);

    for _case in 0..300 {
        let mut world = World::new();
        let mut shapes = ShapeWorld::default();
        let count = 1 + (rng.next_u64() % 10) as usize;
        for _ in 0..count {
            let e = world.spawn_empty().id();
            let p = Vec3::new(rng.range_f32(2.0, 40.0), 0.0, rng.range_f32(-15.0, 15.0));
            shapes.sphere(e, p, 0.5, Layer::Enemy);
        }
        let wall = world.spawn_empty().id();
        shapes.cuboid(wall, Vec3::new(45.0, 0.0, 0.0), Vec3::new(1.0, 5.0, 40.0), Layer::Obstacle);

        let spec = ChainSpec {
            max_chains: (rng.next_u64() % 5) as u32,
            falloff: rng.range_f32(0.0, 1.0),
            ricochet: rng.next_u64() % 2 == 0,
            ..chain_spec()
        };
        let dir = Dir3::new(Vec3::new(1.0, 0.0, rng.range_f32(-0.5, 0.5))).unwrap();
        let out = resolve_chain(&shapes, Vec3::ZERO, dir, &spec);

        assert!(out.strikes.len() <= spec.max_chains as usize + 1);

        let mut seen: Vec<Entity> = Vec::new();
        for s in &out.strikes {
            assert!(!seen.contains(&s.target));
            seen.push(s.target);
        }
        for pair in out.strikes.windows(2) {
            assert!(pair[1].damage <= pair[0].damage + 1e-5);
        }
    }
}

// -----------------------------------------------------------------------------
// Pierce
// -----------------------------------------------------------------------------

#[test]
fn pierce_stops_at_first_blocker() {
    let mut world = World::new();
    let [a, wall, b] = entities(&mut world);
    let mut shapes = ShapeWorld::default();
    shapes
        .sphere(a, Vec3::new(5.0, 0.0, 0.0), 0.5, Layer::Enemy)
        .cuboid(wall, Vec3::new(10.0, 0.0, 0.0), Vec3::new(0.5, 2.0, 2.0), Layer::Obstacle)
        .sphere(b, Vec3::new(15.0, 0.0, 0.0), 0.5, Layer::Enemy);

    let out = resolve_pierce(&shapes, Vec3::ZERO, Dir3::X, 100.0, 5);
    assert_eq!(out.targets, vec![a]);
    assert!((out.stop_point.x - 9.5).abs() < 1e-4);
}

#[test]
fn pierce_budget_ends_the_beam_at_the_next_enemy() {
    let mut world = World::new();
    let [a, b, c, d] = entities(&mut world);
    let mut shapes = ShapeWorld::default();
    for (e, x) in [(a, 4.0), (b, 8.0), (c, 12.0), (d, 16.0)] {
        shapes.sphere(e, Vec3::new(x, 0.0, 0.0), 0.5, Layer::Enemy);
    }

    let out = resolve_pierce(&shapes, Vec3::ZERO, Dir3::X, 100.0, 2);
    assert_eq!(out.targets, vec![a, b]);
    assert!((out.stop_point.x - 11.5).abs() < 1e-4);
    assert!((out.length_from(Vec3::ZERO) - 11.5).abs() < 1e-4);
}

#[test]
fn pierce_with_nothing_ahead_reaches_max_range() {
    let shapes = ShapeWorld::default();
    let out = resolve_pierce(&shapes, Vec3::ZERO, Dir3::Z, 40.0, 2);
    assert!(out.targets.is_empty());
    assert_eq!(out.stop_point, Vec3::new(0.0, 0.0, 40.0));
}

// -----------------------------------------------------------------------------
// Leap
// -----------------------------------------------------------------------------

#[test]
fn leap_time_is_clamped_and_ballistics_close() {
    let solver = LeapSolver::default();
    let mut rng = TestRng::new(0x1EA9);

    for _case in 0..5_000 {
        let start = rng.vec3(30.0);
        let dir = Vec3::new(rng.range_f32(-1.0, 1.0), 0.0, rng.range_f32(-1.0, 1.0)).normalize_or_zero();
        let end = start + dir * rng.range_f32(0.0, solver.max_leap_distance) + Vec3::Y * rng.range_f32(-3.0, 3.0);

        let plan = solver.solve(start, end, G);
        assert!(plan.time >= solver.min_leap_time - 1e-6);
        assert!(plan.time <= solver.max_leap_time + 1e-6);

        // y(t) = v_y t - ½ g t²  ==  Δh + arc
        let t = plan.time;
        let rise = plan.velocity.y * t - 0.5 * G * t * t;
        let expected = (end.y - start.y) + solver.arc_height;
        assert!((rise - expected).abs() < 1e-3, "rise {rise} expected {expected}");
    }
}

#[test]
fn leap_uses_fixed_horizontal_speed_and_clamps_distance() {
    let solver = LeapSolver::default();
    let plan = solver.solve(Vec3::ZERO, Vec3::new(100.0, 0.0, 0.0), G);
    assert!((Vec3::new(plan.velocity.x, 0.0, plan.velocity.z).length() - 10.0).abs() < 1e-4);
    assert!((plan.landing - Vec3::new(20.0, 0.0, 0.0)).length() < 1e-4);
    assert_eq!(plan.time, 2.0);
}

#[test]
fn leap_onto_own_spot_goes_straight_up() {
    let solver = LeapSolver::default();
    let plan = solver.solve(Vec3::ONE, Vec3::ONE, G);
    assert_eq!(plan.velocity.x, 0.0);
    assert_eq!(plan.velocity.z, 0.0);
    assert!(plan.velocity.y > 0.0);
    assert_eq!(plan.time, solver.min_leap_time);
}

#[test]
fn prediction_leads_a_crossing_target() {
    let solver = LeapSolver::default();
    let lead = LeadProfile { prediction_strength: 1.0, max_used_velocity: 12.0 };
    let target = Vec3::new(10.0, 0.0, 0.0);

    // Crossing: perpendicular to attacker->target. t = 10 / 10 = 1s.
    let p = solver.predict(Vec3::ZERO, target, Vec3::new(0.0, 0.0, 4.0), &lead);
    assert!((p - Vec3::new(10.0, 0.0, 4.0)).length() < 1e-4);
}

#[test]
fn prediction_is_abandoned_for_targets_running_back_at_the_attacker() {
    let solver = LeapSolver::default();
    let lead = LeadProfile { prediction_strength: 1.0, max_used_velocity: 12.0 };
    let target = Vec3::new(10.0, 0.0, 0.0);

    let head_on = solver.predict(Vec3::ZERO, target, Vec3::new(-5.0, 0.0, 0.0), &lead);
    assert_eq!(head_on, target);

    // dot = -0.5 -> strength * 0.3
    let angled = Vec3::new(-0.5, 0.0, 0.866_025_4) * 4.0;
    let p = solver.predict(Vec3::ZERO, target, angled, &lead);
    let full = target + angled * 1.0;
    let expected = target.lerp(full, 0.3);
    assert!((p - expected).length() < 1e-3);
}

#[test]
fn prediction_clamps_velocity_height_and_reach() {
    let solver = LeapSolver::default();
    let lead = LeadProfile { prediction_strength: 1.0, max_used_velocity: 12.0 };
    let target = Vec3::new(15.0, 2.0, 0.0);

    // Fleeing fast: clamped to 12 m/s over t = 1.5s, then clamped to 20m reach.
    let p = solver.predict(Vec3::ZERO, target, Vec3::new(50.0, 30.0, 0.0), &lead);
    assert_eq!(p.y, 2.0);
    assert!((Vec3::new(p.x, 0.0, p.z).length() - 20.0).abs() < 1e-3);
}

#[test]
fn prediction_ignores_target_height_velocity() {
    let solver = LeapSolver::default();
    let lead = LeadProfile::default();
    let target = Vec3::new(5.0, 1.0, 0.0);
    let p = solver.predict(Vec3::ZERO, target, Vec3::new(0.0, 20.0, 0.0), &lead);
    assert!((p - target).length() < 1e-5);
}

// -----------------------------------------------------------------------------
// Bands
// -----------------------------------------------------------------------------

#[test]
fn bands_select_retreat_hold_advance() {
    let bands = PositioningBands::default();
    assert_eq!(bands.movement(5.0), BandMove::Retreat);
    assert_eq!(bands.movement(15.0), BandMove::Hold);
    assert_eq!(bands.movement(25.0), BandMove::Advance);
    assert_eq!(bands.movement(34.0), BandMove::Advance);
    assert_eq!(bands.movement(40.0), BandMove::OutOfSight);

    assert!(bands.in_attack_range(30.0));
    assert!(!bands.in_attack_range(30.5));
}

#[test]
fn advance_policy_holds_anywhere_inside_attack_range() {
    let bands = PositioningBands { policy: OptimalBandPolicy::AdvanceToAttackRange, ..Default::default() };
    assert_eq!(bands.movement(25.0), BandMove::Hold);
    assert_eq!(bands.movement(31.0), BandMove::Advance);
    assert_eq!(bands.movement(5.0), BandMove::Retreat);
}

#[test]
fn bands_must_be_ordered() {
    assert!(PositioningBands::default().validate().is_ok());
    let bad = PositioningBands { retreat: 25.0, ..Default::default() };
    assert!(bad.validate().is_err());
    let bad = PositioningBands { sight_range: 29.0, ..Default::default() };
    assert!(bad.validate().is_err());
}
