//! Test helpers.
//!
//! - `run_system_once` runs a system against a bare `World` and flushes queued commands
//!   so assertions see structural changes.
//! - `TestRng` is a tiny deterministic xorshift for property-style loops.
//! - `ShapeWorld` is an in-memory `SpatialQueries` backend (spheres and boxes), so
//!   targeting and behavior code can be tested without a physics world.

use std::time::Duration;

use avian3d::prelude::LayerMask;
use bevy::ecs::system::{IntoSystem, RunSystemOnce};
use bevy::prelude::*;

use crate::common::layers::Layer;
use crate::plugins::spatial::{Overlap, RayHit, SpatialQueries};

/// Run a system once on the given world, then flush deferred commands.
/// Returns the system output.
pub fn run_system_once<T, Out, Marker>(world: &mut World, system: T) -> Out
where
    T: IntoSystem<(), Out, Marker>,
{
    let out = world.run_system_once(system).expect("system run failed");
    world.flush();
    out
}

/// A `Time<Fixed>` that reports `dt` as its last delta.
pub fn fixed_time_with_delta(dt: f32) -> Time<Fixed> {
    let mut t = Time::<Fixed>::default();
    t.advance_by(Duration::from_secs_f32(dt));
    t
}

/// Tiny deterministic PRNG for property-style tests (xorshift64*).
#[derive(Clone, Copy)]
pub struct TestRng(u64);

impl TestRng {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.0 = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    #[inline]
    pub fn next_f32(&mut self) -> f32 {
        // 24 random bits -> float in [0,1)
        let v = (self.next_u64() >> 40) as u32;
        (v as f32) / ((1u32 << 24) as f32)
    }

    #[inline]
    pub fn range_f32(&mut self, lo: f32, hi: f32) -> f32 {
        debug_assert!(hi >= lo);
        lo + (hi - lo) * self.next_f32()
    }

    pub fn vec3(&mut self, half_extent: f32) -> Vec3 {
        Vec3::new(
            self.range_f32(-half_extent, half_extent),
            self.range_f32(-half_extent, half_extent),
            self.range_f32(-half_extent, half_extent),
        )
    }
}

// -----------------------------------------------------------------------------
// In-memory spatial backend
// -----------------------------------------------------------------------------

#[derive(Clone, Copy, Debug)]
pub enum TestShape {
    Sphere { center: Vec3, radius: f32 },
    Cuboid { center: Vec3, half_extents: Vec3 },
}

#[derive(Clone, Copy, Debug)]
pub struct TestBody {
    pub entity: Entity,
    pub shape: TestShape,
    pub layer: Layer,
}

impl TestBody {
    fn position(&self) -> Vec3 {
        match self.shape {
            TestShape::Sphere { center, .. } | TestShape::Cuboid { center, .. } => center,
        }
    }

    fn closest_point(&self, p: Vec3) -> Vec3 {
        match self.shape {
            TestShape::Sphere { center, radius } => {
                let d = p - center;
                if d.length() <= radius {
                    p
                } else {
                    center + d.normalize() * radius
                }
            }
            TestShape::Cuboid { center, half_extents } => {
                center + (p - center).clamp(-half_extents, half_extents)
            }
        }
    }

    /// Entry distance and outward normal of a ray, if it hits within `max`.
    /// A ray starting inside reports distance 0 (solid shapes).
    fn ray(&self, origin: Vec3, dir: Vec3, max: f32) -> Option<(f32, Vec3)> {
        match self.shape {
            TestShape::Sphere { center, radius } => {
                let oc = origin - center;
                let c = oc.length_squared() - radius * radius;
                if c <= 0.0 {
                    return Some((0.0, -dir));
                }
                let b = oc.dot(dir);
                let disc = b * b - c;
                if b > 0.0 || disc < 0.0 {
                    return None;
                }
                let t = -b - disc.sqrt();
                (t <= max).then(|| (t, (origin + dir * t - center).normalize()))
            }
            TestShape::Cuboid { center, half_extents } => {
                let min = center - half_extents;
                let max_corner = center + half_extents;
                let mut t_enter = 0.0_f32;
                let mut t_exit = max;
                let mut normal = -dir;
                for axis in 0..3 {
                    let o = origin[axis];
                    let d = dir[axis];
                    if d.abs() < 1e-8 {
                        if o < min[axis] || o > max_corner[axis] {
                            return None;
                        }
                        continue;
                    }
                    let mut t0 = (min[axis] - o) / d;
                    let mut t1 = (max_corner[axis] - o) / d;
                    let mut n = Vec3::ZERO;
                    n[axis] = -1.0;
                    if t0 > t1 {
                        std::mem::swap(&mut t0, &mut t1);
                        n[axis] = 1.0;
                    }
                    if t0 > t_enter {
                        t_enter = t0;
                        normal = n;
                    }
                    t_exit = t_exit.min(t1);
                    if t_enter > t_exit {
                        return None;
                    }
                }
                Some((t_enter, normal))
            }
        }
    }

    fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.closest_point(center).distance(center) <= radius
    }
}

/// In-memory `SpatialQueries` implementation.
#[derive(Default, Debug, Clone)]
pub struct ShapeWorld {
    pub bodies: Vec<TestBody>,
}

impl ShapeWorld {
    pub fn sphere(&mut self, entity: Entity, center: Vec3, radius: f32, layer: Layer) -> &mut Self {
        self.bodies.push(TestBody { entity, shape: TestShape::Sphere { center, radius }, layer });
        self
    }

    pub fn cuboid(&mut self, entity: Entity, center: Vec3, half_extents: Vec3, layer: Layer) -> &mut Self {
        self.bodies.push(TestBody { entity, shape: TestShape::Cuboid { center, half_extents }, layer });
        self
    }

    /// Flat ground slab whose top face is at `y = height`.
    pub fn ground(&mut self, entity: Entity, height: f32) -> &mut Self {
        self.cuboid(entity, Vec3::new(0.0, height - 0.5, 0.0), Vec3::new(500.0, 0.5, 500.0), Layer::Ground)
    }

    fn interested<'a>(&'a self, interest: LayerMask) -> impl Iterator<Item = &'a TestBody> + 'a {
        self.bodies
            .iter()
            .filter(move |b| (LayerMask::from(b.layer) & interest) != LayerMask::NONE)
    }

    fn to_hit(body: &TestBody, origin: Vec3, dir: Vec3, t: f32, normal: Vec3) -> RayHit {
        RayHit {
            entity: body.entity,
            point: origin + dir * t,
            normal,
            distance: t,
            membership: LayerMask::from(body.layer),
        }
    }
}

impl SpatialQueries for ShapeWorld {
    fn ray_cast(&self, origin: Vec3, direction: Dir3, max_distance: f32, interest: LayerMask) -> Option<RayHit> {
        self.ray_cast_all(origin, direction, max_distance, interest).into_iter().next()
    }

    fn ray_cast_all(&self, origin: Vec3, direction: Dir3, max_distance: f32, interest: LayerMask) -> Vec<RayHit> {
        let dir = *direction;
        let mut hits: Vec<RayHit> = self
            .interested(interest)
            .filter_map(|b| b.ray(origin, dir, max_distance).map(|(t, n)| Self::to_hit(b, origin, dir, t, n)))
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }

    fn overlap_sphere(&self, center: Vec3, radius: f32, interest: LayerMask) -> Vec<Overlap> {
        self.interested(interest)
            .filter(|b| b.intersects_sphere(center, radius))
            .map(|b| Overlap { entity: b.entity, position: b.position() })
            .collect()
    }

    fn overlap_capsule(&self, a: Vec3, b: Vec3, radius: f32, interest: LayerMask) -> Vec<Overlap> {
        self.interested(interest)
            .filter(|body| {
                // Sample the segment; accurate enough for test geometry.
                (0..=16).any(|i| body.intersects_sphere(a.lerp(b, i as f32 / 16.0), radius))
            })
            .map(|body| Overlap { entity: body.entity, position: body.position() })
            .collect()
    }

    fn closest_point(&self, point: Vec3, interest: LayerMask) -> Option<Vec3> {
        self.interested(interest)
            .map(|b| b.closest_point(point))
            .min_by(|x, y| x.distance_squared(point).total_cmp(&y.distance_squared(point)))
    }
}

/// Spawn `n` empty entities to use as stable ids in pure tests.
pub fn entities<const N: usize>(world: &mut World) -> [Entity; N] {
    std::array::from_fn(|_| world.spawn_empty().id())
}
