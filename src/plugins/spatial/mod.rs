//! Spatial Query Facade.
//!
//! Every geometric question the combat core asks (ray casts, overlaps, closest
//! surface point) goes through the [`SpatialQueries`] trait. Gameplay code is
//! written against the trait so the targeting algorithms stay pure and testable;
//! systems pass [`AvianSpatial`], a `SystemParam` adapter over avian's
//! `SpatialQuery`.
//!
//! Results always name the *gameplay owner* (the rigid body), not the collider,
//! because health and status live on the body.

use avian3d::prelude::*;
use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use crate::common::layers::Layer;

/// One ray intersection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    pub entity: Entity,
    pub point: Vec3,
    pub normal: Vec3,
    pub distance: f32,
    /// Collision memberships of the collider that was hit.
    pub membership: LayerMask,
}

impl RayHit {
    #[inline]
    pub fn is(&self, layer: Layer) -> bool {
        self.membership.has_all(layer)
    }
}

/// One overlap candidate with the owner's current position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Overlap {
    pub entity: Entity,
    pub position: Vec3,
}

pub trait SpatialQueries {
    /// Nearest hit along the ray, if any within `max_distance`.
    fn ray_cast(&self, origin: Vec3, direction: Dir3, max_distance: f32, interest: LayerMask) -> Option<RayHit>;

    /// Every hit along the ray, sorted by ascending distance.
    fn ray_cast_all(&self, origin: Vec3, direction: Dir3, max_distance: f32, interest: LayerMask) -> Vec<RayHit>;

    /// Owners whose colliders intersect the sphere. Each owner appears once.
    fn overlap_sphere(&self, center: Vec3, radius: f32, interest: LayerMask) -> Vec<Overlap>;

    /// Owners whose colliders intersect the capsule `a..b`. Each owner appears once.
    fn overlap_capsule(&self, a: Vec3, b: Vec3, radius: f32, interest: LayerMask) -> Vec<Overlap>;

    /// Closest point on any surface in `interest` to `point`.
    fn closest_point(&self, point: Vec3, interest: LayerMask) -> Option<Vec3>;
}

/// Convenience: is there a blocker strictly between `from` and `to`?
pub fn segment_blocked(spatial: &impl SpatialQueries, from: Vec3, to: Vec3, blockers: LayerMask) -> bool {
    let delta = to - from;
    let Ok(dir) = Dir3::new(delta) else {
        return false;
    };
    spatial.ray_cast(from, dir, delta.length(), blockers).is_some()
}

/// Convenience: is something solid within `probe` metres below `position`?
pub fn grounded(spatial: &impl SpatialQueries, position: Vec3, probe: f32, ground: LayerMask) -> bool {
    spatial.ray_cast(position, Dir3::NEG_Y, probe, ground).is_some()
}

// -----------------------------------------------------------------------------
// Avian adapter
// -----------------------------------------------------------------------------

#[derive(SystemParam)]
pub struct AvianSpatial<'w, 's> {
    query: SpatialQuery<'w, 's>,
    colliders: Query<'w, 's, &'static ColliderOf>,
    layers: Query<'w, 's, &'static CollisionLayers>,
    positions: Query<'w, 's, &'static Position>,
}

impl AvianSpatial<'_, '_> {
    #[inline]
    fn owner(&self, collider: Entity) -> Entity {
        self.colliders.get(collider).map(|c| c.body).unwrap_or(collider)
    }

    #[inline]
    fn membership(&self, collider: Entity) -> LayerMask {
        self.layers.get(collider).map(|l| l.memberships).unwrap_or(LayerMask::DEFAULT)
    }

    fn to_hit(&self, origin: Vec3, direction: Dir3, data: &RayHitData) -> RayHit {
        RayHit {
            entity: self.owner(data.entity),
            point: origin + *direction * data.distance,
            normal: data.normal,
            distance: data.distance,
            membership: self.membership(data.entity),
        }
    }

    fn owners_of(&self, colliders: Vec<Entity>) -> Vec<Overlap> {
        let mut out: Vec<Overlap> = Vec::with_capacity(colliders.len());
        for collider in colliders {
            let entity = self.owner(collider);
            if out.iter().any(|o| o.entity == entity) {
                continue;
            }
            let Ok(position) = self.positions.get(entity) else {
                continue;
            };
            out.push(Overlap { entity, position: position.0 });
        }
        out
    }
}

impl SpatialQueries for AvianSpatial<'_, '_> {
    fn ray_cast(&self, origin: Vec3, direction: Dir3, max_distance: f32, interest: LayerMask) -> Option<RayHit> {
        let filter = SpatialQueryFilter::from_mask(interest);
        self.query
            .cast_ray(origin, direction, max_distance, true, &filter)
            .map(|data| self.to_hit(origin, direction, &data))
    }

    fn ray_cast_all(&self, origin: Vec3, direction: Dir3, max_distance: f32, interest: LayerMask) -> Vec<RayHit> {
        let filter = SpatialQueryFilter::from_mask(interest);
        let mut hits: Vec<RayHit> = self
            .query
            .ray_hits(origin, direction, max_distance, u32::MAX, true, &filter)
            .iter()
            .map(|data| self.to_hit(origin, direction, data))
            .collect();
        // avian does not guarantee an order.
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }

    fn overlap_sphere(&self, center: Vec3, radius: f32, interest: LayerMask) -> Vec<Overlap> {
        let filter = SpatialQueryFilter::from_mask(interest);
        let shape = Collider::sphere(radius);
        self.owners_of(self.query.shape_intersections(&shape, center, Quat::IDENTITY, &filter))
    }

    fn overlap_capsule(&self, a: Vec3, b: Vec3, radius: f32, interest: LayerMask) -> Vec<Overlap> {
        let filter = SpatialQueryFilter::from_mask(interest);
        let shape = Collider::capsule_endpoints(radius, a, b);
        self.owners_of(self.query.shape_intersections(&shape, Vec3::ZERO, Quat::IDENTITY, &filter))
    }

    fn closest_point(&self, point: Vec3, interest: LayerMask) -> Option<Vec3> {
        let filter = SpatialQueryFilter::from_mask(interest);
        self.query.project_point(point, true, &filter).map(|projection| projection.point)
    }
}
