//! Abstract attack input.
//!
//! Device polling and camera control live outside the combat core. Whatever owns them
//! writes [`AttackInput`]: trigger edges, the current aim ray, and mode selections. Dispatch
//! consumes the edges, so a press is acted on exactly once.

use bevy::prelude::*;

use crate::common::layers;
use crate::plugins::spatial::SpatialQueries;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeSelect {
    Index(usize),
    Next,
    Previous,
}

/// One tick's worth of trigger state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Trigger {
    pub pressed: bool,
    pub held: bool,
    pub released: bool,
}

#[derive(Resource, Debug, Clone)]
pub struct AttackInput {
    pressed: bool,
    held: bool,
    released: bool,
    selection: Option<ModeSelect>,
    pub aim_origin: Vec3,
    pub aim_direction: Dir3,
}

impl Default for AttackInput {
    fn default() -> Self {
        Self {
            pressed: false,
            held: false,
            released: false,
            selection: None,
            aim_origin: Vec3::ZERO,
            aim_direction: Dir3::NEG_Z,
        }
    }
}

impl AttackInput {
    pub fn press(&mut self) {
        self.pressed = true;
        self.held = true;
    }

    pub fn release(&mut self) {
        if self.held {
            self.released = true;
        }
        self.held = false;
    }

    pub fn aim(&mut self, origin: Vec3, direction: Dir3) {
        self.aim_origin = origin;
        self.aim_direction = direction;
    }

    /// Later selections in the same tick replace earlier ones.
    pub fn select(&mut self, selection: ModeSelect) {
        self.selection = Some(selection);
    }

    #[inline]
    pub fn is_held(&self) -> bool {
        self.held
    }

    /// Read the trigger and clear its edges.
    pub fn take_trigger(&mut self) -> Trigger {
        let trigger = Trigger { pressed: self.pressed, held: self.held, released: self.released };
        self.pressed = false;
        self.released = false;
        trigger
    }

    pub fn take_selection(&mut self) -> Option<ModeSelect> {
        self.selection.take()
    }
}

/// Where the aim ray comes to rest: the first surface or enemy it meets, or a point `far`
/// along the ray.
pub fn resolve_aim_point(spatial: &impl SpatialQueries, origin: Vec3, direction: Dir3, far: f32) -> Vec3 {
    spatial
        .ray_cast(origin, direction, far, layers::aim_surfaces())
        .map_or(origin + *direction * far, |hit| hit.point)
}
