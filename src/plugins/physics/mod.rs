use avian3d::prelude::*;
use bevy::prelude::*;

use crate::common::tunables::Tunables;

/// Physics steps in `FixedPostUpdate`, after every combat stage has written velocities.
pub fn plugin(app: &mut App) {
    let gravity = app.world().resource::<Tunables>().gravity;
    app.add_plugins(PhysicsPlugins::default());
    app.insert_resource(Gravity(Vec3::NEG_Y * gravity));
}
