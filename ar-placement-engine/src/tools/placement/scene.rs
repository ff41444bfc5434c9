//! Capability surfaces the placement core drives but does not implement.

use bevy::prelude::*;

use super::state::{ObjectId, ReticlePose};

/// Object table of the rendering layer. The adapter owns every object's
/// lifetime; callers only hold [`ObjectId`] keys, which may go stale.
///
/// Mutations on unknown ids are ignored.
pub trait SceneAdapter {
    /// Objects hit by the camera ray through `ndc` (x right, y up, both in
    /// `[-1, 1]`), nearest first. Only `candidates` and their descendants are
    /// considered; a hit may be a descendant rather than the candidate itself.
    fn pick_objects(&mut self, ndc: Vec2, candidates: &[ObjectId]) -> Vec<ObjectId>;

    fn parent_of(&self, object: ObjectId) -> Option<ObjectId>;

    /// Local transform, or `None` once the object is gone.
    fn transform(&self, object: ObjectId) -> Option<Transform>;

    fn set_position(&mut self, object: ObjectId, position: Vec3);

    fn set_rotation(&mut self, object: ObjectId, rotation: Quat);

    fn set_scale(&mut self, object: ObjectId, scale: Vec3);

    fn set_opacity(&mut self, object: ObjectId, opacity: f32);

    /// Independent deep copy, not yet added to the scene.
    fn clone_object(&mut self, source: ObjectId) -> Option<ObjectId>;

    fn add_to_scene(&mut self, object: ObjectId);

    /// Removes and destroys the object.
    fn remove_from_scene(&mut self, object: ObjectId);

    fn contains(&self, object: ObjectId) -> bool {
        self.transform(object).is_some()
    }
}

/// Camera-based surface detection, refreshed once per rendered frame.
pub trait SurfaceTracker {
    fn current_pose(&self) -> ReticlePose;
}

impl SurfaceTracker for ReticlePose {
    fn current_pose(&self) -> ReticlePose {
        *self
    }
}
