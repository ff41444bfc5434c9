//! Touch gesture interpreter.
//!
//! The mode is classified when touches go down and held until they lift;
//! moves never reclassify. All deltas are measured from the values captured
//! at classification, so a long gesture does not accumulate drift.
//!
//! ```text
//! Idle ──1 touch on placed object──> Rotating
//! Idle ──2 touches, spacing < threshold──> Dragging
//! Idle ──2 touches, spacing >= threshold──> Scaling
//! Dragging | Scaling ──lift to 1 touch──> Rotating (rebased on remaining touch)
//! any ──lift to 0 touches──> Idle
//! ```

use bevy::prelude::*;
use constants::gesture::MIN_PINCH_DISTANCE_PX;
use serde::Serialize;

use super::scene::SceneAdapter;
use super::state::{GestureSettings, ObjectId, TouchPoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GestureKind {
    Idle,
    Rotating,
    Dragging,
    Scaling,
}

/// Active interaction and the snapshot its deltas are relative to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureMode {
    Idle,
    Rotating {
        object: ObjectId,
        start_x: f32,
        initial_rotation: Quat,
    },
    Dragging {
        object: ObjectId,
        initial_centroid: Vec2,
        initial_position: Vec3,
    },
    Scaling {
        object: ObjectId,
        initial_distance: f32,
        initial_scale: Vec3,
    },
}

impl GestureMode {
    pub fn kind(&self) -> GestureKind {
        match self {
            Self::Idle => GestureKind::Idle,
            Self::Rotating { .. } => GestureKind::Rotating,
            Self::Dragging { .. } => GestureKind::Dragging,
            Self::Scaling { .. } => GestureKind::Scaling,
        }
    }

    pub fn object(&self) -> Option<ObjectId> {
        match *self {
            Self::Idle => None,
            Self::Rotating { object, .. }
            | Self::Dragging { object, .. }
            | Self::Scaling { object, .. } => Some(object),
        }
    }
}

/// Result of feeding one move event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Applied,
    /// Scale would leave the configured bounds; the object keeps its scale.
    Rejected,
    /// Idle, wrong touch count, or the object no longer exists.
    Ignored,
}

pub fn centroid(a: TouchPoint, b: TouchPoint) -> Vec2 {
    (a.position + b.position) * 0.5
}

pub fn pinch_distance(a: TouchPoint, b: TouchPoint) -> f32 {
    a.position.distance(b.position)
}

#[derive(Debug, Clone)]
pub struct GestureInterpreter {
    mode: GestureMode,
    settings: GestureSettings,
}

impl Default for GestureInterpreter {
    fn default() -> Self {
        Self::new(GestureSettings::default())
    }
}

impl GestureInterpreter {
    pub fn new(settings: GestureSettings) -> Self {
        Self {
            mode: GestureMode::Idle,
            settings,
        }
    }

    pub fn mode(&self) -> GestureMode {
        self.mode
    }

    pub fn kind(&self) -> GestureKind {
        self.mode.kind()
    }

    pub fn object(&self) -> Option<ObjectId> {
        self.mode.object()
    }

    pub fn settings(&self) -> &GestureSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: GestureSettings) {
        self.settings = settings;
    }

    pub fn reset(&mut self) {
        self.mode = GestureMode::Idle;
    }

    /// Drop the reference if it points at `object`, e.g. after a delete.
    pub fn release_object(&mut self, object: ObjectId) {
        if self.mode.object() == Some(object) {
            self.mode = GestureMode::Idle;
        }
    }

    pub fn begin_rotate(
        &mut self,
        scene: &impl SceneAdapter,
        object: ObjectId,
        touch: TouchPoint,
    ) -> GestureKind {
        self.mode = match scene.transform(object) {
            Some(transform) => GestureMode::Rotating {
                object,
                start_x: touch.position.x,
                initial_rotation: transform.rotation,
            },
            None => GestureMode::Idle,
        };
        self.kind()
    }

    /// Classify a two-finger start by initial finger spacing.
    pub fn begin_two_finger(
        &mut self,
        scene: &impl SceneAdapter,
        object: ObjectId,
        a: TouchPoint,
        b: TouchPoint,
    ) -> GestureKind {
        let Some(transform) = scene.transform(object) else {
            self.mode = GestureMode::Idle;
            return self.kind();
        };

        let distance = pinch_distance(a, b);
        self.mode = if distance < self.settings.drag_scale_threshold {
            GestureMode::Dragging {
                object,
                initial_centroid: centroid(a, b),
                initial_position: transform.translation,
            }
        } else {
            GestureMode::Scaling {
                object,
                initial_distance: distance,
                initial_scale: transform.scale,
            }
        };
        self.kind()
    }

    pub fn on_move(
        &mut self,
        scene: &mut impl SceneAdapter,
        touches: &[TouchPoint],
    ) -> MoveOutcome {
        match (self.mode, touches) {
            (
                GestureMode::Rotating {
                    object,
                    start_x,
                    initial_rotation,
                },
                [touch],
            ) => {
                if !scene.contains(object) {
                    return MoveOutcome::Ignored;
                }
                let yaw = (touch.position.x - start_x) * self.settings.rotation_speed;
                scene.set_rotation(object, initial_rotation * Quat::from_rotation_y(yaw));
                MoveOutcome::Applied
            }
            (
                GestureMode::Dragging {
                    object,
                    initial_centroid,
                    initial_position,
                },
                [a, b],
            ) => {
                if !scene.contains(object) {
                    return MoveOutcome::Ignored;
                }
                let offset = (centroid(*a, *b) - initial_centroid) * self.settings.movement_speed;
                // Screen y grows downward, which maps to +Z (towards the viewer).
                let position = initial_position + Vec3::new(offset.x, 0.0, offset.y);
                scene.set_position(object, position);
                MoveOutcome::Applied
            }
            (
                GestureMode::Scaling {
                    object,
                    initial_distance,
                    initial_scale,
                },
                [a, b],
            ) => {
                if !scene.contains(object) || initial_distance <= MIN_PINCH_DISTANCE_PX {
                    return MoveOutcome::Ignored;
                }
                let factor = pinch_distance(*a, *b) / initial_distance;
                let uniform = initial_scale.x * factor;
                if !(self.settings.min_scale..=self.settings.max_scale).contains(&uniform) {
                    return MoveOutcome::Rejected;
                }
                scene.set_scale(object, initial_scale * factor);
                MoveOutcome::Applied
            }
            _ => MoveOutcome::Ignored,
        }
    }

    /// Touches lifted; `remaining` are the ones still down.
    pub fn on_release(
        &mut self,
        scene: &impl SceneAdapter,
        remaining: &[TouchPoint],
    ) -> GestureKind {
        match (self.mode, remaining) {
            (_, []) => self.reset(),
            (GestureMode::Idle, _) => {}
            (mode, [touch]) => {
                if let Some(object) = mode.object() {
                    self.begin_rotate(scene, object, *touch);
                }
            }
            (
                GestureMode::Dragging { object, .. } | GestureMode::Scaling { object, .. },
                [a, b],
            ) => {
                // Rebase the same kind on the surviving pair so nothing jumps.
                let Some(transform) = scene.transform(object) else {
                    self.reset();
                    return self.kind();
                };
                self.mode = match self.mode {
                    GestureMode::Dragging { .. } => GestureMode::Dragging {
                        object,
                        initial_centroid: centroid(*a, *b),
                        initial_position: transform.translation,
                    },
                    _ => GestureMode::Scaling {
                        object,
                        initial_distance: pinch_distance(*a, *b),
                        initial_scale: transform.scale,
                    },
                };
            }
            _ => {}
        }
        self.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::placement::memory::MemoryScene;
    use approx::assert_relative_eq;

    fn yaw(scene: &MemoryScene, object: ObjectId) -> f32 {
        let (yaw, _, _) = scene
            .transform(object)
            .unwrap()
            .rotation
            .to_euler(EulerRot::YXZ);
        yaw
    }

    fn setup() -> (MemoryScene, ObjectId, GestureInterpreter) {
        let mut scene = MemoryScene::new();
        let object = scene.spawn(Transform::IDENTITY);
        scene.add_to_scene(object);
        (scene, object, GestureInterpreter::default())
    }

    #[test]
    fn one_finger_drag_rotates_yaw() {
        let (mut scene, object, mut gestures) = setup();

        gestures.begin_rotate(&scene, object, TouchPoint::new(0, 100.0, 300.0));
        let outcome = gestures.on_move(&mut scene, &[TouchPoint::new(0, 160.0, 310.0)]);

        assert_eq!(outcome, MoveOutcome::Applied);
        assert_relative_eq!(yaw(&scene, object), 0.6, epsilon = 1e-5);
    }

    #[test]
    fn rotation_is_independent_of_event_count() {
        let (mut single, a, mut g1) = setup();
        let (mut many, b, mut g2) = setup();

        g1.begin_rotate(&single, a, TouchPoint::new(0, 50.0, 0.0));
        g1.on_move(&mut single, &[TouchPoint::new(0, 90.0, 0.0)]);

        g2.begin_rotate(&many, b, TouchPoint::new(0, 50.0, 0.0));
        for x in [53.0, 61.5, 70.0, 77.25, 84.0, 90.0] {
            g2.on_move(&mut many, &[TouchPoint::new(0, x, 0.0)]);
        }

        assert_relative_eq!(yaw(&single, a), yaw(&many, b), epsilon = 1e-6);
        assert_relative_eq!(yaw(&many, b), 0.4, epsilon = 1e-5);
    }

    #[test]
    fn rotation_composes_with_existing_orientation() {
        let mut scene = MemoryScene::new();
        let object = scene.spawn(Transform::from_rotation(Quat::from_rotation_y(1.0)));
        let mut gestures = GestureInterpreter::default();

        gestures.begin_rotate(&scene, object, TouchPoint::new(0, 0.0, 0.0));
        gestures.on_move(&mut scene, &[TouchPoint::new(0, -50.0, 0.0)]);

        assert_relative_eq!(yaw(&scene, object), 0.5, epsilon = 1e-5);
    }

    #[test]
    fn close_fingers_drag_along_ground_plane() {
        let mut scene = MemoryScene::new();
        let object = scene.spawn(Transform::from_xyz(1.0, 0.25, 2.0));
        let mut gestures = GestureInterpreter::default();

        let kind = gestures.begin_two_finger(
            &scene,
            object,
            TouchPoint::new(0, 100.0, 100.0),
            TouchPoint::new(1, 140.0, 100.0),
        );
        assert_eq!(kind, GestureKind::Dragging);

        gestures.on_move(
            &mut scene,
            &[TouchPoint::new(0, 150.0, 120.0), TouchPoint::new(1, 190.0, 120.0)],
        );
        gestures.on_move(
            &mut scene,
            &[TouchPoint::new(0, 300.0, 300.0), TouchPoint::new(1, 340.0, 300.0)],
        );

        let position = scene.transform(object).unwrap().translation;
        // Absolute from the start centroid (120, 100): (+200, +200) px.
        assert_relative_eq!(position.x, 1.0 + 200.0 * 0.005, epsilon = 1e-5);
        assert_relative_eq!(position.y, 0.25);
        assert_relative_eq!(position.z, 2.0 + 200.0 * 0.005, epsilon = 1e-5);
    }

    #[test]
    fn wide_fingers_scale_from_initial_spacing() {
        let (mut scene, object, mut gestures) = setup();

        let kind = gestures.begin_two_finger(
            &scene,
            object,
            TouchPoint::new(0, 0.0, 0.0),
            TouchPoint::new(1, 200.0, 0.0),
        );
        assert_eq!(kind, GestureKind::Scaling);

        let outcome = gestures.on_move(
            &mut scene,
            &[TouchPoint::new(0, 0.0, 0.0), TouchPoint::new(1, 300.0, 0.0)],
        );

        assert_eq!(outcome, MoveOutcome::Applied);
        assert_relative_eq!(scene.transform(object).unwrap().scale.x, 1.5, epsilon = 1e-5);
    }

    #[test]
    fn pinch_beyond_bounds_is_rejected_not_clamped() {
        let (mut scene, object, mut gestures) = setup();
        gestures.set_settings(GestureSettings {
            drag_scale_threshold: 40.0,
            ..GestureSettings::default()
        });

        gestures.begin_two_finger(
            &scene,
            object,
            TouchPoint::new(0, 0.0, 0.0),
            TouchPoint::new(1, 50.0, 0.0),
        );
        assert_eq!(gestures.kind(), GestureKind::Scaling);

        let grow = gestures.on_move(
            &mut scene,
            &[TouchPoint::new(0, 0.0, 0.0), TouchPoint::new(1, 100.0, 0.0)],
        );
        assert_eq!(grow, MoveOutcome::Applied);
        assert_relative_eq!(scene.transform(object).unwrap().scale.x, 2.0, epsilon = 1e-5);

        let overshoot = gestures.on_move(
            &mut scene,
            &[TouchPoint::new(0, 0.0, 0.0), TouchPoint::new(1, 150.0, 0.0)],
        );
        assert_eq!(overshoot, MoveOutcome::Rejected);
        assert_relative_eq!(scene.transform(object).unwrap().scale.x, 2.0, epsilon = 1e-5);

        let undershoot = gestures.on_move(
            &mut scene,
            &[TouchPoint::new(0, 0.0, 0.0), TouchPoint::new(1, 10.0, 0.0)],
        );
        assert_eq!(undershoot, MoveOutcome::Rejected);
        assert_relative_eq!(scene.transform(object).unwrap().scale.x, 2.0, epsilon = 1e-5);
    }

    #[test]
    fn lifting_one_of_two_fingers_rebases_rotation() {
        let (mut scene, object, mut gestures) = setup();

        gestures.begin_two_finger(
            &scene,
            object,
            TouchPoint::new(0, 100.0, 100.0),
            TouchPoint::new(1, 120.0, 100.0),
        );
        let kind = gestures.on_release(&scene, &[TouchPoint::new(1, 400.0, 100.0)]);
        assert_eq!(kind, GestureKind::Rotating);

        // No jump: rotation starts from the remaining finger's position.
        gestures.on_move(&mut scene, &[TouchPoint::new(1, 400.0, 100.0)]);
        assert_relative_eq!(yaw(&scene, object), 0.0, epsilon = 1e-6);

        gestures.on_move(&mut scene, &[TouchPoint::new(1, 410.0, 100.0)]);
        assert_relative_eq!(yaw(&scene, object), 0.1, epsilon = 1e-5);
    }

    #[test]
    fn lifting_all_fingers_returns_to_idle() {
        let (scene, object, mut gestures) = setup();

        gestures.begin_rotate(&scene, object, TouchPoint::new(0, 10.0, 10.0));
        assert_eq!(gestures.on_release(&scene, &[]), GestureKind::Idle);
        assert_eq!(gestures.object(), None);
    }

    #[test]
    fn moves_on_a_vanished_object_are_ignored() {
        let (mut scene, object, mut gestures) = setup();

        gestures.begin_rotate(&scene, object, TouchPoint::new(0, 0.0, 0.0));
        scene.destroy(object);

        let outcome = gestures.on_move(&mut scene, &[TouchPoint::new(0, 80.0, 0.0)]);
        assert_eq!(outcome, MoveOutcome::Ignored);
    }

    #[test]
    fn mismatched_touch_count_is_ignored() {
        let (mut scene, object, mut gestures) = setup();

        gestures.begin_rotate(&scene, object, TouchPoint::new(0, 0.0, 0.0));
        let outcome = gestures.on_move(
            &mut scene,
            &[TouchPoint::new(0, 50.0, 0.0), TouchPoint::new(1, 90.0, 0.0)],
        );

        assert_eq!(outcome, MoveOutcome::Ignored);
        assert_relative_eq!(yaw(&scene, object), 0.0);
    }
}
