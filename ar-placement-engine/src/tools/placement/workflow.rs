//! Preview and placement lifecycle.
//!
//! A preview is a ghosted clone of a template that follows the reticle.
//! Confirming clones the preview again into the placed set and discards the
//! preview, so preview and placed lifetimes never overlap.

use bevy::prelude::*;
use constants::placement::PLACED_OPACITY;

use super::scene::SceneAdapter;
use super::state::{ObjectId, PlacedItemSet, ReticlePose};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementState {
    NoSelection,
    Previewing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub object: ObjectId,
    pub template: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Placed(ObjectId),
    NoPreview,
    /// The last reported pose was invalid; nothing changed.
    NoSurface,
    /// The adapter refused to clone the preview; nothing changed.
    CloneFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// No preview to move.
    Idle,
    /// Preview snapped to a valid pose.
    Tracking,
    /// Preview kept its last position.
    SearchingSurface,
}

#[derive(Debug, Default, Clone)]
pub struct PlacementWorkflow {
    preview: Option<Preview>,
    last_pose: ReticlePose,
}

impl PlacementWorkflow {
    pub fn state(&self) -> PlacementState {
        match self.preview {
            Some(_) => PlacementState::Previewing,
            None => PlacementState::NoSelection,
        }
    }

    pub fn preview(&self) -> Option<&Preview> {
        self.preview.as_ref()
    }

    pub fn last_pose(&self) -> ReticlePose {
        self.last_pose
    }

    /// Reticle is only worth showing while something is being placed.
    pub fn reticle_visible(&self) -> bool {
        self.preview.is_some() && self.last_pose.valid
    }

    /// Clone `template_object` into a fresh ghost, replacing any earlier preview.
    pub fn begin(
        &mut self,
        scene: &mut impl SceneAdapter,
        template_id: &str,
        template_object: ObjectId,
        ghost_opacity: f32,
    ) -> Option<ObjectId> {
        let object = scene.clone_object(template_object)?;
        self.discard(scene);

        scene.set_opacity(object, ghost_opacity);
        if self.last_pose.valid {
            scene.set_position(object, self.last_pose.position);
            scene.set_rotation(object, self.last_pose.orientation);
        }
        scene.add_to_scene(object);

        self.preview = Some(Preview {
            object,
            template: template_id.to_string(),
        });
        Some(object)
    }

    pub fn update_frame(
        &mut self,
        scene: &mut impl SceneAdapter,
        pose: ReticlePose,
    ) -> FrameOutcome {
        self.last_pose = pose;
        let Some(preview) = &self.preview else {
            return FrameOutcome::Idle;
        };
        if !pose.valid {
            return FrameOutcome::SearchingSurface;
        }
        scene.set_position(preview.object, pose.position);
        scene.set_rotation(preview.object, pose.orientation);
        FrameOutcome::Tracking
    }

    pub fn confirm(
        &mut self,
        scene: &mut impl SceneAdapter,
        placed: &mut PlacedItemSet,
    ) -> ConfirmOutcome {
        let Some(preview) = &self.preview else {
            return ConfirmOutcome::NoPreview;
        };
        if !self.last_pose.valid {
            return ConfirmOutcome::NoSurface;
        }
        let Some(object) = scene.clone_object(preview.object) else {
            return ConfirmOutcome::CloneFailed;
        };

        scene.set_position(object, self.last_pose.position);
        scene.set_rotation(object, self.last_pose.orientation);
        scene.set_opacity(object, PLACED_OPACITY);
        scene.add_to_scene(object);
        placed.push(object, preview.template.clone());

        self.discard(scene);
        ConfirmOutcome::Placed(object)
    }

    /// Remove the preview if there is one. Returns whether anything was removed.
    pub fn discard(&mut self, scene: &mut impl SceneAdapter) -> bool {
        match self.preview.take() {
            Some(preview) => {
                scene.remove_from_scene(preview.object);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::placement::memory::MemoryScene;

    fn template(scene: &mut MemoryScene) -> ObjectId {
        let root = scene.spawn(Transform::IDENTITY);
        scene.spawn_child(root, Transform::IDENTITY);
        root
    }

    #[test]
    fn preview_is_a_ghosted_clone() {
        let mut scene = MemoryScene::new();
        let chair = template(&mut scene);
        let mut workflow = PlacementWorkflow::default();

        let preview = workflow.begin(&mut scene, "chair1", chair, 0.5).unwrap();

        assert_ne!(preview, chair);
        assert!(scene.is_in_scene(preview));
        assert!(!scene.is_in_scene(chair));
        assert_eq!(scene.opacity(preview), Some(0.5));
        assert_eq!(scene.opacity(chair), Some(1.0));
        assert_eq!(workflow.state(), PlacementState::Previewing);
    }

    #[test]
    fn preview_follows_valid_pose_and_holds_on_invalid() {
        let mut scene = MemoryScene::new();
        let chair = template(&mut scene);
        let mut workflow = PlacementWorkflow::default();
        let preview = workflow.begin(&mut scene, "chair1", chair, 0.5).unwrap();

        let pose = ReticlePose::at(Vec3::new(0.5, -1.0, -2.0), Quat::from_rotation_y(0.3));
        assert_eq!(workflow.update_frame(&mut scene, pose), FrameOutcome::Tracking);
        assert_eq!(scene.transform(preview).unwrap().translation, pose.position);
        assert!(workflow.reticle_visible());

        assert_eq!(
            workflow.update_frame(&mut scene, ReticlePose::invalid()),
            FrameOutcome::SearchingSurface
        );
        assert_eq!(scene.transform(preview).unwrap().translation, pose.position);
        assert!(!workflow.reticle_visible());
    }

    #[test]
    fn confirm_without_surface_keeps_everything() {
        let mut scene = MemoryScene::new();
        let chair = template(&mut scene);
        let mut workflow = PlacementWorkflow::default();
        let mut placed = PlacedItemSet::default();
        let preview = workflow.begin(&mut scene, "chair1", chair, 0.5).unwrap();

        workflow.update_frame(&mut scene, ReticlePose::invalid());
        let outcome = workflow.confirm(&mut scene, &mut placed);

        assert_eq!(outcome, ConfirmOutcome::NoSurface);
        assert!(placed.is_empty());
        assert_eq!(workflow.preview().map(|p| p.object), Some(preview));
        assert!(scene.is_in_scene(preview));
    }

    #[test]
    fn confirm_clones_and_discards_preview() {
        let mut scene = MemoryScene::new();
        let chair = template(&mut scene);
        let mut workflow = PlacementWorkflow::default();
        let mut placed = PlacedItemSet::default();
        let preview = workflow.begin(&mut scene, "chair1", chair, 0.5).unwrap();
        let pose = ReticlePose::at(Vec3::new(1.0, 0.0, 2.0), Quat::IDENTITY);
        workflow.update_frame(&mut scene, pose);

        let ConfirmOutcome::Placed(object) = workflow.confirm(&mut scene, &mut placed) else {
            panic!("expected placement");
        };

        assert_ne!(object, preview);
        assert!(!scene.contains(preview));
        assert!(placed.contains(object));
        assert_eq!(scene.opacity(object), Some(1.0));
        assert_eq!(workflow.state(), PlacementState::NoSelection);
    }

    #[test]
    fn second_begin_replaces_first_preview() {
        let mut scene = MemoryScene::new();
        let chair = template(&mut scene);
        let sofa = template(&mut scene);
        let mut workflow = PlacementWorkflow::default();

        let first = workflow.begin(&mut scene, "chair1", chair, 0.5).unwrap();
        let second = workflow.begin(&mut scene, "sofa2", sofa, 0.5).unwrap();

        assert!(!scene.contains(first));
        assert!(scene.is_in_scene(second));
        assert_eq!(workflow.preview().unwrap().template, "sofa2");
    }

    #[test]
    fn cancel_without_preview_is_a_no_op() {
        let mut scene = MemoryScene::new();
        let mut workflow = PlacementWorkflow::default();
        assert!(!workflow.discard(&mut scene));
    }
}
