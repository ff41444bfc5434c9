//! The placement component: one explicit state owner per AR session.

use std::collections::HashMap;

use bevy::prelude::*;
use constants::placement::DELETE_AFFORDANCE_OFFSET;

use super::gesture::{GestureInterpreter, GestureKind, MoveOutcome, centroid};
use super::scene::{SceneAdapter, SurfaceTracker};
use super::selection::{Selection, pick_placed};
use super::state::{
    GestureSettings, ObjectId, PlacedItemSet, SessionSignal, StatusMessage, TouchPoint,
};
use super::workflow::{ConfirmOutcome, FrameOutcome, PlacementState, PlacementWorkflow};

/// Gesture interpreter, placement workflow and placed items for one session.
///
/// All entry points run to completion synchronously and never fail; invalid
/// requests degrade to no-ops and are reported through [`SessionSignal`]s.
#[derive(Debug, Default)]
pub struct ArSession {
    gestures: GestureInterpreter,
    workflow: PlacementWorkflow,
    placed: PlacedItemSet,
    selection: Selection,
    templates: HashMap<String, ObjectId>,
    viewport: Vec2,
    last_status: Option<StatusMessage>,
    signals: Vec<SessionSignal>,
}

impl ArSession {
    pub fn new(settings: GestureSettings) -> Self {
        Self {
            gestures: GestureInterpreter::new(settings.sanitized()),
            ..default()
        }
    }

    pub fn settings(&self) -> &GestureSettings {
        self.gestures.settings()
    }

    pub fn set_settings(&mut self, settings: GestureSettings) {
        self.gestures.set_settings(settings.sanitized());
    }

    /// Window size in the same pixel space as touch positions.
    pub fn set_viewport(&mut self, size: Vec2) {
        self.viewport = size;
    }

    pub fn register_template(&mut self, template_id: impl Into<String>, object: ObjectId) {
        let template_id = template_id.into();
        debug!("Template registered: {} -> {}", template_id, object);
        self.templates.insert(template_id, object);
    }

    pub fn unregister_template(&mut self, template_id: &str) -> Option<ObjectId> {
        self.templates.remove(template_id)
    }

    pub fn has_template(&self, template_id: &str) -> bool {
        self.templates.contains_key(template_id)
    }

    pub fn placed(&self) -> &PlacedItemSet {
        &self.placed
    }

    pub fn selected(&self) -> Option<ObjectId> {
        self.selection.current()
    }

    pub fn gesture_kind(&self) -> GestureKind {
        self.gestures.kind()
    }

    pub fn manipulated(&self) -> Option<ObjectId> {
        self.gestures.object()
    }

    pub fn placement_state(&self) -> PlacementState {
        self.workflow.state()
    }

    pub fn preview(&self) -> Option<ObjectId> {
        self.workflow.preview().map(|preview| preview.object)
    }

    pub fn reticle_visible(&self) -> bool {
        self.workflow.reticle_visible()
    }

    pub fn drain_signals(&mut self) -> Vec<SessionSignal> {
        std::mem::take(&mut self.signals)
    }

    // Selection

    /// Nearest placed object under `point`; highlights it and dims nothing else.
    pub fn select_from_screen_point(
        &mut self,
        scene: &mut impl SceneAdapter,
        point: Vec2,
    ) -> Option<ObjectId> {
        match pick_placed(scene, &self.placed, point, self.viewport) {
            Some(object) => {
                let opacity = self.gestures.settings().selected_opacity;
                if self.selection.select(scene, object, opacity) {
                    self.signals.push(SessionSignal::SelectionChanged(Some(object)));
                }
                Some(object)
            }
            None => {
                if self.selection.clear(scene) {
                    self.signals.push(SessionSignal::SelectionChanged(None));
                }
                None
            }
        }
    }

    // Placement

    pub fn begin_placement(
        &mut self,
        scene: &mut impl SceneAdapter,
        template_id: &str,
    ) -> Option<ObjectId> {
        let unavailable = StatusMessage::TemplateUnavailable(template_id.to_string());
        let Some(&template) = self.templates.get(template_id) else {
            info!("Template '{}' not available", template_id);
            self.emit_status(Some(unavailable), true);
            return None;
        };

        let ghost = self.gestures.settings().ghost_opacity;
        let Some(preview) = self.workflow.begin(scene, template_id, template, ghost) else {
            warn!("Template '{}' ({}) could not be cloned", template_id, template);
            self.emit_status(Some(unavailable), true);
            return None;
        };

        info!("Previewing '{}' as {}", template_id, preview);
        self.signals.push(SessionSignal::PlacementControls { visible: true });
        let status = if self.workflow.last_pose().valid {
            StatusMessage::TapPlace
        } else {
            StatusMessage::PointAtSurface
        };
        self.emit_status(Some(status), true);
        Some(preview)
    }

    /// Per-frame update, driven by the render loop rather than by touches.
    pub fn update_frame(&mut self, scene: &mut impl SceneAdapter, tracker: &impl SurfaceTracker) {
        match self.workflow.update_frame(scene, tracker.current_pose()) {
            FrameOutcome::Idle => {}
            FrameOutcome::Tracking => self.emit_status(Some(StatusMessage::TapPlace), false),
            FrameOutcome::SearchingSurface => {
                self.emit_status(Some(StatusMessage::PointAtSurface), false)
            }
        }
    }

    pub fn confirm_placement(&mut self, scene: &mut impl SceneAdapter) -> ConfirmOutcome {
        let outcome = self.workflow.confirm(scene, &mut self.placed);
        match outcome {
            ConfirmOutcome::Placed(object) => {
                info!("Placed {} ({} items)", object, self.placed.len());
                self.signals.push(SessionSignal::ItemPlaced(object));
                self.signals.push(SessionSignal::PlacementControls { visible: false });
                self.signals.push(SessionSignal::DeleteAffordance { anchor: None });
                self.emit_status(Some(StatusMessage::Placed), true);
            }
            ConfirmOutcome::NoSurface => {
                info!("Placement requested without a tracked surface");
                self.emit_status(Some(StatusMessage::PointAtSurface), true);
            }
            ConfirmOutcome::NoPreview => debug!("Confirm ignored: no preview"),
            ConfirmOutcome::CloneFailed => warn!("Confirm failed: preview could not be cloned"),
        }
        outcome
    }

    pub fn cancel_placement(&mut self, scene: &mut impl SceneAdapter) {
        if self.workflow.discard(scene) {
            debug!("Preview cancelled");
        }
        self.signals.push(SessionSignal::PlacementControls { visible: false });
        self.emit_status(None, false);
    }

    /// Remove the selected placed object. Returns the removed id.
    pub fn delete_selected(&mut self, scene: &mut impl SceneAdapter) -> Option<ObjectId> {
        let Some(object) = self.selection.current() else {
            debug!("Delete ignored: nothing selected");
            return None;
        };
        if self.placed.remove(object).is_none() {
            debug!("Delete ignored: {} is not placed", object);
            self.selection.forget(object);
            return None;
        }

        scene.remove_from_scene(object);
        self.selection.forget(object);
        self.gestures.release_object(object);
        info!("Deleted {} ({} items left)", object, self.placed.len());

        self.signals.push(SessionSignal::ItemDeleted(object));
        self.signals.push(SessionSignal::SelectionChanged(None));
        self.signals.push(SessionSignal::DeleteAffordance { anchor: None });
        Some(object)
    }

    // Touch entry points. `touches` is every touch still down after the event.

    pub fn on_touch_start(&mut self, scene: &mut impl SceneAdapter, touches: &[TouchPoint]) {
        match touches {
            [touch] => {
                match self.select_from_screen_point(scene, touch.position) {
                    Some(object) => {
                        self.gestures.begin_rotate(&*scene, object, *touch);
                        let anchor = touch.position + Vec2::from(DELETE_AFFORDANCE_OFFSET);
                        self.signals.push(SessionSignal::DeleteAffordance { anchor: Some(anchor) });
                    }
                    None => {
                        self.gestures.reset();
                        self.signals.push(SessionSignal::DeleteAffordance { anchor: None });
                    }
                }
            }
            [a, b] => {
                let mid = centroid(*a, *b);
                let target = pick_placed(scene, &self.placed, mid, self.viewport).or_else(|| {
                    self.selection
                        .current()
                        .filter(|object| self.placed.contains(*object))
                });
                match target {
                    Some(object) => {
                        let opacity = self.gestures.settings().selected_opacity;
                        if self.selection.select(scene, object, opacity) {
                            self.signals.push(SessionSignal::SelectionChanged(Some(object)));
                        }
                        let kind = self.gestures.begin_two_finger(&*scene, object, *a, *b);
                        debug!("Two-finger gesture on {}: {:?}", object, kind);
                    }
                    None => self.gestures.reset(),
                }
            }
            // Zero touches cannot start anything; three or more keep the current mode.
            _ => {}
        }
    }

    pub fn on_touch_move(
        &mut self,
        scene: &mut impl SceneAdapter,
        touches: &[TouchPoint],
    ) -> MoveOutcome {
        self.gestures.on_move(scene, touches)
    }

    pub fn on_touch_end(&mut self, scene: &mut impl SceneAdapter, touches: &[TouchPoint]) {
        let kind = self.gestures.on_release(&*scene, touches);
        if touches.is_empty() && self.selection.current().is_none() {
            self.signals.push(SessionSignal::DeleteAffordance { anchor: None });
        }
        trace!("Touch released, {} remaining, mode {:?}", touches.len(), kind);
    }

    // UI entry points

    pub fn on_thumbnail_activated(&mut self, scene: &mut impl SceneAdapter, template_id: &str) {
        self.begin_placement(scene, template_id);
    }

    pub fn on_place_button(&mut self, scene: &mut impl SceneAdapter) {
        self.confirm_placement(scene);
    }

    pub fn on_cancel_button(&mut self, scene: &mut impl SceneAdapter) {
        self.cancel_placement(scene);
    }

    pub fn on_delete_button(&mut self, scene: &mut impl SceneAdapter) {
        if self.delete_selected(scene).is_none() {
            self.emit_status(Some(StatusMessage::NothingSelected), true);
        }
    }

    fn emit_status(&mut self, status: Option<StatusMessage>, force: bool) {
        if !force && self.last_status == status {
            return;
        }
        self.last_status = status.clone();
        self.signals.push(SessionSignal::Status(status));
    }
}
