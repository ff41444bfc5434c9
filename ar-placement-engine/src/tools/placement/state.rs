use std::fmt;

use bevy::prelude::*;
use constants::gesture::{
    DRAG_SCALE_THRESHOLD_PX, MAX_SCALE, MIN_SCALE, MOVEMENT_SPEED, ROTATION_SPEED,
};
use constants::placement::{GHOST_OPACITY, SELECTED_OPACITY};
use serde::{Deserialize, Serialize};

/// Lookup key into the scene adapter's object table. Never implies ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

impl ObjectId {
    /// The ECS entity behind this id, or `None` for bits no entity can have.
    pub fn entity(self) -> Option<Entity> {
        Entity::try_from_bits(self.0).ok()
    }
}

impl From<Entity> for ObjectId {
    fn from(entity: Entity) -> Self {
        Self(entity.to_bits())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One active touch in window pixels (origin top-left, y down).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    pub id: u64,
    pub position: Vec2,
}

impl TouchPoint {
    pub fn new(id: u64, x: f32, y: f32) -> Self {
        Self {
            id,
            position: Vec2::new(x, y),
        }
    }
}

/// Latest surface pose reported by the surface tracker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReticlePose {
    pub position: Vec3,
    pub orientation: Quat,
    pub valid: bool,
}

impl ReticlePose {
    pub fn at(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
            valid: true,
        }
    }

    pub fn invalid() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            valid: false,
        }
    }
}

impl Default for ReticlePose {
    fn default() -> Self {
        Self::invalid()
    }
}

/// Tunables for gesture interpretation and placement feedback.
///
/// Missing fields fall back to the values in the `constants` crate, so a
/// manifest may override only what it needs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureSettings {
    /// Radians of yaw per pixel of one-finger horizontal travel.
    pub rotation_speed: f32,
    /// World units per pixel of two-finger centroid travel.
    pub movement_speed: f32,
    /// Initial finger spacing (px) below which two fingers drag instead of scale.
    pub drag_scale_threshold: f32,
    pub min_scale: f32,
    pub max_scale: f32,
    pub ghost_opacity: f32,
    pub selected_opacity: f32,
}

impl Default for GestureSettings {
    fn default() -> Self {
        Self {
            rotation_speed: ROTATION_SPEED,
            movement_speed: MOVEMENT_SPEED,
            drag_scale_threshold: DRAG_SCALE_THRESHOLD_PX,
            min_scale: MIN_SCALE,
            max_scale: MAX_SCALE,
            ghost_opacity: GHOST_OPACITY,
            selected_opacity: SELECTED_OPACITY,
        }
    }
}

impl GestureSettings {
    /// Replace unusable values with defaults so a bad manifest cannot wedge gestures.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let mut out = self;

        let positive = |v: f32| v.is_finite() && v > 0.0;
        if !positive(out.rotation_speed) {
            warn!("Ignoring rotation_speed {}", out.rotation_speed);
            out.rotation_speed = defaults.rotation_speed;
        }
        if !positive(out.movement_speed) {
            warn!("Ignoring movement_speed {}", out.movement_speed);
            out.movement_speed = defaults.movement_speed;
        }
        if !positive(out.drag_scale_threshold) {
            warn!("Ignoring drag_scale_threshold {}", out.drag_scale_threshold);
            out.drag_scale_threshold = defaults.drag_scale_threshold;
        }
        if !positive(out.min_scale) || !positive(out.max_scale) || out.min_scale > out.max_scale {
            warn!(
                "Ignoring scale bounds [{}, {}]",
                out.min_scale, out.max_scale
            );
            out.min_scale = defaults.min_scale;
            out.max_scale = defaults.max_scale;
        }
        out.ghost_opacity = out.ghost_opacity.clamp(0.0, 1.0);
        out.selected_opacity = out.selected_opacity.clamp(0.0, 1.0);
        out
    }
}

/// A committed object and the catalog template it was cloned from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedItem {
    pub object: ObjectId,
    pub template: String,
}

/// Placed objects in stable insertion order. Appended by confirm, shrunk by delete.
#[derive(Debug, Clone, Default)]
pub struct PlacedItemSet {
    items: Vec<PlacedItem>,
}

impl PlacedItemSet {
    pub fn push(&mut self, object: ObjectId, template: impl Into<String>) {
        self.items.push(PlacedItem {
            object,
            template: template.into(),
        });
    }

    pub fn remove(&mut self, object: ObjectId) -> Option<PlacedItem> {
        let index = self.items.iter().position(|item| item.object == object)?;
        Some(self.items.remove(index))
    }

    pub fn contains(&self, object: ObjectId) -> bool {
        self.items.iter().any(|item| item.object == object)
    }

    pub fn ids(&self) -> Vec<ObjectId> {
        self.items.iter().map(|item| item.object).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlacedItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Human-readable state for the surrounding UI. Wording here is only a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum StatusMessage {
    PointAtSurface,
    TapPlace,
    Placed,
    TemplateUnavailable(String),
    NothingSelected,
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PointAtSurface => write!(f, "Point at a surface to place the model"),
            Self::TapPlace => write!(f, "Tap 'Place' to position the model"),
            Self::Placed => write!(f, "Model placed"),
            Self::TemplateUnavailable(id) => write!(f, "Model '{id}' is not loaded yet"),
            Self::NothingSelected => write!(f, "Tap a placed model to select it"),
        }
    }
}

/// Outgoing notifications for the UI layer, drained once per frame.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionSignal {
    /// `None` clears the status line.
    Status(Option<StatusMessage>),
    /// Show or hide the Place/Cancel affordances.
    PlacementControls { visible: bool },
    /// Screen anchor for the delete button, `None` hides it.
    DeleteAffordance { anchor: Option<Vec2> },
    SelectionChanged(Option<ObjectId>),
    ItemPlaced(ObjectId),
    ItemDeleted(ObjectId),
}
