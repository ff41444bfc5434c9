//! Screen point to placed object resolution and selection highlight.

use bevy::prelude::*;
use constants::placement::PLACED_OPACITY;

use super::scene::SceneAdapter;
use super::state::{ObjectId, PlacedItemSet};

// Guards the ancestor walk against cyclic parent links from a broken adapter.
const MAX_ANCESTOR_DEPTH: usize = 64;

/// Window pixels (y down) to NDC (y up). `None` for a degenerate viewport.
pub fn screen_to_ndc(point: Vec2, viewport: Vec2) -> Option<Vec2> {
    if viewport.x <= 0.0 || viewport.y <= 0.0 {
        return None;
    }
    Some(Vec2::new(
        (point.x / viewport.x) * 2.0 - 1.0,
        -(point.y / viewport.y) * 2.0 + 1.0,
    ))
}

/// Walk up from a picked sub-object to the entry registered in `placed`.
pub fn resolve_placed_root(
    scene: &impl SceneAdapter,
    placed: &PlacedItemSet,
    hit: ObjectId,
) -> Option<ObjectId> {
    let mut current = hit;
    for _ in 0..MAX_ANCESTOR_DEPTH {
        if placed.contains(current) {
            return Some(current);
        }
        current = scene.parent_of(current)?;
    }
    None
}

/// Nearest placed object under `point`, or `None` on an empty hit list.
pub fn pick_placed(
    scene: &mut impl SceneAdapter,
    placed: &PlacedItemSet,
    point: Vec2,
    viewport: Vec2,
) -> Option<ObjectId> {
    if placed.is_empty() {
        return None;
    }
    let ndc = screen_to_ndc(point, viewport)?;
    let hits = scene.pick_objects(ndc, &placed.ids());
    hits.into_iter()
        .find_map(|hit| resolve_placed_root(&*scene, placed, hit))
}

/// Currently highlighted placed object. Purely cosmetic: it dims the
/// selected object and restores the previous one.
#[derive(Debug, Default, Clone)]
pub struct Selection {
    current: Option<ObjectId>,
}

impl Selection {
    pub fn current(&self) -> Option<ObjectId> {
        self.current
    }

    /// Returns `true` when the selection changed.
    pub fn select(
        &mut self,
        scene: &mut impl SceneAdapter,
        object: ObjectId,
        selected_opacity: f32,
    ) -> bool {
        if self.current == Some(object) {
            return false;
        }
        if let Some(previous) = self.current.take() {
            scene.set_opacity(previous, PLACED_OPACITY);
        }
        scene.set_opacity(object, selected_opacity);
        self.current = Some(object);
        true
    }

    /// Returns `true` when something was deselected.
    pub fn clear(&mut self, scene: &mut impl SceneAdapter) -> bool {
        match self.current.take() {
            Some(previous) => {
                scene.set_opacity(previous, PLACED_OPACITY);
                true
            }
            None => false,
        }
    }

    /// Drop the reference without touching the object, which is already gone.
    pub fn forget(&mut self, object: ObjectId) -> bool {
        if self.current == Some(object) {
            self.current = None;
            true
        } else {
            false
        }
    }
}
