//! Headless [`SceneAdapter`] backed by a plain map.
//!
//! Picking uses screen-space footprints registered per object instead of
//! geometry, which is enough to drive sessions without a renderer.

use std::collections::BTreeMap;

use bevy::prelude::*;

use super::scene::SceneAdapter;
use super::state::ObjectId;

#[derive(Debug, Clone)]
pub struct MemoryObject {
    pub transform: Transform,
    pub opacity: f32,
    pub parent: Option<ObjectId>,
    pub in_scene: bool,
    /// NDC rectangle and view depth used by `pick_objects`.
    pub footprint: Option<(Rect, f32)>,
}

#[derive(Debug, Default)]
pub struct MemoryScene {
    objects: BTreeMap<ObjectId, MemoryObject>,
    next_id: u64,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached object, as a loaded template would be.
    pub fn spawn(&mut self, transform: Transform) -> ObjectId {
        self.insert(MemoryObject {
            transform,
            opacity: 1.0,
            parent: None,
            in_scene: false,
            footprint: None,
        })
    }

    pub fn spawn_child(&mut self, parent: ObjectId, transform: Transform) -> ObjectId {
        let in_scene = self.is_in_scene(parent);
        self.insert(MemoryObject {
            transform,
            opacity: 1.0,
            parent: Some(parent),
            in_scene,
            footprint: None,
        })
    }

    pub fn set_footprint(&mut self, object: ObjectId, ndc_rect: Rect, depth: f32) {
        if let Some(obj) = self.objects.get_mut(&object) {
            obj.footprint = Some((ndc_rect, depth));
        }
    }

    pub fn object(&self, object: ObjectId) -> Option<&MemoryObject> {
        self.objects.get(&object)
    }

    pub fn opacity(&self, object: ObjectId) -> Option<f32> {
        self.objects.get(&object).map(|obj| obj.opacity)
    }

    pub fn is_in_scene(&self, object: ObjectId) -> bool {
        self.objects.get(&object).is_some_and(|obj| obj.in_scene)
    }

    pub fn children_of(&self, object: ObjectId) -> Vec<ObjectId> {
        self.objects
            .iter()
            .filter(|(_, obj)| obj.parent == Some(object))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Objects currently added to the scene.
    pub fn live_count(&self) -> usize {
        self.objects.values().filter(|obj| obj.in_scene).count()
    }

    /// Out-of-band removal, bypassing whoever holds the id.
    pub fn destroy(&mut self, object: ObjectId) {
        for id in self.subtree(object) {
            self.objects.remove(&id);
        }
    }

    fn insert(&mut self, object: MemoryObject) -> ObjectId {
        self.next_id += 1;
        let id = ObjectId(self.next_id);
        self.objects.insert(id, object);
        id
    }

    /// `root` followed by all of its descendants, parents before children.
    fn subtree(&self, root: ObjectId) -> Vec<ObjectId> {
        if !self.objects.contains_key(&root) {
            return Vec::new();
        }
        let mut out = vec![root];
        let mut cursor = 0;
        while cursor < out.len() {
            let current = out[cursor];
            out.extend(self.children_of(current));
            cursor += 1;
        }
        out
    }

    fn is_under(&self, object: ObjectId, ancestor: ObjectId) -> bool {
        let mut current = Some(object);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.objects.get(&id).and_then(|obj| obj.parent);
        }
        false
    }
}

impl SceneAdapter for MemoryScene {
    fn pick_objects(&mut self, ndc: Vec2, candidates: &[ObjectId]) -> Vec<ObjectId> {
        let mut hits: Vec<(ObjectId, f32)> = self
            .objects
            .iter()
            .filter(|(_, obj)| obj.in_scene)
            .filter_map(|(id, obj)| {
                let (rect, depth) = obj.footprint?;
                rect.contains(ndc).then_some((*id, depth))
            })
            .filter(|(id, _)| candidates.iter().any(|c| self.is_under(*id, *c)))
            .collect();
        hits.sort_by(|a, b| a.1.total_cmp(&b.1));
        hits.into_iter().map(|(id, _)| id).collect()
    }

    fn parent_of(&self, object: ObjectId) -> Option<ObjectId> {
        self.objects.get(&object)?.parent
    }

    fn transform(&self, object: ObjectId) -> Option<Transform> {
        self.objects.get(&object).map(|obj| obj.transform)
    }

    fn set_position(&mut self, object: ObjectId, position: Vec3) {
        if let Some(obj) = self.objects.get_mut(&object) {
            obj.transform.translation = position;
        }
    }

    fn set_rotation(&mut self, object: ObjectId, rotation: Quat) {
        if let Some(obj) = self.objects.get_mut(&object) {
            obj.transform.rotation = rotation;
        }
    }

    fn set_scale(&mut self, object: ObjectId, scale: Vec3) {
        if let Some(obj) = self.objects.get_mut(&object) {
            obj.transform.scale = scale;
        }
    }

    fn set_opacity(&mut self, object: ObjectId, opacity: f32) {
        for id in self.subtree(object) {
            if let Some(obj) = self.objects.get_mut(&id) {
                obj.opacity = opacity;
            }
        }
    }

    fn clone_object(&mut self, source: ObjectId) -> Option<ObjectId> {
        let subtree = self.subtree(source);
        if subtree.is_empty() {
            return None;
        }

        let mut remap: BTreeMap<ObjectId, ObjectId> = BTreeMap::new();
        for old in subtree {
            let mut copy = self.objects.get(&old)?.clone();
            copy.in_scene = false;
            copy.parent = if old == source {
                None
            } else {
                copy.parent.and_then(|p| remap.get(&p).copied())
            };
            let new = self.insert(copy);
            remap.insert(old, new);
        }
        remap.get(&source).copied()
    }

    fn add_to_scene(&mut self, object: ObjectId) {
        for id in self.subtree(object) {
            if let Some(obj) = self.objects.get_mut(&id) {
                obj.in_scene = true;
            }
        }
    }

    fn remove_from_scene(&mut self, object: ObjectId) {
        self.destroy(object);
    }

    fn contains(&self, object: ObjectId) -> bool {
        self.objects.contains_key(&object)
    }
}
