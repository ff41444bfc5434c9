//! ECS side of the placement core: placeable entities and the
//! [`SceneAdapter`] implementation systems use to drive them.

pub mod opacity;
pub mod ray;

use std::collections::{HashMap, HashSet};

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use crate::tools::placement::scene::SceneAdapter;
use crate::tools::placement::state::ObjectId;
use opacity::Opacity;
use ray::{ndc_ray, ray_hits_obb};

/// Root of a template, ghost or placed item.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Placeable;

/// Full extents of the pick box around the object's origin.
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct PickBounds(pub Vec3);

#[derive(Clone)]
struct PendingObject {
    transform: Transform,
    opacity: f32,
    visibility: Visibility,
    bounds: Option<PickBounds>,
    scene: Option<SceneRoot>,
    name: Option<Name>,
}

/// Clones reserved this run whose components are not yet inserted, and
/// objects whose despawn is still queued.
#[derive(Default)]
pub struct PendingSpawns {
    spawned: HashMap<Entity, PendingObject>,
    removed: HashSet<Entity>,
}

/// [`SceneAdapter`] over `Placeable` entities.
///
/// Structural changes go through `Commands`, so systems must call
/// [`SceneAccess::flush`] before returning.
#[derive(SystemParam)]
pub struct SceneAccess<'w, 's> {
    commands: Commands<'w, 's>,
    objects: Query<
        'w,
        's,
        (
            &'static mut Transform,
            &'static mut Opacity,
            &'static mut Visibility,
            Option<&'static PickBounds>,
            Option<&'static SceneRoot>,
            Option<&'static Name>,
        ),
        With<Placeable>,
    >,
    pickables: Query<
        'w,
        's,
        (Entity, &'static GlobalTransform, &'static PickBounds, &'static InheritedVisibility),
        With<Placeable>,
    >,
    parents: Query<'w, 's, &'static ChildOf>,
    cameras: Query<'w, 's, (&'static Camera, &'static GlobalTransform), With<Camera3d>>,
    pending: Local<'s, PendingSpawns>,
}

impl SceneAccess<'_, '_> {
    pub fn flush(&mut self) {
        for (entity, object) in self.pending.spawned.drain() {
            let mut entity_commands = self.commands.entity(entity);
            entity_commands.insert((
                object.transform,
                Opacity(object.opacity),
                object.visibility,
                Placeable,
            ));
            if let Some(bounds) = object.bounds {
                entity_commands.insert(bounds);
            }
            if let Some(scene) = object.scene {
                entity_commands.insert(scene);
            }
            if let Some(name) = object.name {
                entity_commands.insert(name);
            }
        }
        self.pending.removed.clear();
    }

    fn is_removed(&self, entity: Entity) -> bool {
        self.pending.removed.contains(&entity)
    }

    fn with_object(
        &mut self,
        object: ObjectId,
        pending: impl FnOnce(&mut PendingObject),
        live: impl FnOnce(Mut<Transform>, Mut<Opacity>, Mut<Visibility>),
    ) {
        let Some(entity) = object.entity() else {
            return;
        };
        if self.is_removed(entity) {
            return;
        }
        if let Some(record) = self.pending.spawned.get_mut(&entity) {
            pending(record);
            return;
        }
        if let Ok((transform, opacity, visibility, ..)) = self.objects.get_mut(entity) {
            live(transform, opacity, visibility);
        }
    }

    fn descends_from(&self, mut entity: Entity, roots: &HashSet<Entity>) -> bool {
        for _ in 0..64 {
            if roots.contains(&entity) {
                return true;
            }
            let Ok(child_of) = self.parents.get(entity) else {
                return false;
            };
            entity = child_of.parent();
        }
        false
    }
}

impl SceneAdapter for SceneAccess<'_, '_> {
    fn pick_objects(&mut self, ndc: Vec2, candidates: &[ObjectId]) -> Vec<ObjectId> {
        let Ok((camera, camera_xf)) = self.cameras.single() else {
            return Vec::new();
        };
        let Some(ray) = ndc_ray(camera, camera_xf, ndc) else {
            return Vec::new();
        };
        let origin = ray.origin;
        let dir = ray.direction.as_vec3();
        let roots: HashSet<Entity> = candidates.iter().filter_map(|id| id.entity()).collect();

        let mut hits: Vec<(Entity, f32)> = self
            .pickables
            .iter()
            .filter(|(entity, _, _, visibility)| {
                visibility.get() && !self.is_removed(*entity) && self.descends_from(*entity, &roots)
            })
            .filter_map(|(entity, xf, PickBounds(size), _)| {
                ray_hits_obb(origin, dir, xf, *size)
                    .filter(|t| *t > 0.0)
                    .map(|t| (entity, t))
            })
            .collect();
        hits.sort_by(|a, b| a.1.total_cmp(&b.1));
        hits.into_iter().map(|(entity, _)| entity.into()).collect()
    }

    fn parent_of(&self, object: ObjectId) -> Option<ObjectId> {
        self.parents
            .get(object.entity()?)
            .ok()
            .map(|child_of| child_of.parent().into())
    }

    fn transform(&self, object: ObjectId) -> Option<Transform> {
        let entity = object.entity()?;
        if self.is_removed(entity) {
            return None;
        }
        if let Some(record) = self.pending.spawned.get(&entity) {
            return Some(record.transform);
        }
        self.objects.get(entity).ok().map(|(transform, ..)| *transform)
    }

    fn set_position(&mut self, object: ObjectId, position: Vec3) {
        self.with_object(
            object,
            |record| record.transform.translation = position,
            |mut transform, _, _| transform.translation = position,
        );
    }

    fn set_rotation(&mut self, object: ObjectId, rotation: Quat) {
        self.with_object(
            object,
            |record| record.transform.rotation = rotation,
            |mut transform, _, _| transform.rotation = rotation,
        );
    }

    fn set_scale(&mut self, object: ObjectId, scale: Vec3) {
        self.with_object(
            object,
            |record| record.transform.scale = scale,
            |mut transform, _, _| transform.scale = scale,
        );
    }

    fn set_opacity(&mut self, object: ObjectId, value: f32) {
        self.with_object(
            object,
            |record| record.opacity = value,
            |_, mut opacity, _| opacity.0 = value,
        );
    }

    fn clone_object(&mut self, source: ObjectId) -> Option<ObjectId> {
        let entity = source.entity()?;
        if self.is_removed(entity) {
            return None;
        }
        let mut record = match self.pending.spawned.get(&entity) {
            Some(record) => record.clone(),
            None => {
                let (transform, opacity, _, bounds, scene, name) = self.objects.get(entity).ok()?;
                PendingObject {
                    transform: *transform,
                    opacity: opacity.0,
                    visibility: Visibility::Hidden,
                    bounds: bounds.copied(),
                    scene: scene.cloned(),
                    name: name.cloned(),
                }
            }
        };
        record.visibility = Visibility::Hidden;

        let clone = self.commands.spawn_empty().id();
        trace!("Cloned {:?} into {:?}", entity, clone);
        self.pending.spawned.insert(clone, record);
        Some(clone.into())
    }

    fn add_to_scene(&mut self, object: ObjectId) {
        self.with_object(
            object,
            |record| record.visibility = Visibility::Inherited,
            |_, _, mut visibility| *visibility = Visibility::Inherited,
        );
    }

    fn remove_from_scene(&mut self, object: ObjectId) {
        let Some(entity) = object.entity() else {
            return;
        };
        if self.is_removed(entity) {
            return;
        }
        let known = self.pending.spawned.remove(&entity).is_some() || self.objects.contains(entity);
        if known {
            self.commands.entity(entity).despawn();
            self.pending.removed.insert(entity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;

    fn spawn_template(world: &mut World) -> Entity {
        world
            .spawn((
                Transform::from_xyz(0.0, 1.0, 0.0),
                Opacity(1.0),
                Visibility::Hidden,
                PickBounds(Vec3::ONE),
                Placeable,
                Name::new("template"),
            ))
            .id()
    }

    #[test]
    fn clone_writes_are_buffered_until_flush() {
        let mut world = World::new();
        let template = spawn_template(&mut world);

        let clone = world
            .run_system_once(move |mut scene: SceneAccess| {
                let clone = scene.clone_object(template.into())?;
                scene.set_position(clone, Vec3::new(2.0, 0.0, -1.0));
                scene.set_opacity(clone, 0.5);
                scene.add_to_scene(clone);
                // Readable before the entity has any components.
                assert_eq!(
                    scene.transform(clone).map(|t| t.translation),
                    Some(Vec3::new(2.0, 0.0, -1.0))
                );
                scene.flush();
                Some(clone)
            })
            .unwrap()
            .unwrap();

        let entity = world.entity(clone.entity().unwrap());
        assert_eq!(entity.get::<Transform>().unwrap().translation, Vec3::new(2.0, 0.0, -1.0));
        assert_eq!(entity.get::<Opacity>(), Some(&Opacity(0.5)));
        assert_eq!(entity.get::<Visibility>(), Some(&Visibility::Inherited));
        assert_eq!(entity.get::<PickBounds>(), Some(&PickBounds(Vec3::ONE)));
        assert!(entity.contains::<Placeable>());
        // The template stays hidden and untouched.
        assert_eq!(world.get::<Visibility>(template), Some(&Visibility::Hidden));
    }

    #[test]
    fn removed_objects_read_as_gone() {
        let mut world = World::new();
        let template = spawn_template(&mut world);

        world
            .run_system_once(move |mut scene: SceneAccess| {
                let id = ObjectId::from(template);
                scene.remove_from_scene(id);
                assert!(!scene.contains(id));
                assert!(scene.clone_object(id).is_none());
                scene.flush();
            })
            .unwrap();

        assert!(world.get_entity(template).is_err());
    }

    #[test]
    fn parent_links_follow_child_of() {
        let mut world = World::new();
        let root = spawn_template(&mut world);
        let leg = world.spawn((Transform::default(), ChildOf(root))).id();

        let parent = world
            .run_system_once(move |scene: SceneAccess| scene.parent_of(leg.into()))
            .unwrap();
        assert_eq!(parent, Some(ObjectId::from(root)));
    }

    #[test]
    fn ids_without_an_entity_are_stale() {
        let mut world = World::new();
        let template = spawn_template(&mut world);
        // A zero generation is not a valid entity.
        let bogus = ObjectId(7);
        assert_eq!(bogus.entity(), None);
        assert_eq!(ObjectId::from(template).entity(), Some(template));

        world
            .run_system_once(move |mut scene: SceneAccess| {
                assert!(!scene.contains(bogus));
                assert!(scene.parent_of(bogus).is_none());
                assert!(scene.clone_object(bogus).is_none());
                scene.set_position(bogus, Vec3::X);
                scene.remove_from_scene(bogus);
                assert_eq!(scene.pick_objects(Vec2::ZERO, &[bogus]), Vec::new());
                scene.flush();
            })
            .unwrap();

        assert!(world.get_entity(template).is_ok());
    }
}
