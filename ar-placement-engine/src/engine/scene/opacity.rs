use bevy::prelude::*;

use crate::engine::catalog::CatalogTemplate;

/// Target opacity of a placeable object, pushed onto every mesh below it.
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct Opacity(pub f32);

impl Default for Opacity {
    fn default() -> Self {
        Self(1.0)
    }
}

/// Opacity last written into this mesh's private material copy.
#[derive(Component, Clone, Copy, Debug)]
pub struct AppliedOpacity(pub f32);

// glTF scenes finish spawning a few frames after the root, so this runs every
// frame and only touches meshes whose applied value is stale. Hidden catalog
// templates are never shown and keep their shared materials.
pub fn apply_opacity(
    roots: Query<(Entity, &Opacity), Without<CatalogTemplate>>,
    children: Query<&Children>,
    meshes: Query<(&MeshMaterial3d<StandardMaterial>, Option<&AppliedOpacity>)>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut commands: Commands,
) {
    for (root, &Opacity(opacity)) in &roots {
        for entity in std::iter::once(root).chain(children.iter_descendants(root)) {
            let Ok((material, applied)) = meshes.get(entity) else {
                continue;
            };
            if applied.is_some_and(|a| a.0 == opacity) {
                continue;
            }
            let Some(source) = materials.get(&material.0) else {
                continue;
            };

            let mut copy = source.clone();
            copy.base_color = copy.base_color.with_alpha(opacity);
            copy.alpha_mode = alpha_mode_for(opacity);
            let handle = materials.add(copy);
            commands
                .entity(entity)
                .insert((MeshMaterial3d(handle), AppliedOpacity(opacity)));
        }
    }
}

pub fn alpha_mode_for(opacity: f32) -> AlphaMode {
    if opacity < 1.0 {
        AlphaMode::Blend
    } else {
        AlphaMode::Opaque
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translucent_objects_blend() {
        assert_eq!(alpha_mode_for(0.5), AlphaMode::Blend);
        assert_eq!(alpha_mode_for(1.0), AlphaMode::Opaque);
    }

    #[test]
    fn opacity_reaches_descendant_meshes() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .init_resource::<Assets<StandardMaterial>>()
            .add_systems(Update, apply_opacity);

        let shared = app
            .world_mut()
            .resource_mut::<Assets<StandardMaterial>>()
            .add(StandardMaterial::default());
        let root = app.world_mut().spawn(Opacity(0.5)).id();
        let mesh = app
            .world_mut()
            .spawn((MeshMaterial3d(shared.clone()), ChildOf(root)))
            .id();

        app.update();

        let material = app.world().get::<MeshMaterial3d<StandardMaterial>>(mesh).unwrap();
        assert_ne!(material.0, shared);
        let materials = app.world().resource::<Assets<StandardMaterial>>();
        let applied = materials.get(&material.0).unwrap();
        assert_eq!(applied.base_color.alpha(), 0.5);
        assert_eq!(applied.alpha_mode, AlphaMode::Blend);
        // The shared source material is left untouched.
        assert_eq!(materials.get(&shared).unwrap().base_color.alpha(), 1.0);
    }

    #[test]
    fn catalog_templates_keep_shared_materials() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .init_resource::<Assets<StandardMaterial>>()
            .add_systems(Update, apply_opacity);

        let shared = app
            .world_mut()
            .resource_mut::<Assets<StandardMaterial>>()
            .add(StandardMaterial::default());
        let template = app
            .world_mut()
            .spawn((Opacity(0.5), CatalogTemplate("chair-1".into())))
            .id();
        let mesh = app
            .world_mut()
            .spawn((MeshMaterial3d(shared.clone()), ChildOf(template)))
            .id();

        app.update();

        let material = app.world().get::<MeshMaterial3d<StandardMaterial>>(mesh).unwrap();
        assert_eq!(material.0, shared);
        assert!(app.world().get::<AppliedOpacity>(mesh).is_none());
        assert_eq!(app.world().resource::<Assets<StandardMaterial>>().len(), 1);
    }
}
