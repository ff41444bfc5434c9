//! Furniture catalog: the JSON manifest and the hidden template objects
//! spawned from it.

use bevy::asset::LoadState;
use bevy::prelude::*;
use constants::placement::CATALOG_MANIFEST_PATH;
use serde::{Deserialize, Serialize};

use super::core::app_state::AppState;
use super::scene::opacity::Opacity;
use super::scene::{PickBounds, Placeable};
use crate::tools::placement::PlacementSession;
use crate::tools::placement::state::GestureSettings;

/// Catalog manifest as a Bevy asset. Mirrors `catalog.json`.
#[derive(Asset, TypePath, Debug, Clone, Serialize, Deserialize)]
pub struct CatalogManifest {
    /// Overrides for the default gesture tuning.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gestures: Option<GestureSettings>,
    pub items: Vec<CatalogItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    pub category: String,
    /// glTF path relative to the asset root.
    pub model: String,
    /// Pick box extents in metres.
    #[serde(default = "default_bounds")]
    pub bounds: [f32; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

fn default_bounds() -> [f32; 3] {
    [0.5, 0.5, 0.5]
}

impl CatalogManifest {
    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = Vec::new();
        for item in &self.items {
            if !categories.contains(&item.category.as_str()) {
                categories.push(&item.category);
            }
        }
        categories
    }

    pub fn item(&self, id: &str) -> Option<&CatalogItem> {
        self.items.iter().find(|item| item.id == id)
    }
}

/// Loaded catalog entries, in manifest order.
#[derive(Resource, Debug, Default)]
pub struct Catalog {
    pub items: Vec<CatalogItem>,
}

/// Marks a hidden template root with the catalog id it was spawned for.
#[derive(Component, Debug, Clone)]
pub struct CatalogTemplate(pub String);

#[derive(Resource, Default)]
pub struct CatalogLoader {
    handle: Option<Handle<CatalogManifest>>,
}

pub fn start_loading(mut loader: ResMut<CatalogLoader>, asset_server: Res<AssetServer>) {
    info!("Loading catalog from {}", CATALOG_MANIFEST_PATH);
    loader.handle = Some(asset_server.load(CATALOG_MANIFEST_PATH));
}

// Spawns one hidden template per item once the manifest resolves, then
// hands over to the running state.
pub fn load_catalog_system(
    loader: Res<CatalogLoader>,
    manifests: Res<Assets<CatalogManifest>>,
    asset_server: Res<AssetServer>,
    mut catalog: ResMut<Catalog>,
    mut session: ResMut<PlacementSession>,
    mut next_state: ResMut<NextState<AppState>>,
    mut commands: Commands,
) {
    let Some(handle) = loader.handle.as_ref() else {
        return;
    };

    let Some(manifest) = manifests.get(handle) else {
        if let LoadState::Failed(err) = asset_server.load_state(handle.id()) {
            warn!("Catalog failed to load, starting empty: {}", err);
            next_state.set(AppState::Running);
        }
        return;
    };

    if let Some(gestures) = manifest.gestures {
        session.set_settings(gestures);
    }

    for item in &manifest.items {
        let template = spawn_template(&mut commands, &asset_server, item);
        session.register_template(item.id.clone(), template.into());
    }
    info!(
        "✓ Catalog loaded: {} items in {} categories",
        manifest.items.len(),
        manifest.categories().len()
    );
    catalog.items = manifest.items.clone();
    next_state.set(AppState::Running);
}

fn spawn_template(
    commands: &mut Commands,
    asset_server: &AssetServer,
    item: &CatalogItem,
) -> Entity {
    commands
        .spawn((
            Name::new(format!("template:{}", item.id)),
            SceneRoot(asset_server.load(GltfAssetLabel::Scene(0).from_asset(item.model.clone()))),
            Transform::default(),
            Visibility::Hidden,
            Opacity::default(),
            PickBounds(Vec3::from_array(item.bounds)),
            Placeable,
            CatalogTemplate(item.id.clone()),
        ))
        .id()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const MANIFEST: &str = r#"{
        "gestures": { "rotation_speed": 0.02 },
        "items": [
            {
                "id": "table-1", "category": "table",
                "model": "models/table/table-1/scene.gltf", "bounds": [1.2, 0.75, 0.8]
            },
            { "id": "chair-1", "category": "chair", "model": "models/chair/chair-1/scene.gltf" },
            {
                "id": "table-2", "category": "table",
                "model": "models/table/table-2/scene.gltf", "thumbnail": "thumbs/table-2.png"
            }
        ]
    }"#;

    #[test]
    fn manifest_fills_defaults() {
        let manifest: CatalogManifest = serde_json::from_str(MANIFEST).unwrap();

        assert_eq!(manifest.items.len(), 3);
        assert_eq!(manifest.item("chair-1").unwrap().bounds, default_bounds());
        assert_eq!(
            manifest.item("table-2").unwrap().thumbnail.as_deref(),
            Some("thumbs/table-2.png")
        );

        let gestures = manifest.gestures.unwrap();
        assert_relative_eq!(gestures.rotation_speed, 0.02);
        assert_relative_eq!(gestures.movement_speed, GestureSettings::default().movement_speed);
    }

    #[test]
    fn categories_keep_first_seen_order() {
        let manifest: CatalogManifest = serde_json::from_str(MANIFEST).unwrap();
        assert_eq!(manifest.categories(), vec!["table", "chair"]);
    }

    #[test]
    fn manifest_without_gestures_parses() {
        let manifest: CatalogManifest = serde_json::from_str(r#"{ "items": [] }"#).unwrap();
        assert!(manifest.gestures.is_none());
        assert!(manifest.categories().is_empty());
    }
}
