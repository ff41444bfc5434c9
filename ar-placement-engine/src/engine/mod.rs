//! Bevy side of the AR placement engine: app setup, catalog loading,
//! surface tracking and the ECS scene adapter.

pub mod catalog;
pub mod core;
pub mod scene;
pub mod surface;

use bevy::prelude::*;

use catalog::{Catalog, CatalogLoader, load_catalog_system, start_loading};
use self::core::app_state::{AppState, log_running};
use scene::opacity::apply_opacity;
use surface::{HostSurface, XrFrameEvent, apply_xr_frames, spawn_reticle, update_reticle};

/// Per-frame ordering: surface pose in, placement logic, then visuals out.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum EngineSet {
    Tracking,
    Placement,
    Presentation,
}

pub struct EnginePlugin;

impl Plugin for EnginePlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<AppState>()
            .init_resource::<Catalog>()
            .init_resource::<CatalogLoader>()
            .init_resource::<HostSurface>()
            .add_event::<XrFrameEvent>()
            .configure_sets(
                Update,
                (
                    EngineSet::Tracking,
                    EngineSet::Placement,
                    EngineSet::Presentation,
                )
                    .chain()
                    .run_if(in_state(AppState::Running)),
            )
            .add_systems(Startup, (start_loading, spawn_reticle))
            .add_systems(
                Update,
                (
                    load_catalog_system.run_if(in_state(AppState::Loading)),
                    log_running,
                ),
            )
            .add_systems(Update, apply_xr_frames.in_set(EngineSet::Tracking))
            .add_systems(
                Update,
                (update_reticle, apply_opacity).in_set(EngineSet::Presentation),
            );

        #[cfg(not(target_arch = "wasm32"))]
        app.add_systems(
            Update,
            surface::track_ground_plane
                .after(apply_xr_frames)
                .in_set(EngineSet::Tracking),
        );
    }
}
