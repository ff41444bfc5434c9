use bevy::asset::AssetMetaCheck;
use bevy::prelude::*;
use bevy::render::camera::PerspectiveProjection;
use bevy_common_assets::json::JsonAssetPlugin;
use constants::render_settings::{CAMERA_FAR, CAMERA_FOV_DEGREES, CAMERA_NEAR};

use crate::engine::EnginePlugin;
use crate::engine::catalog::CatalogManifest;
use crate::engine::core::window_config::create_window_config;
use crate::rpc::web_rpc::WebRpcPlugin;
use crate::tools::placement::ArPlacementPlugin;

pub fn create_app() -> App {
    let mut app = App::new();

    app.add_plugins(create_default_plugins())
        // Registers CatalogManifest as a loadable asset type from JSON files.
        .add_plugins(JsonAssetPlugin::<CatalogManifest>::new(&["json"]))
        .add_plugins(EnginePlugin)
        .add_plugins(ArPlacementPlugin)
        .add_plugins(WebRpcPlugin);

    // The camera feed is composited by the browser behind a transparent canvas.
    #[cfg(target_arch = "wasm32")]
    app.insert_resource(ClearColor(Color::NONE));

    app.add_systems(Startup, setup);
    app
}

fn spawn_lighting(commands: &mut Commands) {
    commands.spawn((
        DirectionalLight {
            shadows_enabled: false,
            ..default()
        },
        Transform::from_rotation(Quat::from_euler(
            EulerRot::ZYX,
            0.0,
            1.0,
            -std::f32::consts::FRAC_PI_4,
        )),
    ));
}

fn spawn_camera(commands: &mut Commands) {
    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: CAMERA_FOV_DEGREES.to_radians(),
            near: CAMERA_NEAR,
            far: CAMERA_FAR,
            ..default()
        }),
        // Eye height, looking at the floor a couple of metres ahead. The
        // host overwrites this with the viewer pose on every XR frame.
        Transform::from_xyz(0.0, 1.5, 0.0).looking_at(Vec3::new(0.0, 0.0, -2.0), Vec3::Y),
    ));
}

fn setup(mut commands: Commands) {
    spawn_lighting(&mut commands);
    spawn_camera(&mut commands);
}

fn create_default_plugins() -> impl PluginGroup {
    let window_config = WindowPlugin {
        primary_window: Some(create_window_config()),
        ..default()
    };

    let asset_config = AssetPlugin {
        meta_check: AssetMetaCheck::Never,
        ..default()
    };

    DefaultPlugins.set(window_config).set(asset_config)
}
