//! Surface tracking sources and the reticle that marks the current hit.

use std::f32::consts::FRAC_PI_2;

use bevy::prelude::*;
use constants::render_settings::{
    GROUND_PLANE_HEIGHT, RETICLE_COLOR, RETICLE_INNER_RADIUS, RETICLE_OUTER_RADIUS,
};
use serde::Deserialize;

use crate::tools::placement::PlacementSession;
use crate::tools::placement::scene::SurfaceTracker;
use crate::tools::placement::state::ReticlePose;

/// Latest surface hit, written by the host each XR frame or, on native
/// builds without a host, by the ground-plane tracker.
#[derive(Resource, Debug, Default)]
pub struct HostSurface {
    pose: ReticlePose,
    host_driven: bool,
}

impl HostSurface {
    pub fn set_pose(&mut self, pose: ReticlePose) {
        self.pose = pose;
    }

    /// True once any `xr_frame` has arrived; the native tracker stands down.
    pub fn is_host_driven(&self) -> bool {
        self.host_driven
    }
}

impl SurfaceTracker for HostSurface {
    fn current_pose(&self) -> ReticlePose {
        self.pose
    }
}

/// Position plus `[x, y, z, w]` orientation, as sent by WebXR.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PoseParams {
    pub position: [f32; 3],
    #[serde(default = "identity_orientation")]
    pub orientation: [f32; 4],
}

fn identity_orientation() -> [f32; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

impl PoseParams {
    pub fn rotation(&self) -> Quat {
        let q = Quat::from_array(self.orientation);
        if q.length_squared() > f32::EPSILON {
            q.normalize()
        } else {
            Quat::IDENTITY
        }
    }

    pub fn to_transform(&self) -> Transform {
        Transform::from_translation(Vec3::from_array(self.position)).with_rotation(self.rotation())
    }
}

/// One XR frame from the host: where the viewer is and what the hit test found.
#[derive(Event, Debug, Clone, Copy, Deserialize)]
pub struct XrFrameEvent {
    #[serde(default)]
    pub viewer: Option<PoseParams>,
    #[serde(default)]
    pub hit: Option<PoseParams>,
}

pub fn apply_xr_frames(
    mut frames: EventReader<XrFrameEvent>,
    mut surface: ResMut<HostSurface>,
    mut cameras: Query<&mut Transform, With<Camera3d>>,
) {
    let Some(frame) = frames.read().last() else {
        return;
    };
    if !surface.host_driven {
        info!("Host surface tracking active");
        surface.host_driven = true;
    }

    if let Some(viewer) = frame.viewer {
        if let Ok(mut camera) = cameras.single_mut() {
            *camera = viewer.to_transform();
        }
    }

    surface.pose = match frame.hit {
        Some(hit) => ReticlePose::at(Vec3::from_array(hit.position), hit.rotation()),
        None => ReticlePose::invalid(),
    };
}

/// Desktop stand-in for hit testing: the screen-centre ray against the floor.
pub fn track_ground_plane(
    mut surface: ResMut<HostSurface>,
    cameras: Query<(&Camera, &GlobalTransform), With<Camera3d>>,
) {
    if surface.host_driven {
        return;
    }
    let Ok((camera, camera_xf)) = cameras.single() else {
        return;
    };
    let Some(size) = camera.logical_viewport_size() else {
        return;
    };
    let Ok(ray) = camera.viewport_to_world(camera_xf, size * 0.5) else {
        return;
    };

    surface.pose = match ground_plane_hit(&ray, GROUND_PLANE_HEIGHT) {
        Some(point) => ReticlePose::at(point, Quat::IDENTITY),
        None => ReticlePose::invalid(),
    };
}

pub fn ground_plane_hit(ray: &Ray3d, plane_y: f32) -> Option<Vec3> {
    if ray.direction.y.abs() < 0.001 {
        return None;
    }
    let t = (plane_y - ray.origin.y) / ray.direction.y;
    if t > 0.0 {
        Some(ray.origin + ray.direction * t)
    } else {
        None
    }
}

#[derive(Component)]
pub struct Reticle;

pub fn spawn_reticle(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.spawn((
        Mesh3d(meshes.add(Annulus::new(RETICLE_INNER_RADIUS, RETICLE_OUTER_RADIUS))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: RETICLE_COLOR,
            unlit: true,
            cull_mode: None,
            ..default()
        })),
        Transform::from_rotation(Quat::from_rotation_x(-FRAC_PI_2)),
        Visibility::Hidden,
        Reticle,
        Name::new("Reticle"),
    ));
}

pub fn update_reticle(
    session: Res<PlacementSession>,
    surface: Res<HostSurface>,
    mut reticles: Query<(&mut Transform, &mut Visibility), With<Reticle>>,
) {
    let pose = surface.current_pose();
    for (mut transform, mut visibility) in &mut reticles {
        if session.reticle_visible() {
            transform.translation = pose.position;
            // The annulus is built in the XY plane; lay it onto the surface.
            transform.rotation = pose.orientation * Quat::from_rotation_x(-FRAC_PI_2);
            visibility.set_if_neq(Visibility::Inherited);
        } else {
            visibility.set_if_neq(Visibility::Hidden);
        }
    }
}
