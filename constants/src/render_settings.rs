use bevy::color::Color;

pub const RETICLE_INNER_RADIUS: f32 = 0.15;
pub const RETICLE_OUTER_RADIUS: f32 = 0.2;
pub const RETICLE_COLOR: Color = Color::WHITE;

/// Height of the simulated floor used by native builds without a tracked surface.
pub const GROUND_PLANE_HEIGHT: f32 = 0.0;

pub const CAMERA_NEAR: f32 = 0.01;
pub const CAMERA_FAR: f32 = 20.0;
pub const CAMERA_FOV_DEGREES: f32 = 70.0;
