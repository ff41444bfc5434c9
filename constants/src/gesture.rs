/// Radians of yaw applied per pixel of horizontal one-finger travel.
pub const ROTATION_SPEED: f32 = 0.01;

/// World units of ground-plane travel per pixel of two-finger centroid travel.
pub const MOVEMENT_SPEED: f32 = 0.005;

/// Two-finger starts closer than this (screen pixels) drag, wider ones pinch-scale.
pub const DRAG_SCALE_THRESHOLD_PX: f32 = 100.0;

/// Uniform scale bounds. Pinch updates that would leave this range are rejected.
pub const MIN_SCALE: f32 = 0.3;
pub const MAX_SCALE: f32 = 2.5;

/// Pinch distances at or below this are treated as degenerate.
pub const MIN_PINCH_DISTANCE_PX: f32 = 1.0;
