//! Shared tuning values for touch gestures, placement and reticle rendering.

pub mod gesture;
pub mod placement;
pub mod render_settings;
