//! Core application setup and state management.
//!
//! Builds the app for native and WASM targets and tracks the loading state.

/// Application setup and plugin configuration for the Bevy engine.
pub mod app_setup;

/// Loading → Running state machine.
pub mod app_state;

/// Platform-specific window configuration for native and WASM builds.
///
/// Configures canvas integration for web targets and vsync settings.
pub mod window_config;
