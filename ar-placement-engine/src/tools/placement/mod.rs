//! Touch-driven furniture placement for an AR view.
//!
//! The core ([`session::ArSession`] and everything it owns) is plain Rust
//! over two capability traits, [`scene::SceneAdapter`] and
//! [`scene::SurfaceTracker`], so it runs the same against the ECS and the
//! headless `memory::MemoryScene` (built for tests and the `test-util`
//! feature).
//!
//! ## Frame flow
//!
//! ```text
//! TouchInput / PlacementCommand
//!   └─> ArSession entry points (SceneAccess as the adapter)
//!       └─> SessionSignal outbox
//!           └─> PlacementSignal events
//!               ├─> RPC notifications (web host)
//!               └─> native status panel
//! ```
//!
//! ## Gestures
//!
//! - One finger on a placed object rotates it about Y.
//! - Two fingers closer than the threshold drag it on the floor plane.
//! - Two fingers further apart pinch-scale it.

/// Touch gesture classification and per-mode transform updates.
pub mod gesture;

/// Headless scene adapter for tests.
#[cfg(any(test, feature = "test-util"))]
pub mod memory;

/// Capability traits the core drives.
pub mod scene;

/// Screen-point picking restricted to placed items.
pub mod selection;

/// The session state owner.
pub mod session;

/// Shared value types, settings and outgoing signals.
pub mod state;

/// ECS systems feeding the session.
pub mod systems;

/// Native bottom panel with catalog, placement controls and status (native only).
#[cfg(not(target_arch = "wasm32"))]
pub mod ui;

/// Ghost preview and commit workflow.
pub mod workflow;

use bevy::prelude::*;

use crate::engine::EngineSet;
use session::ArSession;
use state::SessionSignal;
use systems::{
    ActiveTouches, handle_placement_commands, handle_touch_input, publish_session_signals,
    sync_viewport, update_placement_frame,
};

/// The app's single session.
#[derive(Resource, Debug, Default, Deref, DerefMut)]
pub struct PlacementSession(pub ArSession);

/// UI or host request routed into the session.
#[derive(Event, Debug, Clone, PartialEq)]
pub enum PlacementCommand {
    ThumbnailActivated(String),
    Place,
    Cancel,
    Delete,
}

/// A drained [`SessionSignal`], broadcast to every presentation layer.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct PlacementSignal(pub SessionSignal);

pub struct ArPlacementPlugin;

impl Plugin for ArPlacementPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PlacementSession>()
            .init_resource::<ActiveTouches>()
            .add_event::<PlacementCommand>()
            .add_event::<PlacementSignal>()
            .add_systems(
                Update,
                (
                    sync_viewport,
                    handle_touch_input,
                    handle_placement_commands,
                    update_placement_frame,
                    publish_session_signals,
                )
                    .chain()
                    .in_set(EngineSet::Placement),
            );

        #[cfg(not(target_arch = "wasm32"))]
        {
            use self::systems::mouse_as_touch;
            use self::ui::{
                control_button_interaction, reflect_placement_signals, spawn_catalog_buttons,
                spawn_placement_ui, thumbnail_button_interaction,
            };

            app.add_systems(Startup, spawn_placement_ui)
                .add_systems(
                    OnEnter(crate::engine::core::app_state::AppState::Running),
                    spawn_catalog_buttons,
                )
                .add_systems(
                    Update,
                    (
                        // Native Only UI
                        mouse_as_touch.before(handle_touch_input),
                        (thumbnail_button_interaction, control_button_interaction)
                            .before(handle_placement_commands),
                    )
                        .in_set(EngineSet::Placement),
                )
                .add_systems(
                    Update,
                    reflect_placement_signals.in_set(EngineSet::Presentation),
                );
        }
    }
}
