//! JSON-RPC 2.0 bridge to the host page.
//!
//! The engine runs in an iframe; the page owns the WebXR session, the camera
//! feed and (on the web) the UI. Messages travel over `postMessage`.
//!
//! ```text
//! Host page (parent window)  <──postMessage──>  Bevy (iframe)
//!        │                                           │
//!        ├─ xr_frame (notification, every frame) ──> │ HostSurface, camera pose
//!        ├─ select_item / place / cancel / delete ─> │ PlacementCommand
//!        ├─ get_placed_items / get_catalog (id) ───> │
//!        │ <──────────────────────── Response (id) ──┤
//!        │ <──────────── status_changed, item_placed ┤ PlacementSignal
//! ```
//!
//! Requests without an `id` are executed as notifications and get no reply.
//!
//! ## Methods
//!
//! - `select_item {template}`: start a ghost preview of a catalog item
//! - `place`, `cancel`: commit or discard the preview
//! - `delete`: remove the selected placed item
//! - `xr_frame {viewer?, hit?}`: viewer pose and hit-test result for this frame
//! - `get_placed_items`: id, template, position, yaw and scale per placed item
//! - `get_catalog`: categories and items from `catalog.json`
//!
//! ## Notifications
//!
//! `status_changed`, `placement_controls`, `delete_affordance`,
//! `selection_changed`, `item_placed`, `item_deleted`.
//!
//! ## Error Handling
//!
//! - `-32601`: Method not found
//! - `-32602`: Invalid params

/// JSON-RPC 2.0 bidirectional communication system for the host page.
///
/// Handles request-response patterns, notifications, and WASM message listeners.
pub mod web_rpc;
