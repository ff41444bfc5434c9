//! Interaction tools layered on the engine.

/// Touch-driven AR furniture placement.
pub mod placement;
