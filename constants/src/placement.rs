/// Opacity of a preview (ghost) object following the reticle.
pub const GHOST_OPACITY: f32 = 0.5;

/// Opacity of a placed object while it is selected.
pub const SELECTED_OPACITY: f32 = 0.8;

/// Opacity of a committed, unselected object.
pub const PLACED_OPACITY: f32 = 1.0;

/// Offset of the delete affordance from the selecting touch, in screen pixels.
pub const DELETE_AFFORDANCE_OFFSET: [f32; 2] = [-40.0, -60.0];

/// Catalog manifest path, relative to the asset root.
pub const CATALOG_MANIFEST_PATH: &str = "catalog.json";
