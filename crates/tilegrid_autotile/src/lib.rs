//! Autotile propagation for tilegrid
//!
//! This crate keeps autotile terrain visually consistent as a grid is edited.
//!
//! # Features
//! - `AutotileIndex` built once from the catalog: `group → mask → variants`
//! - Breadth-first propagation with a bounded iteration count
//! - Injectable variant selection (80/20 weighted by default)
//!
//! # Example
//!
//! ```rust,ignore
//! use tilegrid_autotile::{propagate, AutotileIndex, PropagationSettings, WeightedVariantSelector};
//! use tilegrid_core::{Catalog, Coord, Grid, TileOrigin};
//!
//! let catalog = Catalog::from_json(catalog_json)?;
//! let index = AutotileIndex::build(&catalog);
//! let mut selector = WeightedVariantSelector::default();
//!
//! let mut grid = Grid::new();
//! let touched = grid.place_tile(&catalog, Coord::new(0, 0), "wall", TileOrigin::Placed)?;
//! let report = propagate(
//!     &mut grid,
//!     &catalog,
//!     &index,
//!     &touched,
//!     &mut selector,
//!     &PropagationSettings::default(),
//! );
//! ```

pub mod index;
pub mod propagate;
pub mod variant;

pub use index::{AutotileIndex, MASK_COUNT};
pub use propagate::{
    live_mask, propagate, PropagationOutcome, PropagationReport, PropagationSettings,
    DEFAULT_MAX_ITERATIONS,
};
pub use variant::{
    select_variant, CanonicalVariantSelector, FnSelector, VariantSelector, VariantSettings,
    WeightedVariantSelector, DEFAULT_CANONICAL_WEIGHT,
};

// Re-export tilegrid_core
pub use tilegrid_core;
