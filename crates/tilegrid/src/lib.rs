//! tilegrid - sparse multi-layer tile map editing
//!
//! Re-exports the editing stack and adds [`EditSession`], which ties a grid,
//! its catalog, autotile propagation and undo history together.
//!
//! # Example
//!
//! ```rust,ignore
//! use tilegrid::prelude::*;
//!
//! let mut session = EditSession::from_catalog_json(catalog_json, EditorSettings::default())?;
//! let outcome = session.place(Coord::new(0, 0), "wall")?;
//! broadcast(outcome.delta.to_wire().to_json()?);
//! ```

mod error;
mod session;
mod settings;

pub use error::{SessionError, SettingsError};
pub use session::{EditOutcome, EditSession, HistoryOutcome, SyncOutcome};
pub use settings::EditorSettings;

pub use tilegrid_autotile;
pub use tilegrid_core;
pub use tilegrid_delta;

pub mod prelude {
    pub use crate::{
        EditOutcome, EditSession, EditorSettings, HistoryOutcome, SessionError, SyncOutcome,
    };
    pub use tilegrid_autotile::{
        AutotileIndex, CanonicalVariantSelector, PropagationOutcome, PropagationReport,
        VariantSelector, WeightedVariantSelector,
    };
    pub use tilegrid_core::{
        Catalog, Coord, Direction, Grid, GridError, GridSnapshot, PlacedTile, TileKind,
        TileOrigin, TouchedCoords,
    };
    pub use tilegrid_delta::{ApplyReport, Delta, DeltaTile, DeltaWire};
}
