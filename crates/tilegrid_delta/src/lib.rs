//! Deltas between tilegrid maps
//!
//! - `diff` / `apply` - Minimal structural change between two grids and its replay
//! - `diff_journal` - The same change computed from a grid's edit journal
//! - `DeltaWire` - The layer-less form exchanged with collaborators
//! - `EditHistory` - Bounded undo/redo built on inverted deltas
//!
//! Applying a delta never runs autotile propagation; callers seed
//! propagation with the returned touched coordinates when they need it.

mod diff;
mod error;
mod history;
mod wire;

pub use diff::{apply, diff, diff_journal, ApplyReport, BackgroundChange, Delta, DeltaTile};
pub use error::DeltaError;
pub use history::{EditHistory, HistoryEntry, HistorySettings, DEFAULT_MAX_HISTORY};
pub use wire::{apply_wire, DeltaWire, WireTile};

pub use tilegrid_core;
