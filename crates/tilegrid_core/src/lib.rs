//! Core data structures for tilegrid
//!
//! This crate provides the authoritative state of a tile map editor:
//! - `Catalog` - The read-only description of every tile kind
//! - `Coord` / `Direction` - Unbounded grid positions and cardinal steps
//! - `Grid` - Sparse multi-layer cells plus a whole-map background
//! - `GridSnapshot` - The load/save boundary format
//!
//! Nothing here performs I/O; callers pass strings and receive plain values.

mod catalog;
mod coord;
mod error;
mod grid;
mod settings;
mod snapshot;

pub use catalog::{
    AutotileSpec, Catalog, NeighborMask, NeighborParseError, SpriteRect, TileGroup, TileKind,
    TileKindId, TileType,
};
pub use coord::{Coord, Direction};
pub use error::{CatalogError, GridError};
pub use grid::{Cell, Grid, GridJournal, PlacedTile, Rect, TileOrigin, TouchedCoords};
pub use settings::{GridSettings, DEFAULT_MAX_RECTANGLE_AREA};
pub use snapshot::{GridSnapshot, LoadReport};
