use thiserror::Error;

use crate::Coord;

/// Errors raised by grid mutations and snapshot loading.
///
/// Every variant leaves the grid unchanged for the rejected write.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("Unknown tile kind '{0}'")]
    UnknownTileKind(String),
    #[error("Tile kind '{0}' is a background and can only be set with set_background")]
    BackgroundPlacement(String),
    #[error("Tile kind '{0}' is not a background")]
    NotABackground(String),
    #[error("Rectangle ({x0}, {y0})..=({x1}, {y1}) covers {area} cells, limit is {limit}")]
    RectangleTooLarge {
        x0: i32,
        y0: i32,
        x1: i32,
        y1: i32,
        area: u64,
        limit: u64,
    },
    #[error("Invalid coordinate key '{0}'")]
    InvalidCoordinateKey(String),
    #[error("Tile stored under {key} claims coordinate {found}")]
    CoordinateMismatch { key: Coord, found: Coord },
}

/// Errors raised while parsing or validating a tile catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Duplicate tile kind '{0}'")]
    DuplicateTileKind(String),
    #[error("Tile kind '{tile}' has invalid autotile neighbors '{neighbors}': {reason}")]
    InvalidNeighbors {
        tile: String,
        neighbors: String,
        reason: String,
    },
    #[error("Background tile kind '{0}' cannot belong to an autotile group")]
    BackgroundAutotile(String),
    #[error("Group '{group}' lists unknown tile kind '{tile}'")]
    UnknownGroupMember { group: String, tile: String },
    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
}
