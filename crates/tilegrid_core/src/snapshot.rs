//! Snapshot format for loading and saving a whole grid
//!
//! Shape: `{ "placedTiles": { "x-y": { layer: tile | null } }, "backgroundTileId": id | null }`

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use crate::{Catalog, Cell, Coord, Grid, GridError, PlacedTile, TileKindId};

/// Serializable form of a [`Grid`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridSnapshot {
    #[serde(default)]
    pub placed_tiles: BTreeMap<String, BTreeMap<i32, Option<PlacedTile>>>,
    #[serde(default)]
    pub background_tile_id: Option<TileKindId>,
}

impl GridSnapshot {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Entries rejected while loading a snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub skipped: Vec<GridError>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

impl Grid {
    /// Replace the whole grid with `snapshot`. No propagation runs.
    ///
    /// Bad or non-canonical keys, tiles whose coordinate disagrees with their
    /// key, and ids missing from the catalog are skipped individually and
    /// reported; the rest of the snapshot still loads. Settings are kept; an
    /// open journal is dropped.
    pub fn load(&mut self, catalog: &Catalog, snapshot: &GridSnapshot) -> LoadReport {
        let mut report = LoadReport::default();
        let mut grid = Grid::with_settings(*self.settings());

        for (key, layers) in &snapshot.placed_tiles {
            let coord = match key.parse::<Coord>() {
                Ok(coord) => coord,
                Err(e) => {
                    report.skipped.push(e);
                    continue;
                }
            };

            let mut cell = Cell::default();
            for (&layer, entry) in layers {
                match entry {
                    None => cell.set(layer, None),
                    Some(tile) => match check_tile(catalog, coord, tile) {
                        Ok(()) => cell.set(layer, Some(tile.clone())),
                        Err(e) => report.skipped.push(e),
                    },
                }
            }
            grid.insert_cell(coord, cell);
        }

        if let Some(id) = &snapshot.background_tile_id {
            match catalog.get(id) {
                Some(kind) if kind.is_background() => {
                    grid.set_background_unchecked(Some(id.clone()));
                }
                Some(_) => report.skipped.push(GridError::NotABackground(id.clone())),
                None => report.skipped.push(GridError::UnknownTileKind(id.clone())),
            }
        }

        for error in &report.skipped {
            warn!("Skipped snapshot entry: {}", error);
        }

        *self = grid;
        report
    }

    /// Build a fresh grid from a snapshot
    pub fn from_snapshot(catalog: &Catalog, snapshot: &GridSnapshot) -> (Grid, LoadReport) {
        let mut grid = Grid::new();
        let report = grid.load(catalog, snapshot);
        (grid, report)
    }

    /// Serialize to the snapshot shape. Cells without live tiles are omitted.
    pub fn save(&self) -> GridSnapshot {
        let placed_tiles = self
            .cells()
            .filter(|(_, cell)| cell.has_live())
            .map(|(coord, cell)| {
                let layers = cell
                    .entries()
                    .map(|(layer, tile)| (layer, tile.cloned()))
                    .collect();
                (coord.to_string(), layers)
            })
            .collect();

        GridSnapshot {
            placed_tiles,
            background_tile_id: self.background().map(str::to_string),
        }
    }
}

fn check_tile(catalog: &Catalog, key: Coord, tile: &PlacedTile) -> Result<(), GridError> {
    if tile.coord != key {
        return Err(GridError::CoordinateMismatch {
            key,
            found: tile.coord,
        });
    }
    match catalog.get(&tile.tile_kind_id) {
        None => Err(GridError::UnknownTileKind(tile.tile_kind_id.clone())),
        Some(kind) if kind.is_background() => {
            Err(GridError::BackgroundPlacement(tile.tile_kind_id.clone()))
        }
        Some(_) => Ok(()),
    }
}
