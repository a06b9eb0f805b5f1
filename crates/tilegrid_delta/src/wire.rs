//! Wire form of a delta as exchanged with collaborators
//!
//! Shape: `{ "added": [{ "x", "y", "tileKindId" }], "removed": [...] }`.
//! Layers are not transmitted; the receiver resolves them.

use serde::{Deserialize, Serialize};

use tilegrid_core::{Catalog, Coord, Grid, TileKindId};

use crate::{apply, ApplyReport, BackgroundChange, Delta, DeltaError, DeltaTile};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTile {
    pub x: i32,
    pub y: i32,
    pub tile_kind_id: TileKindId,
}

impl From<&DeltaTile> for WireTile {
    fn from(tile: &DeltaTile) -> Self {
        Self {
            x: tile.coord.x,
            y: tile.coord.y,
            tile_kind_id: tile.tile_kind_id.clone(),
        }
    }
}

impl WireTile {
    pub fn coord(&self) -> Coord {
        Coord::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeltaWire {
    #[serde(default)]
    pub added: Vec<WireTile>,
    #[serde(default)]
    pub removed: Vec<WireTile>,
    /// Present only when the background changed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<BackgroundChange>,
}

impl DeltaWire {
    pub fn from_json(json: &str) -> Result<Self, DeltaError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, DeltaError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Resolve layers against the receiving grid.
    ///
    /// Additions go to the kind's catalog layer. A removal targets the
    /// layer currently holding that kind at the coordinate, or the catalog
    /// layer when none does (the removal is then stale on apply).
    pub fn resolve(&self, grid: &Grid, catalog: &Catalog) -> Result<Delta, DeltaError> {
        let layer_of = |id: &str| {
            catalog
                .z_index(id)
                .ok_or_else(|| DeltaError::UnknownTileKind(id.to_string()))
        };

        let removed = self
            .removed
            .iter()
            .map(|tile| {
                let coord = tile.coord();
                let held = grid
                    .tiles_at(coord)
                    .find(|(_, placed)| placed.tile_kind_id == tile.tile_kind_id)
                    .map(|(layer, _)| layer);
                let layer = match held {
                    Some(layer) => layer,
                    None => layer_of(&tile.tile_kind_id)?,
                };
                Ok(DeltaTile {
                    coord,
                    layer,
                    tile_kind_id: tile.tile_kind_id.clone(),
                })
            })
            .collect::<Result<Vec<_>, DeltaError>>()?;

        let added = self
            .added
            .iter()
            .map(|tile| {
                Ok(DeltaTile {
                    coord: tile.coord(),
                    layer: layer_of(&tile.tile_kind_id)?,
                    tile_kind_id: tile.tile_kind_id.clone(),
                })
            })
            .collect::<Result<Vec<_>, DeltaError>>()?;

        Ok(Delta {
            added,
            removed,
            background: self.background.clone(),
        })
    }
}

impl Delta {
    /// Drop layers for transmission
    pub fn to_wire(&self) -> DeltaWire {
        DeltaWire {
            added: self.added.iter().map(WireTile::from).collect(),
            removed: self.removed.iter().map(WireTile::from).collect(),
            background: self.background.clone(),
        }
    }
}

/// Resolve and apply a received wire delta
pub fn apply_wire(
    grid: &mut Grid,
    catalog: &Catalog,
    wire: &DeltaWire,
) -> Result<ApplyReport, DeltaError> {
    let delta = wire.resolve(grid, catalog)?;
    Ok(apply(grid, catalog, &delta))
}
