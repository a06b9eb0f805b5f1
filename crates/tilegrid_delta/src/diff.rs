//! Structural diff between two grids and its inverse, apply

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

use tilegrid_core::{
    Catalog, Cell, Coord, Grid, GridError, GridJournal, PlacedTile, TileKindId, TileOrigin,
    TouchedCoords,
};

/// One tile position in a delta
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeltaTile {
    pub coord: Coord,
    pub layer: i32,
    pub tile_kind_id: TileKindId,
}

impl DeltaTile {
    fn from_placed(coord: Coord, layer: i32, tile: &PlacedTile) -> Self {
        Self {
            coord,
            layer,
            tile_kind_id: tile.tile_kind_id.clone(),
        }
    }
}

/// A change of the whole-map background
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundChange {
    pub from: Option<TileKindId>,
    pub to: Option<TileKindId>,
}

/// The minimal edit turning one grid into another.
///
/// Both lists are ordered by coordinate, then layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delta {
    pub added: Vec<DeltaTile>,
    pub removed: Vec<DeltaTile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<BackgroundChange>,
}

impl Delta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.background.is_none()
    }

    /// Number of tile entries (added plus removed)
    pub fn len(&self) -> usize {
        self.added.len() + self.removed.len()
    }

    /// The delta that undoes this one
    pub fn invert(&self) -> Delta {
        Delta {
            added: self.removed.clone(),
            removed: self.added.clone(),
            background: self.background.as_ref().map(|change| BackgroundChange {
                from: change.to.clone(),
                to: change.from.clone(),
            }),
        }
    }

    /// Every coordinate the delta mentions
    pub fn touched(&self) -> TouchedCoords {
        self.added
            .iter()
            .chain(&self.removed)
            .map(|t| t.coord)
            .collect()
    }
}

/// Result of applying a delta
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Coordinates actually changed
    pub touched: TouchedCoords,
    /// Removals skipped because the occupant no longer matched
    pub stale_removals: usize,
    /// Additions rejected by the grid
    pub skipped: Vec<GridError>,
}

/// Compute the delta turning `before` into `after`.
///
/// Tiles are compared by kind id only; origin tags are ignored.
pub fn diff(before: &Grid, after: &Grid) -> Delta {
    let mut delta = Delta::default();

    let coords: BTreeSet<Coord> = before
        .cells()
        .chain(after.cells())
        .map(|(coord, _)| coord)
        .collect();
    for coord in coords {
        diff_cell(&mut delta, coord, before.cell(coord), after.cell(coord));
    }

    delta.background = background_change(before.background(), after.background());
    delta
}

/// The delta from the state a journal captured to `after`.
///
/// Visits only the journaled coordinates, so the cost follows the size of
/// the edit rather than the size of the grid. Equal to `diff` against a
/// copy taken when the journal began.
pub fn diff_journal(journal: &GridJournal, after: &Grid) -> Delta {
    let mut delta = Delta::default();

    for (coord, before_cell) in journal.cells() {
        diff_cell(&mut delta, coord, before_cell, after.cell(coord));
    }

    if let Some(before_background) = journal.background() {
        delta.background = background_change(before_background, after.background());
    }
    delta
}

/// Append the changes at one coordinate, ascending by layer
fn diff_cell(delta: &mut Delta, coord: Coord, before: Option<&Cell>, after: Option<&Cell>) {
    let layers: BTreeSet<i32> = before
        .into_iter()
        .chain(after)
        .flat_map(|cell| cell.live().map(|(layer, _)| layer))
        .collect();

    for layer in layers {
        let old = before.and_then(|cell| cell.get(layer));
        let new = after.and_then(|cell| cell.get(layer));
        match (old, new) {
            (Some(old), Some(new)) if old.tile_kind_id == new.tile_kind_id => {}
            (old, new) => {
                if let Some(old) = old {
                    delta.removed.push(DeltaTile::from_placed(coord, layer, old));
                }
                if let Some(new) = new {
                    delta.added.push(DeltaTile::from_placed(coord, layer, new));
                }
            }
        }
    }
}

fn background_change(before: Option<&str>, after: Option<&str>) -> Option<BackgroundChange> {
    (before != after).then(|| BackgroundChange {
        from: before.map(str::to_string),
        to: after.map(str::to_string),
    })
}

/// Apply `delta` to `grid`. Does not propagate autotiles.
///
/// Removals run first and only clear a layer whose occupant still has the
/// recorded id. Additions are placed at their recorded layer, tagged
/// [`TileOrigin::Synced`].
pub fn apply(grid: &mut Grid, catalog: &Catalog, delta: &Delta) -> ApplyReport {
    let mut report = ApplyReport::default();

    for removed in &delta.removed {
        if grid.clear_layer_if(removed.coord, removed.layer, &removed.tile_kind_id) {
            report.touched.insert(removed.coord);
        } else {
            report.stale_removals += 1;
        }
    }

    for added in &delta.added {
        match grid.place(
            catalog,
            added.coord,
            added.layer,
            &added.tile_kind_id,
            TileOrigin::Synced,
        ) {
            Ok(touched) => report.touched.extend(touched),
            Err(e) => report.skipped.push(e),
        }
    }

    if let Some(change) = &delta.background {
        if grid.background() == change.from.as_deref() {
            if let Err(e) = grid.set_background(catalog, change.to.as_deref()) {
                report.skipped.push(e);
            }
        } else {
            report.stale_removals += 1;
        }
    }

    if report.stale_removals > 0 || !report.skipped.is_empty() {
        debug!(
            "Delta applied with {} stale removals and {} skipped additions",
            report.stale_removals,
            report.skipped.len()
        );
    }

    report
}
