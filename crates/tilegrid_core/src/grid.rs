//! The sparse, multi-layer tile grid and its mutation primitives

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::{Catalog, Coord, GridError, GridSettings, TileKindId};

/// Coordinates written or cleared by a mutation, in ascending order.
///
/// Callers hand this set to the propagation engine.
pub type TouchedCoords = BTreeSet<Coord>;

/// What produced a placed tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileOrigin {
    /// Single placement by the user
    #[default]
    Placed,
    /// Rectangle fill
    Filled,
    /// Rewritten by autotile propagation
    Autotile,
    /// Applied from a delta (sync, undo, redo)
    Synced,
}

/// A tile occupying one layer of one cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedTile {
    #[serde(rename = "coordinate")]
    pub coord: Coord,
    pub tile_kind_id: TileKindId,
    #[serde(default)]
    pub origin: TileOrigin,
}

impl PlacedTile {
    pub fn new(coord: Coord, tile_kind_id: impl Into<TileKindId>, origin: TileOrigin) -> Self {
        Self {
            coord,
            tile_kind_id: tile_kind_id.into(),
            origin,
        }
    }
}

/// All layers at one coordinate.
///
/// A layer mapped to `None` was explicitly cleared; a missing layer was
/// never set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cell {
    layers: BTreeMap<i32, Option<PlacedTile>>,
}

impl Cell {
    /// The live tile on `layer`, if any
    pub fn get(&self, layer: i32) -> Option<&PlacedTile> {
        self.layers.get(&layer).and_then(Option::as_ref)
    }

    /// Raw entries including cleared layers, ascending by layer
    pub fn entries(&self) -> impl Iterator<Item = (i32, Option<&PlacedTile>)> {
        self.layers.iter().map(|(&layer, tile)| (layer, tile.as_ref()))
    }

    /// Live tiles ascending by layer
    pub fn live(&self) -> impl Iterator<Item = (i32, &PlacedTile)> {
        self.layers
            .iter()
            .filter_map(|(&layer, tile)| tile.as_ref().map(|t| (layer, t)))
    }

    pub fn has_live(&self) -> bool {
        self.layers.values().any(Option::is_some)
    }

    pub(crate) fn set(&mut self, layer: i32, tile: Option<PlacedTile>) {
        self.layers.insert(layer, tile);
    }
}

/// Inclusive rectangle with normalized corners
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub min: Coord,
    pub max: Coord,
}

impl Rect {
    /// Normalize two arbitrary corners into min/max form
    pub fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self {
            min: Coord::new(x0.min(x1), y0.min(y1)),
            max: Coord::new(x0.max(x1), y0.max(y1)),
        }
    }

    /// Number of cells covered. Computed in 64 bits so extreme corners
    /// cannot overflow.
    pub fn area(&self) -> u64 {
        let w = (self.max.x as i64 - self.min.x as i64 + 1) as u64;
        let h = (self.max.y as i64 - self.min.y as i64 + 1) as u64;
        w.saturating_mul(h)
    }

    /// Row-major iteration over every covered coordinate
    pub fn coords(&self) -> impl Iterator<Item = Coord> {
        let Rect { min, max } = *self;
        (min.y..=max.y).flat_map(move |y| (min.x..=max.x).map(move |x| Coord::new(x, y)))
    }
}

/// Prior state of everything a grid changed while journaling.
///
/// Each cell (and the background) is captured once, before its first change;
/// later changes to the same cell keep the original entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridJournal {
    cells: BTreeMap<Coord, Option<Cell>>,
    background: Option<Option<TileKindId>>,
}

impl GridJournal {
    /// Changed coordinates ascending, with the cell they held before
    pub fn cells(&self) -> impl Iterator<Item = (Coord, Option<&Cell>)> {
        self.cells.iter().map(|(&coord, cell)| (coord, cell.as_ref()))
    }

    /// The background before its first change, if it changed
    pub fn background(&self) -> Option<Option<&str>> {
        self.background.as_ref().map(Option::as_deref)
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty() && self.background.is_none()
    }

    /// Number of journaled coordinates
    pub fn len(&self) -> usize {
        self.cells.len()
    }
}

/// The authoritative map state: sparse cells plus an optional background
#[derive(Debug, Clone, Default)]
pub struct Grid {
    cells: BTreeMap<Coord, Cell>,
    background: Option<TileKindId>,
    settings: GridSettings,
    journal: Option<GridJournal>,
}

/// Equality covers map content only, not settings or an open journal
impl PartialEq for Grid {
    fn eq(&self, other: &Self) -> bool {
        self.cells == other.cells && self.background == other.background
    }
}

impl Eq for Grid {}

impl Grid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: GridSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> &GridSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: GridSettings) {
        self.settings = settings;
    }

    // ─── Journal ─────────────────────────────────────────────────────────────

    /// Start recording the prior state of every cell changed from now on.
    /// Discards a journal that was already open.
    pub fn begin_journal(&mut self) {
        self.journal = Some(GridJournal::default());
    }

    /// Stop recording and return what changed since [`Grid::begin_journal`]
    pub fn take_journal(&mut self) -> Option<GridJournal> {
        self.journal.take()
    }

    pub fn is_journaling(&self) -> bool {
        self.journal.is_some()
    }

    fn note_cell(&mut self, coord: Coord) {
        if let Some(journal) = self.journal.as_mut() {
            journal
                .cells
                .entry(coord)
                .or_insert_with(|| self.cells.get(&coord).cloned());
        }
    }

    fn note_background(&mut self) {
        if let Some(journal) = self.journal.as_mut() {
            journal
                .background
                .get_or_insert_with(|| self.background.clone());
        }
    }

    // ─── Mutations ───────────────────────────────────────────────────────────

    /// Write `kind_id` at (`coord`, `layer`), replacing only that layer.
    pub fn place(
        &mut self,
        catalog: &Catalog,
        coord: Coord,
        layer: i32,
        kind_id: &str,
        origin: TileOrigin,
    ) -> Result<TouchedCoords, GridError> {
        Self::check_placeable(catalog, kind_id)?;
        self.write(coord, layer, kind_id, origin);
        Ok(TouchedCoords::from([coord]))
    }

    /// Place `kind_id` on its own catalog layer
    pub fn place_tile(
        &mut self,
        catalog: &Catalog,
        coord: Coord,
        kind_id: &str,
        origin: TileOrigin,
    ) -> Result<TouchedCoords, GridError> {
        let layer = Self::check_placeable(catalog, kind_id)?;
        self.write(coord, layer, kind_id, origin);
        Ok(TouchedCoords::from([coord]))
    }

    /// Remove every layer at `coord`
    pub fn erase(&mut self, coord: Coord) -> TouchedCoords {
        self.note_cell(coord);
        self.cells.remove(&coord);
        TouchedCoords::from([coord])
    }

    /// Place `kind_id` at every coordinate of the inclusive box.
    ///
    /// The box is rejected as a whole, before any write, when it exceeds
    /// the configured area.
    pub fn fill_rectangle(
        &mut self,
        catalog: &Catalog,
        x0: i32,
        y0: i32,
        x1: i32,
        y1: i32,
        kind_id: &str,
    ) -> Result<TouchedCoords, GridError> {
        let rect = self.checked_rect(x0, y0, x1, y1)?;
        let layer = Self::check_placeable(catalog, kind_id)?;

        let mut touched = TouchedCoords::new();
        for coord in rect.coords() {
            self.write(coord, layer, kind_id, TileOrigin::Filled);
            touched.insert(coord);
        }
        Ok(touched)
    }

    /// Erase every coordinate of the inclusive box
    pub fn erase_rectangle(
        &mut self,
        x0: i32,
        y0: i32,
        x1: i32,
        y1: i32,
    ) -> Result<TouchedCoords, GridError> {
        let rect = self.checked_rect(x0, y0, x1, y1)?;

        let mut touched = TouchedCoords::new();
        for coord in rect.coords() {
            self.note_cell(coord);
            self.cells.remove(&coord);
            touched.insert(coord);
        }
        Ok(touched)
    }

    /// Replace the whole-map background. Touches no cell.
    pub fn set_background(
        &mut self,
        catalog: &Catalog,
        kind_id: Option<&str>,
    ) -> Result<TouchedCoords, GridError> {
        if let Some(id) = kind_id {
            let kind = catalog
                .get(id)
                .ok_or_else(|| GridError::UnknownTileKind(id.to_string()))?;
            if !kind.is_background() {
                return Err(GridError::NotABackground(id.to_string()));
            }
        }
        self.note_background();
        self.background = kind_id.map(str::to_string);
        Ok(TouchedCoords::new())
    }

    /// Clear one layer, but only while it still holds `kind_id`.
    ///
    /// Returns `false` (and changes nothing) when the occupant differs.
    pub fn clear_layer_if(&mut self, coord: Coord, layer: i32, kind_id: &str) -> bool {
        if self.tile_at(coord, layer).map(|t| t.tile_kind_id.as_str()) != Some(kind_id) {
            return false;
        }
        self.note_cell(coord);
        let Some(cell) = self.cells.get_mut(&coord) else {
            return false;
        };
        cell.set(layer, None);
        if !cell.has_live() {
            self.cells.remove(&coord);
        }
        true
    }

    /// Drop every cell and the background
    pub fn clear(&mut self) {
        if self.journal.is_some() {
            let coords: Vec<Coord> = self.cells.keys().copied().collect();
            for coord in coords {
                self.note_cell(coord);
            }
            self.note_background();
        }
        self.cells.clear();
        self.background = None;
    }

    pub(crate) fn insert_cell(&mut self, coord: Coord, cell: Cell) {
        if cell.has_live() {
            self.note_cell(coord);
            self.cells.insert(coord, cell);
        }
    }

    pub(crate) fn set_background_unchecked(&mut self, background: Option<TileKindId>) {
        self.note_background();
        self.background = background;
    }

    fn write(&mut self, coord: Coord, layer: i32, kind_id: &str, origin: TileOrigin) {
        self.note_cell(coord);
        self.cells
            .entry(coord)
            .or_default()
            .set(layer, Some(PlacedTile::new(coord, kind_id, origin)));
    }

    /// Resolve the layer for `kind_id`, rejecting unknown and background kinds
    fn check_placeable(catalog: &Catalog, kind_id: &str) -> Result<i32, GridError> {
        let kind = catalog
            .get(kind_id)
            .ok_or_else(|| GridError::UnknownTileKind(kind_id.to_string()))?;
        if kind.is_background() {
            return Err(GridError::BackgroundPlacement(kind_id.to_string()));
        }
        Ok(kind.z_index)
    }

    fn checked_rect(&self, x0: i32, y0: i32, x1: i32, y1: i32) -> Result<Rect, GridError> {
        let rect = Rect::new(x0, y0, x1, y1);
        let area = rect.area();
        if area > self.settings.max_rectangle_area {
            return Err(GridError::RectangleTooLarge {
                x0,
                y0,
                x1,
                y1,
                area,
                limit: self.settings.max_rectangle_area,
            });
        }
        Ok(rect)
    }

    // ─── Queries ─────────────────────────────────────────────────────────────

    pub fn cell(&self, coord: Coord) -> Option<&Cell> {
        self.cells.get(&coord)
    }

    pub fn tile_at(&self, coord: Coord, layer: i32) -> Option<&PlacedTile> {
        self.cells.get(&coord).and_then(|c| c.get(layer))
    }

    /// Live tiles at `coord`, ascending by layer
    pub fn tiles_at(&self, coord: Coord) -> impl Iterator<Item = (i32, &PlacedTile)> {
        self.cells.get(&coord).into_iter().flat_map(Cell::live)
    }

    pub fn cells(&self) -> impl Iterator<Item = (Coord, &Cell)> {
        self.cells.iter().map(|(&coord, cell)| (coord, cell))
    }

    /// Every live tile, ordered by coordinate then layer
    pub fn live_tiles(&self) -> impl Iterator<Item = (Coord, i32, &PlacedTile)> {
        self.cells
            .iter()
            .flat_map(|(&coord, cell)| cell.live().map(move |(layer, t)| (coord, layer, t)))
    }

    /// Whether both grids hold the same live (coordinate, layer, kind) set
    /// and background. Origins and cleared layers are ignored.
    pub fn same_tiles(&self, other: &Grid) -> bool {
        self.background == other.background
            && self
                .live_tiles()
                .map(|(c, l, t)| (c, l, t.tile_kind_id.as_str()))
                .eq(other
                    .live_tiles()
                    .map(|(c, l, t)| (c, l, t.tile_kind_id.as_str())))
    }

    pub fn background(&self) -> Option<&str> {
        self.background.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty() && self.background.is_none()
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TileKind;

    fn catalog() -> Catalog {
        Catalog::from_kinds([
            TileKind::new("dirt", 0),
            TileKind::new("stone", 0),
            TileKind::new("rock", 1),
            TileKind::new("flower", 2),
            TileKind::new("sky", 0).background(),
        ])
        .unwrap()
    }

    #[test]
    fn test_journal_keeps_first_prior_state() {
        let catalog = catalog();
        let mut grid = Grid::new();
        grid.place_tile(&catalog, Coord::new(0, 0), "dirt", TileOrigin::Placed)
            .unwrap();
        grid.place_tile(&catalog, Coord::new(5, 5), "rock", TileOrigin::Placed)
            .unwrap();
        let original = grid.clone();

        grid.begin_journal();
        assert!(grid.is_journaling());
        grid.place_tile(&catalog, Coord::new(0, 0), "stone", TileOrigin::Placed)
            .unwrap();
        grid.place_tile(&catalog, Coord::new(0, 0), "flower", TileOrigin::Placed)
            .unwrap();
        grid.place_tile(&catalog, Coord::new(1, 0), "dirt", TileOrigin::Placed)
            .unwrap();
        assert!(!grid.clear_layer_if(Coord::new(5, 5), 1, "dirt"));
        grid.set_background(&catalog, Some("sky")).unwrap();
        grid.set_background(&catalog, None).unwrap();

        let mut expected = original.clone();
        expected
            .place_tile(&catalog, Coord::new(0, 0), "flower", TileOrigin::Placed)
            .unwrap();
        expected
            .place_tile(&catalog, Coord::new(0, 0), "stone", TileOrigin::Placed)
            .unwrap();
        expected
            .place_tile(&catalog, Coord::new(1, 0), "dirt", TileOrigin::Placed)
            .unwrap();
        assert_eq!(grid, expected, "an open journal is not content");

        let journal = grid.take_journal().unwrap();
        assert!(!grid.is_journaling());
        let before: Vec<_> = journal.cells().collect();
        assert_eq!(
            before,
            vec![
                (Coord::new(0, 0), original.cell(Coord::new(0, 0))),
                (Coord::new(1, 0), None),
            ]
        );
        assert_eq!(journal.background(), Some(None));
        assert_eq!(journal.len(), 2);

        // nothing is recorded once the journal is taken
        grid.erase(Coord::new(5, 5));
        assert!(grid.take_journal().is_none());
    }

    #[test]
    fn test_journal_covers_erase_and_clear() {
        let catalog = catalog();
        let mut grid = Grid::new();
        grid.fill_rectangle(&catalog, 0, 0, 1, 1, "dirt").unwrap();
        grid.set_background(&catalog, Some("sky")).unwrap();
        let original = grid.clone();

        grid.begin_journal();
        grid.erase_rectangle(1, 0, 1, 1).unwrap();
        grid.clear();
        let journal = grid.take_journal().unwrap();

        assert_eq!(journal.len(), 4);
        for (coord, cell) in journal.cells() {
            assert_eq!(cell, original.cell(coord), "at {coord}");
        }
        assert_eq!(journal.background(), Some(Some("sky")));
        assert!(GridJournal::default().is_empty());
    }

    #[test]
    fn test_place_overwrites_same_layer_only() {
        let catalog = catalog();
        let mut grid = Grid::new();
        let c = Coord::new(1, 1);

        grid.place_tile(&catalog, c, "dirt", TileOrigin::Placed).unwrap();
        grid.place_tile(&catalog, c, "flower", TileOrigin::Placed).unwrap();
        grid.place_tile(&catalog, c, "stone", TileOrigin::Placed).unwrap();

        assert_eq!(grid.tile_at(c, 0).unwrap().tile_kind_id, "stone");
        assert_eq!(grid.tile_at(c, 2).unwrap().tile_kind_id, "flower");
        assert_eq!(grid.tiles_at(c).count(), 2);
    }

    #[test]
    fn test_place_explicit_layer_isolated() {
        let catalog = catalog();
        let mut grid = Grid::new();
        let c = Coord::new(0, 0);
        grid.place(&catalog, c, 0, "dirt", TileOrigin::Placed).unwrap();
        grid.place(&catalog, c, 1, "rock", TileOrigin::Placed).unwrap();
        let before: Vec<_> = grid
            .tiles_at(c)
            .filter(|(l, _)| *l != 2)
            .map(|(l, t)| (l, t.clone()))
            .collect();

        grid.place(&catalog, c, 2, "stone", TileOrigin::Placed).unwrap();

        let after: Vec<_> = grid
            .tiles_at(c)
            .filter(|(l, _)| *l != 2)
            .map(|(l, t)| (l, t.clone()))
            .collect();
        assert_eq!(before, after);
        assert_eq!(grid.tile_at(c, 2).unwrap().tile_kind_id, "stone");
    }

    #[test]
    fn test_place_rejects_unknown_and_background() {
        let catalog = catalog();
        let mut grid = Grid::new();
        let c = Coord::new(0, 0);

        assert_eq!(
            grid.place_tile(&catalog, c, "lava", TileOrigin::Placed),
            Err(GridError::UnknownTileKind("lava".to_string()))
        );
        assert_eq!(
            grid.place_tile(&catalog, c, "sky", TileOrigin::Placed),
            Err(GridError::BackgroundPlacement("sky".to_string()))
        );
        assert!(grid.is_empty());
    }

    #[test]
    fn test_erase_clears_whole_stack() {
        let catalog = catalog();
        let mut grid = Grid::new();
        let c = Coord::new(-4, 9);
        grid.place_tile(&catalog, c, "dirt", TileOrigin::Placed).unwrap();
        grid.place_tile(&catalog, c, "flower", TileOrigin::Placed).unwrap();

        let touched = grid.erase(c);
        assert_eq!(touched, TouchedCoords::from([c]));
        assert!(grid.cell(c).is_none());
        assert!(grid.is_empty());
    }

    #[test]
    fn test_erase_empty_is_noop() {
        let catalog = catalog();
        let mut grid = Grid::new();
        grid.place_tile(&catalog, Coord::new(0, 0), "dirt", TileOrigin::Placed)
            .unwrap();
        let before = grid.clone();

        grid.erase(Coord::new(5, 5));
        assert_eq!(grid, before);
    }

    #[test]
    fn test_fill_rectangle_normalizes_corners() {
        let catalog = catalog();
        let mut a = Grid::new();
        let mut b = Grid::new();

        let touched = a.fill_rectangle(&catalog, 2, 3, -1, 0, "dirt").unwrap();
        b.fill_rectangle(&catalog, -1, 0, 2, 3, "dirt").unwrap();

        assert_eq!(touched.len(), 16);
        assert_eq!(a, b);
        assert!(a.tile_at(Coord::new(-1, 3), 0).is_some());
        assert_eq!(
            a.tile_at(Coord::new(2, 0), 0).unwrap().origin,
            TileOrigin::Filled
        );
    }

    #[test]
    fn test_rectangle_area_cap() {
        let catalog = catalog();
        let mut grid = Grid::with_settings(GridSettings {
            max_rectangle_area: 100,
        });

        assert!(grid.fill_rectangle(&catalog, 0, 0, 9, 9, "dirt").is_ok());
        let err = grid.fill_rectangle(&catalog, 0, 0, 10, 9, "dirt").unwrap_err();
        assert!(matches!(err, GridError::RectangleTooLarge { area: 110, .. }));
        assert_eq!(grid.cell_count(), 100);

        let err = grid
            .erase_rectangle(i32::MIN, i32::MIN, i32::MAX, i32::MAX)
            .unwrap_err();
        assert!(matches!(err, GridError::RectangleTooLarge { .. }));
        assert_eq!(grid.cell_count(), 100);
    }

    #[test]
    fn test_erase_rectangle() {
        let catalog = catalog();
        let mut grid = Grid::new();
        grid.fill_rectangle(&catalog, 0, 0, 3, 3, "dirt").unwrap();
        grid.place_tile(&catalog, Coord::new(1, 1), "flower", TileOrigin::Placed)
            .unwrap();

        let touched = grid.erase_rectangle(1, 1, 2, 2).unwrap();
        assert_eq!(touched.len(), 4);
        assert_eq!(grid.cell_count(), 12);
        assert!(grid.cell(Coord::new(1, 1)).is_none());
    }

    #[test]
    fn test_set_background() {
        let catalog = catalog();
        let mut grid = Grid::new();

        assert!(grid.set_background(&catalog, Some("sky")).unwrap().is_empty());
        assert_eq!(grid.background(), Some("sky"));
        assert_eq!(
            grid.set_background(&catalog, Some("dirt")),
            Err(GridError::NotABackground("dirt".to_string()))
        );
        assert_eq!(grid.background(), Some("sky"));
        grid.set_background(&catalog, None).unwrap();
        assert_eq!(grid.background(), None);
    }

    #[test]
    fn test_clear_layer_if_guards_stale_occupant() {
        let catalog = catalog();
        let mut grid = Grid::new();
        let c = Coord::new(3, 3);
        grid.place_tile(&catalog, c, "dirt", TileOrigin::Placed).unwrap();
        grid.place_tile(&catalog, c, "flower", TileOrigin::Placed).unwrap();

        assert!(!grid.clear_layer_if(c, 0, "stone"));
        assert!(grid.clear_layer_if(c, 0, "dirt"));
        assert!(grid.tile_at(c, 0).is_none());
        assert!(grid.cell(c).is_some());
        assert!(grid.clear_layer_if(c, 2, "flower"));
        assert!(grid.cell(c).is_none(), "cell with no live tile is pruned");
    }

    #[test]
    fn test_same_tiles_ignores_origin() {
        let catalog = catalog();
        let mut a = Grid::new();
        let mut b = Grid::new();
        a.place_tile(&catalog, Coord::new(0, 0), "dirt", TileOrigin::Placed)
            .unwrap();
        b.place_tile(&catalog, Coord::new(0, 0), "dirt", TileOrigin::Synced)
            .unwrap();
        assert!(a.same_tiles(&b));
        assert_ne!(a, b);
    }
}
