//! The editing session: one grid, its catalog, propagation and history

use tracing::debug;

use tilegrid_autotile::{
    propagate, AutotileIndex, PropagationReport, VariantSelector, WeightedVariantSelector,
};
use tilegrid_core::{
    Catalog, Coord, Grid, GridError, GridSnapshot, LoadReport, TileOrigin, TouchedCoords,
};
use tilegrid_delta::{apply, diff, diff_journal, ApplyReport, Delta, DeltaWire, EditHistory};

use crate::{EditorSettings, SessionError};

/// Result of one mutating verb
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOutcome {
    /// Coordinates the verb itself wrote or cleared
    pub touched: TouchedCoords,
    /// Full change including autotile rewrites
    pub delta: Delta,
    pub propagation: PropagationReport,
}

/// Result of applying a collaborator's delta
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub applied: ApplyReport,
    pub propagation: PropagationReport,
}

/// Result of an undo or redo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryOutcome {
    pub applied: ApplyReport,
    /// Present when the recorded delta no longer matched the grid and
    /// autotiles around it had to be re-settled
    pub repair: Option<PropagationReport>,
}

/// Owns a grid and keeps it consistent across edits.
///
/// Every mutating verb runs autotile propagation over the cells it touched,
/// records the resulting delta for undo, and returns it for broadcasting.
pub struct EditSession {
    catalog: Catalog,
    index: AutotileIndex,
    grid: Grid,
    selector: Box<dyn VariantSelector + Send>,
    history: EditHistory,
    settings: EditorSettings,
}

impl EditSession {
    pub fn new(catalog: Catalog, settings: EditorSettings) -> Self {
        let index = AutotileIndex::build(&catalog);
        debug!(
            "Edit session created: {} tile kinds, {} autotile groups",
            catalog.len(),
            index.groups().count()
        );
        Self {
            catalog,
            index,
            grid: Grid::with_settings(settings.grid),
            selector: Box::new(WeightedVariantSelector::from_settings(&settings.variants)),
            history: EditHistory::new(settings.history),
            settings,
        }
    }

    pub fn from_catalog_json(json: &str, settings: EditorSettings) -> Result<Self, SessionError> {
        Ok(Self::new(Catalog::from_json(json)?, settings))
    }

    /// Replace the variant selection strategy
    pub fn with_selector(mut self, selector: impl VariantSelector + Send + 'static) -> Self {
        self.selector = Box::new(selector);
        self
    }

    // ─── Mutations ───────────────────────────────────────────────────────────

    /// Place a tile on its catalog layer
    pub fn place(&mut self, coord: Coord, kind_id: &str) -> Result<EditOutcome, SessionError> {
        self.edit(format!("Place {kind_id} at {coord}"), |grid, catalog| {
            grid.place_tile(catalog, coord, kind_id, TileOrigin::Placed)
        })
    }

    /// Place a tile on an explicit layer
    pub fn place_at_layer(
        &mut self,
        coord: Coord,
        layer: i32,
        kind_id: &str,
    ) -> Result<EditOutcome, SessionError> {
        self.edit(
            format!("Place {kind_id} at {coord} layer {layer}"),
            |grid, catalog| grid.place(catalog, coord, layer, kind_id, TileOrigin::Placed),
        )
    }

    /// Clear every layer at `coord`
    pub fn erase(&mut self, coord: Coord) -> Result<EditOutcome, SessionError> {
        self.edit(format!("Erase {coord}"), |grid, _| Ok(grid.erase(coord)))
    }

    pub fn fill_rectangle(
        &mut self,
        x0: i32,
        y0: i32,
        x1: i32,
        y1: i32,
        kind_id: &str,
    ) -> Result<EditOutcome, SessionError> {
        self.edit(
            format!("Fill ({x0}, {y0})..({x1}, {y1}) with {kind_id}"),
            |grid, catalog| grid.fill_rectangle(catalog, x0, y0, x1, y1, kind_id),
        )
    }

    pub fn erase_rectangle(
        &mut self,
        x0: i32,
        y0: i32,
        x1: i32,
        y1: i32,
    ) -> Result<EditOutcome, SessionError> {
        self.edit(format!("Erase ({x0}, {y0})..({x1}, {y1})"), |grid, _| {
            grid.erase_rectangle(x0, y0, x1, y1)
        })
    }

    pub fn set_background(&mut self, kind_id: Option<&str>) -> Result<EditOutcome, SessionError> {
        let description = match kind_id {
            Some(id) => format!("Set background {id}"),
            None => "Clear background".to_string(),
        };
        self.edit(description, |grid, catalog| {
            grid.set_background(catalog, kind_id)
        })
    }

    /// Replace the grid with a snapshot. Clears history; does not propagate.
    pub fn load(&mut self, snapshot: &GridSnapshot) -> LoadReport {
        let report = self.grid.load(&self.catalog, snapshot);
        self.history.clear();
        debug!(
            "Loaded snapshot: {} cells, {} entries skipped",
            self.grid.cell_count(),
            report.skipped.len()
        );
        report
    }

    pub fn load_json(&mut self, json: &str) -> Result<LoadReport, SessionError> {
        let snapshot = GridSnapshot::from_json(json)?;
        Ok(self.load(&snapshot))
    }

    /// Apply a delta without propagating or recording it
    pub fn apply_delta(&mut self, delta: &Delta) -> ApplyReport {
        apply(&mut self.grid, &self.catalog, delta)
    }

    /// Apply a collaborator's delta, then re-settle autotiles around it.
    ///
    /// Not recorded in local history.
    pub fn apply_remote_delta(&mut self, wire: &DeltaWire) -> Result<SyncOutcome, SessionError> {
        let delta = wire.resolve(&self.grid, &self.catalog)?;
        let applied = apply(&mut self.grid, &self.catalog, &delta);
        let propagation = propagate(
            &mut self.grid,
            &self.catalog,
            &self.index,
            &delta.touched(),
            &mut *self.selector,
            &self.settings.propagation,
        );
        debug!(
            "Applied remote delta: {} entries, {} stale removals, {} cells re-settled",
            delta.len(),
            applied.stale_removals,
            propagation.rewritten.len()
        );
        Ok(SyncOutcome {
            applied,
            propagation,
        })
    }

    /// Revert the most recent local edit.
    ///
    /// When remote deltas have changed the cells since the edit, part of
    /// the inverse is stale and the restored tiles are re-settled.
    pub fn undo(&mut self) -> Option<HistoryOutcome> {
        let applied = self.history.undo(&mut self.grid, &self.catalog)?;
        Some(self.repair_after_history(applied))
    }

    pub fn redo(&mut self) -> Option<HistoryOutcome> {
        let applied = self.history.redo(&mut self.grid, &self.catalog)?;
        Some(self.repair_after_history(applied))
    }

    /// A clean apply restores a state that was already settled. Anything
    /// stale or skipped may leave variants that disagree with neighbours.
    fn repair_after_history(&mut self, applied: ApplyReport) -> HistoryOutcome {
        if applied.stale_removals == 0 && applied.skipped.is_empty() {
            return HistoryOutcome {
                applied,
                repair: None,
            };
        }
        let repair = propagate(
            &mut self.grid,
            &self.catalog,
            &self.index,
            &applied.touched,
            &mut *self.selector,
            &self.settings.propagation,
        );
        debug!(
            "History entry partly stale ({} stale, {} skipped), {} cells re-settled",
            applied.stale_removals,
            applied.skipped.len(),
            repair.rewritten.len()
        );
        HistoryOutcome {
            applied,
            repair: Some(repair),
        }
    }

    /// Mutate the grid, propagate and record the change.
    ///
    /// The grid journals the prior state of each cell it writes, so the
    /// delta costs time in the size of the edit, not of the map. A rejected
    /// mutation leaves the grid untouched.
    fn edit<F>(&mut self, description: String, mutate: F) -> Result<EditOutcome, SessionError>
    where
        F: FnOnce(&mut Grid, &Catalog) -> Result<TouchedCoords, GridError>,
    {
        self.grid.begin_journal();
        let touched = match mutate(&mut self.grid, &self.catalog) {
            Ok(touched) => touched,
            Err(e) => {
                self.grid.take_journal();
                return Err(e.into());
            }
        };
        let propagation = propagate(
            &mut self.grid,
            &self.catalog,
            &self.index,
            &touched,
            &mut *self.selector,
            &self.settings.propagation,
        );
        let delta = self
            .grid
            .take_journal()
            .map(|journal| diff_journal(&journal, &self.grid))
            .unwrap_or_default();
        debug!(
            "{}: {} touched, {} added, {} removed",
            description,
            touched.len(),
            delta.added.len(),
            delta.removed.len()
        );
        self.history.record(description, delta.clone());

        Ok(EditOutcome {
            touched,
            delta,
            propagation,
        })
    }

    // ─── Queries ─────────────────────────────────────────────────────────────

    pub fn save(&self) -> GridSnapshot {
        self.grid.save()
    }

    pub fn save_json(&self) -> Result<String, SessionError> {
        Ok(self.grid.save().to_json()?)
    }

    /// Delta turning the current grid into `other`
    pub fn diff(&self, other: &Grid) -> Delta {
        diff(&self.grid, other)
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn index(&self) -> &AutotileIndex {
        &self.index
    }

    pub fn history(&self) -> &EditHistory {
        &self.history
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilegrid_autotile::CanonicalVariantSelector;

    const CATALOG: &str = r#"{
        "tiles": {
            "grass": { "zIndex": 0 },
            "flower": { "zIndex": 2 },
            "sky": { "zIndex": 0, "type": "background" },
            "path-alone": { "zIndex": 1, "autotile": { "group": "path", "neighbors": "" } },
            "path-ns": { "zIndex": 1, "autotile": { "group": "path", "neighbors": "NS" } },
            "path-ew": { "zIndex": 1, "autotile": { "group": "path", "neighbors": "EW" } },
            "path-e": { "zIndex": 1, "autotile": { "group": "path", "neighbors": "E" } },
            "path-w": { "zIndex": 1, "autotile": { "group": "path", "neighbors": "W" } }
        }
    }"#;

    fn session() -> EditSession {
        EditSession::from_catalog_json(CATALOG, EditorSettings::default())
            .unwrap()
            .with_selector(CanonicalVariantSelector)
    }

    #[test]
    fn test_place_propagates_and_records() {
        let mut session = session();
        session.place(Coord::new(0, 0), "path-alone").unwrap();
        let outcome = session.place(Coord::new(1, 0), "path-alone").unwrap();

        assert_eq!(outcome.touched, TouchedCoords::from([Coord::new(1, 0)]));
        let grid = session.grid();
        assert_eq!(grid.tile_at(Coord::new(0, 0), 1).unwrap().tile_kind_id, "path-e");
        assert_eq!(grid.tile_at(Coord::new(1, 0), 1).unwrap().tile_kind_id, "path-w");
        assert_eq!(outcome.delta.added.len(), 2);
        assert_eq!(session.history().len(), 2);
    }

    #[test]
    fn test_rejected_edit_changes_nothing() {
        let mut session = session();
        session.place(Coord::new(0, 0), "grass").unwrap();

        assert!(matches!(
            session.place(Coord::new(1, 1), "lava"),
            Err(SessionError::Grid(GridError::UnknownTileKind(_)))
        ));
        assert!(matches!(
            session.place(Coord::new(1, 1), "sky"),
            Err(SessionError::Grid(GridError::BackgroundPlacement(_)))
        ));
        assert_eq!(session.grid().cell_count(), 1);
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn test_edit_delta_on_large_map_matches_full_diff() {
        let mut session = session();
        session.fill_rectangle(0, 0, 299, 299, "grass").unwrap();
        session.place(Coord::new(10, 10), "path-alone").unwrap();
        let before = session.grid().clone();

        let outcome = session.place(Coord::new(11, 10), "path-alone").unwrap();
        assert!(!session.grid().is_journaling());
        assert_eq!(outcome.delta, diff(&before, session.grid()));
        assert_eq!(
            outcome.delta.touched(),
            TouchedCoords::from([Coord::new(10, 10), Coord::new(11, 10)])
        );

        assert!(session.place(Coord::new(0, 0), "lava").is_err());
        assert!(!session.grid().is_journaling());
    }

    #[test]
    fn test_background_is_undoable() {
        let mut session = session();
        let outcome = session.set_background(Some("sky")).unwrap();
        assert!(outcome.touched.is_empty());
        assert_eq!(session.grid().background(), Some("sky"));

        session.undo().unwrap();
        assert_eq!(session.grid().background(), None);
        session.redo().unwrap();
        assert_eq!(session.grid().background(), Some("sky"));
    }

    #[test]
    fn test_load_clears_history_without_propagation() {
        let mut session = session();
        session.place(Coord::new(0, 0), "grass").unwrap();

        let report = session
            .load_json(
                r#"{ "placedTiles": {
                    "0-0": { "1": { "coordinate": { "x": 0, "y": 0 }, "tileKindId": "path-alone" } },
                    "1-0": { "1": { "coordinate": { "x": 1, "y": 0 }, "tileKindId": "path-alone" } }
                } }"#,
            )
            .unwrap();

        assert!(report.is_clean());
        assert!(!session.history().can_undo());
        assert_eq!(
            session.grid().tile_at(Coord::new(0, 0), 1).unwrap().tile_kind_id,
            "path-alone"
        );
    }

    #[test]
    fn test_remote_delta_resettles_neighbors() {
        let mut session = session();
        session.place(Coord::new(0, 0), "path-alone").unwrap();

        let wire = DeltaWire::from_json(
            r#"{ "added": [{ "x": 1, "y": 0, "tileKindId": "path-alone" }], "removed": [] }"#,
        )
        .unwrap();
        let outcome = session.apply_remote_delta(&wire).unwrap();

        assert_eq!(outcome.applied.stale_removals, 0);
        assert!(outcome.propagation.changed());
        let grid = session.grid();
        assert_eq!(grid.tile_at(Coord::new(0, 0), 1).unwrap().tile_kind_id, "path-e");
        assert_eq!(grid.tile_at(Coord::new(1, 0), 1).unwrap().tile_kind_id, "path-w");
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn test_malformed_catalog_fails_fast() {
        assert!(matches!(
            EditSession::from_catalog_json("{ not json", EditorSettings::default()),
            Err(SessionError::Catalog(_))
        ));
    }
}
