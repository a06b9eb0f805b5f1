//! Undo/redo history of applied edits

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::debug;

use tilegrid_core::{Catalog, Grid};

use crate::{apply, ApplyReport, Delta};

/// Default number of undo steps retained
pub const DEFAULT_MAX_HISTORY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    /// Oldest entries are dropped beyond this count. 0 disables history.
    pub max_entries: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_HISTORY,
        }
    }
}

/// One recorded edit: the delta from the state before it to the state after
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub description: String,
    pub delta: Delta,
}

#[derive(Debug, Clone, Default)]
pub struct EditHistory {
    /// Edits that can be undone, oldest first
    undo_stack: VecDeque<HistoryEntry>,
    /// Edits that have been undone, most recent last
    redo_stack: Vec<HistoryEntry>,
    settings: HistorySettings,
}

impl EditHistory {
    pub fn new(settings: HistorySettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Record an edit that has already been applied.
    ///
    /// Empty deltas are ignored. Recording clears the redo stack.
    pub fn record(&mut self, description: impl Into<String>, delta: Delta) -> bool {
        if delta.is_empty() || self.settings.max_entries == 0 {
            return false;
        }
        self.undo_stack.push_back(HistoryEntry {
            description: description.into(),
            delta,
        });
        self.redo_stack.clear();
        while self.undo_stack.len() > self.settings.max_entries {
            self.undo_stack.pop_front();
        }
        true
    }

    /// Revert the most recent edit
    pub fn undo(&mut self, grid: &mut Grid, catalog: &Catalog) -> Option<ApplyReport> {
        let entry = self.undo_stack.pop_back()?;
        debug!("Undo: {}", entry.description);
        let report = apply(grid, catalog, &entry.delta.invert());
        self.redo_stack.push(entry);
        Some(report)
    }

    /// Re-apply the most recently undone edit
    pub fn redo(&mut self, grid: &mut Grid, catalog: &Catalog) -> Option<ApplyReport> {
        let entry = self.redo_stack.pop()?;
        debug!("Redo: {}", entry.description);
        let report = apply(grid, catalog, &entry.delta);
        self.undo_stack.push_back(entry);
        Some(report)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.back().map(|e| e.description.as_str())
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.last().map(|e| e.description.as_str())
    }

    pub fn len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.undo_stack.is_empty()
    }

    pub fn settings(&self) -> &HistorySettings {
        &self.settings
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff;
    use tilegrid_core::{Coord, TileKind, TileOrigin};

    fn catalog() -> Catalog {
        Catalog::from_kinds([TileKind::new("dirt", 0), TileKind::new("stone", 0)]).unwrap()
    }

    /// Place and record, returning the grid before the edit
    fn edit(history: &mut EditHistory, grid: &mut Grid, x: i32, id: &str) -> Grid {
        let before = grid.clone();
        grid.place_tile(&catalog(), Coord::new(x, 0), id, TileOrigin::Placed)
            .unwrap();
        history.record(format!("Place {id}"), diff(&before, grid));
        before
    }

    #[test]
    fn test_undo_redo_restores_states() {
        let catalog = catalog();
        let mut history = EditHistory::default();
        let mut grid = Grid::new();

        let empty = edit(&mut history, &mut grid, 0, "dirt");
        let one = edit(&mut history, &mut grid, 0, "stone");
        let two = grid.clone();

        assert_eq!(history.undo_description(), Some("Place stone"));
        history.undo(&mut grid, &catalog).unwrap();
        assert!(grid.same_tiles(&one));
        history.undo(&mut grid, &catalog).unwrap();
        assert!(grid.same_tiles(&empty));
        assert!(!history.can_undo());
        assert!(history.undo(&mut grid, &catalog).is_none());

        history.redo(&mut grid, &catalog).unwrap();
        history.redo(&mut grid, &catalog).unwrap();
        assert!(grid.same_tiles(&two));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_record_clears_redo() {
        let catalog = catalog();
        let mut history = EditHistory::default();
        let mut grid = Grid::new();

        edit(&mut history, &mut grid, 0, "dirt");
        history.undo(&mut grid, &catalog);
        assert!(history.can_redo());

        edit(&mut history, &mut grid, 1, "stone");
        assert!(!history.can_redo());
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_empty_delta_not_recorded() {
        let mut history = EditHistory::default();
        assert!(!history.record("Nothing", Delta::default()));
        assert!(!history.can_undo());
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut history = EditHistory::new(HistorySettings { max_entries: 2 });
        let mut grid = Grid::new();
        for x in 0..5 {
            edit(&mut history, &mut grid, x, "dirt");
        }
        assert_eq!(history.len(), 2);

        let catalog = catalog();
        history.undo(&mut grid, &catalog);
        history.undo(&mut grid, &catalog);
        assert!(!history.can_undo());
        assert_eq!(grid.cell_count(), 3);
    }
}
