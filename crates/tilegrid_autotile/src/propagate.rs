//! Propagation engine: re-derives autotile variants around edited cells
//!
//! The entry point is [`propagate`]. It runs a breadth-first fixpoint over the
//! 4-neighbourhood of the seed coordinates, rewriting any autotile tile whose
//! id is not a valid variant for its live neighbour mask, and re-queueing the
//! neighbours of every rewritten cell.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet, VecDeque};
use tracing::{debug, warn};

use tilegrid_core::{Catalog, Coord, Direction, Grid, TileKindId, TileOrigin, TouchedCoords};

use crate::{select_variant, AutotileIndex, VariantSelector};

/// Default cap on cell evaluations per propagation run
pub const DEFAULT_MAX_ITERATIONS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropagationSettings {
    /// Cell evaluations allowed before the run stops unsettled
    pub max_iterations: usize,
}

impl Default for PropagationSettings {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// How a propagation run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropagationOutcome {
    /// No autotile group near any seed; nothing was evaluated
    NoAutotileGroups,
    /// The queue drained; every evaluated cell is consistent
    Settled,
    /// The iteration cap was reached with work left. The grid is partially
    /// settled and is not rolled back.
    LimitExceeded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropagationReport {
    /// Cells evaluated
    pub iterations: usize,
    /// Cells where at least one tile was replaced
    pub rewritten: TouchedCoords,
    pub outcome: PropagationOutcome,
}

impl PropagationReport {
    fn no_groups() -> Self {
        Self {
            iterations: 0,
            rewritten: TouchedCoords::new(),
            outcome: PropagationOutcome::NoAutotileGroups,
        }
    }

    pub fn limit_exceeded(&self) -> bool {
        self.outcome == PropagationOutcome::LimitExceeded
    }

    pub fn changed(&self) -> bool {
        !self.rewritten.is_empty()
    }
}

/// Bring every autotile tile around `seeds` in line with its neighbours.
///
/// `seeds` are the coordinates a mutation just wrote or cleared. Replacements
/// go to the replaced tile's own layer, tagged [`TileOrigin::Autotile`].
pub fn propagate(
    grid: &mut Grid,
    catalog: &Catalog,
    index: &AutotileIndex,
    seeds: &TouchedCoords,
    selector: &mut dyn VariantSelector,
    settings: &PropagationSettings,
) -> PropagationReport {
    let groups = collect_groups(grid, catalog, seeds);
    if groups.is_empty() {
        return PropagationReport::no_groups();
    }

    let mut queue = VecDeque::new();
    let mut visited = HashSet::new();
    for seed in seeds {
        for coord in seed.with_neighbors() {
            if visited.insert(coord) {
                queue.push_back(coord);
            }
        }
    }

    let mut iterations = 0;
    let mut rewritten = TouchedCoords::new();
    let outcome = loop {
        if queue.is_empty() {
            break PropagationOutcome::Settled;
        }
        if iterations >= settings.max_iterations {
            break PropagationOutcome::LimitExceeded;
        }
        let Some(coord) = queue.pop_front() else {
            break PropagationOutcome::Settled;
        };
        iterations += 1;

        if relax_cell(grid, catalog, index, &groups, coord, selector) {
            rewritten.insert(coord);
            for neighbor in coord.neighbors() {
                if visited.insert(neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }
    };

    if outcome == PropagationOutcome::LimitExceeded {
        warn!(
            "Autotile propagation stopped after {} iterations with {} cells pending",
            iterations,
            queue.len()
        );
    } else {
        debug!(
            "Autotile propagation settled: {} iterations, {} cells rewritten",
            iterations,
            rewritten.len()
        );
    }

    PropagationReport {
        iterations,
        rewritten,
        outcome,
    }
}

/// Neighbour mask of `coord` for `group` (N=1, E=2, S=4, W=8).
///
/// A bit is set when the neighbour holds any tile of the group, whatever
/// its variant or layer.
pub fn live_mask(grid: &Grid, catalog: &Catalog, coord: Coord, group: &str) -> u8 {
    Direction::ALL
        .iter()
        .filter(|&&d| {
            coord
                .step(d)
                .is_some_and(|n| cell_has_group(grid, catalog, n, group))
        })
        .fold(0, |mask, d| mask | d.bit())
}

fn cell_has_group(grid: &Grid, catalog: &Catalog, coord: Coord, group: &str) -> bool {
    grid.tiles_at(coord)
        .any(|(_, tile)| catalog.autotile_group(&tile.tile_kind_id) == Some(group))
}

/// Autotile groups present on the seeds and their 4-neighbours
fn collect_groups(grid: &Grid, catalog: &Catalog, seeds: &TouchedCoords) -> BTreeSet<String> {
    seeds
        .iter()
        .flat_map(|seed| seed.with_neighbors())
        .flat_map(|coord| grid.tiles_at(coord))
        .filter_map(|(_, tile)| catalog.autotile_group(&tile.tile_kind_id))
        .map(str::to_string)
        .collect()
}

/// Evaluate one cell against every relevant group. Returns `true` if any
/// tile at `coord` was replaced.
fn relax_cell(
    grid: &mut Grid,
    catalog: &Catalog,
    index: &AutotileIndex,
    groups: &BTreeSet<String>,
    coord: Coord,
    selector: &mut dyn VariantSelector,
) -> bool {
    let mut changed = false;

    for group in groups {
        let members: Vec<(i32, TileKindId)> = grid
            .tiles_at(coord)
            .filter(|(_, tile)| {
                catalog.autotile_group(&tile.tile_kind_id) == Some(group.as_str())
            })
            .map(|(layer, tile)| (layer, tile.tile_kind_id.clone()))
            .collect();
        if members.is_empty() {
            continue;
        }

        let mask = live_mask(grid, catalog, coord, group);
        let Some((_, candidates)) = index.resolve(group, mask) else {
            continue;
        };

        for (layer, current) in members {
            if candidates.contains(&current) {
                continue;
            }
            let Some(choice) = select_variant(selector, candidates) else {
                continue;
            };
            match grid.place(catalog, coord, layer, choice, TileOrigin::Autotile) {
                Ok(_) => changed = true,
                Err(e) => warn!("Autotile rewrite at {} failed: {}", coord, e),
            }
        }
    }

    changed
}
