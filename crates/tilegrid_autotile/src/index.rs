//! Autotile index: `group → bitmask → ordered variant list`

use std::cmp::Reverse;
use std::collections::BTreeMap;

use tilegrid_core::{Catalog, TileKindId};

/// Number of distinct 4-bit neighbour masks
pub const MASK_COUNT: usize = 16;

/// Read-only lookup from an autotile group and neighbour mask to the tile
/// kinds drawn for it.
///
/// Variants keep catalog order; position 0 is the canonical variant.
#[derive(Debug, Clone, Default)]
pub struct AutotileIndex {
    groups: BTreeMap<String, [Vec<TileKindId>; MASK_COUNT]>,
}

impl AutotileIndex {
    /// Build the index from every catalog kind that carries an autotile spec.
    ///
    /// A `Catalog` already has unique ids, so this cannot fail.
    pub fn build(catalog: &Catalog) -> Self {
        let mut groups: BTreeMap<String, [Vec<TileKindId>; MASK_COUNT]> = BTreeMap::new();

        for kind in catalog.iter() {
            if let Some(spec) = &kind.autotile {
                let mask = spec.neighbors.bits() as usize;
                groups.entry(spec.group.clone()).or_default()[mask].push(kind.id.clone());
            }
        }

        Self { groups }
    }

    /// Variants registered for exactly (`group`, `mask`)
    pub fn candidates(&self, group: &str, mask: u8) -> &[TileKindId] {
        self.groups
            .get(group)
            .map(|variants| variants[(mask & 0b1111) as usize].as_slice())
            .unwrap_or(&[])
    }

    /// Variants to use for a cell whose live mask is `mask`.
    ///
    /// Uses the exact list when it exists. Otherwise picks the defined mask
    /// with the smallest Hamming distance to `mask`, then the largest overlap
    /// with it, then the lowest value. Returns the mask actually used.
    /// `None` only when the group has no variants at all.
    pub fn resolve(&self, group: &str, mask: u8) -> Option<(u8, &[TileKindId])> {
        let variants = self.groups.get(group)?;
        let mask = mask & 0b1111;

        if !variants[mask as usize].is_empty() {
            return Some((mask, &variants[mask as usize]));
        }

        (0..MASK_COUNT as u8)
            .filter(|&m| !variants[m as usize].is_empty())
            .min_by_key(|&m| ((m ^ mask).count_ones(), Reverse((m & mask).count_ones()), m))
            .map(|m| (m, variants[m as usize].as_slice()))
    }

    pub fn has_group(&self, group: &str) -> bool {
        self.groups.contains_key(group)
    }

    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Masks with at least one variant in `group`, ascending
    pub fn defined_masks(&self, group: &str) -> Vec<u8> {
        self.groups
            .get(group)
            .map(|variants| {
                (0..MASK_COUNT as u8)
                    .filter(|&m| !variants[m as usize].is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilegrid_core::{CatalogError, NeighborMask, TileKind};

    fn kind(id: &str, group: &str, neighbors: &str) -> TileKind {
        TileKind::new(id, 1).with_autotile(group, neighbors.parse::<NeighborMask>().unwrap())
    }

    #[test]
    fn test_build_masks_and_order() {
        let catalog = Catalog::from_kinds([
            kind("wall-cross", "wall", "NESW"),
            kind("wall-v", "wall", "SN"),
            kind("wall-cross-cracked", "wall", "WSEN"),
            kind("water", "water", ""),
            TileKind::new("flower", 2),
        ])
        .unwrap();
        let index = AutotileIndex::build(&catalog);

        assert_eq!(
            index.candidates("wall", 15),
            ["wall-cross".to_string(), "wall-cross-cracked".to_string()]
        );
        assert_eq!(index.candidates("wall", 5), ["wall-v".to_string()]);
        assert!(index.candidates("wall", 0).is_empty());
        assert_eq!(index.candidates("water", 0), ["water".to_string()]);
        assert!(index.candidates("lava", 0).is_empty());
        assert_eq!(index.groups().collect::<Vec<_>>(), ["wall", "water"]);
        assert_eq!(index.defined_masks("wall"), vec![5, 15]);
    }

    #[test]
    fn test_no_autotile_kinds_builds_empty() {
        let catalog = Catalog::from_kinds([TileKind::new("a", 0), TileKind::new("b", 1)]).unwrap();
        let index = AutotileIndex::build(&catalog);
        assert!(index.is_empty());
    }

    #[test]
    fn test_duplicate_ids_never_reach_the_index() {
        let duplicated = Catalog::from_kinds([
            kind("wall-a", "wall", ""),
            kind("wall-a", "wall", "NESW"),
        ]);
        assert!(matches!(
            duplicated,
            Err(CatalogError::DuplicateTileKind(id)) if id == "wall-a"
        ));

        let catalog = Catalog::from_kinds([
            kind("wall-a", "wall", ""),
            kind("wall-b", "wall", "NESW"),
        ])
        .unwrap();
        let index = AutotileIndex::build(&catalog);
        assert_eq!(index.defined_masks("wall"), vec![0, 15]);
    }

    #[test]
    fn test_resolve_exact_and_fallback() {
        let catalog = Catalog::from_kinds([
            kind("alone", "wall", ""),
            kind("vertical", "wall", "NS"),
            kind("horizontal", "wall", "EW"),
            kind("cross", "wall", "NESW"),
        ])
        .unwrap();
        let index = AutotileIndex::build(&catalog);

        assert_eq!(index.resolve("wall", 5).unwrap().0, 5);
        // W only: alone and horizontal tie on distance, horizontal overlaps
        assert_eq!(index.resolve("wall", 0b1000).unwrap().0, 10);
        // N only
        assert_eq!(index.resolve("wall", 0b0001).unwrap().0, 5);
        // corner E+S: every mask is two bits away, cross overlaps most
        assert_eq!(index.resolve("wall", 0b0110).unwrap().0, 15);
        assert_eq!(index.resolve("wall", 0b0111).unwrap().0, 15);
        assert!(index.resolve("lava", 0).is_none());
    }
}
