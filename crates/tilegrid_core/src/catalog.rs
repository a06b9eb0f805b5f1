//! Tile catalog: the read-only description of every tile kind
//!
//! The catalog is loaded once per session. Entry order is preserved because
//! autotile variants are ranked by the order they appear in.

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use thiserror::Error;

use crate::{CatalogError, Direction};

/// Identifier of a tile kind in the catalog
pub type TileKindId = String;

/// Whether a tile kind is placed on cells or used as the whole-map background
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileType {
    #[default]
    Tile,
    Background,
}

/// Source rectangle inside a spritesheet image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Reasons a neighbor string is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NeighborParseError {
    #[error("'{0}' is not one of N, E, S, W")]
    InvalidDirection(char),
    #[error("'{0}' appears more than once")]
    Duplicate(char),
}

/// A set of cardinal directions stored as a 4-bit mask (N=1, E=2, S=4, W=8)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NeighborMask(u8);

impl NeighborMask {
    pub const EMPTY: Self = Self(0);
    pub const ALL: Self = Self(0b1111);

    /// Build from raw bits. Bits above the low nibble are dropped.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 0b1111)
    }

    pub fn from_directions(directions: &[Direction]) -> Self {
        Self(directions.iter().fold(0, |acc, d| acc | d.bit()))
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, direction: Direction) -> bool {
        self.0 & direction.bit() != 0
    }

    pub fn insert(&mut self, direction: Direction) {
        self.0 |= direction.bit();
    }

    pub fn directions(self) -> impl Iterator<Item = Direction> {
        Direction::ALL.into_iter().filter(move |d| self.contains(*d))
    }
}

impl FromStr for NeighborMask {
    type Err = NeighborParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut mask = Self::EMPTY;
        for c in s.chars() {
            let direction =
                Direction::from_letter(c).ok_or(NeighborParseError::InvalidDirection(c))?;
            if mask.contains(direction) {
                return Err(NeighborParseError::Duplicate(c));
            }
            mask.insert(direction);
        }
        Ok(mask)
    }
}

impl TryFrom<String> for NeighborMask {
    type Error = NeighborParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<NeighborMask> for String {
    fn from(mask: NeighborMask) -> Self {
        mask.directions().map(Direction::letter).collect()
    }
}

/// Autotile membership of a tile kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutotileSpec {
    pub group: String,
    /// Which neighbours this variant is drawn to connect to
    pub neighbors: NeighborMask,
}

/// One entry of the tile catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileKind {
    pub id: TileKindId,
    pub display_name: String,
    /// Image reference, opaque to the grid
    pub src: String,
    /// Layer this kind occupies by default; also its draw order
    pub z_index: i32,
    #[serde(rename = "type")]
    pub tile_type: TileType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spritesheet: Option<SpriteRect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autotile: Option<AutotileSpec>,
}

impl TileKind {
    pub fn new(id: impl Into<String>, z_index: i32) -> Self {
        let id = id.into();
        Self {
            display_name: id.clone(),
            id,
            src: String::new(),
            z_index,
            tile_type: TileType::Tile,
            spritesheet: None,
            autotile: None,
        }
    }

    /// Mark as a whole-map background kind
    pub fn background(mut self) -> Self {
        self.tile_type = TileType::Background;
        self
    }

    pub fn with_autotile(mut self, group: impl Into<String>, neighbors: NeighborMask) -> Self {
        self.autotile = Some(AutotileSpec {
            group: group.into(),
            neighbors,
        });
        self
    }

    pub fn is_background(&self) -> bool {
        self.tile_type == TileType::Background
    }

    pub fn autotile_group(&self) -> Option<&str> {
        self.autotile.as_ref().map(|a| a.group.as_str())
    }
}

/// A named presentation group of tile ids (palette tab)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileGroup {
    pub name: String,
    pub tiles: Vec<TileKindId>,
}

/// The validated, read-only tile catalog
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    kinds: Vec<TileKind>,
    by_id: HashMap<TileKindId, usize>,
    groups: Vec<TileGroup>,
}

impl Catalog {
    /// Parse the catalog JSON input shape:
    /// `{ "tiles": { id: {...} }, "groups": { name: [id, ...] } }`
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;

        let mut kinds = Vec::with_capacity(file.tiles.0.len());
        for (id, def) in file.tiles.0 {
            kinds.push(def.into_kind(id)?);
        }

        let groups = file
            .groups
            .0
            .into_iter()
            .map(|(name, tiles)| TileGroup { name, tiles })
            .collect();

        Self::from_parts(kinds, groups)
    }

    /// Build from tile kinds with no presentation groups
    pub fn from_kinds(kinds: impl IntoIterator<Item = TileKind>) -> Result<Self, CatalogError> {
        Self::from_parts(kinds.into_iter().collect(), Vec::new())
    }

    pub fn from_parts(kinds: Vec<TileKind>, groups: Vec<TileGroup>) -> Result<Self, CatalogError> {
        let mut by_id = HashMap::with_capacity(kinds.len());
        for (idx, kind) in kinds.iter().enumerate() {
            if by_id.insert(kind.id.clone(), idx).is_some() {
                return Err(CatalogError::DuplicateTileKind(kind.id.clone()));
            }
            if kind.is_background() && kind.autotile.is_some() {
                return Err(CatalogError::BackgroundAutotile(kind.id.clone()));
            }
        }

        for group in &groups {
            if let Some(missing) = group.tiles.iter().find(|id| !by_id.contains_key(*id)) {
                return Err(CatalogError::UnknownGroupMember {
                    group: group.name.clone(),
                    tile: missing.clone(),
                });
            }
        }

        Ok(Self {
            kinds,
            by_id,
            groups,
        })
    }

    pub fn get(&self, id: &str) -> Option<&TileKind> {
        self.by_id.get(id).map(|&idx| &self.kinds[idx])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn z_index(&self, id: &str) -> Option<i32> {
        self.get(id).map(|k| k.z_index)
    }

    pub fn autotile_group(&self, id: &str) -> Option<&str> {
        self.get(id).and_then(TileKind::autotile_group)
    }

    /// Tile kinds in catalog order
    pub fn iter(&self) -> impl Iterator<Item = &TileKind> {
        self.kinds.iter()
    }

    pub fn groups(&self) -> &[TileGroup] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

#[derive(Deserialize)]
struct CatalogFile {
    tiles: OrderedEntries<TileKindDef>,
    #[serde(default)]
    groups: OrderedEntries<Vec<TileKindId>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TileKindDef {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    src: String,
    z_index: i32,
    #[serde(rename = "type", default)]
    tile_type: TileType,
    #[serde(default)]
    spritesheet: Option<SpriteRect>,
    #[serde(default)]
    autotile: Option<AutotileDef>,
}

#[derive(Deserialize)]
struct AutotileDef {
    group: String,
    neighbors: String,
}

impl TileKindDef {
    fn into_kind(self, id: TileKindId) -> Result<TileKind, CatalogError> {
        let autotile = match self.autotile {
            Some(def) => {
                let neighbors =
                    def.neighbors
                        .parse()
                        .map_err(|e: NeighborParseError| CatalogError::InvalidNeighbors {
                            tile: id.clone(),
                            neighbors: def.neighbors.clone(),
                            reason: e.to_string(),
                        })?;
                Some(AutotileSpec {
                    group: def.group,
                    neighbors,
                })
            }
            None => None,
        };

        Ok(TileKind {
            display_name: self.display_name.unwrap_or_else(|| id.clone()),
            id,
            src: self.src,
            z_index: self.z_index,
            tile_type: self.tile_type,
            spritesheet: self.spritesheet,
            autotile,
        })
    }
}

/// A JSON object read as a list of entries in document order.
///
/// Repeated keys are kept so duplicates can be reported instead of silently
/// overwritten.
struct OrderedEntries<T>(Vec<(String, T)>);

impl<T> Default for OrderedEntries<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for OrderedEntries<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for EntriesVisitor<T> {
            type Value = OrderedEntries<T>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map keyed by id")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, T>()? {
                    entries.push((key, value));
                }
                Ok(OrderedEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}
