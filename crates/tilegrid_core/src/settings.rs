use serde::{Deserialize, Serialize};

/// Default cap on the number of cells a single rectangle operation may cover
pub const DEFAULT_MAX_RECTANGLE_AREA: u64 = 250_000;

/// Limits applied by grid mutations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSettings {
    /// Rectangle fills and erases covering more cells than this are rejected
    pub max_rectangle_area: u64,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            max_rectangle_area: DEFAULT_MAX_RECTANGLE_AREA,
        }
    }
}
