//! Editor settings, read from TOML
//!
//! Every section and key is optional:
//!
//! ```toml
//! [grid]
//! max_rectangle_area = 250000
//!
//! [propagation]
//! max_iterations = 1000
//!
//! [variants]
//! canonical_weight = 0.8
//! seed = 42
//!
//! [history]
//! max_entries = 100
//! ```

use serde::{Deserialize, Serialize};

use tilegrid_autotile::{PropagationSettings, VariantSettings};
use tilegrid_core::GridSettings;
use tilegrid_delta::HistorySettings;

use crate::SettingsError;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    pub grid: GridSettings,
    pub propagation: PropagationSettings,
    pub variants: VariantSettings,
    pub history: HistorySettings,
}

impl EditorSettings {
    pub fn from_toml_str(s: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(s)?)
    }

    pub fn to_toml_string(&self) -> Result<String, SettingsError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
