use thiserror::Error;

use tilegrid_core::{CatalogError, GridError};
use tilegrid_delta::DeltaError;

/// Errors raised while reading or writing editor settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Errors surfaced by [`EditSession`](crate::EditSession)
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Delta(#[from] DeltaError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("Invalid snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}
