use thiserror::Error;

/// Errors raised while decoding or resolving a received delta
#[derive(Debug, Error)]
pub enum DeltaError {
    #[error("Delta references unknown tile kind '{0}'")]
    UnknownTileKind(String),
    #[error("Malformed delta: {0}")]
    Json(#[from] serde_json::Error),
}
