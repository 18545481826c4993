//! Error types for the clustering engine.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClusterMapError {
    /// Invalid index or viewport configuration. The build that hit it produced nothing.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// Malformed fly-to-bounds request; the viewport keeps its previous state.
    #[error("Invalid bounds: {0}")]
    InvalidBounds(String),
    #[error("Unknown cluster id: {0}")]
    UnknownCluster(u64),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("TOML error: {0}")]
    Toml(String),
}

pub type Result<T> = std::result::Result<T, ClusterMapError>;
