//! Error types for the visualisation core

use thiserror::Error;

/// Errors surfaced by scene, emitter and snapshot operations.
///
/// Lookup failures are recoverable: the operation that raised them did not
/// change any state.
#[derive(Debug, Error)]
pub enum VisualisationError {
    #[error("No emitter with id {0}")]
    EmitterNotFound(String),
    #[error("No molecule with id {molecule} in emitter {emitter}")]
    MoleculeNotFound { emitter: String, molecule: String },
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = VisualisationError> = std::result::Result<T, E>;
