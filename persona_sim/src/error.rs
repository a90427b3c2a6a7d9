//! Simulation harness errors.

use persona_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] CoreError),

    #[error("Export failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}
