//! Error types for the oracle abstraction.

use thiserror::Error;

/// Errors a single oracle call can fail with.
///
/// None of these are retried inside the engine.
#[derive(Debug, Error)]
pub enum OracleError {
    /// Network send/receive failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// Rate limit or quota exhausted
    #[error("Quota exceeded: {0}")]
    Quota(String),

    /// Call did not finish in time
    #[error("Timeout after {0}ms")]
    Timeout(u64),

    /// Service refused or is not configured
    #[error("Oracle unavailable: {0}")]
    Unavailable(String),
}

impl OracleError {
    /// Creates a transport error.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Creates an unavailable error.
    pub fn unavailable(msg: impl std::fmt::Display) -> Self {
        Self::Unavailable(msg.to_string())
    }
}
