//! Engine error types.

use persona_env::OracleError;
use thiserror::Error;

/// A reply that does not match its schema.
///
/// Raised at the parsing boundary so bad data never turns into silently
/// wrong numbers further in.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Malformed JSON: {0}")]
    Malformed(String),

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Field {field} = {value} outside [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Unparsable vote reply: {0:?}")]
    Vote(String),
}

impl From<serde_json::Error> for SchemaError {
    fn from(err: serde_json::Error) -> Self {
        SchemaError::Malformed(err.to_string())
    }
}

/// Errors surfaced by the engine's public operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// The explicit "no data" signal for empty reaction sets
    #[error("No reactions to aggregate")]
    NoReactions,

    #[error("Reaction references unknown persona: {0}")]
    UnknownPersona(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
