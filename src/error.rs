//! Error types for the feature extraction engine

use thiserror::Error;

/// Result type alias for feature extraction operations
pub type Result<T> = std::result::Result<T, FeatureError>;

/// Main error type for the engine
///
/// Data-quality conditions (missing cells, degenerate statistics, invalid
/// tables) are never surfaced here; they produce null features or dropped
/// groups. These variants cover caller contract violations and genuinely
/// malformed inputs.
#[derive(Error, Debug)]
pub enum FeatureError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Length mismatch: column `{a_field}` has {a_len} values, column `{b_field}` has {b_len}")]
    LengthMismatch {
        a_field: String,
        b_field: String,
        a_len: usize,
        b_len: usize,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for FeatureError {
    fn from(err: serde_json::Error) -> Self {
        FeatureError::SerializationError(err.to_string())
    }
}
