//! Error types for streaming feature extraction.

use thiserror::Error;

/// Error type for feature extraction operations.
///
/// Configuration problems surface when a transformer is built. Field problems
/// surface per sample and never touch any accumulator. A statistic without
/// enough history is not an error: it is reported as `None`.
#[derive(Debug, Error)]
pub enum FeatureError {
    /// Invalid transformer configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// A sample lacks a field needed for its key or value.
    #[error("Missing field: {field}")]
    MissingField { field: String },
    /// A value field holds something that is not a number.
    #[error("Non-numeric field: {field}")]
    NonNumericField { field: String },
    /// A supervised step was updated without a target.
    #[error("Missing target: {0}")]
    MissingTarget(String),
    /// Serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// I/O error during checkpoint file operations.
    #[error("I/O error: {0}")]
    Io(String),
}

impl FeatureError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        FeatureError::Configuration(msg.into())
    }

    pub(crate) fn missing(field: &str) -> Self {
        FeatureError::MissingField {
            field: field.to_string(),
        }
    }
}

impl From<std::io::Error> for FeatureError {
    fn from(err: std::io::Error) -> Self {
        FeatureError::Io(err.to_string())
    }
}

impl From<bincode::Error> for FeatureError {
    fn from(err: bincode::Error) -> Self {
        FeatureError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for FeatureError {
    fn from(err: serde_json::Error) -> Self {
        FeatureError::Serialization(err.to_string())
    }
}
