//! Error types for the drill_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for drill_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration error (including an empty practice queue)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed exercise descriptor
    #[error("Invalid exercise: {0}")]
    InvalidExercise(String),

    /// Operation not allowed in the current runner/session state
    #[error("State error: {0}")]
    State(String),

    /// Visualization failed to load or initialize
    #[error("Visualization error: {0}")]
    Visualization(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
