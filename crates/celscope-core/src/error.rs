//! Error types for celscope-rs.

use thiserror::Error;

/// The main error type for celscope-rs operations.
#[derive(Error, Debug)]
pub enum CelscopeError {
    /// A model file could not be loaded or parsed.
    #[error("model load error: {0}")]
    ModelLoad(String),

    /// Geometry arrays passed to a mesh have inconsistent lengths.
    #[error("data size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// Rendering error surfaced from the backend.
    #[error("render error: {0}")]
    Render(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A specialized Result type for celscope-rs operations.
pub type Result<T> = std::result::Result<T, CelscopeError>;
