//! Error types for the continuity engine.
//!
//! Ingestion and reporting have almost no failure modes; most errors come
//! from loading persisted state that does not match the expected shape.

use thiserror::Error;

/// Errors from continuity engine operations.
#[derive(Debug, Error)]
pub enum ContinuityError {
    /// A required identifier was empty.
    #[error("Identifier `{field}` must not be empty")]
    EmptyIdentifier { field: &'static str },

    /// Malformed structured input (bad timestamp, unknown enum tag, unknown field).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Persisted data was written by an incompatible format version.
    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },

    /// A save parsed cleanly but its records are inconsistent.
    #[error("Invalid save: {0}")]
    InvalidSave(String),

    /// A tracker configuration value is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for convenience.
pub type Result<T> = std::result::Result<T, ContinuityError>;
