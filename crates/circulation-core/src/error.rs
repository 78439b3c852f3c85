//! Error types for circulation core operations.
//!
//! Domain refusals (unknown member, no copies left, ...) are not errors; they
//! are reported through the outcome types in [`crate::library`]. The variants
//! here cover bad arguments and conditions the caller has to act on, such as
//! a save that did not reach disk.

use thiserror::Error;

/// Result type alias for circulation operations.
pub type Result<T> = std::result::Result<T, CirculationError>;

/// Core error type for circulation operations.
#[derive(Debug, Error)]
pub enum CirculationError {
    /// Argument validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// State could not be written to (or read from) durable storage.
    ///
    /// When returned from a mutating call, the in-memory change has already
    /// been applied; only durability is unconfirmed.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Store invariants do not hold
    #[error("Integrity error: {0}")]
    Integrity(String),

    /// Configuration could not be read or parsed
    #[error("Config error: {0}")]
    Config(String),
}

impl From<std::io::Error> for CirculationError {
    fn from(err: std::io::Error) -> Self {
        CirculationError::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for CirculationError {
    fn from(err: serde_json::Error) -> Self {
        CirculationError::Persistence(err.to_string())
    }
}
