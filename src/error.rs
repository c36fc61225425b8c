//! # Error Types
//!
//! Custom error types for GPS Bridge using `thiserror`.

use thiserror::Error;

/// Main error type for GPS Bridge
#[derive(Debug, Error)]
pub enum GpsBridgeError {
    /// A submitted sample is missing a required field or carries a
    /// non-numeric value; the submission is rejected as a whole
    #[error("validation error: {0}")]
    Validation(String),

    /// The record log could not be written or read
    #[error("storage error: {0}")]
    Storage(String),

    /// A raw line from the side channel is not valid JSON
    #[error("parse error: {0}")]
    Parse(String),

    /// A parsed sample could not be handed off to the store
    #[error("transport error: {0}")]
    Transport(String),

    /// The export artifact was requested before any export has run
    #[error("not found: {0}")]
    NotFound(String),

    /// Serial port errors
    #[error("serial error: {0}")]
    Serial(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for GPS Bridge
pub type Result<T> = std::result::Result<T, GpsBridgeError>;
