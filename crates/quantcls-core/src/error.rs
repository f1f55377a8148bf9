//! Error types for the classification demo.

use thiserror::Error;

/// Main error type for the workspace.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// PPM image decoding or preprocessing error
    #[error("Image error: {0}")]
    Ppm(String),

    /// Dynamic-range file error
    #[error("Dynamic range error: {0}")]
    Ranges(String),

    /// Reference-label file error
    #[error("Reference labels error: {0}")]
    Labels(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid argument error
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A required file could not be located
    #[error("Not found: {0}")]
    NotFound(String),

    /// Inference engine build or execution error
    #[error("Engine error: {0}")]
    Engine(String),

    /// The platform lacks a required hardware capability
    #[error("Unsupported platform: {0}")]
    Unsupported(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Specialized Result type for classification demo operations.
pub type Result<T> = std::result::Result<T, Error>;
