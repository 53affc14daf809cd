//! Common error types for the recipe audit services

use thiserror::Error;

/// Common result type for recipe audit operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across recipe audit services
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
