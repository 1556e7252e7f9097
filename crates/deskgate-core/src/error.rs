//! Error types for the desk core

use thiserror::Error;

pub use crate::auth::AuthError;

/// Result type alias for gate and registry operations
pub type Result<T> = std::result::Result<T, AuthError>;

/// Result type alias for key-value store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors raised by the persistence provider
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored record could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Key contains characters the store cannot map to a record
    #[error("Invalid store key: {0}")]
    InvalidKey(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Errors raised while loading desk configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed TOML
    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),
}
