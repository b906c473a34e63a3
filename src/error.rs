//! Error types for cache operations
//!
//! Backend failures (I/O, Redis) are wrapped but never reinterpreted: the
//! tag layer hands them back to the caller exactly as the store raised them.
//! A missing key is not an error anywhere in this crate.

use thiserror::Error;

/// Main error type for cache operations
#[derive(Error, Debug)]
pub enum CacheError {
    /// Configuration error - unknown driver, serializer or store name
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The backend does not implement the requested store operation
    #[error("Operation not implemented by the {store} store: {operation}")]
    NotImplemented {
        store: &'static str,
        operation: &'static str,
    },

    /// Serialization/Deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A stored value cannot be used for the requested operation
    #[error("Invalid value for key {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    /// Filesystem error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Redis driver error (wrapper)
    #[cfg(feature = "redis")]
    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    /// Generic error with context
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

impl From<String> for CacheError {
    fn from(s: String) -> Self {
        CacheError::Other(s)
    }
}

impl From<&str> for CacheError {
    fn from(s: &str) -> Self {
        CacheError::Other(s.to_string())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(e: serde_json::Error) -> Self {
        CacheError::SerializationError(e.to_string())
    }
}
