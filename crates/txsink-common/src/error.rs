//! Error types for txsink

use thiserror::Error;

/// Result type alias for txsink operations
pub type Result<T> = std::result::Result<T, TxSinkError>;

/// Main error type for txsink
#[derive(Error, Debug)]
pub enum TxSinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
