use thiserror::Error;

/// Main error type for the application.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found error.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input or data format.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (storage backend failures).
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for the application.
pub type Result<T> = std::result::Result<T, AppError>;
