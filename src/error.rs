use thiserror::Error;

/// Main error type for logsmith
#[derive(Debug, Error)]
pub enum LogsmithError {
    // Setup errors
    #[error("Failed to create log directory: {0}")]
    DirectoryError(String),

    #[error("Failed to open log file: {0}")]
    FileError(String),

    #[error("Log rotation failed: {0}")]
    RotationError(String),

    // Emit-time errors
    #[error("Invalid log format: {0}")]
    FormatError(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid configuration file: {0}")]
    InvalidConfig(String),

    // IO errors (automatically converted from std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for logsmith operations
pub type Result<T> = std::result::Result<T, LogsmithError>;
