// Error handling module
// Defines the library-level error taxonomy. Per-call failures never surface
// here: they are classified into `CallOutcome::Failed` by the executor.

use thiserror::Error;

/// Errors that can abort benchmark setup or report persistence
#[derive(Error, Debug)]
pub enum BenchError {
    /// Configuration error (missing credentials, bad iteration count, ...)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Credential could not be turned into a header value
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Endpoint address could not be parsed
    #[error("Invalid endpoint address: {0}")]
    InvalidAddress(String),

    /// HTTP client construction failed
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Report could not be written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Report could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for library operations
pub type Result<T> = std::result::Result<T, BenchError>;
