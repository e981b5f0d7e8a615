//! Error types for paperforge.

use thiserror::Error;

/// Result type alias using paperforge's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for paperforge operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Document not found
    #[error("Document not found: {0}")]
    DocumentNotFound(uuid::Uuid),

    /// Embedding or generation backend could not be reached or loaded.
    /// Fatal for the current job, non-fatal for the process.
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// External provider call exceeded its deadline
    #[error("Timeout after {0:?}")]
    Timeout(std::time::Duration),

    /// External provider returned a non-success response
    #[error("Provider error: {0}")]
    ProviderError(String),

    /// Provider returned a response with no usable choices
    #[error("Empty response from provider")]
    EmptyResponse,

    /// Fewer structural items recovered than the acceptable threshold
    #[error("Insufficient yield: got {got}, need at least {need}")]
    InsufficientYield { got: usize, need: usize },

    /// Vector index and metadata store ids are misaligned.
    /// Must never be silently tolerated.
    #[error("Store skew: {0}")]
    StoreSkew(String),

    /// Job lifecycle error
    #[error("Job error: {0}")]
    Job(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            // reqwest does not expose the configured duration here; callers
            // that know their deadline construct Error::Timeout directly.
            Error::Timeout(std::time::Duration::ZERO)
        } else if e.is_connect() {
            Error::ProviderUnavailable(e.to_string())
        } else {
            Error::Request(e.to_string())
        }
    }
}

impl Error {
    /// Whether a generation-side pipeline may skip the current source and
    /// continue with the remaining ones.
    pub fn is_source_skippable(&self) -> bool {
        matches!(
            self,
            Error::Timeout(_) | Error::ProviderError(_) | Error::EmptyResponse
        )
    }
}
