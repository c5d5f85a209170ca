//! Error types for the ingestion pipeline.

use thiserror::Error;

/// Errors that can occur while resolving, fetching or persisting entries.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The requested date range is empty, reversed, or unparsable.
    #[error("invalid date range: {0}")]
    InvalidRange(String),

    /// The request could not be delivered on the final attempt.
    #[error("network error: {message}")]
    Network { message: String },

    /// The API answered with a non-retryable status or an unreadable body.
    #[error("API returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    /// Every attempt was rate limited or hit a server error.
    #[error("gave up after {attempts} attempts: {last_error}")]
    ExhaustedRetries { attempts: u32, last_error: String },

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    /// An error propagated from the store.
    #[error("database error: {0}")]
    Database(#[from] stargazer_core::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IngestError {
    /// Returns `true` when re-running the whole ingestion may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::ExhaustedRetries { .. })
    }

    /// Short name of the failure kind, for terminal error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRange(_) => "InvalidRange",
            Self::Network { .. } => "NetworkError",
            Self::Api { .. } => "ApiError",
            Self::ExhaustedRetries { .. } => "ExhaustedRetries",
            Self::Client(_) => "ClientError",
            Self::Database(_) => "DatabaseError",
            Self::Io(_) => "IoError",
            Self::Serialization(_) => "SerializationError",
        }
    }
}

/// Convenience alias for ingestion results.
pub type IngestResult<T> = std::result::Result<T, IngestError>;
