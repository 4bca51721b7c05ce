// Error types for ghusers.
// Covers the remote user source, the cache store, and input validation.

use reqwest::StatusCode;
use thiserror::Error;

/// Coarse error category surfaced to callers that render failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transport failure, timeout, or non-2xx response.
    Network,
    /// Response body did not match the expected shape.
    Decode,
    /// Local persistence failure.
    Storage,
    /// Missing or empty required input.
    InvalidInput,
}

impl ErrorKind {
    pub fn label(&self) -> &'static str {
        match self {
            ErrorKind::Network => "network error",
            ErrorKind::Decode => "decode error",
            ErrorKind::Storage => "storage error",
            ErrorKind::InvalidInput => "invalid input",
        }
    }
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("GitHub request failed: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Authentication failed: invalid or expired token")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded, resets at {reset_at}")]
    RateLimited { reset_at: String },

    #[error("HTTP {status}: {body}")]
    Http { status: StatusCode, body: String },

    #[error("Unexpected response shape: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl SyncError {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::Network(e) if e.is_decode() => ErrorKind::Decode,
            SyncError::Network(_)
            | SyncError::Unauthorized
            | SyncError::NotFound(_)
            | SyncError::RateLimited { .. }
            | SyncError::Http { .. } => ErrorKind::Network,
            SyncError::Decode(_) => ErrorKind::Decode,
            SyncError::Io(_) | SyncError::Storage(_) => ErrorKind::Storage,
            SyncError::InvalidInput(_) => ErrorKind::InvalidInput,
        }
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(e: reqwest::Error) -> Self {
        SyncError::Network(e)
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
