//! Error types for the freshness cache

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when fetching a collection from the remote source
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The host could not be reached at all
    #[error("No internet connection. Please check your network and try again.")]
    NoConnectivity,

    /// The server answered with a non-success status code
    #[error("Server error (Code: {status}). Please try again later.")]
    Server { status: u16 },

    /// The response body could not be decoded
    #[error("Data error: {0}")]
    Decode(String),

    /// Any other transport failure, including request timeouts
    #[error("Network error: {0}")]
    Transport(String),
}

/// Errors that can occur when reading or writing the local store
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Filesystem operation failed
    #[error("Cache I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The collection could not be serialized
    #[error("Failed to serialize cache contents: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The persisted document exists but cannot be parsed
    #[error("Corrupt cache file at {}: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors surfaced by the read-through cache
#[derive(Debug, Error)]
pub enum CacheError {
    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Stable classification of a [`CacheError`]
///
/// Presentation code picks copy and retry affordances from this value rather
/// than from the error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NoConnectivity,
    Server,
    Decode,
    Transport,
    Persistence,
}

impl ErrorKind {
    /// Whether retrying the same call later can reasonably succeed
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            ErrorKind::NoConnectivity | ErrorKind::Server | ErrorKind::Transport
        )
    }
}

impl NetworkError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            NetworkError::NoConnectivity => ErrorKind::NoConnectivity,
            NetworkError::Server { .. } => ErrorKind::Server,
            NetworkError::Decode(_) => ErrorKind::Decode,
            NetworkError::Transport(_) => ErrorKind::Transport,
        }
    }
}

impl CacheError {
    /// Returns the stable kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            CacheError::Network(err) => err.kind(),
            CacheError::Persistence(_) => ErrorKind::Persistence,
        }
    }

    /// Returns a short hint telling the user what to do next
    pub fn recovery_suggestion(&self) -> &'static str {
        match self.kind() {
            ErrorKind::NoConnectivity => "Check your internet connection and try again.",
            ErrorKind::Server => {
                "The server is experiencing issues. Please try again in a few minutes."
            }
            ErrorKind::Persistence => {
                "The local cache could not be written. Check permissions on the cache directory."
            }
            ErrorKind::Decode | ErrorKind::Transport => {
                "Please try again. If the problem persists, contact support."
            }
        }
    }
}
