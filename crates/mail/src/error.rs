//! Error types for the mail core
//!
//! Every fallible operation in this crate returns [`Result`]. Nothing in the
//! core terminates the process; callers decide how failures are surfaced.

use std::path::PathBuf;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the mail core
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Network failure or unexpected HTTP status
    #[error("Transport error: {0}")]
    Transport(String),

    /// A remote call exceeded its per-call timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Credential was rejected (expired or revoked)
    #[error("Authorization failed (HTTP {status})")]
    Auth { status: u16 },

    /// Remote service asked us to slow down
    #[error("Rate limited by remote service")]
    RateLimited,

    /// Response could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// A page request is already in flight
    #[error("Navigation busy: a page request is already in flight")]
    Busy,

    /// The operation was cancelled before it completed
    #[error("Operation cancelled")]
    Cancelled,

    /// No credential file exists yet
    #[error("No stored credential at {}", .0.display())]
    CredentialNotFound(PathBuf),

    /// The credential file exists but could not be parsed
    #[error("Stored credential at {} is corrupt: {source}", path.display())]
    CredentialCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The detail worker pool could not be started
    #[error("Worker pool error: {0}")]
    WorkerPool(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Coarse classification of [`Error`] values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Auth,
    Decode,
    Navigation,
    Storage,
    Config,
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Transport(_) | Error::Timeout(_) | Error::RateLimited | Error::Cancelled => {
                ErrorKind::Transport
            }
            Error::Auth { .. } => ErrorKind::Auth,
            Error::Decode(_) => ErrorKind::Decode,
            Error::Busy => ErrorKind::Navigation,
            Error::CredentialNotFound(_) | Error::CredentialCorrupt { .. } | Error::Io(_) => {
                ErrorKind::Storage
            }
            Error::WorkerPool(_) | Error::InvalidConfig(_) => ErrorKind::Config,
        }
    }

    /// True when the caller must run the authorization flow again
    pub fn requires_authorization(&self) -> bool {
        matches!(
            self,
            Error::Auth { .. } | Error::CredentialNotFound(_) | Error::CredentialCorrupt { .. }
        )
    }

    /// True for failures where retrying the same request later may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Transport(_) | Error::Timeout(_) | Error::RateLimited
        )
    }
}
