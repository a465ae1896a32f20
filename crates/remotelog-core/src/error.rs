//! Error types for remotelog
//!
//! Two layers live here:
//! - [`Error`]: crate-level failures (configuration, registry, record formatting)
//! - [`RemoteError`]: the closed set of failures a [`RemoteLog`](crate::traits::RemoteLog)
//!   backend may report for a single round trip

use thiserror::Error;

/// Result type alias for remotelog operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for remotelog
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Transport content could not be decoded
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// A remote round trip failed
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Backend-specific error
    #[error("Backend error ({backend}): {message}")]
    Backend {
        /// Backend name
        backend: String,
        /// Error message
        message: String,
    },

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a backend-specific error
    pub fn backend(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            backend: backend.into(),
            message: message.into(),
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

/// Failure of a single `get` or `put` against a remote log object
///
/// Backends must map every transport outcome onto one of these variants;
/// callers never re-parse status codes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The conditional write was rejected because the live version token differs
    #[error("version conflict: remote object changed since it was read")]
    Conflict,

    /// Credentials were rejected; never retryable
    #[error("authorization rejected: {0}")]
    Auth(String),

    /// Network failure, unexpected status, or malformed remote content
    #[error("transient failure: {0}")]
    Transient(String),
}

impl RemoteError {
    /// Create an authorization error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    /// Create a transient error
    pub fn transient(msg: impl Into<String>) -> Self {
        Self::Transient(msg.into())
    }
}

/// Malformed remote content is an unexpected remote-side state
impl From<DecodeError> for RemoteError {
    fn from(err: DecodeError) -> Self {
        Self::Transient(err.to_string())
    }
}

/// Transport content is not valid base64
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed transport content: {0}")]
pub struct DecodeError(#[from] base64::DecodeError);
