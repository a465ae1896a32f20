// # Remote Log Trait
//
// Defines the interface to a remote, versioned log object.
//
// The remote store has no native append. Appends are built on top of two
// primitives: fetch the whole object with its version token, and write a
// whole new object conditioned on the token that was read.
//
// ## Implementations
//
// - GitHub contents API: `remotelog-github` crate
// - In-memory: [`crate::store::MemoryRemoteLog`]
//
// ## Usage
//
// ```rust,ignore
// use remotelog_core::traits::{Credentials, RemoteLog};
//
// let object = backend.get("email.txt", &credentials).await?;
// let token = backend
//     .put("email.txt", b"a\n", object.version_token.as_ref(), "Add a", &credentials)
//     .await?;
// ```

use async_trait::async_trait;
use std::fmt;

use crate::error::RemoteError;

/// Opaque identifier of one observed state of a remote object
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionToken(String);

impl VersionToken {
    /// Wrap a backend-issued token
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token as the backend issued it
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VersionToken {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

/// Full state of a remote log object at one instant
///
/// `version_token` is present iff `exists`. Snapshots are read fresh for
/// every attempt and never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteObject {
    /// Whether the object exists remotely
    pub exists: bool,
    /// Raw (decoded) content
    pub content: Vec<u8>,
    /// Token of the observed state
    pub version_token: Option<VersionToken>,
}

impl RemoteObject {
    /// An object that does not exist yet
    pub fn absent() -> Self {
        Self {
            exists: false,
            content: Vec::new(),
            version_token: None,
        }
    }

    /// An existing object with its current token
    pub fn present(content: impl Into<Vec<u8>>, version_token: VersionToken) -> Self {
        Self {
            exists: true,
            content: content.into(),
            version_token: Some(version_token),
        }
    }
}

/// API credentials for a remote log backend
///
/// The `Debug` implementation never prints the secret.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// ⚠️ NEVER log this value
    token: String,
}

impl Credentials {
    /// Wrap an API token
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Credentials that disable remote appends
    pub fn none() -> Self {
        Self::default()
    }

    /// True when no usable token is present
    pub fn is_empty(&self) -> bool {
        self.token.trim().is_empty()
    }

    /// The secret token, for building request headers only
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown = if self.is_empty() { "<EMPTY>" } else { "<REDACTED>" };
        f.debug_struct("Credentials").field("token", &shown).finish()
    }
}

/// Trait for remote log backends
///
/// # Contract
///
/// - Each call performs exactly one round trip to the remote system.
/// - No internal retries, backoff or caching. Retry policy is owned by
///   [`AppendOrchestrator`](crate::orchestrator::AppendOrchestrator).
/// - Every failure is mapped onto [`RemoteError`] before returning; raw
///   transport errors never escape.
///
/// # Thread Safety
///
/// Implementations must be usable concurrently from many tasks.
#[async_trait]
pub trait RemoteLog: Send + Sync {
    /// Fetch the current state of the object at `path`
    ///
    /// A missing object is not an error: it yields [`RemoteObject::absent()`].
    ///
    /// # Returns
    ///
    /// - `Ok(RemoteObject)`: current content and token, or absent
    /// - `Err(RemoteError::Auth)`: credentials rejected
    /// - `Err(RemoteError::Transient)`: transport failure, unexpected status
    ///   or malformed content
    async fn get(
        &self,
        path: &str,
        credentials: &Credentials,
    ) -> Result<RemoteObject, RemoteError>;

    /// Replace the object at `path` with `content`, conditioned on `expected`
    ///
    /// `expected = None` means "create only if absent". A live token that
    /// differs from `expected` must yield `RemoteError::Conflict`, never a
    /// silent overwrite.
    ///
    /// # Parameters
    ///
    /// - `path`: object path
    /// - `content`: complete new content (raw bytes)
    /// - `expected`: token observed by the preceding `get`
    /// - `message`: change description recorded by the remote (commit message)
    /// - `credentials`: API credentials
    ///
    /// # Returns
    ///
    /// The token of the newly written state.
    async fn put(
        &self,
        path: &str,
        content: &[u8],
        expected: Option<&VersionToken>,
        message: &str,
        credentials: &Credentials,
    ) -> Result<VersionToken, RemoteError>;

    /// Backend name (for logging/debugging)
    fn backend_name(&self) -> &'static str;
}

/// Helper trait for constructing backends from configuration
pub trait RemoteLogFactory: Send + Sync {
    /// Create a backend from its configuration
    fn create(
        &self,
        config: &crate::config::BackendConfig,
    ) -> Result<std::sync::Arc<dyn RemoteLog>, crate::Error>;
}
