// # Memory Remote Log
//
// In-process implementation of RemoteLog with real conditional-write
// semantics.
//
// ## Purpose
//
// Behaves like a versioned remote object store without the network:
// - every successful write issues a fresh version token
// - writes carrying a stale token (or no token for an existing object) are
//   rejected with `RemoteError::Conflict`
// - an optional required token makes credential checks observable
//
// ## When to Use
//
// - Testing the append path under contention
// - Embedding without a remote, where losing the log on restart is fine

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::config::BackendConfig;
use crate::error::RemoteError;
use crate::traits::{Credentials, RemoteLog, RemoteLogFactory, RemoteObject, VersionToken};

#[derive(Debug, Clone)]
struct StoredObject {
    content: Vec<u8>,
    token: VersionToken,
}

#[derive(Debug, Default)]
struct Objects {
    by_path: HashMap<String, StoredObject>,
    next_version: u64,
}

impl Objects {
    fn issue_token(&mut self) -> VersionToken {
        self.next_version += 1;
        VersionToken::new(format!("v{}", self.next_version))
    }
}

/// In-memory versioned object store
///
/// Clones share the same objects.
///
/// # Example
///
/// ```rust,no_run
/// use remotelog_core::store::MemoryRemoteLog;
/// use remotelog_core::traits::{Credentials, RemoteLog};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryRemoteLog::new();
///     let creds = Credentials::new("local");
///
///     let object = store.get("email.txt", &creds).await?;
///     assert!(!object.exists);
///
///     store.put("email.txt", b"a\n", None, "Add a", &creds).await?;
///     assert_eq!(store.contents("email.txt").await, Some(b"a\n".to_vec()));
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryRemoteLog {
    inner: Arc<RwLock<Objects>>,
    required_token: Option<String>,
}

impl MemoryRemoteLog {
    /// Create a new empty store that accepts any credentials
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every call whose credentials do not carry `token`
    pub fn with_required_token(mut self, token: impl Into<String>) -> Self {
        self.required_token = Some(token.into());
        self
    }

    /// Store `content` at `path` unconditionally, returning its token
    pub async fn seed(&self, path: &str, content: impl Into<Vec<u8>>) -> VersionToken {
        let mut guard = self.inner.write().await;
        let token = guard.issue_token();
        guard.by_path.insert(
            path.to_string(),
            StoredObject {
                content: content.into(),
                token: token.clone(),
            },
        );
        token
    }

    /// Current content at `path`, if any
    pub async fn contents(&self, path: &str) -> Option<Vec<u8>> {
        self.inner
            .read()
            .await
            .by_path
            .get(path)
            .map(|object| object.content.clone())
    }

    /// Current token at `path`, if any
    pub async fn version_token(&self, path: &str) -> Option<VersionToken> {
        self.inner
            .read()
            .await
            .by_path
            .get(path)
            .map(|object| object.token.clone())
    }

    /// Get the number of objects in the store
    pub async fn len(&self) -> usize {
        self.inner.read().await.by_path.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.by_path.is_empty()
    }

    fn authorize(&self, credentials: &Credentials) -> Result<(), RemoteError> {
        match &self.required_token {
            Some(required) if credentials.token() != required => {
                Err(RemoteError::auth("memory store rejected credentials"))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl RemoteLog for MemoryRemoteLog {
    async fn get(
        &self,
        path: &str,
        credentials: &Credentials,
    ) -> Result<RemoteObject, RemoteError> {
        self.authorize(credentials)?;

        let guard = self.inner.read().await;
        Ok(match guard.by_path.get(path) {
            Some(object) => RemoteObject::present(object.content.clone(), object.token.clone()),
            None => RemoteObject::absent(),
        })
    }

    async fn put(
        &self,
        path: &str,
        content: &[u8],
        expected: Option<&VersionToken>,
        _message: &str,
        credentials: &Credentials,
    ) -> Result<VersionToken, RemoteError> {
        self.authorize(credentials)?;

        let mut guard = self.inner.write().await;
        let live = guard.by_path.get(path).map(|object| &object.token);
        if live != expected {
            return Err(RemoteError::Conflict);
        }

        let token = guard.issue_token();
        guard.by_path.insert(
            path.to_string(),
            StoredObject {
                content: content.to_vec(),
                token: token.clone(),
            },
        );
        Ok(token)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// Factory for creating memory backends
pub struct MemoryRemoteLogFactory;

impl RemoteLogFactory for MemoryRemoteLogFactory {
    fn create(&self, config: &BackendConfig) -> crate::Result<Arc<dyn RemoteLog>> {
        match config {
            BackendConfig::Memory => Ok(Arc::new(MemoryRemoteLog::new())),
            _ => Err(crate::Error::config("Invalid config for memory backend")),
        }
    }
}
