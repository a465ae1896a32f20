//! Test doubles and common utilities for append contract tests
//!
//! These doubles count round trips and replay scripted responses so tests
//! can assert exactly how the orchestrator drives a backend.

#![allow(dead_code)]

use remotelog_core::traits::{Credentials, RemoteLog, RemoteObject, VersionToken};
use remotelog_core::{AppendConfig, AppendOrchestrator, MemoryRemoteLog, RemoteError};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One observed `put` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedPut {
    pub path: String,
    pub content: Vec<u8>,
    pub expected: Option<VersionToken>,
    pub message: String,
}

/// A backend that replays scripted responses and counts calls
///
/// When a script runs dry, `get` returns an absent object and `put` fails
/// transiently, so an unexpected extra round trip is visible in the outcome.
#[derive(Default)]
pub struct ScriptedRemoteLog {
    gets: Mutex<VecDeque<Result<RemoteObject, RemoteError>>>,
    puts: Mutex<VecDeque<Result<VersionToken, RemoteError>>>,
    get_call_count: AtomicUsize,
    put_call_count: AtomicUsize,
    recorded_puts: Mutex<Vec<RecordedPut>>,
    delay: Option<Duration>,
}

impl ScriptedRemoteLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for the next `get`
    pub fn on_get(self, response: Result<RemoteObject, RemoteError>) -> Self {
        self.gets.lock().unwrap().push_back(response);
        self
    }

    /// Queue a response for the next `put`
    pub fn on_put(self, response: Result<VersionToken, RemoteError>) -> Self {
        self.puts.lock().unwrap().push_back(response);
        self
    }

    /// Sleep this long inside every call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Get the number of times get() was called
    pub fn get_call_count(&self) -> usize {
        self.get_call_count.load(Ordering::SeqCst)
    }

    /// Get the number of times put() was called
    pub fn put_call_count(&self) -> usize {
        self.put_call_count.load(Ordering::SeqCst)
    }

    /// Every put() call, in order
    pub fn recorded_puts(&self) -> Vec<RecordedPut> {
        self.recorded_puts.lock().unwrap().clone()
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait::async_trait]
impl RemoteLog for ScriptedRemoteLog {
    async fn get(
        &self,
        _path: &str,
        _credentials: &Credentials,
    ) -> Result<RemoteObject, RemoteError> {
        self.get_call_count.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        self.gets
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(RemoteObject::absent()))
    }

    async fn put(
        &self,
        path: &str,
        content: &[u8],
        expected: Option<&VersionToken>,
        message: &str,
        _credentials: &Credentials,
    ) -> Result<VersionToken, RemoteError> {
        self.put_call_count.fetch_add(1, Ordering::SeqCst);
        self.recorded_puts.lock().unwrap().push(RecordedPut {
            path: path.to_string(),
            content: content.to_vec(),
            expected: expected.cloned(),
            message: message.to_string(),
        });
        self.pause().await;
        self.puts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(RemoteError::transient("put script exhausted")))
    }

    fn backend_name(&self) -> &'static str {
        "scripted"
    }
}

/// A memory backend where another writer sneaks in after each of the first
/// `interference` reads, so the following conditional write goes stale
pub struct InterferingRemoteLog {
    pub store: MemoryRemoteLog,
    interference: AtomicUsize,
    rival_line: String,
}

impl InterferingRemoteLog {
    pub fn new(store: MemoryRemoteLog, interference: usize, rival_line: &str) -> Self {
        Self {
            store,
            interference: AtomicUsize::new(interference),
            rival_line: rival_line.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl RemoteLog for InterferingRemoteLog {
    async fn get(
        &self,
        path: &str,
        credentials: &Credentials,
    ) -> Result<RemoteObject, RemoteError> {
        let snapshot = self.store.get(path, credentials).await?;

        let remaining = self.interference.load(Ordering::SeqCst);
        if remaining > 0 {
            self.interference.store(remaining - 1, Ordering::SeqCst);
            let rival = remotelog_core::codec::append_to(&snapshot.content, &self.rival_line);
            self.store
                .put(path, &rival, snapshot.version_token.as_ref(), "rival", credentials)
                .await?;
        }

        Ok(snapshot)
    }

    async fn put(
        &self,
        path: &str,
        content: &[u8],
        expected: Option<&VersionToken>,
        message: &str,
        credentials: &Credentials,
    ) -> Result<VersionToken, RemoteError> {
        self.store.put(path, content, expected, message, credentials).await
    }

    fn backend_name(&self) -> &'static str {
        "interfering"
    }
}

/// A memory backend that yields to the scheduler between round trips,
/// widening the window for concurrent writers to collide
pub struct YieldingRemoteLog {
    pub store: MemoryRemoteLog,
}

#[async_trait::async_trait]
impl RemoteLog for YieldingRemoteLog {
    async fn get(
        &self,
        path: &str,
        credentials: &Credentials,
    ) -> Result<RemoteObject, RemoteError> {
        let object = self.store.get(path, credentials).await;
        tokio::task::yield_now().await;
        object
    }

    async fn put(
        &self,
        path: &str,
        content: &[u8],
        expected: Option<&VersionToken>,
        message: &str,
        credentials: &Credentials,
    ) -> Result<VersionToken, RemoteError> {
        tokio::task::yield_now().await;
        self.store.put(path, content, expected, message, credentials).await
    }

    fn backend_name(&self) -> &'static str {
        "yielding"
    }
}

/// Credentials accepted by every double
pub fn test_credentials() -> Credentials {
    Credentials::new("test-token")
}

/// Orchestrator with default settings over a shared backend
pub fn orchestrator_for(backend: Arc<dyn RemoteLog>) -> AppendOrchestrator {
    AppendOrchestrator::new(backend, AppendConfig::default())
        .expect("default append config is valid")
}

pub fn token(value: &str) -> VersionToken {
    VersionToken::new(value)
}
