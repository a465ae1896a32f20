//! Minimal embedding example for remotelog-core
//!
//! Several tasks append signups and contact messages to the same in-memory
//! log at once. A custom backend wraps the memory store to add latency, so
//! writers overlap and some writes lose the version race and get retried.

use remotelog_core::traits::{Credentials, RemoteLog, RemoteObject, VersionToken};
use remotelog_core::{
    AppendConfig, AppendOrchestrator, AppendRequest, ContactMessage, DestinationConfig,
    MemoryRemoteLog, Outcome, RemoteError, Result, Signup,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::task::JoinSet;

/// Memory store with a fixed round-trip delay and a conflict counter
struct SlowRemoteLog {
    store: MemoryRemoteLog,
    delay: Duration,
    conflicts: AtomicUsize,
}

#[async_trait::async_trait]
impl RemoteLog for SlowRemoteLog {
    async fn get(
        &self,
        path: &str,
        credentials: &Credentials,
    ) -> std::result::Result<RemoteObject, RemoteError> {
        tokio::time::sleep(self.delay).await;
        self.store.get(path, credentials).await
    }

    async fn put(
        &self,
        path: &str,
        content: &[u8],
        expected: Option<&VersionToken>,
        message: &str,
        credentials: &Credentials,
    ) -> std::result::Result<VersionToken, RemoteError> {
        tokio::time::sleep(self.delay).await;
        let result = self
            .store
            .put(path, content, expected, message, credentials)
            .await;
        if result == Err(RemoteError::Conflict) {
            self.conflicts.fetch_add(1, Ordering::SeqCst);
        }
        result
    }

    fn backend_name(&self) -> &'static str {
        "slow-memory"
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .init();

    println!("=== Embedded remotelog-core Example ===\n");

    let store = MemoryRemoteLog::new();
    let backend = Arc::new(SlowRemoteLog {
        store: store.clone(),
        delay: Duration::from_millis(5),
        conflicts: AtomicUsize::new(0),
    });

    let destinations = DestinationConfig::default();
    let orchestrator = Arc::new(AppendOrchestrator::new(
        backend.clone(),
        AppendConfig {
            max_attempts: 10,
            deadline_secs: Some(10),
        },
    )?);
    let credentials = Credentials::new("demo-token");

    println!("1. Spawning 8 signup writers and 4 contact writers...");
    let mut tasks = JoinSet::new();

    for i in 0..8 {
        let orchestrator = Arc::clone(&orchestrator);
        let request = AppendRequest::for_record(
            destinations.signups_path.clone(),
            &Signup::now(format!("reader{}@example.com", i)),
            credentials.clone(),
        )?;
        tasks.spawn(async move { (request.path.clone(), orchestrator.append_line(&request).await) });
    }

    for i in 0..4 {
        let orchestrator = Arc::clone(&orchestrator);
        let message = ContactMessage::now(
            format!("Visitor {}", i),
            format!("visitor{}@example.com", i),
            "Hello,\nplease get in touch.",
        );
        let request = AppendRequest::for_record(
            destinations.contacts_path.clone(),
            &message,
            credentials.clone(),
        )?;
        tasks.spawn(async move { (request.path.clone(), orchestrator.append_line(&request).await) });
    }

    println!("2. Waiting for outcomes...\n");
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((path, Outcome::Success { new_version_token })) => {
                println!("   [ok]   {} -> version {}", path, new_version_token);
            }
            Ok((path, other)) => println!("   [fail] {} -> {:?}", path, other),
            Err(e) => println!("   [fail] task panicked: {}", e),
        }
    }

    println!(
        "\n3. {} write(s) lost a version race and were retried.\n",
        backend.conflicts.load(Ordering::SeqCst)
    );

    for path in [&destinations.signups_path, &destinations.contacts_path] {
        let content = store.contents(path).await.unwrap_or_default();
        println!("--- {} ---", path);
        print!("{}", String::from_utf8_lossy(&content));
    }

    println!("\n=== Embedding Successful ===");
    println!("Key Points:");
    println!("- No client-side locking; the store's version check orders writers");
    println!("- Each record is exactly one line, even with embedded newlines");
    println!("- Retry policy lives in the orchestrator, not the backend");

    Ok(())
}
