//! Contract Test: No Loss Under Contention
//!
//! Constraints verified:
//! - N concurrent appends with an unlimited budget yield exactly N lines
//! - Each line appears exactly once, regardless of ordering
//! - No client-side locking is needed; the backend's version check suffices
//!
//! If this test fails, concurrent writers can overwrite each other.

mod common;

use common::*;
use remotelog_core::{AppendRequest, MemoryRemoteLog, Outcome, RemoteLog};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::task::JoinSet;

async fn run_concurrent_appends(backend: Arc<dyn RemoteLog>, writers: usize) -> Vec<Outcome> {
    let orchestrator = Arc::new(orchestrator_for(backend));
    let mut tasks = JoinSet::new();

    for i in 0..writers {
        let orchestrator = Arc::clone(&orchestrator);
        tasks.spawn(async move {
            let request = AppendRequest::new(
                "email.txt",
                format!("writer-{}@x.com,2024-01-01T00:00:00Z", i),
                format!("writer-{}@x.com", i),
                test_credentials(),
            );
            orchestrator.append_line_with_attempts(&request, usize::MAX).await
        });
    }

    let mut outcomes = Vec::with_capacity(writers);
    while let Some(joined) = tasks.join_next().await {
        outcomes.push(joined.expect("append task panicked"));
    }
    outcomes
}

fn assert_each_line_once(content: &[u8], writers: usize) {
    let text = std::str::from_utf8(content).expect("log is utf-8");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), writers, "expected {} lines, got {:?}", writers, lines);

    let unique: HashSet<&str> = lines.iter().copied().collect();
    assert_eq!(unique.len(), writers, "duplicate lines in {:?}", lines);

    for i in 0..writers {
        let line = format!("writer-{}@x.com,2024-01-01T00:00:00Z", i);
        assert!(unique.contains(line.as_str()), "missing {}", line);
    }
    assert!(text.ends_with('\n'));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_appends_lose_nothing() {
    const WRITERS: usize = 32;

    let store = MemoryRemoteLog::new();
    let backend = Arc::new(YieldingRemoteLog {
        store: store.clone(),
    });

    let outcomes = run_concurrent_appends(backend, WRITERS).await;

    assert!(
        outcomes.iter().all(Outcome::is_success),
        "every writer must succeed with an unlimited budget: {:?}",
        outcomes
    );
    let content = store.contents("email.txt").await.expect("log was created");
    assert_each_line_once(&content, WRITERS);
}

#[tokio::test]
async fn concurrent_appends_on_single_thread_lose_nothing() {
    const WRITERS: usize = 16;

    let store = MemoryRemoteLog::new();
    store.seed("email.txt", Vec::new()).await;
    let backend = Arc::new(YieldingRemoteLog {
        store: store.clone(),
    });

    let outcomes = run_concurrent_appends(backend, WRITERS).await;

    assert!(outcomes.iter().all(Outcome::is_success));
    let content = store.contents("email.txt").await.unwrap();
    assert_each_line_once(&content, WRITERS);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn bounded_budget_never_reports_false_success() {
    const WRITERS: usize = 24;

    let store = MemoryRemoteLog::new();
    let backend: Arc<dyn RemoteLog> = Arc::new(YieldingRemoteLog {
        store: store.clone(),
    });
    let orchestrator = Arc::new(orchestrator_for(backend));
    let mut tasks = JoinSet::new();

    for i in 0..WRITERS {
        let orchestrator = Arc::clone(&orchestrator);
        tasks.spawn(async move {
            let line = format!("writer-{}", i);
            let request = AppendRequest::new("log", line.clone(), "tester", test_credentials());
            (line, orchestrator.append_line_with_attempts(&request, 1).await)
        });
    }

    let mut succeeded = HashSet::new();
    while let Some(joined) = tasks.join_next().await {
        let (line, outcome) = joined.expect("append task panicked");
        match outcome {
            Outcome::Success { .. } => {
                succeeded.insert(line);
            }
            Outcome::TransientFailure { .. } => {}
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    // Exactly the writers told "success" are in the log
    let content = store.contents("log").await.unwrap_or_default();
    let logged: HashSet<String> = std::str::from_utf8(&content)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect();
    assert!(!succeeded.is_empty());
    assert_eq!(logged, succeeded);
}
