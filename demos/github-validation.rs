// # GitHub Backend Real Environment Validation Tool
//
// Checks the GitHub backend against a real repository.
//
// ## Usage
//
// ```bash
// # Read-only mode (default - safe)
// REMOTELOG_TOKEN=your_token \
// REMOTELOG_REPO=owner/name \
// REMOTELOG_PATH=validation/log.txt \
// cargo run -p remotelog-demos --bin github_validation
//
// # Live mode (commits a line to the repository!)
// REMOTELOG_MODE=live \
// REMOTELOG_TOKEN=your_token \
// REMOTELOG_REPO=owner/name \
// REMOTELOG_PATH=validation/log.txt \
// cargo run -p remotelog-demos --bin github_validation
// ```
//
// ## Environment Variables
//
// Required:
// - `REMOTELOG_TOKEN`: API token with contents access
// - `REMOTELOG_REPO`: Repository in owner/name form
//
// Optional:
// - `REMOTELOG_PATH`: Log object to use (default: remotelog-validation.txt)
// - `REMOTELOG_BRANCH`: Branch to read and commit to
// - `REMOTELOG_MODE`: "read-only" or "live" (default: read-only)

use remotelog_core::traits::{Credentials, RemoteLog};
use remotelog_core::{AppendConfig, AppendOrchestrator, AppendRequest, Outcome, Signup};
use remotelog_github::GithubRemoteLog;
use std::env;
use std::process::ExitCode;
use std::sync::Arc;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    tracing::info!("=== GitHub Backend Real Environment Validation ===");

    let (Ok(token), Ok(repo)) = (env::var("REMOTELOG_TOKEN"), env::var("REMOTELOG_REPO")) else {
        tracing::error!("REMOTELOG_TOKEN and REMOTELOG_REPO environment variables are required");
        return ExitCode::from(1);
    };
    let path = env::var("REMOTELOG_PATH").unwrap_or_else(|_| "remotelog-validation.txt".to_string());
    let branch = env::var("REMOTELOG_BRANCH").ok();
    let live = env::var("REMOTELOG_MODE").is_ok_and(|mode| mode == "live");

    tracing::info!("Repository: {}", repo);
    tracing::info!("Path: {}", path);
    tracing::info!("Mode: {}", if live { "live" } else { "read-only" });

    let backend = match GithubRemoteLog::new(repo, None, branch) {
        Ok(backend) => Arc::new(backend),
        Err(e) => {
            tracing::error!("Failed to create backend: {}", e);
            return ExitCode::from(1);
        }
    };
    let credentials = Credentials::new(token);

    // Step 1: read
    tracing::info!("Step 1: Fetching current state");
    match backend.get(&path, &credentials).await {
        Ok(object) if object.exists => {
            let lines = object.content.iter().filter(|&&b| b == b'\n').count();
            tracing::info!(
                "✓ Present: {} bytes, {} line(s), version {:?}",
                object.content.len(),
                lines,
                object.version_token
            );
        }
        Ok(_) => tracing::info!("✓ Absent: the first append will create it"),
        Err(e) => {
            tracing::error!("✗ Fetch failed: {}", e);
            return ExitCode::from(2);
        }
    }

    if !live {
        tracing::info!("Read-only mode: skipping append (set REMOTELOG_MODE=live to commit)");
        return ExitCode::SUCCESS;
    }

    // Step 2: append through the orchestrator
    tracing::info!("Step 2: Appending a validation line");
    let orchestrator = match AppendOrchestrator::new(backend.clone(), AppendConfig::default()) {
        Ok(orchestrator) => orchestrator,
        Err(e) => {
            tracing::error!("Failed to create orchestrator: {}", e);
            return ExitCode::from(1);
        }
    };
    let request = match AppendRequest::for_record(
        path.clone(),
        &Signup::now("validation@remotelog.invalid"),
        credentials.clone(),
    ) {
        Ok(request) => request,
        Err(e) => {
            tracing::error!("Failed to build record: {}", e);
            return ExitCode::from(1);
        }
    };

    match orchestrator.append_line(&request).await {
        Outcome::Success { new_version_token } => {
            tracing::info!("✓ Appended, new version {}", new_version_token);
        }
        other => {
            tracing::error!("✗ Append failed: {:?}", other);
            return ExitCode::from(2);
        }
    }

    // Step 3: read back
    tracing::info!("Step 3: Verifying the line landed");
    match backend.get(&path, &credentials).await {
        Ok(object) if object.content.ends_with(format!("{}\n", request.line).as_bytes()) => {
            tracing::info!("✓ Last line matches");
            ExitCode::SUCCESS
        }
        Ok(_) => {
            tracing::error!("✗ Last line does not match (a concurrent writer may have appended)");
            ExitCode::from(2)
        }
        Err(e) => {
            tracing::error!("✗ Read-back failed: {}", e);
            ExitCode::from(2)
        }
    }
}
