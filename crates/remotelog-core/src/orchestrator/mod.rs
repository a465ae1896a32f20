//! Append orchestrator
//!
//! The AppendOrchestrator turns the two remote primitives into one append:
//! - Fetch the current object and its version token
//! - Append exactly one normalized line to the fetched bytes
//! - Write the result conditioned on the fetched token
//! - Start over on a version conflict, within a bounded budget
//!
//! ## State Machine
//!
//! ```text
//!               ┌──────────────┐
//!  request ───▶ │   Fetching   │ ◀──────────────┐
//!               └──────────────┘                │
//!                      │ get ok                 │ Conflict
//!                      ▼                        │ (budget left)
//!               ┌──────────────┐                │
//!               │   Writing    │ ───────────────┘
//!               └──────────────┘
//!                      │ put ok / Auth / Transient
//!                      ▼
//!               ┌──────────────┐
//!               │     Done     │
//!               └──────────────┘
//! ```
//!
//! ## Retry Policy
//!
//! Only version conflicts are retried. Auth and transient failures end the
//! append on the spot so configuration and permission problems are never
//! hidden behind a retry loop.
//!
//! ## Delivery
//!
//! A caller sees at most one success per call. A write that lands remotely
//! but whose response is lost (timeout, dropped connection, deadline) is
//! indistinguishable from a failed write and is reported as
//! `TransientFailure`; callers needing exactly-once must de-duplicate.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::codec;
use crate::config::AppendConfig;
use crate::error::{RemoteError, Result};
use crate::record::LogRecord;
use crate::traits::{Credentials, RemoteLog, VersionToken};

/// Cause reported when every attempt hit a version conflict
pub const RETRY_BUDGET_EXHAUSTED: &str = "retry budget exhausted";

/// Cause reported when the whole append outlived its deadline
pub const DEADLINE_EXCEEDED: &str = "deadline exceeded";

/// A single line to append to a remote log object
#[derive(Debug, Clone)]
pub struct AppendRequest {
    /// Object path of the log
    pub path: String,
    /// One validated record (normalized again before writing)
    pub line: String,
    /// Who the record belongs to, used in the change message
    pub actor: String,
    /// API credentials; empty means appends are disabled
    pub credentials: Credentials,
}

impl AppendRequest {
    /// Create a new append request
    pub fn new(
        path: impl Into<String>,
        line: impl Into<String>,
        actor: impl Into<String>,
        credentials: Credentials,
    ) -> Self {
        Self {
            path: path.into(),
            line: line.into(),
            actor: actor.into(),
            credentials,
        }
    }

    /// Build a request from a log record
    pub fn for_record(
        path: impl Into<String>,
        record: &impl LogRecord,
        credentials: Credentials,
    ) -> Result<Self> {
        Ok(Self::new(path, record.to_line()?, record.actor(), credentials))
    }

    fn change_message(&self) -> String {
        format!("Append log entry for {}", self.actor)
    }
}

/// Result of one append
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The line is durably appended
    Success {
        /// Token of the state containing the new line
        new_version_token: VersionToken,
    },

    /// The conditional write lost a race
    ///
    /// Mirrors [`RemoteError::Conflict`]. The orchestrator retries conflicts
    /// and reports an exhausted budget as `TransientFailure`, so it never
    /// returns this variant itself.
    Conflict,

    /// Credentials were rejected; retrying will not help
    AuthFailure {
        /// Backend-provided reason
        reason: String,
    },

    /// Try again later
    TransientFailure {
        /// What went wrong
        cause: String,
    },

    /// No credentials; the append was skipped without contacting the remote
    NotConfigured,
}

impl Outcome {
    /// Whether the line was appended
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    /// Whether a later attempt with the same input may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Outcome::Conflict | Outcome::TransientFailure { .. })
    }
}

impl From<RemoteError> for Outcome {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Conflict => Outcome::Conflict,
            RemoteError::Auth(reason) => Outcome::AuthFailure { reason },
            RemoteError::Transient(cause) => Outcome::TransientFailure { cause },
        }
    }
}

/// Conflict-safe appender over a [`RemoteLog`] backend
///
/// Holds no per-call state: every append fetches a fresh snapshot, and
/// concurrent calls (from this or other processes) are ordered solely by the
/// backend's version check.
pub struct AppendOrchestrator {
    /// Backend holding the log objects
    backend: Arc<dyn RemoteLog>,

    /// Default attempt budget
    max_attempts: usize,

    /// Default deadline for a whole append
    deadline: Option<Duration>,
}

impl AppendOrchestrator {
    /// Create a new orchestrator
    ///
    /// # Parameters
    ///
    /// - `backend`: remote log backend
    /// - `config`: attempt budget and deadline
    pub fn new(backend: Arc<dyn RemoteLog>, config: AppendConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            backend,
            max_attempts: config.max_attempts,
            deadline: config.deadline(),
        })
    }

    /// Append one line using the configured budget and deadline
    pub async fn append_line(&self, request: &AppendRequest) -> Outcome {
        self.run(request, self.max_attempts, self.deadline).await
    }

    /// Append one line with an explicit attempt budget
    ///
    /// A budget of 0 is treated as 1: at least one fetch/write is always made.
    pub async fn append_line_with_attempts(
        &self,
        request: &AppendRequest,
        max_attempts: usize,
    ) -> Outcome {
        self.run(request, max_attempts.max(1), self.deadline).await
    }

    /// Append one line, giving up after `deadline` across all attempts
    pub async fn append_line_with_deadline(
        &self,
        request: &AppendRequest,
        deadline: Duration,
    ) -> Outcome {
        self.run(request, self.max_attempts, Some(deadline)).await
    }

    /// Append a record to `path`
    pub async fn append_record(
        &self,
        path: &str,
        record: &impl LogRecord,
        credentials: Credentials,
    ) -> Result<Outcome> {
        let request = AppendRequest::for_record(path, record, credentials)?;
        Ok(self.append_line(&request).await)
    }

    async fn run(
        &self,
        request: &AppendRequest,
        max_attempts: usize,
        deadline: Option<Duration>,
    ) -> Outcome {
        if request.credentials.is_empty() {
            debug!("No credentials for {}, skipping append", request.path);
            return Outcome::NotConfigured;
        }

        let Some(limit) = deadline else {
            return self.attempt_loop(request, max_attempts).await;
        };

        match tokio::time::timeout(limit, self.attempt_loop(request, max_attempts)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(
                    "Append to {} abandoned after {:?} ({})",
                    request.path, limit, DEADLINE_EXCEEDED
                );
                Outcome::TransientFailure {
                    cause: DEADLINE_EXCEEDED.to_string(),
                }
            }
        }
    }

    async fn attempt_loop(&self, request: &AppendRequest, max_attempts: usize) -> Outcome {
        let backend = self.backend.backend_name();
        let normalized = codec::normalize_line(&request.line);
        let message = request.change_message();

        for attempt in 1..=max_attempts {
            debug!(
                "Fetching {} from {} (attempt {}/{})",
                request.path, backend, attempt, max_attempts
            );
            let object = match self.backend.get(&request.path, &request.credentials).await {
                Ok(object) => object,
                Err(e) => {
                    warn!("Fetch of {} from {} failed: {}", request.path, backend, e);
                    return e.into();
                }
            };

            let updated = codec::append_to(&object.content, &normalized);

            debug!(
                "Writing {} bytes to {} (expected version: {:?})",
                updated.len(),
                request.path,
                object.version_token
            );
            match self
                .backend
                .put(
                    &request.path,
                    &updated,
                    object.version_token.as_ref(),
                    &message,
                    &request.credentials,
                )
                .await
            {
                Ok(new_version_token) => {
                    info!(
                        "Appended line to {} on {} (version: {})",
                        request.path, backend, new_version_token
                    );
                    return Outcome::Success { new_version_token };
                }
                Err(RemoteError::Conflict) => {
                    warn!(
                        "Version conflict on {} (attempt {}/{}), refetching",
                        request.path, attempt, max_attempts
                    );
                }
                Err(e) => {
                    warn!("Write of {} to {} failed: {}", request.path, backend, e);
                    return e.into();
                }
            }
        }

        warn!(
            "Append to {} gave up after {} conflicting attempts",
            request.path, max_attempts
        );
        Outcome::TransientFailure {
            cause: RETRY_BUDGET_EXHAUSTED.to_string(),
        }
    }
}
