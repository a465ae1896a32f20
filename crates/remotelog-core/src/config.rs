//! Configuration types for remotelog
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::traits::Credentials;

/// Main remotelog configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteLogConfig {
    /// Backend holding the log objects
    pub backend: BackendConfig,

    /// API token; empty disables remote appends
    #[serde(default)]
    pub token: String,

    /// Log object paths per record kind
    #[serde(default)]
    pub destinations: DestinationConfig,

    /// Append retry settings
    #[serde(default)]
    pub append: AppendConfig,
}

impl RemoteLogConfig {
    /// Create a new configuration for a backend with defaults
    pub fn new(backend: BackendConfig) -> Self {
        Self {
            backend,
            token: String::new(),
            destinations: DestinationConfig::default(),
            append: AppendConfig::default(),
        }
    }

    /// Set the API token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    /// Credentials derived from the configured token
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.token.clone())
    }

    /// Whether appends can reach a remote at all
    ///
    /// An unconfigured setup is not an error: appends become no-ops.
    pub fn is_configured(&self) -> bool {
        !self.credentials().is_empty() && self.backend.is_configured()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.backend.validate()?;
        self.destinations.validate()?;
        self.append.validate()?;
        Ok(())
    }
}

impl Default for RemoteLogConfig {
    fn default() -> Self {
        Self::new(BackendConfig::default())
    }
}

/// Backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackendConfig {
    /// GitHub-style repository contents API
    Github {
        /// Repository in `owner/name` form
        repo: String,
        /// API base URL (default: https://api.github.com)
        #[serde(default)]
        api_base: Option<String>,
        /// Branch to commit to (default: repository default branch)
        #[serde(default)]
        branch: Option<String>,
    },

    /// In-process versioned store (not persistent)
    Memory,

    /// Custom backend
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl BackendConfig {
    /// Validate the backend configuration
    ///
    /// An empty GitHub repository is accepted here and reported through
    /// [`BackendConfig::is_configured`] instead.
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            BackendConfig::Github { repo, api_base, .. } => {
                if !repo.is_empty() {
                    let mut parts = repo.split('/');
                    let valid = matches!(
                        (parts.next(), parts.next(), parts.next()),
                        (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty()
                    );
                    if !valid {
                        return Err(crate::Error::config(format!(
                            "GitHub repository must be in owner/name form, got: {}",
                            repo
                        )));
                    }
                }
                if let Some(base) = api_base
                    && !base.starts_with("https://")
                    && !base.starts_with("http://")
                {
                    return Err(crate::Error::config(format!(
                        "GitHub API base must use HTTP or HTTPS scheme, got: {}",
                        base
                    )));
                }
                Ok(())
            }
            BackendConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config("Custom backend factory cannot be empty"));
                }
                if config.is_null() {
                    return Err(crate::Error::config("Custom backend config cannot be null"));
                }
                Ok(())
            }
            BackendConfig::Memory => Ok(()),
        }
    }

    /// Whether the backend has enough settings to reach a remote
    pub fn is_configured(&self) -> bool {
        match self {
            BackendConfig::Github { repo, .. } => !repo.is_empty(),
            BackendConfig::Memory | BackendConfig::Custom { .. } => true,
        }
    }

    /// Get the backend type name
    pub fn type_name(&self) -> &str {
        match self {
            BackendConfig::Github { .. } => "github",
            BackendConfig::Memory => "memory",
            BackendConfig::Custom { factory, .. } => factory,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Github {
            repo: String::new(),
            api_base: None,
            branch: None,
        }
    }
}

/// Log object paths
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationConfig {
    /// Newsletter signup log
    #[serde(default = "default_signups_path")]
    pub signups_path: String,

    /// Contact message log
    #[serde(default = "default_contacts_path")]
    pub contacts_path: String,
}

impl DestinationConfig {
    /// Validate the destination paths
    pub fn validate(&self) -> Result<(), crate::Error> {
        for (name, path) in [
            ("signups_path", &self.signups_path),
            ("contacts_path", &self.contacts_path),
        ] {
            if path.trim().is_empty() {
                return Err(crate::Error::config(format!("{} cannot be empty", name)));
            }
            if path.starts_with('/') || path.split('/').any(|segment| segment.is_empty()) {
                return Err(crate::Error::config(format!(
                    "{} must be a relative path without empty segments, got: {}",
                    name, path
                )));
            }
        }
        Ok(())
    }
}

impl Default for DestinationConfig {
    fn default() -> Self {
        Self {
            signups_path: default_signups_path(),
            contacts_path: default_contacts_path(),
        }
    }
}

fn default_signups_path() -> String {
    "email.txt".to_string()
}

fn default_contacts_path() -> String {
    "contact-submissions.jsonl".to_string()
}

/// Append orchestrator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppendConfig {
    /// Maximum fetch/write attempts per append
    ///
    /// Only version conflicts consume extra attempts; every other failure
    /// ends the append immediately.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,

    /// Upper bound on one whole append across all attempts (in seconds)
    ///
    /// None disables the deadline; each round trip is still bounded by the
    /// backend's own transport timeout.
    #[serde(default)]
    pub deadline_secs: Option<u64>,
}

impl AppendConfig {
    /// Validate the append settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.max_attempts == 0 {
            return Err(crate::Error::config("max_attempts must be > 0"));
        }
        if self.deadline_secs == Some(0) {
            return Err(crate::Error::config("deadline_secs must be > 0 when set"));
        }
        Ok(())
    }

    /// The configured deadline as a duration
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }
}

impl Default for AppendConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            deadline_secs: None,
        }
    }
}

fn default_max_attempts() -> usize {
    3
}
