// # remotelog-append
//
// ⚠️ ARCHITECTURAL CONSTRAINTS ⚠️
//
// - This is a THIN integration layer ONLY
// - DO NOT add merge, encoding, or retry logic here
// - All append logic MUST be in remotelog-core
// - Configuration is via environment variables ONLY
//
// The binary is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing the runtime
// 3. Registering backends
// 4. Running exactly one append and mapping its outcome to an exit code
//
// ## Configuration
//
// ### Backend
// - `REMOTELOG_BACKEND`: Backend type (github, memory; default github)
// - `REMOTELOG_TOKEN`: API token (falls back to `GITHUB_TOKEN`)
// - `REMOTELOG_REPO`: Repository in owner/name form (falls back to `GITHUB_REPO`)
// - `REMOTELOG_API_BASE`: API base URL (default https://api.github.com)
// - `REMOTELOG_BRANCH`: Branch to commit to (default: repository default)
//
// ### Append
// - `REMOTELOG_PATH`: Log object path (falls back to `GITHUB_PATH`, default email.txt)
// - `REMOTELOG_ACTOR`: Name used in the change message (default: first field of the line)
// - `REMOTELOG_MAX_ATTEMPTS`: Attempt budget, 1-10 (default 3)
// - `REMOTELOG_DEADLINE_SECS`: Whole-append deadline, 1-300 seconds (default none)
// - `REMOTELOG_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// The line to append is the positional arguments joined by spaces.
//
// ## Exit Codes
//
// | Code | Meaning |
// |------|---------|
// | 0 | Appended, or no token/repo configured (nothing to do) |
// | 1 | Configuration error |
// | 2 | Credentials rejected |
// | 75 | Temporary failure, try again later (EX_TEMPFAIL) |
//
// ## Example
//
// ```bash
// export GITHUB_TOKEN=ghp_...
// export GITHUB_REPO=acme/site
// remotelog-append "alice@example.com,2024-01-01T00:00:00Z"
// ```

use anyhow::Result;
use remotelog_core::{
    AppendConfig, AppendOrchestrator, AppendRequest, BackendConfig, BackendRegistry, Outcome,
    RemoteLogConfig,
};
use std::env;
use std::process::ExitCode;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for the possible append outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AppendExitCode {
    /// Appended, or appends are not configured
    Done = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Credentials rejected by the remote
    AuthFailure = 2,
    /// Temporary failure (sysexits EX_TEMPFAIL)
    TempFail = 75,
}

impl From<AppendExitCode> for ExitCode {
    fn from(code: AppendExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

impl From<&Outcome> for AppendExitCode {
    fn from(outcome: &Outcome) -> Self {
        match outcome {
            Outcome::Success { .. } | Outcome::NotConfigured => AppendExitCode::Done,
            Outcome::AuthFailure { .. } => AppendExitCode::AuthFailure,
            Outcome::Conflict | Outcome::TransientFailure { .. } => AppendExitCode::TempFail,
        }
    }
}

/// Application configuration
#[derive(Debug)]
struct Config {
    backend_type: String,
    token: String,
    repo: String,
    api_base: Option<String>,
    branch: Option<String>,
    path: String,
    actor: Option<String>,
    max_attempts: Option<usize>,
    deadline_secs: Option<u64>,
    log_level: String,
    line: String,
}

impl Config {
    /// Load configuration from environment variables and arguments
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok(), env::args().skip(1))
    }

    /// Load configuration from any variable source
    ///
    /// Empty variables count as unset.
    fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        args: impl IntoIterator<Item = String>,
    ) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let var_or = |key: &str, fallback: &str| var(key).or_else(|| var(fallback));

        Ok(Self {
            backend_type: var("REMOTELOG_BACKEND").unwrap_or_else(|| "github".to_string()),
            token: var_or("REMOTELOG_TOKEN", "GITHUB_TOKEN").unwrap_or_default(),
            repo: var_or("REMOTELOG_REPO", "GITHUB_REPO").unwrap_or_default(),
            api_base: var("REMOTELOG_API_BASE"),
            branch: var("REMOTELOG_BRANCH"),
            path: var_or("REMOTELOG_PATH", "GITHUB_PATH")
                .unwrap_or_else(|| "email.txt".to_string()),
            actor: var("REMOTELOG_ACTOR"),
            max_attempts: var("REMOTELOG_MAX_ATTEMPTS")
                .map(|s| parse_number(&s, "REMOTELOG_MAX_ATTEMPTS"))
                .transpose()?,
            deadline_secs: var("REMOTELOG_DEADLINE_SECS")
                .map(|s| parse_number(&s, "REMOTELOG_DEADLINE_SECS"))
                .transpose()?,
            log_level: var("REMOTELOG_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            line: args.into_iter().collect::<Vec<_>>().join(" "),
        })
    }

    /// Validate the configuration
    ///
    /// A missing token or repository is not an error: the append is skipped
    /// and reported as not configured.
    fn validate(&self) -> Result<()> {
        match self.backend_type.as_str() {
            "github" | "memory" => {}
            _ => anyhow::bail!(
                "REMOTELOG_BACKEND '{}' is not supported. \
                Supported backends: github, memory",
                self.backend_type
            ),
        }

        if self.line.trim().is_empty() {
            anyhow::bail!(
                "Nothing to append. Pass the line as arguments: \
                remotelog-append \"alice@example.com,2024-01-01T00:00:00Z\""
            );
        }

        if self.path.trim().is_empty() {
            anyhow::bail!("REMOTELOG_PATH cannot be empty");
        }

        if let Some(max_attempts) = self.max_attempts
            && !(1..=10).contains(&max_attempts)
        {
            anyhow::bail!(
                "REMOTELOG_MAX_ATTEMPTS must be between 1 and 10. Got: {}",
                max_attempts
            );
        }

        if let Some(deadline) = self.deadline_secs
            && !(1..=300).contains(&deadline)
        {
            anyhow::bail!(
                "REMOTELOG_DEADLINE_SECS must be between 1 and 300 seconds. Got: {}",
                deadline
            );
        }

        if let Some(ref url) = self.api_base
            && url.starts_with("http://")
        {
            eprintln!(
                "WARNING: REMOTELOG_API_BASE uses HTTP (not HTTPS). \
                The API token will be sent in clear text."
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "REMOTELOG_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        // Shape checks shared with library users (repo form, URL scheme)
        self.to_remotelog_config().validate()?;

        Ok(())
    }

    /// Library configuration for this invocation
    fn to_remotelog_config(&self) -> RemoteLogConfig {
        let backend = match self.backend_type.as_str() {
            "memory" => BackendConfig::Memory,
            _ => BackendConfig::Github {
                repo: self.repo.clone(),
                api_base: self.api_base.clone(),
                branch: self.branch.clone(),
            },
        };

        let mut config = RemoteLogConfig::new(backend).with_token(self.token.clone());
        config.destinations.signups_path = self.path.clone();
        config.append = AppendConfig {
            max_attempts: self.max_attempts.unwrap_or(config.append.max_attempts),
            deadline_secs: self.deadline_secs,
        };
        config
    }

    /// Who the line belongs to
    ///
    /// Defaults to the first comma-separated field, which is the email for
    /// signup lines.
    fn actor(&self) -> String {
        match &self.actor {
            Some(actor) => actor.clone(),
            None => self
                .line
                .split(',')
                .next()
                .unwrap_or_default()
                .trim()
                .to_string(),
        }
    }
}

fn parse_number<T: std::str::FromStr>(value: &str, name: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("{} must be a positive integer. Got: {}", name, value))
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return AppendExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return AppendExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return AppendExitCode::ConfigError.into();
    }

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return AppendExitCode::TempFail.into();
        }
    };

    let code = rt.block_on(async {
        match run_append(&config).await {
            Ok(outcome) => report(&config, &outcome),
            Err(e) => {
                error!("Startup error: {}", e);
                AppendExitCode::ConfigError
            }
        }
    });

    code.into()
}

/// Run one append
async fn run_append(config: &Config) -> Result<Outcome> {
    let settings = config.to_remotelog_config();

    if !settings.is_configured() {
        return Ok(Outcome::NotConfigured);
    }

    let registry = BackendRegistry::with_builtin();

    #[cfg(feature = "github")]
    remotelog_github::register(&registry);

    info!(
        "Appending to {} via {} backend",
        settings.destinations.signups_path,
        settings.backend.type_name()
    );

    let backend = registry.create_backend(&settings.backend)?;
    let orchestrator = AppendOrchestrator::new(backend, settings.append.clone())?;

    let request = AppendRequest::new(
        settings.destinations.signups_path.clone(),
        config.line.clone(),
        config.actor(),
        settings.credentials(),
    );

    Ok(orchestrator.append_line(&request).await)
}

/// Log the outcome and pick the exit code
fn report(config: &Config, outcome: &Outcome) -> AppendExitCode {
    match outcome {
        Outcome::Success { new_version_token } => {
            info!("Appended to {} (version {})", config.path, new_version_token);
        }
        Outcome::NotConfigured => {
            warn!(
                "Remote log not configured (set REMOTELOG_TOKEN and REMOTELOG_REPO); nothing appended"
            );
        }
        Outcome::AuthFailure { reason } => {
            error!("Remote rejected the credentials: {}", reason);
        }
        Outcome::Conflict | Outcome::TransientFailure { .. } => {
            let cause = match outcome {
                Outcome::TransientFailure { cause } => cause.as_str(),
                _ => "version conflict",
            };
            error!("Append failed, try again later: {}", cause);
        }
    }

    AppendExitCode::from(outcome)
}
