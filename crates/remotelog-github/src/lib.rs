// # GitHub Contents Backend
//
// This crate provides a RemoteLog backend over the GitHub repository
// contents API. Each log is one file in a repository; every append is a
// commit.
//
// ## Behavior
//
// - ✅ One HTTP request per `get` / `put` call
// - ✅ Writes are conditioned on the blob `sha` (the version token)
// - ✅ Writes without a `sha` only succeed if the file does not exist yet
// - ✅ Every status code is mapped onto `RemoteError` (callers never see raw HTTP)
// - ✅ HTTP timeout configured (10 seconds)
// - ❌ NO retry logic (owned by AppendOrchestrator)
// - ❌ NO caching (a snapshot is only valid for one attempt)
//
// ## Security Requirements
//
// - API token NEVER appears in logs or Debug output
// - Token is sent per call from the caller's Credentials, never stored
//
// ## API Reference
//
// - Get contents: GET `/repos/:owner/:repo/contents/:path`
// - Create or update file: PUT `/repos/:owner/:repo/contents/:path`
//
// | Call | Status | Result |
// |------|--------|--------|
// | GET  | 200 | present (content + sha) |
// | GET  | 404 | absent |
// | PUT  | 200, 201 | new sha |
// | PUT  | 409 | Conflict (sha is stale) |
// | PUT  | 422 without sha | Conflict (file appeared since the read) |
// | any  | 401, 403 | Auth |
// | any  | other / no response | Transient |

use async_trait::async_trait;
use remotelog_core::codec;
use remotelog_core::config::BackendConfig;
use remotelog_core::registry::BackendRegistry;
use remotelog_core::traits::{Credentials, RemoteLog, RemoteLogFactory, RemoteObject, VersionToken};
use remotelog_core::{Error, RemoteError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// GitHub API base URL
pub const GITHUB_API_BASE: &str = "https://api.github.com";

/// Default HTTP timeout for API requests (10 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// User agent sent with every request (required by the GitHub API)
const USER_AGENT: &str = concat!("remotelog/", env!("CARGO_PKG_VERSION"));

/// Longest response excerpt carried into error messages
const MAX_ERROR_EXCERPT: usize = 200;

/// GET response body (only the fields we use)
#[derive(Debug, Deserialize)]
struct ContentsResponse {
    #[serde(default)]
    content: Option<String>,
    sha: String,
    #[serde(default)]
    encoding: Option<String>,
}

/// PUT request body
#[derive(Debug, Serialize)]
struct PutContentsBody<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
}

/// PUT response body
#[derive(Debug, Deserialize)]
struct PutContentsResponse {
    content: PutContentsEntry,
}

#[derive(Debug, Deserialize)]
struct PutContentsEntry {
    sha: String,
}

/// How a GET status is handled
#[derive(Debug, PartialEq, Eq)]
enum FetchStatus {
    Present,
    Absent,
    Failed(RemoteError),
}

/// GitHub contents API backend
///
/// Stateless: the same instance can serve many concurrent appends.
pub struct GithubRemoteLog {
    /// Repository in `owner/name` form
    repo: String,

    /// API base URL
    api_base: String,

    /// Branch to read and commit to (None = default branch)
    branch: Option<String>,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Credentials are never held, so Debug has nothing to redact
impl std::fmt::Debug for GithubRemoteLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubRemoteLog")
            .field("repo", &self.repo)
            .field("api_base", &self.api_base)
            .field("branch", &self.branch)
            .finish()
    }
}

impl GithubRemoteLog {
    /// Create a new GitHub backend
    ///
    /// # Parameters
    ///
    /// - `repo`: repository in `owner/name` form
    /// - `api_base`: API base URL (None = https://api.github.com)
    /// - `branch`: branch to commit to (None = repository default)
    pub fn new(
        repo: impl Into<String>,
        api_base: Option<String>,
        branch: Option<String>,
    ) -> Result<Self> {
        let repo = repo.into();
        if repo.is_empty() {
            return Err(Error::config("GitHub repository is required"));
        }

        // Same shape rules as config-driven construction
        BackendConfig::Github {
            repo: repo.clone(),
            api_base: api_base.clone(),
            branch: branch.clone(),
        }
        .validate()?;

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::backend("github", format!("Failed to build HTTP client: {}", e)))?;

        let api_base = api_base
            .unwrap_or_else(|| GITHUB_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            repo,
            api_base,
            branch,
            client,
        })
    }

    /// URL of the contents endpoint for `path`
    ///
    /// Each path segment is percent-encoded on its own, so `/` keeps
    /// separating directories.
    fn contents_url(&self, path: &str) -> std::result::Result<reqwest::Url, RemoteError> {
        let mut url = reqwest::Url::parse(&self.api_base)
            .map_err(|e| RemoteError::transient(format!("Invalid API base URL: {}", e)))?;

        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| RemoteError::transient("API base URL cannot carry a path"))?;
            segments.pop_if_empty().push("repos");
            segments.extend(self.repo.split('/'));
            segments.push("contents");
            segments.extend(path.split('/').filter(|segment| !segment.is_empty()));
        }

        if let Some(branch) = &self.branch {
            url.query_pairs_mut().append_pair("ref", branch);
        }

        Ok(url)
    }

    fn request(
        &self,
        method: reqwest::Method,
        url: reqwest::Url,
        credentials: &Credentials,
    ) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("Authorization", format!("token {}", credentials.token()))
            .header("Accept", "application/vnd.github+json")
    }
}

/// Map a GET status onto the fetch contract
fn classify_fetch(status: u16, body: &str) -> FetchStatus {
    match status {
        200 => FetchStatus::Present,
        404 => FetchStatus::Absent,
        401 | 403 => FetchStatus::Failed(RemoteError::auth(format!(
            "GitHub rejected credentials while reading (status {})",
            status
        ))),
        _ => FetchStatus::Failed(RemoteError::transient(format!(
            "GitHub read failed: {} - {}",
            status,
            excerpt(body)
        ))),
    }
}

/// Map a failed PUT status onto the write contract
///
/// GitHub answers a stale `sha` with 409. A create (no `sha`) against a file
/// that appeared in the meantime is answered with 422, which is the same
/// lost race.
fn classify_write_failure(status: u16, had_expected: bool, body: &str) -> RemoteError {
    match status {
        409 => RemoteError::Conflict,
        422 if !had_expected => RemoteError::Conflict,
        401 | 403 => RemoteError::auth(format!(
            "GitHub rejected credentials while writing (status {})",
            status
        )),
        _ => RemoteError::transient(format!(
            "GitHub write failed: {} - {}",
            status,
            excerpt(body)
        )),
    }
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(MAX_ERROR_EXCERPT) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

/// Parse a 200 GET body into a remote object
fn parse_contents(body: &str) -> std::result::Result<RemoteObject, RemoteError> {
    let parsed: ContentsResponse = serde_json::from_str(body)
        .map_err(|e| RemoteError::transient(format!("Failed to parse contents response: {}", e)))?;

    if let Some(encoding) = parsed.encoding.as_deref()
        && encoding != "base64"
    {
        return Err(RemoteError::transient(format!(
            "Unsupported content encoding '{}' (file too large for the contents API?)",
            encoding
        )));
    }

    let content = parsed
        .content
        .ok_or_else(|| RemoteError::transient("Contents response carries no content"))?;

    let bytes = codec::decode(&content)?;
    Ok(RemoteObject::present(bytes, VersionToken::new(parsed.sha)))
}

#[async_trait]
impl RemoteLog for GithubRemoteLog {
    /// Fetch the log file
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /repos/:owner/:repo/contents/:path[?ref=branch]
    /// Authorization: token <token>
    /// ```
    async fn get(
        &self,
        path: &str,
        credentials: &Credentials,
    ) -> std::result::Result<RemoteObject, RemoteError> {
        let url = self.contents_url(path)?;
        tracing::debug!("GET {} ({})", path, self.repo);

        let response = self
            .request(reqwest::Method::GET, url, credentials)
            .send()
            .await
            .map_err(|e| RemoteError::transient(format!("HTTP request failed: {}", e)))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| RemoteError::transient(format!("Failed to read response: {}", e)))?;

        match classify_fetch(status, &body) {
            FetchStatus::Present => parse_contents(&body),
            FetchStatus::Absent => {
                tracing::debug!("{} does not exist in {} yet", path, self.repo);
                Ok(RemoteObject::absent())
            }
            FetchStatus::Failed(err) => Err(err),
        }
    }

    /// Write the log file conditioned on `expected`
    ///
    /// # API Call
    ///
    /// ```http
    /// PUT /repos/:owner/:repo/contents/:path
    /// Authorization: token <token>
    /// {
    ///   "message": "...",
    ///   "content": "<base64>",
    ///   "sha": "<expected>",        // omitted when creating
    ///   "branch": "<branch>"        // omitted for the default branch
    /// }
    /// ```
    async fn put(
        &self,
        path: &str,
        content: &[u8],
        expected: Option<&VersionToken>,
        message: &str,
        credentials: &Credentials,
    ) -> std::result::Result<VersionToken, RemoteError> {
        let mut url = self.contents_url(path)?;
        // Branch goes in the body for writes
        url.set_query(None);

        let body = PutContentsBody {
            message,
            content: codec::encode(content),
            sha: expected.map(VersionToken::as_str),
            branch: self.branch.as_deref(),
        };

        tracing::debug!(
            "PUT {} ({}) with {} bytes, expected sha: {:?}",
            path,
            self.repo,
            content.len(),
            body.sha
        );

        let response = self
            .request(reqwest::Method::PUT, url, credentials)
            .json(&body)
            .send()
            .await
            .map_err(|e| RemoteError::transient(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| RemoteError::transient(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(classify_write_failure(status.as_u16(), expected.is_some(), &text));
        }

        let parsed: PutContentsResponse = serde_json::from_str(&text).map_err(|e| {
            RemoteError::transient(format!("Failed to parse write response: {}", e))
        })?;

        tracing::debug!("{} now at sha {}", path, parsed.content.sha);
        Ok(VersionToken::new(parsed.content.sha))
    }

    fn backend_name(&self) -> &'static str {
        "github"
    }
}

/// Factory for creating GitHub backends
pub struct GithubFactory;

impl RemoteLogFactory for GithubFactory {
    fn create(&self, config: &BackendConfig) -> Result<Arc<dyn RemoteLog>> {
        match config {
            BackendConfig::Github {
                repo,
                api_base,
                branch,
            } => {
                if repo.is_empty() {
                    return Err(Error::config("GitHub repository is required"));
                }

                Ok(Arc::new(GithubRemoteLog::new(
                    repo.clone(),
                    api_base.clone(),
                    branch.clone(),
                )?))
            }
            _ => Err(Error::config("Invalid config for GitHub backend")),
        }
    }
}

/// Register the GitHub backend with a registry
///
/// # Example
///
/// ```rust
/// use remotelog_core::BackendRegistry;
///
/// let registry = BackendRegistry::with_builtin();
/// remotelog_github::register(&registry);
/// assert!(registry.has_backend("github"));
/// ```
pub fn register(registry: &BackendRegistry) {
    registry.register_backend("github", Box::new(GithubFactory));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> GithubRemoteLog {
        GithubRemoteLog::new("acme/site", None, None).unwrap()
    }

    #[test]
    fn test_factory_creation() {
        let config = BackendConfig::Github {
            repo: "acme/site".to_string(),
            api_base: None,
            branch: None,
        };
        let backend = GithubFactory.create(&config).unwrap();
        assert_eq!(backend.backend_name(), "github");
    }

    #[test]
    fn test_factory_missing_repo() {
        let config = BackendConfig::Github {
            repo: String::new(),
            api_base: None,
            branch: None,
        };
        assert!(GithubFactory.create(&config).is_err());
        assert!(GithubFactory.create(&BackendConfig::Memory).is_err());
    }

    #[test]
    fn test_malformed_repo_rejected() {
        assert!(GithubRemoteLog::new("acme", None, None).is_err());
        assert!(GithubRemoteLog::new("acme/site/x", None, None).is_err());
        assert!(GithubRemoteLog::new("acme//site", None, None).is_err());
        assert!(GithubRemoteLog::new("/acme/site", None, None).is_err());
        assert!(GithubRemoteLog::new("acme/site/", None, None).is_err());
        assert!(GithubRemoteLog::new("", None, None).is_err());
    }

    #[test]
    fn test_direct_and_factory_construction_agree() {
        for repo in ["acme/site", "acme//site", "/acme/site", "acme"] {
            let config = BackendConfig::Github {
                repo: repo.to_string(),
                api_base: None,
                branch: None,
            };
            assert_eq!(
                GithubRemoteLog::new(repo, None, None).is_ok(),
                GithubFactory.create(&config).is_ok(),
                "construction paths disagree on {:?}",
                repo
            );
        }
    }

    #[test]
    fn test_non_http_api_base_rejected() {
        assert!(GithubRemoteLog::new("acme/site", Some("ftp://x".to_string()), None).is_err());
    }

    #[test]
    fn test_contents_url() {
        let url = backend().contents_url("email.txt").unwrap();
        assert_eq!(url.as_str(), "https://api.github.com/repos/acme/site/contents/email.txt");
    }

    #[test]
    fn test_contents_url_encodes_segments() {
        let url = backend().contents_url("logs/sign ups#1.txt").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/acme/site/contents/logs/sign%20ups%231.txt"
        );
    }

    #[test]
    fn test_contents_url_with_base_path_and_branch() {
        let backend = GithubRemoteLog::new(
            "acme/site",
            Some("https://ghe.example.com/api/v3/".to_string()),
            Some("logs".to_string()),
        )
        .unwrap();
        let url = backend.contents_url("email.txt").unwrap();
        assert_eq!(
            url.as_str(),
            "https://ghe.example.com/api/v3/repos/acme/site/contents/email.txt?ref=logs"
        );
    }

    #[test]
    fn test_classify_fetch() {
        assert_eq!(classify_fetch(200, ""), FetchStatus::Present);
        assert_eq!(classify_fetch(404, ""), FetchStatus::Absent);
        assert!(matches!(classify_fetch(401, ""), FetchStatus::Failed(RemoteError::Auth(_))));
        assert!(matches!(classify_fetch(403, ""), FetchStatus::Failed(RemoteError::Auth(_))));
        assert!(matches!(
            classify_fetch(500, "boom"),
            FetchStatus::Failed(RemoteError::Transient(_))
        ));
        assert!(matches!(
            classify_fetch(429, ""),
            FetchStatus::Failed(RemoteError::Transient(_))
        ));
    }

    #[test]
    fn test_classify_write_failure() {
        assert_eq!(classify_write_failure(409, true, ""), RemoteError::Conflict);
        assert_eq!(classify_write_failure(409, false, ""), RemoteError::Conflict);
        assert_eq!(classify_write_failure(422, false, ""), RemoteError::Conflict);
        assert!(matches!(classify_write_failure(422, true, ""), RemoteError::Transient(_)));
        assert!(matches!(classify_write_failure(401, true, ""), RemoteError::Auth(_)));
        assert!(matches!(classify_write_failure(403, false, ""), RemoteError::Auth(_)));
        assert!(matches!(classify_write_failure(502, true, ""), RemoteError::Transient(_)));
    }

    #[test]
    fn test_parse_contents_wrapped_base64() {
        let body = serde_json::json!({
            "sha": "abc123",
            "encoding": "base64",
            "content": "Ym9iQHguY29tLDIwMjQt\nMDEtMDEK\n",
        })
        .to_string();

        let object = parse_contents(&body).unwrap();
        assert!(object.exists);
        assert_eq!(object.content, b"bob@x.com,2024-01-01\n");
        assert_eq!(object.version_token, Some(VersionToken::new("abc123")));
    }

    #[test]
    fn test_parse_contents_rejects_bad_base64() {
        let body = serde_json::json!({ "sha": "abc", "content": "%%%" }).to_string();
        assert!(matches!(parse_contents(&body), Err(RemoteError::Transient(_))));
    }

    #[test]
    fn test_parse_contents_rejects_missing_content() {
        let body = serde_json::json!({ "sha": "abc", "encoding": "none", "content": "" }).to_string();
        assert!(matches!(parse_contents(&body), Err(RemoteError::Transient(_))));

        let body = serde_json::json!({ "sha": "abc" }).to_string();
        assert!(matches!(parse_contents(&body), Err(RemoteError::Transient(_))));
    }

    #[test]
    fn test_excerpt_truncates() {
        let long = "x".repeat(500);
        let cut = excerpt(&long);
        assert!(cut.len() < 210);
        assert!(cut.ends_with("..."));
        assert_eq!(excerpt("  short  "), "short");
    }

    #[test]
    fn test_debug_has_no_secrets() {
        let debug_str = format!("{:?}", backend());
        assert!(debug_str.contains("GithubRemoteLog"));
        assert!(debug_str.contains("acme/site"));
    }
}
