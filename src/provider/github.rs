//! provider::github
//!
//! GitHub provider implementation using the REST contents and git data APIs.
//!
//! # Design
//!
//! This module implements the `Provider` trait for GitHub. It uses:
//! - The contents API for single-file reads and sha-guarded writes
//! - The git data API (trees/commits/refs) for atomic multi-file commits
//!   and renames, since the contents API cannot stage more than one path
//!
//! An atomic commit is built bottom-up: read the branch head, create a tree
//! on top of the head's tree, create a commit pointing at it, then advance
//! the branch ref non-forced. A head that moved underneath makes the ref
//! update a non-fast-forward, which GitHub rejects; that rejection surfaces
//! as [`ProviderError::Conflict`] and none of the file changes land.
//!
//! # Authentication
//!
//! A static bearer token (personal access token or installation token) is
//! held for the lifetime of the provider. Token acquisition and refresh are
//! the caller's concern.
//!
//! # Rate Limiting
//!
//! GitHub has rate limits. This implementation returns
//! `ProviderError::RateLimited` when limits are hit and does not retry;
//! retry policy belongs to the caller.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};

use super::traits::{
    BaseRevision, Blob, CommitFile, CommitInfo, Provider, ProviderError, TreeEntryKind,
    TreeEntryMode, TreeItem,
};

/// Default GitHub API base URL.
const DEFAULT_API_BASE: &str = "https://api.github.com";

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = "folio";

/// GitHub provider implementation.
///
/// Bound to one repository; methods take the branch to operate on.
///
/// # Example
///
/// ```ignore
/// use folio::provider::github::GitHubProvider;
/// use folio::provider::Provider;
///
/// let provider = GitHubProvider::new("ghp_xxx", "octocat", "hello-world");
/// let tree = provider.get_tree("main").await?;
/// ```
pub struct GitHubProvider {
    /// HTTP client for making requests
    client: Client,
    /// Bearer token
    token: String,
    /// Repository owner (user or organization)
    owner: String,
    /// Repository name
    repo: String,
    /// API base URL (configurable for GitHub Enterprise)
    api_base: String,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for GitHubProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubProvider")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl GitHubProvider {
    /// Create a new GitHub provider for one repository.
    ///
    /// # Arguments
    ///
    /// * `token` - Personal access token or GitHub App installation token
    /// * `owner` - Repository owner
    /// * `repo` - Repository name
    pub fn new(
        token: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            token: token.into(),
            owner: owner.into(),
            repo: repo.into(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Create a GitHub provider with a custom API base URL.
    ///
    /// Use this for GitHub Enterprise installations.
    ///
    /// # Arguments
    ///
    /// * `api_base` - Custom API base URL (e.g., `https://github.example.com/api/v3`)
    pub fn with_api_base(
        token: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            token: token.into(),
            owner: owner.into(),
            repo: repo.into(),
            api_base: api_base.into(),
        }
    }

    /// Create a GitHub provider from a remote URL.
    ///
    /// Parses the remote URL to extract owner and repo.
    ///
    /// # Returns
    ///
    /// `Some(GitHubProvider)` if the URL is parseable, `None` otherwise.
    ///
    /// # Example
    ///
    /// ```
    /// use folio::provider::github::GitHubProvider;
    ///
    /// let provider = GitHubProvider::from_remote_url("git@github.com:owner/repo.git", "token");
    /// assert!(provider.is_some());
    /// ```
    pub fn from_remote_url(url: &str, token: impl Into<String>) -> Option<Self> {
        let (owner, repo) = parse_github_url(url)?;
        Some(Self::new(token, owner, repo))
    }

    /// Get the repository owner.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Get the repository name.
    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// Build common headers for API requests.
    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.token))
                .unwrap_or_else(|_| HeaderValue::from_static("Bearer invalid")),
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        headers
    }

    /// Build URL for a repository endpoint.
    fn repo_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_base, self.owner, self.repo, path
        )
    }

    /// Handle API response, mapping errors appropriately.
    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: Response,
    ) -> Result<T, ProviderError> {
        let status = response.status();

        if status.is_success() {
            response.json().await.map_err(|e| ProviderError::ApiError {
                status: status.as_u16(),
                message: format!("Failed to parse response: {}", e),
            })
        } else {
            self.handle_error_response(response, status).await
        }
    }

    /// Handle an error response from the API.
    async fn handle_error_response<T>(
        &self,
        response: Response,
        status: StatusCode,
    ) -> Result<T, ProviderError> {
        // Try to get the error message from the body
        let message = match response.json::<GitHubErrorResponse>().await {
            Ok(err) => err.message,
            Err(_) => "Unknown error".to_string(),
        };

        Err(match status {
            StatusCode::UNAUTHORIZED => ProviderError::AuthFailed("Invalid or expired token".into()),
            StatusCode::FORBIDDEN => ProviderError::AuthFailed(format!("Permission denied: {}", message)),
            StatusCode::NOT_FOUND => ProviderError::NotFound(message),
            StatusCode::CONFLICT => ProviderError::Conflict(message),
            StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited,
            _ if status.is_server_error() => ProviderError::ApiError {
                status: status.as_u16(),
                message: format!("GitHub server error: {}", message),
            },
            _ => ProviderError::ApiError {
                status: status.as_u16(),
                message,
            },
        })
    }

    /// GET a JSON endpoint under the repository.
    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T, ProviderError> {
        let response = self
            .client
            .get(url)
            .headers(self.headers())
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;
        self.handle_response(response).await
    }

    /// Read the head commit sha and its tree sha for a branch.
    async fn branch_head(&self, git_ref: &str) -> Result<(String, String), ProviderError> {
        let git_ref_obj: GitHubRefObject = self
            .get_json(&self.repo_url(&format!("git/ref/heads/{}", git_ref)))
            .await?;
        let head_sha = git_ref_obj.object.sha;

        let commit: GitHubCommitObject = self
            .get_json(&self.repo_url(&format!("git/commits/{}", head_sha)))
            .await?;

        Ok((head_sha, commit.tree.sha))
    }

    /// Create a tree on top of `base_tree`, create a commit for it, and
    /// advance the branch head non-forced.
    async fn commit_tree(
        &self,
        git_ref: &str,
        head_sha: &str,
        base_tree: &str,
        entries: Vec<TreeEntryBody<'_>>,
        message: &str,
    ) -> Result<CommitInfo, ProviderError> {
        let tree_body = CreateTreeBody {
            base_tree,
            tree: entries,
        };
        let response = self
            .client
            .post(self.repo_url("git/trees"))
            .headers(self.headers())
            .json(&tree_body)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;
        let tree: GitHubShaObject = self.handle_response(response).await?;

        let commit_body = CreateCommitBody {
            message,
            tree: &tree.sha,
            parents: &[head_sha],
        };
        let response = self
            .client
            .post(self.repo_url("git/commits"))
            .headers(self.headers())
            .json(&commit_body)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;
        let commit: GitHubShaObject = self.handle_response(response).await?;

        // Non-forced ref update: a head that moved underneath is a
        // non-fast-forward, rejected by GitHub with 422.
        let ref_body = UpdateRefBody {
            sha: &commit.sha,
            force: false,
        };
        let response = self
            .client
            .patch(self.repo_url(&format!("git/refs/heads/{}", git_ref)))
            .headers(self.headers())
            .json(&ref_body)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNPROCESSABLE_ENTITY {
            let message = response
                .json::<GitHubErrorResponse>()
                .await
                .map(|e| e.message)
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ProviderError::Conflict(format!(
                "branch {} moved while committing: {}",
                git_ref, message
            )));
        }
        let _: GitHubRefObject = self.handle_response(response).await?;

        Ok(CommitInfo { sha: commit.sha })
    }
}

#[async_trait::async_trait]
impl Provider for GitHubProvider {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn default_branch(&self) -> Result<String, ProviderError> {
        let url = format!("{}/repos/{}/{}", self.api_base, self.owner, self.repo);
        let repo: GitHubRepo = self.get_json(&url).await?;
        Ok(repo.default_branch)
    }

    async fn get_tree(&self, git_ref: &str) -> Result<Vec<TreeItem>, ProviderError> {
        let url = self.repo_url(&format!("git/trees/{}?recursive=1", git_ref));
        let tree: GitHubTree = self.get_json(&url).await?;

        if tree.truncated {
            return Err(ProviderError::ApiError {
                status: 0,
                message: format!(
                    "tree listing for {} was truncated by the provider",
                    git_ref
                ),
            });
        }

        Ok(tree.tree.into_iter().map(Into::into).collect())
    }

    async fn get_blob(&self, git_ref: &str, path: &str) -> Result<Option<Blob>, ProviderError> {
        let url = self.repo_url(&format!("contents/{}?ref={}", path, git_ref));
        let response = self
            .client
            .get(&url)
            .headers(self.headers())
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let content: GitHubContent = self.handle_response(response).await?;
        let decoded = decode_content(&content.content).ok_or_else(|| ProviderError::ApiError {
            status: 0,
            message: format!("content of {} is not valid base64 UTF-8", path),
        })?;

        Ok(Some(Blob {
            content: decoded,
            sha: content.sha,
        }))
    }

    async fn commit(
        &self,
        git_ref: &str,
        files: Vec<CommitFile>,
        message: &str,
    ) -> Result<CommitInfo, ProviderError> {
        let (head_sha, base_tree) = self.branch_head(git_ref).await?;

        let entries: Vec<TreeEntryBody<'_>> = files
            .iter()
            .map(|f| TreeEntryBody {
                path: &f.path,
                mode: f.mode.as_str(),
                kind: "blob",
                content: Some(&f.content),
                sha: None,
            })
            .collect();

        self.commit_tree(git_ref, &head_sha, &base_tree, entries, message)
            .await
    }

    async fn put_blob(
        &self,
        git_ref: &str,
        path: &str,
        content: &str,
        base: BaseRevision,
        message: &str,
    ) -> Result<CommitInfo, ProviderError> {
        let url = self.repo_url(&format!("contents/{}", path));
        let encoded = BASE64.encode(content);
        let body = PutContentsBody {
            message,
            content: &encoded,
            branch: git_ref,
            sha: base.sha(),
        };

        let response = self
            .client
            .put(&url)
            .headers(self.headers())
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        let status = response.status();

        // The contents API reports a stale or missing expected sha as 409
        // or 422 depending on the shape of the mismatch.
        if status == StatusCode::UNPROCESSABLE_ENTITY {
            let message = response
                .json::<GitHubErrorResponse>()
                .await
                .map(|e| e.message)
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ProviderError::Conflict(format!(
                "write to {} rejected: {}",
                path, message
            )));
        }

        let result: GitHubPutContentsResponse = self.handle_response(response).await?;
        Ok(CommitInfo {
            sha: result.commit.sha,
        })
    }

    async fn rename_blob(
        &self,
        git_ref: &str,
        sha: &str,
        old_path: &str,
        new_path: &str,
        message: &str,
    ) -> Result<CommitInfo, ProviderError> {
        let (head_sha, base_tree) = self.branch_head(git_ref).await?;

        // Stage the blob at its new path and remove the old path; a null
        // sha in a tree entry deletes it.
        let entries = vec![
            TreeEntryBody {
                path: new_path,
                mode: TreeEntryMode::File.as_str(),
                kind: "blob",
                content: None,
                sha: Some(Some(sha)),
            },
            TreeEntryBody {
                path: old_path,
                mode: TreeEntryMode::File.as_str(),
                kind: "blob",
                content: None,
                sha: Some(None),
            },
        ];

        self.commit_tree(git_ref, &head_sha, &base_tree, entries, message)
            .await
    }

    async fn delete_blob(
        &self,
        git_ref: &str,
        path: &str,
        message: &str,
    ) -> Result<CommitInfo, ProviderError> {
        // The contents API requires the current sha to delete; resolve it
        // immediately before mutating.
        let blob = self
            .get_blob(git_ref, path)
            .await?
            .ok_or_else(|| ProviderError::NotFound(path.to_string()))?;

        let url = self.repo_url(&format!("contents/{}", path));
        let body = DeleteContentsBody {
            message,
            sha: &blob.sha,
            branch: git_ref,
        };

        let response = self
            .client
            .delete(&url)
            .headers(self.headers())
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        let result: GitHubPutContentsResponse = self.handle_response(response).await?;
        Ok(CommitInfo {
            sha: result.commit.sha,
        })
    }
}

/// Decode a base64 payload from the contents API.
///
/// GitHub wraps base64 content with embedded newlines; strip whitespace
/// before decoding.
fn decode_content(raw: &str) -> Option<String> {
    let cleaned: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64.decode(cleaned.as_bytes()).ok()?;
    String::from_utf8(bytes).ok()
}

// --------------------------------------------------------------------------
// API Request/Response Types
// --------------------------------------------------------------------------

/// Request body for a contents-API write.
#[derive(Serialize)]
struct PutContentsBody<'a> {
    message: &'a str,
    content: &'a str,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

/// Request body for a contents-API delete.
#[derive(Serialize)]
struct DeleteContentsBody<'a> {
    message: &'a str,
    sha: &'a str,
    branch: &'a str,
}

/// One entry in a tree-creation request.
///
/// Exactly one of `content` / `sha` is set; `sha: Some(None)` serializes
/// as an explicit null, which deletes the path.
#[derive(Serialize)]
struct TreeEntryBody<'a> {
    path: &'a str,
    mode: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<Option<&'a str>>,
}

/// Request body for creating a tree.
#[derive(Serialize)]
struct CreateTreeBody<'a> {
    base_tree: &'a str,
    tree: Vec<TreeEntryBody<'a>>,
}

/// Request body for creating a commit.
#[derive(Serialize)]
struct CreateCommitBody<'a> {
    message: &'a str,
    tree: &'a str,
    parents: &'a [&'a str],
}

/// Request body for advancing a ref.
#[derive(Serialize)]
struct UpdateRefBody<'a> {
    sha: &'a str,
    force: bool,
}

/// GitHub error response format.
#[derive(Deserialize)]
struct GitHubErrorResponse {
    message: String,
}

/// Repository metadata (subset).
#[derive(Deserialize)]
struct GitHubRepo {
    default_branch: String,
}

/// Tree listing response format.
#[derive(Deserialize)]
struct GitHubTree {
    tree: Vec<GitHubTreeItem>,
    #[serde(default)]
    truncated: bool,
}

/// One entry in a tree listing response.
#[derive(Deserialize)]
struct GitHubTreeItem {
    path: String,
    mode: String,
    #[serde(rename = "type")]
    kind: String,
    sha: String,
}

impl From<GitHubTreeItem> for TreeItem {
    fn from(gh: GitHubTreeItem) -> Self {
        TreeItem {
            path: gh.path,
            sha: gh.sha,
            mode: TreeEntryMode::from_mode(&gh.mode),
            kind: if gh.kind == "tree" {
                TreeEntryKind::Tree
            } else {
                TreeEntryKind::Blob
            },
        }
    }
}

/// Contents-API file response (subset).
#[derive(Deserialize)]
struct GitHubContent {
    #[serde(default)]
    content: String,
    sha: String,
}

/// Contents-API write response (subset).
#[derive(Deserialize)]
struct GitHubPutContentsResponse {
    commit: GitHubShaObject,
}

/// A response object carrying just a sha.
#[derive(Deserialize)]
struct GitHubShaObject {
    sha: String,
}

/// Ref lookup response format.
#[derive(Deserialize)]
struct GitHubRefObject {
    object: GitHubShaObject,
}

/// Commit lookup response format (subset).
#[derive(Deserialize)]
struct GitHubCommitObject {
    tree: GitHubShaObject,
}

// --------------------------------------------------------------------------
// URL Parsing
// --------------------------------------------------------------------------

/// Parse a GitHub remote URL to extract owner and repo.
///
/// Supports both SSH and HTTPS formats:
/// - `git@github.com:owner/repo.git`
/// - `https://github.com/owner/repo.git`
/// - `https://github.com/owner/repo`
///
/// # Returns
///
/// `Some((owner, repo))` if the URL is a valid GitHub URL, `None` otherwise.
///
/// # Example
///
/// ```
/// use folio::provider::github::parse_github_url;
///
/// let (owner, repo) = parse_github_url("git@github.com:octocat/hello-world.git").unwrap();
/// assert_eq!(owner, "octocat");
/// assert_eq!(repo, "hello-world");
/// ```
pub fn parse_github_url(url: &str) -> Option<(String, String)> {
    // SSH format: git@github.com:owner/repo.git
    if let Some(rest) = url.strip_prefix("git@github.com:") {
        let rest = rest.strip_suffix(".git").unwrap_or(rest);
        let parts: Vec<&str> = rest.splitn(2, '/').collect();
        if parts.len() == 2 {
            return Some((parts[0].to_string(), parts[1].to_string()));
        }
    }

    // HTTPS format: https://github.com/owner/repo.git
    if let Some(rest) = url
        .strip_prefix("https://github.com/")
        .or_else(|| url.strip_prefix("http://github.com/"))
    {
        let rest = rest.strip_suffix(".git").unwrap_or(rest);
        let parts: Vec<&str> = rest.splitn(2, '/').collect();
        if parts.len() == 2 && !parts[1].is_empty() {
            return Some((parts[0].to_string(), parts[1].to_string()));
        }
    }

    None
}
