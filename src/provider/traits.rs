//! provider::traits
//!
//! Provider trait definition for interacting with remote repository hosts.
//!
//! # Design
//!
//! The `Provider` trait is async because every operation involves network
//! I/O. All methods return `Result` to handle API errors gracefully.
//!
//! A provider instance is bound to one repository (owner/name pair or
//! equivalent); methods take the git ref to operate on so one instance can
//! serve any branch of that repository.
//!
//! # Concurrency contract
//!
//! Mutating calls carry their expected base revision where one is required:
//! [`Provider::put_blob`] takes a [`BaseRevision`] so an update without the
//! current content sha cannot be expressed, and [`Provider::commit`] updates
//! the branch head non-forced so a concurrently moved head is rejected as
//! [`ProviderError::Conflict`] rather than silently overwritten.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from provider operations.
///
/// These error types map to common failure modes when interacting with
/// remote repository hosts like GitHub.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// Authentication is required but not available.
    #[error("authentication required")]
    AuthRequired,

    /// Authentication failed (invalid token, expired, insufficient permissions).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A write was rejected because its expected base revision is stale.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Rate limit exceeded.
    #[error("rate limited")]
    RateLimited,

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError {
        /// HTTP status code (0 when the failure is not tied to a response)
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    NetworkError(String),
}

/// Entry mode of a repository tree item.
///
/// Mirrors the git on-disk modes; providers report these verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeEntryMode {
    /// Regular file (100644)
    File,
    /// Executable file (100755)
    Executable,
    /// Symbolic link (120000)
    Symlink,
    /// Submodule commit (160000)
    Submodule,
    /// Directory (040000)
    Directory,
}

impl TreeEntryMode {
    /// The git mode string for this entry mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            TreeEntryMode::File => "100644",
            TreeEntryMode::Executable => "100755",
            TreeEntryMode::Symlink => "120000",
            TreeEntryMode::Submodule => "160000",
            TreeEntryMode::Directory => "040000",
        }
    }

    /// Parse a git mode string. Unknown modes map to `File`.
    pub fn from_mode(mode: &str) -> Self {
        match mode {
            "100755" => TreeEntryMode::Executable,
            "120000" => TreeEntryMode::Symlink,
            "160000" => TreeEntryMode::Submodule,
            "040000" => TreeEntryMode::Directory,
            _ => TreeEntryMode::File,
        }
    }
}

impl std::fmt::Display for TreeEntryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Object kind of a repository tree item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeEntryKind {
    /// File content
    Blob,
    /// Directory
    Tree,
}

/// One entry in a repository tree listing.
///
/// `sha` is stable only for unchanged content; any edit or rename produces
/// a new sha. Listings are produced fresh on every call and must not be
/// cached across requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeItem {
    /// Repository-relative path
    pub path: String,
    /// Content-addressed identifier of the entry
    pub sha: String,
    /// Git entry mode
    pub mode: TreeEntryMode,
    /// Blob or tree
    pub kind: TreeEntryKind,
}

/// Raw content of one repository file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    /// Decoded UTF-8 content
    pub content: String,
    /// Content-addressed identifier at fetch time
    pub sha: String,
}

/// One file change inside an atomic multi-file commit.
#[derive(Debug, Clone)]
pub struct CommitFile {
    /// Repository-relative path
    pub path: String,
    /// Full replacement content
    pub content: String,
    /// Git entry mode for the written file
    pub mode: TreeEntryMode,
}

/// Result of an accepted commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    /// Commit sha
    pub sha: String,
}

/// Expected base revision for a single-file write.
///
/// Makes the optimistic-concurrency contract explicit in the type: a write
/// over existing content must name the sha it believes is current, and a
/// create must assert the path does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseRevision {
    /// The path must not exist yet; an existing file is a conflict.
    New,
    /// Replace content whose current sha must equal this value.
    Sha(String),
}

impl BaseRevision {
    /// The expected sha, if this is an update.
    pub fn sha(&self) -> Option<&str> {
        match self {
            BaseRevision::New => None,
            BaseRevision::Sha(sha) => Some(sha),
        }
    }
}

/// The Provider trait for interacting with remote repository hosts.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow use across async tasks;
/// collection loads fan blob fetches out over spawned tasks.
///
/// # Error Handling
///
/// All methods return `Result<T, ProviderError>`. Callers should handle:
/// - `AuthRequired` / `AuthFailed`: Prompt the user to authenticate
/// - `NotFound`: Resource doesn't exist
/// - `Conflict`: Expected base revision is stale; refetch and retry
/// - `RateLimited`: Back off (retry policy is the caller's, never this crate's)
/// - `ApiError` / `NetworkError`: Surface to the user
#[async_trait]
pub trait Provider: Send + Sync {
    /// Get the provider name (e.g., "github").
    fn name(&self) -> &'static str;

    /// Get the repository's default branch name.
    ///
    /// Used to resolve a working branch for projects that don't pin one.
    async fn default_branch(&self) -> Result<String, ProviderError>;

    /// List the full repository tree at `git_ref`, recursively.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the ref doesn't exist
    /// - `ApiError` if the host truncated the listing (a partial tree is
    ///   never returned as if complete)
    async fn get_tree(&self, git_ref: &str) -> Result<Vec<TreeItem>, ProviderError>;

    /// Fetch the content of one file at `git_ref`.
    ///
    /// # Returns
    ///
    /// `Some(Blob)` with decoded content and current sha, `None` if the
    /// path does not exist at that ref.
    async fn get_blob(&self, git_ref: &str, path: &str) -> Result<Option<Blob>, ProviderError>;

    /// Apply `files` as one commit on `git_ref`, atomically.
    ///
    /// Either every file change lands in a single commit or none do. The
    /// branch head is advanced non-forced; if it moved underneath, the
    /// commit is rejected with `Conflict` and nothing is applied.
    ///
    /// # Arguments
    ///
    /// * `git_ref` - Branch to commit to
    /// * `files` - Full replacement content per path
    /// * `message` - Commit message
    async fn commit(
        &self,
        git_ref: &str,
        files: Vec<CommitFile>,
        message: &str,
    ) -> Result<CommitInfo, ProviderError>;

    /// Write one file, guarded by its expected base revision.
    ///
    /// # Errors
    ///
    /// - `Conflict` if `base` is `New` but the path exists, or `Sha` but
    ///   the current content sha differs
    async fn put_blob(
        &self,
        git_ref: &str,
        path: &str,
        content: &str,
        base: BaseRevision,
        message: &str,
    ) -> Result<CommitInfo, ProviderError>;

    /// Move a blob to a new path in one commit.
    ///
    /// # Arguments
    ///
    /// * `sha` - Content sha of the blob being moved (identifies the exact
    ///   content; a concurrently edited file yields a different sha)
    async fn rename_blob(
        &self,
        git_ref: &str,
        sha: &str,
        old_path: &str,
        new_path: &str,
        message: &str,
    ) -> Result<CommitInfo, ProviderError>;

    /// Delete one file.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the path does not exist at `git_ref`
    async fn delete_blob(
        &self,
        git_ref: &str,
        path: &str,
        message: &str,
    ) -> Result<CommitInfo, ProviderError>;
}
