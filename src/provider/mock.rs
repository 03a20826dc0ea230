//! provider::mock
//!
//! Mock provider implementation for deterministic testing.
//!
//! # Design
//!
//! The mock provider keeps an in-memory file table and enforces the same
//! optimistic-concurrency contracts as a real host: creates over existing
//! paths and updates with a stale sha are rejected with `Conflict`. Shas
//! are content-addressed so any edit yields a new identifier, and the file
//! table preserves insertion order so tree-listing order is controllable
//! (and deliberately not alphabetical).
//!
//! Failure scenarios are configurable per operation, and every call is
//! recorded for verification.
//!
//! # Example
//!
//! ```
//! use folio::provider::mock::MockProvider;
//! use folio::provider::{BaseRevision, Provider};
//!
//! # tokio_test::block_on(async {
//! let provider = MockProvider::with_files(vec![("posts/a.md", "hello")]);
//!
//! let blob = provider.get_blob("main", "posts/a.md").await.unwrap().unwrap();
//! assert_eq!(blob.content, "hello");
//!
//! // A stale base revision is rejected
//! let result = provider
//!     .put_blob("main", "posts/a.md", "new", BaseRevision::Sha("stale".into()), "edit")
//!     .await;
//! assert!(result.is_err());
//! # });
//! ```

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use indexmap::IndexMap;
use sha2::{Digest, Sha256};

use super::traits::{
    BaseRevision, Blob, CommitFile, CommitInfo, Provider, ProviderError, TreeEntryKind,
    TreeEntryMode, TreeItem,
};

/// Mock provider for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping.
#[derive(Debug, Clone)]
pub struct MockProvider {
    /// Internal state shared across clones.
    inner: Arc<Mutex<MockProviderInner>>,
}

/// Internal mutable state.
#[derive(Debug)]
struct MockProviderInner {
    /// Default branch name reported by the repository.
    default_branch: String,
    /// Stored files by path, in insertion order.
    files: IndexMap<String, MockFile>,
    /// Paths still listed in the tree but whose content fetch yields
    /// nothing (simulates deletion between listing and fetch).
    vanished: HashSet<String>,
    /// Accepted commits, oldest first.
    commits: Vec<MockCommit>,
    /// Method to fail on (for testing error paths).
    fail_on: Option<FailOn>,
    /// Recorded operations for verification.
    operations: Vec<MockOperation>,
}

/// One stored file.
#[derive(Debug, Clone)]
struct MockFile {
    content: String,
    sha: String,
}

/// An accepted commit, for write-count and message assertions.
#[derive(Debug, Clone)]
pub struct MockCommit {
    /// Commit message
    pub message: String,
    /// Paths touched by the commit
    pub paths: Vec<String>,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    /// Fail default_branch with the given error.
    DefaultBranch(ProviderError),
    /// Fail get_tree with the given error.
    GetTree(ProviderError),
    /// Fail get_blob with the given error.
    GetBlob(ProviderError),
    /// Fail commit with the given error.
    Commit(ProviderError),
    /// Fail put_blob with the given error.
    PutBlob(ProviderError),
    /// Fail rename_blob with the given error.
    RenameBlob(ProviderError),
    /// Fail delete_blob with the given error.
    DeleteBlob(ProviderError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone)]
pub enum MockOperation {
    DefaultBranch,
    GetTree,
    GetBlob { path: String },
    Commit { message: String, paths: Vec<String> },
    PutBlob { path: String, base: BaseRevision },
    RenameBlob { old_path: String, new_path: String },
    DeleteBlob { path: String },
}

impl MockProvider {
    /// Create a new empty mock provider with default branch "main".
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockProviderInner {
                default_branch: "main".to_string(),
                files: IndexMap::new(),
                vanished: HashSet::new(),
                commits: Vec::new(),
                fail_on: None,
                operations: Vec::new(),
            })),
        }
    }

    /// Create a mock provider with pre-existing files.
    ///
    /// Tree-listing order follows the order given here.
    pub fn with_files(files: Vec<(&str, &str)>) -> Self {
        let provider = Self::new();
        {
            let mut inner = provider.inner.lock().unwrap();
            for (path, content) in files {
                inner.files.insert(
                    path.to_string(),
                    MockFile {
                        content: content.to_string(),
                        sha: content_sha(content),
                    },
                );
            }
        }
        provider
    }

    /// Set the reported default branch.
    pub fn set_default_branch(&self, branch: impl Into<String>) {
        let mut inner = self.inner.lock().unwrap();
        inner.default_branch = branch.into();
    }

    /// Insert or replace a file without recording a commit.
    ///
    /// Simulates an out-of-band writer mutating the repository underneath
    /// this core (the concurrent-editor scenario).
    pub fn insert_file(&self, path: &str, content: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.files.insert(
            path.to_string(),
            MockFile {
                content: content.to_string(),
                sha: content_sha(content),
            },
        );
    }

    /// Keep `path` in the tree listing but make its content fetch yield
    /// nothing, simulating a file deleted between listing and fetch.
    pub fn vanish_blob(&self, path: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.vanished.insert(path.to_string());
    }

    /// Configure the mock to fail on a specific operation.
    ///
    /// # Example
    ///
    /// ```
    /// use folio::provider::mock::{FailOn, MockProvider};
    /// use folio::provider::ProviderError;
    ///
    /// let provider = MockProvider::new().fail_on(FailOn::GetTree(ProviderError::RateLimited));
    /// ```
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.fail_on = Some(fail_on);
        }
        self
    }

    /// Clear the failure configuration.
    pub fn clear_fail_on(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_on = None;
    }

    /// Get the current content of a file (for test verification).
    pub fn file_content(&self, path: &str) -> Option<String> {
        let inner = self.inner.lock().unwrap();
        inner.files.get(path).map(|f| f.content.clone())
    }

    /// Get the current sha of a file (for test verification).
    pub fn file_sha(&self, path: &str) -> Option<String> {
        let inner = self.inner.lock().unwrap();
        inner.files.get(path).map(|f| f.sha.clone())
    }

    /// Get all accepted commits, oldest first.
    pub fn commits(&self) -> Vec<MockCommit> {
        let inner = self.inner.lock().unwrap();
        inner.commits.clone()
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        let inner = self.inner.lock().unwrap();
        inner.operations.clone()
    }

    /// Record an operation.
    fn record(&self, op: MockOperation) {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(op);
    }

    /// Check if we should fail and return the error if so.
    fn check_fail<T>(&self, expected: &str) -> Option<Result<T, ProviderError>> {
        let inner = self.inner.lock().unwrap();
        match &inner.fail_on {
            Some(FailOn::DefaultBranch(e)) if expected == "default_branch" => Some(Err(e.clone())),
            Some(FailOn::GetTree(e)) if expected == "get_tree" => Some(Err(e.clone())),
            Some(FailOn::GetBlob(e)) if expected == "get_blob" => Some(Err(e.clone())),
            Some(FailOn::Commit(e)) if expected == "commit" => Some(Err(e.clone())),
            Some(FailOn::PutBlob(e)) if expected == "put_blob" => Some(Err(e.clone())),
            Some(FailOn::RenameBlob(e)) if expected == "rename_blob" => Some(Err(e.clone())),
            Some(FailOn::DeleteBlob(e)) if expected == "delete_blob" => Some(Err(e.clone())),
            _ => None,
        }
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn default_branch(&self) -> Result<String, ProviderError> {
        self.record(MockOperation::DefaultBranch);
        if let Some(result) = self.check_fail("default_branch") {
            return result;
        }
        let inner = self.inner.lock().unwrap();
        Ok(inner.default_branch.clone())
    }

    async fn get_tree(&self, _git_ref: &str) -> Result<Vec<TreeItem>, ProviderError> {
        self.record(MockOperation::GetTree);
        if let Some(result) = self.check_fail("get_tree") {
            return result;
        }
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .files
            .iter()
            .map(|(path, file)| TreeItem {
                path: path.clone(),
                sha: file.sha.clone(),
                mode: TreeEntryMode::File,
                kind: TreeEntryKind::Blob,
            })
            .collect())
    }

    async fn get_blob(&self, _git_ref: &str, path: &str) -> Result<Option<Blob>, ProviderError> {
        self.record(MockOperation::GetBlob {
            path: path.to_string(),
        });
        if let Some(result) = self.check_fail("get_blob") {
            return result;
        }
        let inner = self.inner.lock().unwrap();
        if inner.vanished.contains(path) {
            return Ok(None);
        }
        Ok(inner.files.get(path).map(|f| Blob {
            content: f.content.clone(),
            sha: f.sha.clone(),
        }))
    }

    async fn commit(
        &self,
        _git_ref: &str,
        files: Vec<CommitFile>,
        message: &str,
    ) -> Result<CommitInfo, ProviderError> {
        let paths: Vec<String> = files.iter().map(|f| f.path.clone()).collect();
        self.record(MockOperation::Commit {
            message: message.to_string(),
            paths: paths.clone(),
        });
        if let Some(result) = self.check_fail("commit") {
            return result;
        }

        let mut inner = self.inner.lock().unwrap();
        for file in &files {
            inner.files.insert(
                file.path.clone(),
                MockFile {
                    content: file.content.clone(),
                    sha: content_sha(&file.content),
                },
            );
        }
        let sha = commit_sha(message, &paths);
        inner.commits.push(MockCommit {
            message: message.to_string(),
            paths,
        });
        Ok(CommitInfo { sha })
    }

    async fn put_blob(
        &self,
        _git_ref: &str,
        path: &str,
        content: &str,
        base: BaseRevision,
        message: &str,
    ) -> Result<CommitInfo, ProviderError> {
        self.record(MockOperation::PutBlob {
            path: path.to_string(),
            base: base.clone(),
        });
        if let Some(result) = self.check_fail("put_blob") {
            return result;
        }

        let mut inner = self.inner.lock().unwrap();
        match &base {
            BaseRevision::New => {
                if inner.files.contains_key(path) {
                    return Err(ProviderError::Conflict(format!(
                        "{} already exists",
                        path
                    )));
                }
            }
            BaseRevision::Sha(expected) => match inner.files.get(path) {
                None => return Err(ProviderError::NotFound(path.to_string())),
                Some(current) if &current.sha != expected => {
                    return Err(ProviderError::Conflict(format!(
                        "{} is at {} but expected {}",
                        path, current.sha, expected
                    )));
                }
                Some(_) => {}
            },
        }

        inner.files.insert(
            path.to_string(),
            MockFile {
                content: content.to_string(),
                sha: content_sha(content),
            },
        );
        let sha = commit_sha(message, &[path.to_string()]);
        inner.commits.push(MockCommit {
            message: message.to_string(),
            paths: vec![path.to_string()],
        });
        Ok(CommitInfo { sha })
    }

    async fn rename_blob(
        &self,
        _git_ref: &str,
        sha: &str,
        old_path: &str,
        new_path: &str,
        message: &str,
    ) -> Result<CommitInfo, ProviderError> {
        self.record(MockOperation::RenameBlob {
            old_path: old_path.to_string(),
            new_path: new_path.to_string(),
        });
        if let Some(result) = self.check_fail("rename_blob") {
            return result;
        }

        let mut inner = self.inner.lock().unwrap();
        let file = match inner.files.get(old_path) {
            None => return Err(ProviderError::NotFound(old_path.to_string())),
            Some(f) if f.sha != sha => {
                return Err(ProviderError::Conflict(format!(
                    "{} is at {} but expected {}",
                    old_path, f.sha, sha
                )));
            }
            Some(f) => f.clone(),
        };

        inner.files.shift_remove(old_path);
        inner.files.insert(new_path.to_string(), file);
        let paths = vec![old_path.to_string(), new_path.to_string()];
        let sha = commit_sha(message, &paths);
        inner.commits.push(MockCommit {
            message: message.to_string(),
            paths,
        });
        Ok(CommitInfo { sha })
    }

    async fn delete_blob(
        &self,
        _git_ref: &str,
        path: &str,
        message: &str,
    ) -> Result<CommitInfo, ProviderError> {
        self.record(MockOperation::DeleteBlob {
            path: path.to_string(),
        });
        if let Some(result) = self.check_fail("delete_blob") {
            return result;
        }

        let mut inner = self.inner.lock().unwrap();
        if inner.files.shift_remove(path).is_none() {
            return Err(ProviderError::NotFound(path.to_string()));
        }
        let sha = commit_sha(message, &[path.to_string()]);
        inner.commits.push(MockCommit {
            message: message.to_string(),
            paths: vec![path.to_string()],
        });
        Ok(CommitInfo { sha })
    }
}

/// Content-addressed sha for mock blobs.
///
/// Truncated to the 40 hex chars a git sha occupies; only stability and
/// change-on-edit matter here.
fn content_sha(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    hex::encode(digest)[..40].to_string()
}

/// Sha for an accepted mock commit.
fn commit_sha(message: &str, paths: &[String]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(message.as_bytes());
    for path in paths {
        hasher.update(path.as_bytes());
    }
    hex::encode(hasher.finalize())[..40].to_string()
}
