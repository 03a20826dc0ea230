//! content::store
//!
//! `ContentStore`: collection loading, reorder commits, and file mutation
//! primitives over one repository branch.
//!
//! # Design
//!
//! A store owns its provider handle and branch; both are threaded in at
//! construction (no ambient clients). Operations are request-scoped: a
//! collection load fans per-file fetches out over spawned tasks and joins
//! them fail-fast: the first failure aborts the remaining fetches and the
//! whole call fails, so a partial collection can never escape. The only
//! shared resource is the remote repository itself, guarded provider-side
//! by expected-base-revision rejection.

use std::cmp::Ordering;
use std::sync::Arc;

use tokio::task::JoinSet;

use crate::content::document::Document;
use crate::content::tree::filter_collection;
use crate::provider::{
    BaseRevision, CommitFile, CommitInfo, Provider, ProviderError, TreeEntryMode,
};
use crate::registry::Project;

/// Content store for one repository branch.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use folio::content::ContentStore;
/// use folio::provider::github::GitHubProvider;
///
/// let provider = Arc::new(GitHubProvider::new(token, "owner", "repo"));
/// let store = ContentStore::new(provider, "main");
/// let posts = store.load_collection("posts").await?;
/// ```
pub struct ContentStore {
    /// Remote repository handle
    provider: Arc<dyn Provider>,
    /// Working branch every operation targets
    branch: String,
}

impl ContentStore {
    /// Create a store over an explicit branch.
    pub fn new(provider: Arc<dyn Provider>, branch: impl Into<String>) -> Self {
        Self {
            provider,
            branch: branch.into(),
        }
    }

    /// Create a store for a project, resolving the repository's default
    /// branch when the project doesn't pin one.
    pub async fn for_project(
        provider: Arc<dyn Provider>,
        project: &Project,
    ) -> Result<Self, ProviderError> {
        let branch = match &project.branch {
            Some(branch) => branch.clone(),
            None => provider.default_branch().await?,
        };
        Ok(Self::new(provider, branch))
    }

    /// The working branch.
    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub(crate) fn provider(&self) -> &dyn Provider {
        self.provider.as_ref()
    }

    /// Load one collection: list the tree, select members, fetch every
    /// member concurrently, parse, and sort by the `order` attribute.
    ///
    /// # Guarantees
    ///
    /// The result holds exactly one document per selected tree entry, or
    /// the call fails entirely. A member whose content fetch comes back
    /// absent (deleted between listing and fetch) fails the load with
    /// `NotFound` naming that path and aborts the in-flight siblings.
    ///
    /// # Ordering
    ///
    /// Ascending by numeric `order`; documents without one sort after
    /// those with one. The sort is stable over fetch order, which follows
    /// tree-listing order (not guaranteed alphabetical).
    pub async fn load_collection(&self, route: &str) -> Result<Vec<Document>, ProviderError> {
        let tree = self.provider.get_tree(&self.branch).await?;
        let entries = filter_collection(&tree, route);

        let mut fetches: JoinSet<Result<(usize, String, crate::provider::Blob), ProviderError>> =
            JoinSet::new();
        let count = entries.len();
        for (index, entry) in entries.into_iter().enumerate() {
            let provider = Arc::clone(&self.provider);
            let branch = self.branch.clone();
            fetches.spawn(async move {
                let blob = provider
                    .get_blob(&branch, &entry.path)
                    .await?
                    .ok_or_else(|| ProviderError::NotFound(entry.path.clone()))?;
                Ok((index, entry.path, blob))
            });
        }

        let mut slots: Vec<Option<Document>> = Vec::new();
        slots.resize_with(count, || None);
        while let Some(joined) = fetches.join_next().await {
            match joined {
                Ok(Ok((index, path, blob))) => {
                    slots[index] = Some(Document::parse(&blob.content, &path, &blob.sha));
                }
                Ok(Err(error)) => {
                    fetches.abort_all();
                    return Err(error);
                }
                Err(join_error) => {
                    fetches.abort_all();
                    return Err(ProviderError::ApiError {
                        status: 0,
                        message: format!("content fetch task failed: {}", join_error),
                    });
                }
            }
        }

        let mut documents: Vec<Document> = slots.into_iter().flatten().collect();
        documents.sort_by(|a, b| compare_order(a.order(), b.order()));
        Ok(documents)
    }

    /// Persist a new ordering for one collection as a single atomic commit.
    ///
    /// `documents` is the full collection in its desired final order (the
    /// caller computes the ordering; this store only persists it). Each
    /// document's `order` attribute is set to its list position, every
    /// other attribute is left untouched, and all rewritten files go into
    /// one commit, never one commit per file, so a concurrent reader can
    /// never observe a partially renumbered collection.
    ///
    /// A stale branch head surfaces as `Conflict`, unmodified; no retry.
    pub async fn reorder(
        &self,
        route: &str,
        mut documents: Vec<Document>,
    ) -> Result<CommitInfo, ProviderError> {
        for (position, document) in documents.iter_mut().enumerate() {
            document.set_order(position);
        }

        let files: Vec<CommitFile> = documents
            .iter()
            .map(|document| CommitFile {
                path: document.path.clone(),
                content: document.serialize(),
                mode: TreeEntryMode::File,
            })
            .collect();

        let message = format!("Reorder collection {}", route);
        self.provider.commit(&self.branch, files, &message).await
    }

    /// Write one document file, guarded by its expected base revision.
    ///
    /// `BaseRevision::New` asserts the path doesn't exist yet;
    /// `BaseRevision::Sha` names the content the caller last saw. Callers
    /// that cannot tolerate last-write-wins must fetch the current sha
    /// immediately before saving.
    pub async fn save(
        &self,
        path: &str,
        content: &str,
        base: BaseRevision,
    ) -> Result<CommitInfo, ProviderError> {
        let message = match &base {
            BaseRevision::New => format!("Create {}", path),
            BaseRevision::Sha(_) => format!("Update {}", path),
        };
        self.provider
            .put_blob(&self.branch, path, content, base, &message)
            .await
    }

    /// Move a document to a new path.
    pub async fn rename(
        &self,
        old_path: &str,
        new_path: &str,
        sha: &str,
        message: &str,
    ) -> Result<CommitInfo, ProviderError> {
        self.provider
            .rename_blob(&self.branch, sha, old_path, new_path, message)
            .await
    }

    /// Delete a document.
    pub async fn delete(&self, path: &str, message: &str) -> Result<CommitInfo, ProviderError> {
        self.provider.delete_blob(&self.branch, path, message).await
    }
}

/// Ordering for the collection sort: ascending by `order`, missing values
/// after present ones, equal values left to the stable sort.
fn compare_order(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
