//! registry
//!
//! Project records and the external project registry seam.
//!
//! # Design
//!
//! The registry itself (a key-value store with secondary indices) lives
//! outside this crate; the content layer only reads a project's `repo` and
//! `branch` to target its operations. The `ProjectRegistry` trait captures
//! the exact surface the rest of the system composes, and
//! [`MemoryRegistry`] implements it in memory for tests and single-process
//! deployments.
//!
//! Listings are returned in insertion order; sorting (e.g. by title) is
//! the caller's responsibility.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// Errors from registry operations.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// No project with the given id.
    #[error("project not found: {0}")]
    NotFound(String),

    /// The repository is already registered to a project.
    #[error("repository already registered: {0}")]
    DuplicateRepo(String),

    /// The backing store failed.
    #[error("registry backend error: {0}")]
    Backend(String),
}

/// One registered project.
///
/// The content layer reads `repo` and `branch` only; everything else is
/// presentation-side bookkeeping owned by the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    /// Registry identifier
    pub id: String,
    /// Owning user identifier
    pub user: String,
    /// Display title
    pub title: String,
    /// Target repository identifier (e.g. "owner/name")
    pub repo: String,
    /// Working branch; `None` means the repository's default branch
    pub branch: Option<String>,
}

impl Project {
    /// Create a project with a fresh id and no pinned branch.
    pub fn new(
        user: impl Into<String>,
        title: impl Into<String>,
        repo: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user: user.into(),
            title: title.into(),
            repo: repo.into(),
            branch: None,
        }
    }

    /// Pin a working branch.
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }
}

/// The registry trait for project records.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; request handlers share one
/// registry handle.
#[async_trait]
pub trait ProjectRegistry: Send + Sync {
    /// Get a project by id.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no project has the id
    async fn get(&self, id: &str) -> Result<Project, RegistryError>;

    /// Find the project registered for a repository, if any.
    async fn get_by_repo(&self, repo: &str) -> Result<Option<Project>, RegistryError>;

    /// Register a project.
    ///
    /// # Errors
    ///
    /// - `DuplicateRepo` if another project already targets the repository
    async fn create(&self, project: Project) -> Result<Project, RegistryError>;

    /// Replace a project record.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the project doesn't exist
    /// - `DuplicateRepo` if the record was retargeted at a repository
    ///   another project owns
    async fn update(&self, project: Project) -> Result<Project, RegistryError>;

    /// Remove a project record.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the project doesn't exist
    async fn delete(&self, id: &str) -> Result<(), RegistryError>;

    /// All projects owned by a user, in insertion order.
    async fn list_for_user(&self, user: &str) -> Result<Vec<Project>, RegistryError>;
}

/// In-memory registry with user and repo secondary indices.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping.
#[derive(Debug, Clone, Default)]
pub struct MemoryRegistry {
    inner: Arc<Mutex<MemoryRegistryInner>>,
}

#[derive(Debug, Default)]
struct MemoryRegistryInner {
    /// Projects by id.
    projects: HashMap<String, Project>,
    /// user -> project ids, insertion-ordered.
    by_user: HashMap<String, Vec<String>>,
    /// repo -> project id.
    by_repo: HashMap<String, String>,
}

impl MemoryRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered projects (for test verification).
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().projects.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ProjectRegistry for MemoryRegistry {
    async fn get(&self, id: &str) -> Result<Project, RegistryError> {
        let inner = self.inner.lock().unwrap();
        inner
            .projects
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    async fn get_by_repo(&self, repo: &str) -> Result<Option<Project>, RegistryError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .by_repo
            .get(repo)
            .and_then(|id| inner.projects.get(id))
            .cloned())
    }

    async fn create(&self, project: Project) -> Result<Project, RegistryError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.by_repo.contains_key(&project.repo) {
            return Err(RegistryError::DuplicateRepo(project.repo));
        }

        inner
            .by_user
            .entry(project.user.clone())
            .or_default()
            .push(project.id.clone());
        inner.by_repo.insert(project.repo.clone(), project.id.clone());
        inner.projects.insert(project.id.clone(), project.clone());
        Ok(project)
    }

    async fn update(&self, project: Project) -> Result<Project, RegistryError> {
        let mut inner = self.inner.lock().unwrap();
        let previous = inner
            .projects
            .get(&project.id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(project.id.clone()))?;

        if project.repo != previous.repo {
            if let Some(owner) = inner.by_repo.get(&project.repo) {
                if owner != &project.id {
                    return Err(RegistryError::DuplicateRepo(project.repo));
                }
            }
            inner.by_repo.remove(&previous.repo);
            inner.by_repo.insert(project.repo.clone(), project.id.clone());
        }

        if project.user != previous.user {
            if let Some(ids) = inner.by_user.get_mut(&previous.user) {
                ids.retain(|id| id != &project.id);
            }
            inner
                .by_user
                .entry(project.user.clone())
                .or_default()
                .push(project.id.clone());
        }

        inner.projects.insert(project.id.clone(), project.clone());
        Ok(project)
    }

    async fn delete(&self, id: &str) -> Result<(), RegistryError> {
        let mut inner = self.inner.lock().unwrap();
        let project = inner
            .projects
            .remove(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;

        inner.by_repo.remove(&project.repo);
        if let Some(ids) = inner.by_user.get_mut(&project.user) {
            ids.retain(|existing| existing != id);
        }
        Ok(())
    }

    async fn list_for_user(&self, user: &str) -> Result<Vec<Project>, RegistryError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .by_user
            .get(user)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| inner.projects.get(id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_and_get() {
        let registry = MemoryRegistry::new();
        let project = registry
            .create(Project::new("alice", "Blog", "alice/blog"))
            .await
            .unwrap();

        let fetched = registry.get(&project.id).await.unwrap();
        assert_eq!(fetched, project);
    }

    #[tokio::test]
    async fn fresh_projects_get_distinct_ids() {
        let a = Project::new("alice", "One", "alice/one");
        let b = Project::new("alice", "Two", "alice/two");
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn duplicate_repo_rejected() {
        let registry = MemoryRegistry::new();
        registry
            .create(Project::new("alice", "Blog", "alice/blog"))
            .await
            .unwrap();

        let result = registry
            .create(Project::new("bob", "Fork", "alice/blog"))
            .await;
        assert!(matches!(result, Err(RegistryError::DuplicateRepo(_))));
    }

    #[tokio::test]
    async fn get_by_repo_finds_project() {
        let registry = MemoryRegistry::new();
        let project = registry
            .create(Project::new("alice", "Blog", "alice/blog"))
            .await
            .unwrap();

        let found = registry.get_by_repo("alice/blog").await.unwrap();
        assert_eq!(found, Some(project));
        assert_eq!(registry.get_by_repo("nobody/else").await.unwrap(), None);
    }

    #[tokio::test]
    async fn list_for_user_in_insertion_order() {
        let registry = MemoryRegistry::new();
        registry
            .create(Project::new("alice", "Zeta", "alice/zeta"))
            .await
            .unwrap();
        registry
            .create(Project::new("alice", "Alpha", "alice/alpha"))
            .await
            .unwrap();
        registry
            .create(Project::new("bob", "Other", "bob/other"))
            .await
            .unwrap();

        let titles: Vec<String> = registry
            .list_for_user("alice")
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["Zeta", "Alpha"]);
    }

    #[tokio::test]
    async fn update_moves_indices() {
        let registry = MemoryRegistry::new();
        let mut project = registry
            .create(Project::new("alice", "Blog", "alice/blog"))
            .await
            .unwrap();

        project.repo = "alice/site".to_string();
        project.user = "carol".to_string();
        registry.update(project.clone()).await.unwrap();

        assert_eq!(registry.get_by_repo("alice/blog").await.unwrap(), None);
        assert!(registry.get_by_repo("alice/site").await.unwrap().is_some());
        assert!(registry.list_for_user("alice").await.unwrap().is_empty());
        assert_eq!(registry.list_for_user("carol").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_missing_is_not_found() {
        let registry = MemoryRegistry::new();
        let result = registry
            .update(Project::new("alice", "Ghost", "alice/ghost"))
            .await;
        assert!(matches!(result, Err(RegistryError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_removes_indices() {
        let registry = MemoryRegistry::new();
        let project = registry
            .create(Project::new("alice", "Blog", "alice/blog"))
            .await
            .unwrap();

        registry.delete(&project.id).await.unwrap();

        assert!(registry.is_empty());
        assert_eq!(registry.get_by_repo("alice/blog").await.unwrap(), None);
        assert!(registry.list_for_user("alice").await.unwrap().is_empty());
        assert!(matches!(
            registry.delete(&project.id).await,
            Err(RegistryError::NotFound(_))
        ));
    }
}
