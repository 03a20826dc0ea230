//! content::config
//!
//! Project configuration: the schema of the config document and its
//! lifecycle (create, read, update, delete) against the repository.
//!
//! # Storage
//!
//! One JSON document at the fixed repository path [`CONFIG_PATH`],
//! camelCase keys, UTF-8. It is read on every operation that needs
//! configuration; there is no in-memory cache, so the remote document is
//! always authoritative. Creation and deletion commits carry a marker that
//! downstream automation (CI builds and the like) is expected to skip.
//!
//! # Concurrency
//!
//! Updates are full replacements guarded by the sha of the document they
//! were based on; a config edited underneath surfaces as `Conflict`.

use serde::{Deserialize, Serialize};

use crate::content::store::ContentStore;
use crate::provider::{BaseRevision, CommitInfo, ProviderError};

/// Fixed repository path of the project configuration document.
pub const CONFIG_PATH: &str = "folio.json";

/// Commit-message marker excluding config housekeeping from automation.
pub const SKIP_AUTOMATION_MARKER: &str = "[skip ci]";

/// Project configuration document.
///
/// # Example
///
/// ```json
/// {
///   "mediaFolder": "static/images",
///   "collections": [
///     { "id": "posts", "name": "Posts", "route": "content/posts", "template": "post" }
///   ],
///   "templates": [
///     { "id": "post", "name": "Post", "fields": [
///       { "name": "Title", "field": "title", "hidden": false }
///     ]}
///   ]
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectConfig {
    /// Upload target for media files; `"/"` means the repository root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_folder: Option<String>,

    /// Collection definitions, in display order
    pub collections: Vec<Collection>,

    /// Template definitions, in display order
    pub templates: Vec<Template>,
}

impl ProjectConfig {
    /// The media folder as a repository-relative directory path,
    /// normalized (`"/"` and leading slashes collapse to the root `""`).
    pub fn media_root(&self) -> Option<&str> {
        self.media_folder
            .as_deref()
            .map(|folder| folder.trim_start_matches('/'))
    }

    /// Look up a collection by id.
    pub fn collection(&self, id: &str) -> Option<&Collection> {
        self.collections.iter().find(|c| c.id == id)
    }

    /// Look up a template by id.
    pub fn template(&self, id: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.id == id)
    }
}

/// One collection definition.
///
/// `route` is a repository-relative directory path used verbatim to select
/// members from the tree. Nothing validates that routes are disjoint;
/// overlapping routes yield overlapping membership.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Collection {
    pub id: String,
    pub name: String,
    pub route: String,
    /// Id of the template members are edited with
    pub template: String,
}

/// One template definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub fields: Vec<TemplateField>,
}

/// One editable field of a template.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TemplateField {
    /// Display label
    pub name: String,
    /// Attribute key the field reads and writes
    pub field: String,
    /// Initial value for new documents
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Present in the document but not shown in the editor
    pub hidden: bool,
}

impl ContentStore {
    /// Create the config document if it doesn't exist yet.
    ///
    /// Writes the default (empty collections, empty templates) with a
    /// skip-automation commit message. Idempotent: returns without error,
    /// and without writing, when the document is already present.
    pub async fn ensure_config(&self) -> Result<(), ProviderError> {
        let existing = self.provider().get_blob(self.branch(), CONFIG_PATH).await?;
        if existing.is_some() {
            return Ok(());
        }

        let content = render_config(&ProjectConfig::default())?;
        let message = format!("Create {} {}", CONFIG_PATH, SKIP_AUTOMATION_MARKER);
        self.provider()
            .put_blob(
                self.branch(),
                CONFIG_PATH,
                &content,
                BaseRevision::New,
                &message,
            )
            .await?;
        Ok(())
    }

    /// Read the config document.
    ///
    /// An absent document yields the default structure rather than an
    /// error; callers that need existence semantics call [`ensure_config`]
    /// first or check separately. A present but malformed document is an
    /// error; it is never silently replaced.
    ///
    /// [`ensure_config`]: ContentStore::ensure_config
    pub async fn read_config(&self) -> Result<ProjectConfig, ProviderError> {
        match self.provider().get_blob(self.branch(), CONFIG_PATH).await? {
            None => Ok(ProjectConfig::default()),
            Some(blob) => parse_config(&blob.content),
        }
    }

    /// Replace the config document.
    ///
    /// Fetches the current document to obtain the base revision, then
    /// writes the new JSON against it. A config changed underneath is
    /// rejected as `Conflict`, never overwritten.
    pub async fn update_config(&self, config: &ProjectConfig) -> Result<CommitInfo, ProviderError> {
        let current = self
            .provider()
            .get_blob(self.branch(), CONFIG_PATH)
            .await?
            .ok_or_else(|| ProviderError::NotFound(CONFIG_PATH.to_string()))?;

        let content = render_config(config)?;
        let message = format!("Update {}", CONFIG_PATH);
        self.provider()
            .put_blob(
                self.branch(),
                CONFIG_PATH,
                &content,
                BaseRevision::Sha(current.sha),
                &message,
            )
            .await
    }

    /// Delete the config document. No-op when absent.
    pub async fn delete_config(&self) -> Result<(), ProviderError> {
        let existing = self.provider().get_blob(self.branch(), CONFIG_PATH).await?;
        if existing.is_none() {
            return Ok(());
        }

        let message = format!("Delete {} {}", CONFIG_PATH, SKIP_AUTOMATION_MARKER);
        self.provider()
            .delete_blob(self.branch(), CONFIG_PATH, &message)
            .await?;
        Ok(())
    }
}

/// Encode a config document as the on-disk JSON.
fn render_config(config: &ProjectConfig) -> Result<String, ProviderError> {
    let mut json =
        serde_json::to_string_pretty(config).map_err(|e| ProviderError::ApiError {
            status: 0,
            message: format!("failed to encode config document: {}", e),
        })?;
    json.push('\n');
    Ok(json)
}

/// Decode the on-disk JSON into a config document.
fn parse_config(raw: &str) -> Result<ProjectConfig, ProviderError> {
    serde_json::from_str(raw).map_err(|e| ProviderError::ApiError {
        status: 0,
        message: format!("invalid config document at {}: {}", CONFIG_PATH, e),
    })
}
