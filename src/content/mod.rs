//! content
//!
//! The collection content store: everything between raw repository trees
//! and ordered, editable documents.
//!
//! # Modules
//!
//! - [`document`] - Front-matter codec and the `Document` type
//! - [`tree`] - Selection of collection members from a tree listing
//! - [`store`] - `ContentStore`: collection loading, reorder commits, and
//!   file mutation primitives
//! - [`config`] - Project configuration schema and lifecycle
//!
//! # Design Principles
//!
//! - The repository is the only durable store; nothing here caches state
//!   across requests
//! - Parsing is tolerant (malformed metadata degrades to empty attributes);
//!   existence and concurrency failures are always surfaced
//! - Collaborators are threaded explicitly; there are no ambient singletons

pub mod config;
pub mod document;
pub mod store;
pub mod tree;

pub use config::{Collection, ProjectConfig, Template, TemplateField, CONFIG_PATH};
pub use document::{AttrValue, Document};
pub use store::ContentStore;
pub use tree::{filter_collection, MARKDOWN_EXTENSIONS};
