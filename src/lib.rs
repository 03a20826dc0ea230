//! Folio - Git-backed document collections for structured content editing
//!
//! Folio treats a remote Git-hosted repository subtree as a lightweight
//! document store: it lists, parses, reorders, and atomically rewrites
//! collections of front-matter documents, and manages a project-level JSON
//! configuration document stored in the same repository. The repository is
//! the only durable store; nothing is cached across requests.
//!
//! # Architecture
//!
//! The codebase follows a layered architecture:
//!
//! - [`provider`] - Abstraction for remote repository providers (GitHub v1)
//! - [`content`] - Document codec, tree filtering, collection loading,
//!   ordering commits, and config lifecycle
//! - [`registry`] - Project records and the external project registry seam
//!
//! # Correctness Invariants
//!
//! 1. A collection load returns every member or fails entirely; partial
//!    collections are never returned
//! 2. Reordering a collection is a single atomic multi-file commit
//! 3. Writes over existing content carry an expected base revision; stale
//!    writes are rejected by the provider, never silently applied
//! 4. An accepted commit is final; nothing in this crate rolls it back

pub mod content;
pub mod provider;
pub mod registry;
