//! provider
//!
//! Abstraction for remote repository providers (GitHub, etc.).
//!
//! # Architecture
//!
//! The `Provider` trait defines the primitives the content layer composes:
//! tree listing, blob fetch, atomic multi-file commits, and single-file
//! writes guarded by an expected base revision. The content layer never
//! imports a concrete provider; callers construct one and thread it through.
//!
//! Providers hold no state on behalf of this crate:
//! - Tree listings are produced fresh on every call and never cached here
//! - Optimistic concurrency lives provider-side (expected-sha rejection)
//! - An accepted commit is final; nothing in this crate rolls it back
//!
//! # Modules
//!
//! - `traits`: Core `Provider` trait and repository entry types
//! - [`github`]: GitHub implementation using the contents and git data APIs
//! - [`mock`]: Mock implementation for deterministic testing

pub mod github;
pub mod mock;
mod traits;

pub use traits::*;
