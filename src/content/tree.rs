//! content::tree
//!
//! Selection of collection members from a repository tree listing.
//!
//! Collections are flat: a member is a text document sitting directly in
//! the collection's route directory; nested subdirectories are not members.
//! Routes are used verbatim, so overlapping collection routes
//! yield overlapping membership, which is the caller's responsibility to
//! avoid (or embrace).

use crate::provider::{TreeEntryKind, TreeItem};

/// Recognized text-document extensions (the markdown family).
pub const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown", "mdown", "mkd"];

/// Select the entries of one collection from a full tree listing.
///
/// An entry qualifies when it is a blob, its parent directory equals
/// `route` (leading and trailing slashes stripped; `/` or the empty string
/// mean the repository root), and its extension is in the markdown family.
///
/// Returns an empty vector (not an error) when nothing matches.
pub fn filter_collection(tree: &[TreeItem], route: &str) -> Vec<TreeItem> {
    let route = normalize_route(route);
    tree.iter()
        .filter(|item| item.kind == TreeEntryKind::Blob)
        .filter(|item| parent_dir(&item.path) == route)
        .filter(|item| has_markdown_extension(&item.path))
        .cloned()
        .collect()
}

/// Strip leading and trailing slashes; `/` becomes the empty root route.
fn normalize_route(route: &str) -> &str {
    route.trim_start_matches('/').trim_end_matches('/')
}

/// Parent directory of a repo-relative path ("" for top-level entries).
fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(dir, _)| dir)
}

/// Whether the path's extension is a recognized text-document extension.
fn has_markdown_extension(path: &str) -> bool {
    match path.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            let ext = ext.to_ascii_lowercase();
            MARKDOWN_EXTENSIONS.contains(&ext.as_str())
        }
        _ => false,
    }
}
