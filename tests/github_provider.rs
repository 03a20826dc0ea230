//! Wire-level tests for the GitHub provider.
//!
//! These tests run `GitHubProvider` against a local mock of the GitHub
//! REST API and verify request shapes, response decoding, and the status
//! mapping to `ProviderError`.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use folio::provider::github::GitHubProvider;
use folio::provider::{
    BaseRevision, CommitFile, Provider, ProviderError, TreeEntryKind, TreeEntryMode,
};

fn provider_for(server: &MockServer) -> GitHubProvider {
    GitHubProvider::with_api_base("test-token", "octocat", "site", server.uri())
}

// =============================================================================
// Repository metadata
// =============================================================================

#[tokio::test]
async fn default_branch_is_read_from_repo_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/site"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "site",
            "default_branch": "trunk"
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    assert_eq!(provider.default_branch().await.unwrap(), "trunk");
}

// =============================================================================
// Tree listing
// =============================================================================

#[tokio::test]
async fn get_tree_parses_entries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/site/git/trees/main"))
        .and(query_param("recursive", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sha": "roottree",
            "truncated": false,
            "tree": [
                { "path": "posts", "mode": "040000", "type": "tree", "sha": "d1" },
                { "path": "posts/a.md", "mode": "100644", "type": "blob", "sha": "b1" },
                { "path": "run.sh", "mode": "100755", "type": "blob", "sha": "b2" }
            ]
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let tree = provider.get_tree("main").await.unwrap();

    assert_eq!(tree.len(), 3);
    assert_eq!(tree[0].kind, TreeEntryKind::Tree);
    assert_eq!(tree[0].mode, TreeEntryMode::Directory);
    assert_eq!(tree[1].path, "posts/a.md");
    assert_eq!(tree[1].sha, "b1");
    assert_eq!(tree[1].kind, TreeEntryKind::Blob);
    assert_eq!(tree[2].mode, TreeEntryMode::Executable);
}

#[tokio::test]
async fn truncated_tree_is_an_error_not_a_partial_listing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/site/git/trees/main"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sha": "roottree",
            "truncated": true,
            "tree": [
                { "path": "posts/a.md", "mode": "100644", "type": "blob", "sha": "b1" }
            ]
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    assert!(matches!(
        provider.get_tree("main").await,
        Err(ProviderError::ApiError { .. })
    ));
}

#[tokio::test]
async fn missing_ref_maps_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/site/git/trees/ghost"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })),
        )
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    assert!(matches!(
        provider.get_tree("ghost").await,
        Err(ProviderError::NotFound(_))
    ));
}

// =============================================================================
// Blob fetch
// =============================================================================

#[tokio::test]
async fn get_blob_decodes_wrapped_base64() {
    let raw = "---\ntitle: Hello\n---\n\nBody text.";
    // GitHub wraps base64 payloads at 60 columns
    let mut encoded = BASE64.encode(raw);
    encoded.insert(10, '\n');

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/site/contents/posts/a.md"))
        .and(query_param("ref", "main"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sha": "blobsha",
            "encoding": "base64",
            "content": encoded
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let blob = provider.get_blob("main", "posts/a.md").await.unwrap().unwrap();
    assert_eq!(blob.content, raw);
    assert_eq!(blob.sha, "blobsha");
}

#[tokio::test]
async fn get_blob_missing_is_none_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/site/contents/posts/ghost.md"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })),
        )
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    assert_eq!(provider.get_blob("main", "posts/ghost.md").await.unwrap(), None);
}

// =============================================================================
// Single-file writes
// =============================================================================

#[tokio::test]
async fn put_blob_update_sends_expected_sha() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/repos/octocat/site/contents/posts/a.md"))
        .and(body_partial_json(json!({
            "branch": "main",
            "sha": "oldsha",
            "message": "Update posts/a.md"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": { "sha": "newblob" },
            "commit": { "sha": "newcommit" }
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let info = provider
        .put_blob(
            "main",
            "posts/a.md",
            "new body",
            BaseRevision::Sha("oldsha".to_string()),
            "Update posts/a.md",
        )
        .await
        .unwrap();
    assert_eq!(info.sha, "newcommit");
}

#[tokio::test]
async fn put_blob_conflict_statuses_map_to_conflict() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/repos/octocat/site/contents/stale.md"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "message": "stale.md does not match"
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/repos/octocat/site/contents/missing-sha.md"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "message": "\"sha\" wasn't supplied"
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server);

    let stale = provider
        .put_blob(
            "main",
            "stale.md",
            "x",
            BaseRevision::Sha("old".to_string()),
            "Update stale.md",
        )
        .await;
    assert!(matches!(stale, Err(ProviderError::Conflict(_))));

    let existing = provider
        .put_blob("main", "missing-sha.md", "x", BaseRevision::New, "Create missing-sha.md")
        .await;
    assert!(matches!(existing, Err(ProviderError::Conflict(_))));
}

// =============================================================================
// Atomic multi-file commits
// =============================================================================

/// Mount the read side of the data-API commit sequence.
async fn mount_branch_head(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/repos/octocat/site/git/ref/heads/main"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ref": "refs/heads/main",
            "object": { "sha": "headsha", "type": "commit" }
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/site/git/commits/headsha"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sha": "headsha",
            "tree": { "sha": "basetree" }
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn commit_builds_tree_commit_and_ref_update() {
    let server = MockServer::start().await;
    mount_branch_head(&server).await;

    Mock::given(method("POST"))
        .and(path("/repos/octocat/site/git/trees"))
        .and(body_partial_json(json!({
            "base_tree": "basetree",
            "tree": [
                { "path": "posts/a.md", "mode": "100644", "type": "blob", "content": "a body" },
                { "path": "posts/b.md", "mode": "100644", "type": "blob", "content": "b body" }
            ]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sha": "newtree" })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/repos/octocat/site/git/commits"))
        .and(body_partial_json(json!({
            "message": "Reorder collection posts",
            "tree": "newtree",
            "parents": ["headsha"]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sha": "newcommit" })))
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/repos/octocat/site/git/refs/heads/main"))
        .and(body_partial_json(json!({ "sha": "newcommit", "force": false })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ref": "refs/heads/main",
            "object": { "sha": "newcommit" }
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let files = vec![
        CommitFile {
            path: "posts/a.md".to_string(),
            content: "a body".to_string(),
            mode: TreeEntryMode::File,
        },
        CommitFile {
            path: "posts/b.md".to_string(),
            content: "b body".to_string(),
            mode: TreeEntryMode::File,
        },
    ];

    let info = provider
        .commit("main", files, "Reorder collection posts")
        .await
        .unwrap();
    assert_eq!(info.sha, "newcommit");
}

#[tokio::test]
async fn moved_branch_head_maps_to_conflict() {
    let server = MockServer::start().await;
    mount_branch_head(&server).await;

    Mock::given(method("POST"))
        .and(path("/repos/octocat/site/git/trees"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sha": "newtree" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/octocat/site/git/commits"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sha": "newcommit" })))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/repos/octocat/site/git/refs/heads/main"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "message": "Update is not a fast forward"
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let files = vec![CommitFile {
        path: "posts/a.md".to_string(),
        content: "a".to_string(),
        mode: TreeEntryMode::File,
    }];

    let result = provider.commit("main", files, "Reorder collection posts").await;
    match result {
        Err(ProviderError::Conflict(message)) => assert!(message.contains("main")),
        other => panic!("expected Conflict, got {:?}", other),
    }
}

// =============================================================================
// Rename and delete
// =============================================================================

#[tokio::test]
async fn rename_stages_new_path_and_deletes_old() {
    let server = MockServer::start().await;
    mount_branch_head(&server).await;

    Mock::given(method("POST"))
        .and(path("/repos/octocat/site/git/trees"))
        .and(body_partial_json(json!({
            "tree": [
                { "path": "posts/new.md", "mode": "100644", "type": "blob", "sha": "blobsha" },
                { "path": "posts/old.md", "mode": "100644", "type": "blob", "sha": null }
            ]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sha": "newtree" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/octocat/site/git/commits"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sha": "renamecommit" })))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/repos/octocat/site/git/refs/heads/main"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ref": "refs/heads/main",
            "object": { "sha": "renamecommit" }
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let info = provider
        .rename_blob("main", "blobsha", "posts/old.md", "posts/new.md", "Rename post")
        .await
        .unwrap();
    assert_eq!(info.sha, "renamecommit");
}

#[tokio::test]
async fn delete_blob_resolves_current_sha_first() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/site/contents/posts/a.md"))
        .and(query_param("ref", "main"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sha": "currentsha",
            "content": BASE64.encode("body")
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/repos/octocat/site/contents/posts/a.md"))
        .and(body_partial_json(json!({ "sha": "currentsha", "branch": "main" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": null,
            "commit": { "sha": "deletecommit" }
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let info = provider
        .delete_blob("main", "posts/a.md", "Remove post")
        .await
        .unwrap();
    assert_eq!(info.sha, "deletecommit");
}

#[tokio::test]
async fn delete_missing_blob_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/site/contents/posts/ghost.md"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })),
        )
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let result = provider.delete_blob("main", "posts/ghost.md", "Remove post").await;
    match result {
        Err(ProviderError::NotFound(path)) => assert_eq!(path, "posts/ghost.md"),
        other => panic!("expected NotFound, got {:?}", other),
    }
}

// =============================================================================
// Status mapping
// =============================================================================

#[tokio::test]
async fn auth_and_rate_limit_statuses_map_to_typed_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/site/git/trees/unauthorized"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Bad credentials" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/site/git/trees/limited"))
        .respond_with(
            ResponseTemplate::new(429).set_body_json(json!({ "message": "slow down" })),
        )
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    assert!(matches!(
        provider.get_tree("unauthorized").await,
        Err(ProviderError::AuthFailed(_))
    ));
    assert!(matches!(
        provider.get_tree("limited").await,
        Err(ProviderError::RateLimited)
    ));
}
