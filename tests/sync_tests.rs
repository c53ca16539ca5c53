//! End-to-end tests for the sync pipeline
//!
//! These tests use wiremock to stand in for the remote listing API and test
//! full sync runs end-to-end: listing, change detection, concurrent fetch,
//! conversion, tree building, and persistence.

use docsync::config::{Config, OutputConfig, SiteConfig, SourceConfig, SyncConfig};
use docsync::sync::Coordinator;
use docsync::SyncError;
use serde_json::{json, Value};
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str, site_dir: &Path) -> Config {
    Config {
        source: SourceConfig {
            repository: "acme/handbook".to_string(),
            directory: "docs".to_string(),
            api_base_url: base_url.to_string(),
            exclude_patterns: vec![],
            exclude_files: vec![],
        },
        site: SiteConfig::default(),
        sync: SyncConfig {
            concurrency: 4,
            max_retries: 3,
            // Effectively unthrottled so tests stay fast
            requests_per_second: 10_000.0,
            burst: 1_000,
            force_full_resync: false,
        },
        output: OutputConfig {
            site_dir: site_dir.to_string_lossy().to_string(),
        },
    }
}

/// JSON for one file entry in a listing response
fn file_entry(base_url: &str, file_path: &str, content_id: &str) -> Value {
    json!({
        "name": file_path.rsplit('/').next().unwrap(),
        "path": file_path,
        "kind": "file",
        "content_id": content_id,
        "size": 100,
        "download_url": format!("{}/raw/{}", base_url, file_path),
    })
}

/// Mounts an unpaginated listing for the docs directory
async fn mount_listing(server: &MockServer, entries: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path("/repos/acme/handbook/contents/docs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entries": entries,
            "next_page_token": null,
        })))
        .mount(server)
        .await;
}

/// Mounts the raw download for one file
async fn mount_download(server: &MockServer, file_path: &str, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(format!("/raw/{}", file_path)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .mount(server)
        .await;
}

/// Counts requests the server received for the given path
async fn request_count(server: &MockServer, wanted: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == wanted)
        .count()
}

/// Runs one sync against the server and returns the report
async fn run_sync(config: Config) -> docsync::sync::SyncReport {
    let mut coordinator = Coordinator::new(config, None).expect("failed to create coordinator");
    coordinator.run(false).await.expect("sync run failed")
}

fn read_tree(site_dir: &Path) -> Value {
    let content = std::fs::read_to_string(site_dir.join("site_tree.json")).unwrap();
    serde_json::from_str(&content).unwrap()
}

/// Finds a node by title anywhere in the tree
fn find_node<'a>(node: &'a Value, title: &str) -> Option<&'a Value> {
    if node["title"] == title {
        return Some(node);
    }
    node["children"]
        .as_array()
        .into_iter()
        .flatten()
        .find_map(|child| find_node(child, title))
}

#[tokio::test]
async fn test_first_sync_creates_fragment_and_tree_node() {
    let server = MockServer::start().await;
    let site = TempDir::new().unwrap();

    mount_listing(
        &server,
        vec![file_entry(&server.uri(), "docs/guide.md", "c1")],
    )
    .await;
    mount_download(&server, "docs/guide.md", b"# Guide\n\nWelcome.").await;

    let report = run_sync(create_test_config(&server.uri(), site.path())).await;

    assert_eq!(report.synced, vec!["docs/guide.md".to_string()]);
    assert!(!report.has_failures());

    let fragment = site.path().join("fragments/docs-guide-md.html");
    let html = std::fs::read_to_string(&fragment).unwrap();
    assert!(html.contains("<h1>Guide</h1>"));

    let tree = read_tree(site.path());
    assert_eq!(tree["site_title"], "Documentation");
    assert_eq!(tree["sidebar_title"], "Contents");
    let node = find_node(&tree["tree"], "Guide").expect("missing Guide node");
    assert_eq!(node["slug"], "docs-guide-md");
    assert_eq!(node["path"], "docs/guide.md");
}

#[tokio::test]
async fn test_second_run_is_idempotent_and_fetches_nothing() {
    let server = MockServer::start().await;
    let site = TempDir::new().unwrap();

    mount_listing(
        &server,
        vec![file_entry(&server.uri(), "docs/guide.md", "c1")],
    )
    .await;
    mount_download(&server, "docs/guide.md", b"# Guide\n").await;

    let config = create_test_config(&server.uri(), site.path());
    run_sync(config.clone()).await;

    let manifest_before = std::fs::read(site.path().join("manifest.json")).unwrap();
    let tree_before = std::fs::read(site.path().join("site_tree.json")).unwrap();
    let fragment_before =
        std::fs::read(site.path().join("fragments/docs-guide-md.html")).unwrap();

    let report = run_sync(config).await;

    assert!(report.synced.is_empty());
    assert_eq!(report.unchanged, 1);
    assert_eq!(request_count(&server, "/raw/docs/guide.md").await, 1);

    assert_eq!(
        std::fs::read(site.path().join("manifest.json")).unwrap(),
        manifest_before
    );
    assert_eq!(
        std::fs::read(site.path().join("site_tree.json")).unwrap(),
        tree_before
    );
    assert_eq!(
        std::fs::read(site.path().join("fragments/docs-guide-md.html")).unwrap(),
        fragment_before
    );
}

#[tokio::test]
async fn test_corrupt_document_fails_without_blocking_others() {
    let server = MockServer::start().await;
    let site = TempDir::new().unwrap();

    mount_listing(
        &server,
        vec![
            file_entry(&server.uri(), "docs/guide.md", "c1"),
            file_entry(&server.uri(), "docs/notes.docx", "c2"),
        ],
    )
    .await;
    mount_download(&server, "docs/guide.md", b"# Guide\n").await;
    mount_download(&server, "docs/notes.docx", b"definitely not a zip archive").await;

    let report = run_sync(create_test_config(&server.uri(), site.path())).await;

    assert_eq!(report.synced, vec!["docs/guide.md".to_string()]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].path, "docs/notes.docx");
    assert!(report.has_failures());

    // The failed file never reaches the manifest or the tree
    let manifest = std::fs::read_to_string(site.path().join("manifest.json")).unwrap();
    assert!(manifest.contains("docs/guide.md"));
    assert!(!manifest.contains("docs/notes.docx"));
    assert!(find_node(&read_tree(site.path())["tree"], "notes").is_none());
}

#[tokio::test]
async fn test_removed_file_disappears_from_site() {
    let server = MockServer::start().await;
    let site = TempDir::new().unwrap();

    // First listing has both files; once consumed, the second takes over
    Mock::given(method("GET"))
        .and(path("/repos/acme/handbook/contents/docs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entries": [
                file_entry(&server.uri(), "docs/guide.md", "c1"),
                file_entry(&server.uri(), "docs/old.txt", "c2"),
            ],
            "next_page_token": null,
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_listing(
        &server,
        vec![file_entry(&server.uri(), "docs/guide.md", "c1")],
    )
    .await;
    mount_download(&server, "docs/guide.md", b"# Guide\n").await;
    mount_download(&server, "docs/old.txt", b"obsolete").await;

    let config = create_test_config(&server.uri(), site.path());
    run_sync(config.clone()).await;
    assert!(site.path().join("fragments/docs-old-txt.html").exists());

    let report = run_sync(config).await;

    assert_eq!(report.removed, vec!["docs/old.txt".to_string()]);
    assert!(!site.path().join("fragments/docs-old-txt.html").exists());

    let manifest = std::fs::read_to_string(site.path().join("manifest.json")).unwrap();
    assert!(!manifest.contains("docs/old.txt"));
    assert!(find_node(&read_tree(site.path())["tree"], "old").is_none());
}

#[tokio::test]
async fn test_persistent_rate_limiting_exhausts_retries() {
    let server = MockServer::start().await;
    let site = TempDir::new().unwrap();

    mount_listing(
        &server,
        vec![file_entry(&server.uri(), "docs/guide.md", "c1")],
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/raw/docs/guide.md"))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&server)
        .await;

    let report = run_sync(create_test_config(&server.uri(), site.path())).await;

    assert!(report.synced.is_empty());
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].reason.contains("Rate limited"));
}

#[tokio::test]
async fn test_force_full_resync_refetches_everything() {
    let server = MockServer::start().await;
    let site = TempDir::new().unwrap();

    mount_listing(
        &server,
        vec![
            file_entry(&server.uri(), "docs/a.md", "c1"),
            file_entry(&server.uri(), "docs/b.txt", "c2"),
        ],
    )
    .await;
    mount_download(&server, "docs/a.md", b"# A\n").await;
    mount_download(&server, "docs/b.txt", b"b content").await;

    let config = create_test_config(&server.uri(), site.path());
    run_sync(config.clone()).await;
    let manifest_before: Value =
        serde_json::from_str(&std::fs::read_to_string(site.path().join("manifest.json")).unwrap())
            .unwrap();

    let mut forced = config;
    forced.sync.force_full_resync = true;
    let report = run_sync(forced).await;

    assert_eq!(report.synced.len(), 2);
    assert_eq!(request_count(&server, "/raw/docs/a.md").await, 2);
    assert_eq!(request_count(&server, "/raw/docs/b.txt").await, 2);

    // Content-identical to the pre-force manifest apart from timestamps
    let manifest_after: Value =
        serde_json::from_str(&std::fs::read_to_string(site.path().join("manifest.json")).unwrap())
            .unwrap();
    for path in ["docs/a.md", "docs/b.txt"] {
        for field in ["content_id", "title", "slug"] {
            assert_eq!(
                manifest_before["entries"][path][field],
                manifest_after["entries"][path][field],
                "{} {} drifted across forced resync",
                path,
                field
            );
        }
    }
}

#[tokio::test]
async fn test_listing_failure_leaves_previous_state_untouched() {
    let server = MockServer::start().await;
    let site = TempDir::new().unwrap();

    mount_listing(
        &server,
        vec![file_entry(&server.uri(), "docs/guide.md", "c1")],
    )
    .await;
    mount_download(&server, "docs/guide.md", b"# Guide\n").await;

    run_sync(create_test_config(&server.uri(), site.path())).await;
    let manifest_before = std::fs::read(site.path().join("manifest.json")).unwrap();
    let tree_before = std::fs::read(site.path().join("site_tree.json")).unwrap();

    // Second run against a remote that only serves errors
    let broken = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&broken)
        .await;

    let mut coordinator =
        Coordinator::new(create_test_config(&broken.uri(), site.path()), None).unwrap();
    let result = coordinator.run(false).await;

    assert!(matches!(result, Err(SyncError::Fetch { .. })));
    assert_eq!(
        std::fs::read(site.path().join("manifest.json")).unwrap(),
        manifest_before
    );
    assert_eq!(
        std::fs::read(site.path().join("site_tree.json")).unwrap(),
        tree_before
    );
}

#[tokio::test]
async fn test_slug_collision_aborts_without_persisting() {
    let server = MockServer::start().await;
    let site = TempDir::new().unwrap();

    // Both paths sanitize to "docs-guide-md"
    mount_listing(
        &server,
        vec![
            file_entry(&server.uri(), "docs/Guide.md", "c1"),
            file_entry(&server.uri(), "docs/guide.md", "c2"),
        ],
    )
    .await;
    mount_download(&server, "docs/Guide.md", b"# One\n").await;
    mount_download(&server, "docs/guide.md", b"# Two\n").await;

    let mut coordinator =
        Coordinator::new(create_test_config(&server.uri(), site.path()), None).unwrap();
    let result = coordinator.run(false).await;

    assert!(matches!(result, Err(SyncError::SlugCollision { .. })));
    assert!(!site.path().join("manifest.json").exists());
    assert!(!site.path().join("site_tree.json").exists());
}

#[tokio::test]
async fn test_paginated_listing_is_merged() {
    let server = MockServer::start().await;
    let site = TempDir::new().unwrap();

    // Token-bearing request must be matched before the plain one
    Mock::given(method("GET"))
        .and(path("/repos/acme/handbook/contents/docs"))
        .and(query_param("page_token", "t2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entries": [file_entry(&server.uri(), "docs/second.md", "c2")],
            "next_page_token": null,
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/handbook/contents/docs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entries": [file_entry(&server.uri(), "docs/first.md", "c1")],
            "next_page_token": "t2",
        })))
        .mount(&server)
        .await;
    mount_download(&server, "docs/first.md", b"# First\n").await;
    mount_download(&server, "docs/second.md", b"# Second\n").await;

    let report = run_sync(create_test_config(&server.uri(), site.path())).await;

    assert_eq!(report.listed, 2);
    assert_eq!(
        report.synced,
        vec!["docs/first.md".to_string(), "docs/second.md".to_string()]
    );
}

#[tokio::test]
async fn test_modified_file_is_refetched_and_title_updates() {
    let server = MockServer::start().await;
    let site = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/repos/acme/handbook/contents/docs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entries": [file_entry(&server.uri(), "docs/guide.md", "c1")],
            "next_page_token": null,
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_listing(
        &server,
        vec![file_entry(&server.uri(), "docs/guide.md", "c2")],
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/raw/docs/guide.md"))
        .respond_with(ResponseTemplate::new(200).set_body_string("# Old Title\n"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_download(&server, "docs/guide.md", b"# New Title\n").await;

    let config = create_test_config(&server.uri(), site.path());
    run_sync(config.clone()).await;
    assert!(find_node(&read_tree(site.path())["tree"], "Old Title").is_some());

    let report = run_sync(config).await;

    assert_eq!(report.synced, vec!["docs/guide.md".to_string()]);
    assert_eq!(request_count(&server, "/raw/docs/guide.md").await, 2);
    assert!(find_node(&read_tree(site.path())["tree"], "Old Title").is_none());
    assert!(find_node(&read_tree(site.path())["tree"], "New Title").is_some());
}

#[tokio::test]
async fn test_dry_run_mutates_nothing() {
    let server = MockServer::start().await;
    let site = TempDir::new().unwrap();

    mount_listing(
        &server,
        vec![file_entry(&server.uri(), "docs/guide.md", "c1")],
    )
    .await;

    let mut coordinator =
        Coordinator::new(create_test_config(&server.uri(), site.path()), None).unwrap();
    let report = coordinator.run(true).await.unwrap();

    assert!(report.dry_run);
    assert_eq!(report.synced, vec!["docs/guide.md".to_string()]);
    assert_eq!(request_count(&server, "/raw/docs/guide.md").await, 0);
    assert!(!site.path().join("manifest.json").exists());
    assert!(!site.path().join("fragments").exists());
}
