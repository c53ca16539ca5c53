//! Sync coordinator - main run orchestration logic
//!
//! This module contains the run loop that coordinates one sync, including:
//! - Listing the remote documentation tree
//! - Diffing against the previous manifest
//! - Driving the concurrent fetch-and-convert pool
//! - Rebuilding the navigation tree
//! - Persisting fragments, tree, and manifest
//!
//! Every phase before persistence is read-only with respect to the output
//! directory: a fatal error or cancellation aborts the run with the previous
//! run's artifacts untouched.

use crate::config::Config;
use crate::manifest::{load_manifest, save_manifest, ManifestEntry, SyncManifest};
use crate::remote::{build_http_client, list_tree, ExcludeFilters, RemoteClient, TokenBucket};
use crate::site::{build_site_tree, SiteDocument, SiteTreeNode};
use crate::sync::differ::diff;
use crate::sync::fetcher::{fetch_and_convert, FetchedDocument};
use crate::sync::phase::RunPhase;
use crate::sync::report::SyncReport;
use crate::{Result, SyncError};
use chrono::Utc;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempfile::NamedTempFile;

/// The persisted navigation file consumed by the external site renderer
#[derive(Serialize)]
struct SiteTreeFile<'a> {
    site_title: &'a str,
    sidebar_title: &'a str,
    tree: &'a SiteTreeNode,
}

/// Main sync coordinator structure
pub struct Coordinator {
    config: Config,
    client: Arc<RemoteClient>,
    cancelled: Arc<AtomicBool>,
    phase: RunPhase,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The sync configuration
    /// * `auth_token` - Optional bearer token for the remote API
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(SyncError)` - Failed to build the HTTP client
    pub fn new(config: Config, auth_token: Option<&str>) -> Result<Self> {
        let http = build_http_client(auth_token)?;

        let throttle = Arc::new(TokenBucket::new(
            config.sync.burst,
            config.sync.requests_per_second,
        ));

        let client = Arc::new(RemoteClient::new(
            http,
            &config.source.api_base_url,
            &config.source.repository,
            config.sync.max_retries,
            throttle,
        ));

        Ok(Self {
            config,
            client,
            cancelled: Arc::new(AtomicBool::new(false)),
            phase: RunPhase::Idle,
        })
    }

    /// Returns the shared cancellation flag
    ///
    /// Setting it stops the run at the next phase boundary; in-flight file
    /// downloads finish, but no new files are started and nothing persists.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// The phase the run is currently in
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Runs one full sync
    ///
    /// # Arguments
    ///
    /// * `dry_run` - List and diff only; print what would change
    ///
    /// # Returns
    ///
    /// * `Ok(SyncReport)` - The run completed (possibly with per-file failures)
    /// * `Err(SyncError)` - The run aborted; persisted state is untouched
    pub async fn run(&mut self, dry_run: bool) -> Result<SyncReport> {
        match self.run_phases(dry_run).await {
            Ok(report) => {
                self.phase = RunPhase::Idle;
                Ok(report)
            }
            Err(e) => {
                tracing::error!("Sync run aborted during {}: {}", self.phase, e);
                self.phase = RunPhase::Aborted;
                Err(e)
            }
        }
    }

    async fn run_phases(&mut self, dry_run: bool) -> Result<SyncReport> {
        let start = std::time::Instant::now();
        let site_dir = PathBuf::from(&self.config.output.site_dir);
        let manifest_path = site_dir.join("manifest.json");

        self.phase = RunPhase::Listing;
        let filters = ExcludeFilters::from_config(&self.config.source)?;
        let listing = list_tree(&self.client, &self.config.source.directory, &filters).await?;
        self.check_cancelled()?;

        self.phase = RunPhase::Diffing;
        let previous = load_manifest(&manifest_path);
        let changes = diff(&listing, &previous, self.config.sync.force_full_resync);
        let unchanged = listing.len() - changes.fetch_count();

        if dry_run {
            return Ok(SyncReport {
                listed: listing.len(),
                unchanged,
                synced: changes.to_fetch().map(|e| e.path.clone()).collect(),
                removed: changes.removed.clone(),
                failed: Vec::new(),
                dry_run: true,
                elapsed: start.elapsed(),
            });
        }

        self.phase = RunPhase::Fetching;
        let outcome = fetch_and_convert(
            Arc::clone(&self.client),
            changes.to_fetch().cloned().collect(),
            self.config.sync.concurrency as usize,
            Arc::clone(&self.cancelled),
        )
        .await;
        if outcome.cancelled {
            return Err(SyncError::Cancelled);
        }
        self.check_cancelled()?;

        let (next_manifest, removed_slugs) =
            merge_results(&previous, &changes.removed, &outcome.synced);

        self.phase = RunPhase::TreeBuilding;
        let documents: Vec<SiteDocument> = next_manifest
            .entries
            .iter()
            .map(|(path, entry)| SiteDocument {
                path: path.clone(),
                title: entry.title.clone(),
                slug: entry.slug.clone(),
            })
            .collect();
        let tree = build_site_tree(&self.config.site.site_title, &documents)?;

        self.check_cancelled()?;
        self.phase = RunPhase::Persisting;
        self.persist(
            &site_dir,
            &manifest_path,
            &next_manifest,
            &outcome.synced,
            &removed_slugs,
            &tree,
        )?;

        Ok(SyncReport {
            listed: listing.len(),
            unchanged,
            synced: outcome.synced.iter().map(|f| f.entry.path.clone()).collect(),
            removed: changes.removed,
            failed: outcome.failed,
            dry_run: false,
            elapsed: start.elapsed(),
        })
    }

    /// Writes fragments, the navigation tree, and finally the manifest
    ///
    /// The manifest is written last and atomically: it only records state
    /// whose fragments are already on disk.
    fn persist(
        &self,
        site_dir: &Path,
        manifest_path: &Path,
        next_manifest: &SyncManifest,
        synced: &[FetchedDocument],
        removed_slugs: &[String],
        tree: &SiteTreeNode,
    ) -> Result<()> {
        let fragments_dir = site_dir.join("fragments");
        std::fs::create_dir_all(&fragments_dir)?;

        for fetched in synced {
            let fragment_path = fragments_dir.join(format!("{}.html", fetched.document.slug));
            std::fs::write(&fragment_path, &fetched.document.html)?;
        }

        for slug in removed_slugs {
            let fragment_path = fragments_dir.join(format!("{}.html", slug));
            if fragment_path.exists() {
                std::fs::remove_file(&fragment_path)?;
            }
        }

        let tree_file = SiteTreeFile {
            site_title: &self.config.site.site_title,
            sidebar_title: &self.config.site.sidebar_title,
            tree,
        };
        let tree_json = serde_json::to_string_pretty(&tree_file)?;
        let temp = NamedTempFile::new_in(site_dir)?;
        std::fs::write(temp.path(), tree_json.as_bytes())?;
        temp.persist(site_dir.join("site_tree.json"))
            .map_err(|e| e.error)?;

        save_manifest(manifest_path, next_manifest)?;

        Ok(())
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancelled.load(Ordering::SeqCst) {
            tracing::info!("Cancellation requested, aborting run");
            return Err(SyncError::Cancelled);
        }
        Ok(())
    }
}

/// Merges this run's results into the next manifest
///
/// Removed paths drop out (their slugs are returned so the persist phase can
/// delete the fragments), successfully synced documents replace or add their
/// entries, and everything else carries over unchanged, timestamp included.
/// A file that failed this run therefore keeps its previous entry.
fn merge_results(
    previous: &SyncManifest,
    removed: &[String],
    synced: &[FetchedDocument],
) -> (SyncManifest, Vec<String>) {
    let mut next = previous.clone();

    let mut removed_slugs = Vec::new();
    for path in removed {
        if let Some(entry) = next.remove(path) {
            removed_slugs.push(entry.slug);
        }
    }

    let now = Utc::now();
    for fetched in synced {
        next.insert(
            fetched.entry.path.clone(),
            ManifestEntry {
                content_id: fetched.entry.content_id.clone(),
                title: fetched.document.title.clone(),
                slug: fetched.document.slug.clone(),
                last_synced_at: now,
            },
        );
    }

    (next, removed_slugs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::ConvertedDocument;
    use crate::remote::{EntryKind, RemoteEntry};

    fn fetched(path: &str, content_id: &str, title: &str) -> FetchedDocument {
        FetchedDocument {
            entry: RemoteEntry {
                name: path.rsplit('/').next().unwrap().to_string(),
                path: path.to_string(),
                kind: EntryKind::File,
                content_id: content_id.to_string(),
                size: 1,
                download_url: String::new(),
            },
            document: ConvertedDocument {
                path: path.to_string(),
                html: "<p>x</p>".to_string(),
                title: title.to_string(),
                slug: crate::site::slugify(path),
            },
        }
    }

    fn previous_with(entries: &[(&str, &str)]) -> SyncManifest {
        let mut manifest = SyncManifest::new();
        for (path, content_id) in entries {
            manifest.insert(
                path.to_string(),
                ManifestEntry {
                    content_id: content_id.to_string(),
                    title: "Old".to_string(),
                    slug: crate::site::slugify(path),
                    last_synced_at: Utc::now(),
                },
            );
        }
        manifest
    }

    #[test]
    fn test_merge_adds_new_entries() {
        let previous = SyncManifest::new();
        let synced = vec![fetched("docs/a.md", "c1", "A")];

        let (next, removed_slugs) = merge_results(&previous, &[], &synced);
        assert_eq!(next.len(), 1);
        assert_eq!(next.get("docs/a.md").unwrap().content_id, "c1");
        assert!(removed_slugs.is_empty());
    }

    #[test]
    fn test_merge_replaces_modified_entries() {
        let previous = previous_with(&[("docs/a.md", "c1")]);
        let synced = vec![fetched("docs/a.md", "c2", "New Title")];

        let (next, _) = merge_results(&previous, &[], &synced);
        let entry = next.get("docs/a.md").unwrap();
        assert_eq!(entry.content_id, "c2");
        assert_eq!(entry.title, "New Title");
    }

    #[test]
    fn test_merge_drops_removed_and_returns_slugs() {
        let previous = previous_with(&[("docs/a.md", "c1"), ("docs/old.txt", "c2")]);

        let (next, removed_slugs) =
            merge_results(&previous, &["docs/old.txt".to_string()], &[]);
        assert!(next.get("docs/old.txt").is_none());
        assert_eq!(next.len(), 1);
        assert_eq!(removed_slugs, vec!["docs-old-txt".to_string()]);
    }

    #[test]
    fn test_merge_keeps_failed_files_previous_entry() {
        // A modified file that failed its fetch is simply absent from the
        // synced list; its previous entry must survive untouched.
        let previous = previous_with(&[("docs/broken.docx", "c1")]);

        let (next, _) = merge_results(&previous, &[], &[]);
        assert_eq!(next.get("docs/broken.docx").unwrap().content_id, "c1");
    }

    #[test]
    fn test_merge_preserves_unchanged_timestamps() {
        let previous = previous_with(&[("docs/a.md", "c1")]);
        let before = previous.get("docs/a.md").unwrap().last_synced_at;

        let (next, _) = merge_results(&previous, &[], &[]);
        assert_eq!(next.get("docs/a.md").unwrap().last_synced_at, before);
    }
}
