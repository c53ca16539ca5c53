//! Concurrent fetch-and-convert worker pool
//!
//! Runs the per-file portion of a sync: download the raw bytes, convert to
//! an HTML fragment. Workers run concurrently up to the configured pool
//! size; retries and rate limiting live inside the remote client, so a
//! worker sees each file as a single fallible operation.
//!
//! Results are collected only after every worker finishes. Nothing here
//! touches persisted state.

use crate::convert::{convert, detect_format, ConvertedDocument, SourceDocument};
use crate::remote::{RemoteClient, RemoteEntry};
use crate::sync::report::FailedFile;
use crate::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// A successfully fetched and converted document
#[derive(Debug)]
pub struct FetchedDocument {
    /// The listing entry the fetch was made for
    pub entry: RemoteEntry,

    /// The converted HTML rendition
    pub document: ConvertedDocument,
}

/// Collected results after the worker pool drains
#[derive(Debug, Default)]
pub struct FetchOutcome {
    /// Documents that completed their fetch-and-convert cycle
    pub synced: Vec<FetchedDocument>,

    /// Per-file failures; the run continues past them
    pub failed: Vec<FailedFile>,

    /// True when cancellation stopped workers before they all ran
    pub cancelled: bool,
}

enum WorkerResult {
    Synced(Box<FetchedDocument>),
    Failed(FailedFile),
    Cancelled,
}

/// Fetches and converts the given entries with a bounded worker pool
///
/// At most `concurrency` downloads are in flight at once; the shared token
/// bucket inside the client keeps the pool within the remote request quota.
/// Workers check the cancellation flag before starting a file, so Ctrl-C
/// stops the run between files rather than mid-download.
///
/// # Arguments
///
/// * `client` - Shared remote client (throttle + retry inside)
/// * `entries` - The added and modified entries to sync
/// * `concurrency` - Maximum concurrent fetches
/// * `cancelled` - Cooperative cancellation flag
///
/// # Returns
///
/// * The per-file outcomes, collected after the pool drains
pub async fn fetch_and_convert(
    client: Arc<RemoteClient>,
    entries: Vec<RemoteEntry>,
    concurrency: usize,
    cancelled: Arc<AtomicBool>,
) -> FetchOutcome {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut workers = JoinSet::new();

    for entry in entries {
        let client = Arc::clone(&client);
        let semaphore = Arc::clone(&semaphore);
        let cancelled = Arc::clone(&cancelled);

        workers.spawn(async move {
            // The semaphore is never closed, so acquisition cannot fail
            let _permit = semaphore
                .acquire_owned()
                .await
                .expect("semaphore closed while workers active");

            if cancelled.load(Ordering::SeqCst) {
                return WorkerResult::Cancelled;
            }

            tracing::debug!("Syncing {}", entry.path);
            match sync_one(&client, &entry).await {
                Ok(document) => {
                    WorkerResult::Synced(Box::new(FetchedDocument { entry, document }))
                }
                Err(e) => {
                    tracing::warn!("Failed to sync {}: {}", entry.path, e);
                    WorkerResult::Failed(FailedFile {
                        path: entry.path,
                        reason: e.to_string(),
                    })
                }
            }
        });
    }

    let mut outcome = FetchOutcome::default();
    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok(WorkerResult::Synced(fetched)) => outcome.synced.push(*fetched),
            Ok(WorkerResult::Failed(failure)) => outcome.failed.push(failure),
            Ok(WorkerResult::Cancelled) => outcome.cancelled = true,
            Err(e) => tracing::error!("Sync worker panicked: {}", e),
        }
    }

    // Deterministic merge order regardless of completion order
    outcome.synced.sort_by(|a, b| a.entry.path.cmp(&b.entry.path));
    outcome.failed.sort_by(|a, b| a.path.cmp(&b.path));

    outcome
}

/// Runs one file's fetch-and-convert cycle
async fn sync_one(client: &RemoteClient, entry: &RemoteEntry) -> Result<ConvertedDocument> {
    let format = detect_format(&entry.path)?;
    let bytes = client.download(entry).await?;

    convert(&SourceDocument {
        path: entry.path.clone(),
        format,
        bytes,
    })
}
