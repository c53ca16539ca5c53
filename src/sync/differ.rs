//! Change detection
//!
//! Diffs the current remote listing against the manifest persisted by the
//! previous run. Identity is the repository path; staleness is decided
//! strictly by the remote content identifier, never by timestamps, so a
//! touched-but-unchanged file is not re-fetched.

use crate::manifest::SyncManifest;
use crate::remote::RemoteEntry;
use std::collections::HashSet;

/// The outcome of diffing a listing against the previous manifest
#[derive(Debug, Default)]
pub struct ChangeSet {
    /// Entries with no previous manifest record
    pub added: Vec<RemoteEntry>,

    /// Entries whose content identifier differs from the manifest
    pub modified: Vec<RemoteEntry>,

    /// Paths present in the manifest but absent from the listing
    pub removed: Vec<String>,
}

impl ChangeSet {
    /// Entries that need a fetch-and-convert cycle this run
    pub fn to_fetch(&self) -> impl Iterator<Item = &RemoteEntry> {
        self.added.iter().chain(self.modified.iter())
    }

    /// Total number of entries to fetch
    pub fn fetch_count(&self) -> usize {
        self.added.len() + self.modified.len()
    }

    /// True when nothing changed since the previous run
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.removed.is_empty()
    }
}

/// Diffs the current listing against the previous manifest
///
/// With `force_full_resync` every listed entry is treated as added, ignoring
/// the manifest's content identifiers; removals are still detected so stale
/// paths are cleaned up.
///
/// # Arguments
///
/// * `current` - The remote listing for this run
/// * `previous` - The manifest from the last successful run
/// * `force_full_resync` - Re-fetch everything regardless of content ids
///
/// # Returns
///
/// * The added/modified/removed sets, in listing order
pub fn diff(current: &[RemoteEntry], previous: &SyncManifest, force_full_resync: bool) -> ChangeSet {
    let mut changes = ChangeSet::default();

    let current_paths: HashSet<&str> = current.iter().map(|e| e.path.as_str()).collect();

    for entry in current {
        if force_full_resync {
            changes.added.push(entry.clone());
            continue;
        }

        match previous.get(&entry.path) {
            None => changes.added.push(entry.clone()),
            Some(known) if known.content_id != entry.content_id => {
                changes.modified.push(entry.clone());
            }
            Some(_) => {}
        }
    }

    for path in previous.entries.keys() {
        if !current_paths.contains(path.as_str()) {
            changes.removed.push(path.clone());
        }
    }

    tracing::info!(
        "Change detection: {} added, {} modified, {} removed, {} unchanged",
        changes.added.len(),
        changes.modified.len(),
        changes.removed.len(),
        current.len() - changes.fetch_count()
    );

    changes
}
