//! Sync manifest
//!
//! The manifest is the persisted record of the last successful run: for every
//! synced path, the content identifier that was converted, the extracted
//! title, and the slug. The next run diffs the remote listing against it to
//! decide what to fetch.

mod store;

pub use store::{load_manifest, save_manifest};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Persisted state for one synced document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Content identifier the remote reported when this entry was synced
    pub content_id: String,

    /// Extracted document title
    pub title: String,

    /// Sanitized path slug naming the output fragment
    pub slug: String,

    /// When this entry last completed a fetch-and-convert cycle
    pub last_synced_at: DateTime<Utc>,
}

/// The full persisted sync state, keyed by repository path
///
/// Entries are kept in a sorted map so serialization is byte-deterministic:
/// two manifests with the same entries always produce identical JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncManifest {
    pub entries: BTreeMap<String, ManifestEntry>,
}

impl SyncManifest {
    /// Creates an empty manifest
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entry for a path, if it was synced before
    pub fn get(&self, path: &str) -> Option<&ManifestEntry> {
        self.entries.get(path)
    }

    /// Inserts or replaces the entry for a path
    pub fn insert(&mut self, path: String, entry: ManifestEntry) {
        self.entries.insert(path, entry);
    }

    /// Removes the entry for a path, returning it if present
    pub fn remove(&mut self, path: &str) -> Option<ManifestEntry> {
        self.entries.remove(path)
    }

    /// Number of tracked documents
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no documents are tracked
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
