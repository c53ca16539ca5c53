//! Remote repository access
//!
//! This module contains everything that talks to the remote listing API:
//! - Building the HTTP client with proper user agent and timeouts
//! - Recursive, paginated directory listing with cycle protection
//! - Retry logic with exponential backoff for transient failures
//! - The token bucket shared by all fetch workers

mod client;
mod lister;
mod throttle;

pub use client::{build_http_client, RemoteClient};
pub use lister::{list_tree, ExcludeFilters};
pub use throttle::TokenBucket;

use serde::Deserialize;

/// Kind of a remote directory entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
}

/// A single entry in the remote directory tree
///
/// Produced by the lister each run and discarded afterwards; the persisted
/// record of a synced file lives in the manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteEntry {
    /// File name without directory components
    pub name: String,

    /// Path relative to the repository root
    pub path: String,

    /// Entry kind (file or directory)
    pub kind: EntryKind,

    /// Stable hash of the blob content, assigned by the remote
    pub content_id: String,

    /// Size hint in bytes
    #[serde(default)]
    pub size: u64,

    /// Locator for downloading the raw bytes
    #[serde(default)]
    pub download_url: String,
}

/// One page of a directory listing response
#[derive(Debug, Deserialize)]
pub struct ListingPage {
    pub entries: Vec<RemoteEntry>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}
