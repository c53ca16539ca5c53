//! Manifest persistence
//!
//! Loading is forgiving: a missing or unreadable manifest degrades to an
//! empty one, which causes a full resync on the next diff. Saving is strict
//! and atomic: the manifest is written to a temporary file in the target
//! directory and renamed into place, so a crash mid-write never leaves a
//! truncated manifest behind.

use crate::manifest::SyncManifest;
use crate::{Result, SyncError};
use std::path::Path;
use tempfile::NamedTempFile;

/// Loads the manifest persisted by the previous run
///
/// A missing file is the normal first-run case and yields an empty manifest.
/// A file that exists but cannot be parsed is treated the same way, with a
/// warning: the run degrades to a full resync instead of aborting.
///
/// # Arguments
///
/// * `path` - Location of the manifest file
///
/// # Returns
///
/// * The previous manifest, or an empty one when none is usable
pub fn load_manifest(path: &Path) -> SyncManifest {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No previous manifest at {}; starting fresh", path.display());
            return SyncManifest::new();
        }
        Err(e) => {
            let err = SyncError::ManifestCorruption(e.to_string());
            tracing::warn!("{} ({})", err, path.display());
            return SyncManifest::new();
        }
    };

    match parse_manifest(&content) {
        Ok(manifest) => manifest,
        Err(err) => {
            tracing::warn!("{} ({})", err, path.display());
            SyncManifest::new()
        }
    }
}

/// Parses persisted manifest JSON
///
/// Parse failures surface as the corruption error; `load_manifest` degrades
/// them to an empty manifest, which the next diff turns into a full resync.
fn parse_manifest(content: &str) -> Result<SyncManifest> {
    serde_json::from_str(content).map_err(|e| SyncError::ManifestCorruption(e.to_string()))
}

/// Atomically persists the manifest for the next run
///
/// The content is written to a temporary file in the manifest's directory and
/// renamed over the destination, so readers either see the previous manifest
/// or the complete new one.
///
/// # Arguments
///
/// * `path` - Destination for the manifest file
/// * `manifest` - The post-run state to persist
///
/// # Returns
///
/// * `Ok(())` - The manifest was written and renamed into place
/// * `Err(SyncError::Io)` - The write or rename failed
pub fn save_manifest(path: &Path, manifest: &SyncManifest) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;

    let json = serde_json::to_string_pretty(manifest)?;

    let temp = NamedTempFile::new_in(dir)?;
    std::fs::write(temp.path(), json.as_bytes())?;
    temp.persist(path).map_err(|e| e.error)?;

    tracing::debug!(
        "Persisted manifest with {} entries to {}",
        manifest.len(),
        path.display()
    );
    Ok(())
}
