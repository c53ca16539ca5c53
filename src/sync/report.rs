//! Run report
//!
//! Summarizes one sync run for the CLI: what was listed, what changed, what
//! synced, and which files failed. The report decides the process exit code:
//! any per-file failure makes the run "completed with failures".

use std::fmt;
use std::time::Duration;

/// A file that failed its fetch-and-convert cycle this run
#[derive(Debug, Clone)]
pub struct FailedFile {
    /// Path relative to the repository root
    pub path: String,

    /// Human-readable failure reason
    pub reason: String,
}

/// Summary of one completed sync run
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Number of documents in the remote listing
    pub listed: usize,

    /// Number of documents that did not need fetching
    pub unchanged: usize,

    /// Paths synced successfully this run
    pub synced: Vec<String>,

    /// Paths removed from the site this run
    pub removed: Vec<String>,

    /// Per-file failures; the run completed despite them
    pub failed: Vec<FailedFile>,

    /// True when the run only printed what would change
    pub dry_run: bool,

    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

impl SyncReport {
    /// True when at least one file failed its sync cycle
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let heading = if self.dry_run {
            "Dry run (nothing written)"
        } else {
            "Sync complete"
        };
        writeln!(
            f,
            "{}: {} listed, {} unchanged, {} synced, {} removed, {} failed in {:.2}s",
            heading,
            self.listed,
            self.unchanged,
            self.synced.len(),
            self.removed.len(),
            self.failed.len(),
            self.elapsed.as_secs_f64()
        )?;

        for path in &self.synced {
            writeln!(f, "  synced  {}", path)?;
        }
        for path in &self.removed {
            writeln!(f, "  removed {}", path)?;
        }
        for failure in &self.failed {
            writeln!(f, "  failed  {}: {}", failure.path, failure.reason)?;
        }

        Ok(())
    }
}
