/// Run phase definitions for tracking sync progress
///
/// This module defines the phases a sync run moves through. The coordinator
/// advances through them strictly in order; any fatal error moves the run to
/// `Aborted` before anything on disk is mutated.
use std::fmt;

/// The phase a sync run is currently in
///
/// Ordering is fixed: Idle → Listing → Diffing → Fetching → TreeBuilding →
/// Persisting → Idle. A fatal error during any phase transitions to Aborted
/// instead, and an aborted run never reaches Persisting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunPhase {
    /// No run in progress
    Idle,

    /// Enumerating the remote documentation tree
    Listing,

    /// Diffing the listing against the previous manifest
    Diffing,

    /// Fetching and converting changed documents concurrently
    Fetching,

    /// Rebuilding the navigation tree from the merged document set
    TreeBuilding,

    /// Writing fragments, tree, and manifest to disk
    Persisting,

    /// The run failed fatally; no persisted state was touched
    Aborted,
}

impl RunPhase {
    /// Returns true while a run is actively progressing
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle | Self::Aborted)
    }

    /// Returns true once the run may mutate persisted state
    ///
    /// Everything before Persisting is read-only with respect to the output
    /// directory; a crash or abort in any earlier phase leaves the previous
    /// run's artifacts fully intact.
    pub fn may_mutate(&self) -> bool {
        matches!(self, Self::Persisting)
    }

    /// Name used in logs and the run report
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Listing => "listing",
            Self::Diffing => "diffing",
            Self::Fetching => "fetching",
            Self::TreeBuilding => "tree-building",
            Self::Persisting => "persisting",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
