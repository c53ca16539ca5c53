//! Sync orchestration
//!
//! This module drives one sync run end to end: the coordinator walks the
//! run's phases in order, the differ decides what to fetch, the fetcher runs
//! the bounded worker pool, and the report summarizes the outcome for the
//! CLI.

mod coordinator;
mod differ;
mod fetcher;
mod phase;
mod report;

pub use coordinator::Coordinator;
pub use differ::{diff, ChangeSet};
pub use fetcher::{fetch_and_convert, FetchOutcome, FetchedDocument};
pub use phase::RunPhase;
pub use report::{FailedFile, SyncReport};
