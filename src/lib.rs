//! Docsync: a documentation sync-and-convert pipeline
//!
//! This crate synchronizes a documentation tree hosted in a remote repository
//! into a statically browsable site: it lists the remote tree, fetches only the
//! files whose content changed since the last run, converts plain-text,
//! markdown, and word documents into HTML fragments, and rebuilds the
//! navigation tree consumed by the site renderer.

pub mod config;
pub mod convert;
pub mod manifest;
pub mod remote;
pub mod site;
pub mod sync;

use thiserror::Error;

/// Main error type for docsync operations
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error for {path}: {reason}")]
    Fetch { path: String, reason: String },

    #[error("Rate limited by remote API for {path}")]
    RateLimited { path: String },

    #[error("Unsupported document format: {path}")]
    UnsupportedFormat { path: String },

    #[error("Conversion failed for {path}: {reason}")]
    Conversion { path: String, reason: String },

    #[error("Slug collision: {first} and {second} both map to '{slug}'")]
    SlugCollision {
        slug: String,
        first: String,
        second: String,
    },

    #[error("Manifest unreadable, forcing full resync: {0}")]
    ManifestCorruption(String),

    #[error("Sync run cancelled")]
    Cancelled,

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SyncError {
    /// Returns true if this failure is scoped to a single file
    ///
    /// Per-file errors are accumulated into the run report instead of
    /// aborting the run. Everything else is fatal: the run aborts before
    /// any persisted state is mutated.
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            Self::Fetch { .. }
                | Self::RateLimited { .. }
                | Self::UnsupportedFormat { .. }
                | Self::Conversion { .. }
        )
    }

    /// Returns true if the operation that produced this error may be retried
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid exclude pattern: {0}")]
    InvalidPattern(String),
}

/// Result type alias for docsync operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use convert::{ConvertedDocument, DocumentFormat, SourceDocument};
pub use manifest::{ManifestEntry, SyncManifest};
pub use remote::{EntryKind, RemoteEntry};
pub use site::SiteTreeNode;
pub use sync::{ChangeSet, RunPhase, SyncReport};
