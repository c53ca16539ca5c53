//! Configuration module for docsync
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files.
//!
//! # Example
//!
//! ```no_run
//! use docsync::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("docsync.toml")).unwrap();
//! println!("Syncing {}", config.source.repository);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, OutputConfig, SiteConfig, SourceConfig, SyncConfig, DEFAULT_CONCURRENCY,
    DEFAULT_MAX_RETRIES,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
