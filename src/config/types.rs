use serde::Deserialize;

/// Default fetch worker pool size
pub const DEFAULT_CONCURRENCY: u32 = 4;

/// Default maximum attempts per file fetch
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Main configuration structure for docsync
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub source: SourceConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    pub output: OutputConfig,
}

/// Remote source configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Remote repository identifier, "owner/name"
    pub repository: String,

    /// Root path within the repository to sync
    pub directory: String,

    /// Base URL of the remote listing API
    #[serde(rename = "api-base-url", default = "default_api_base_url")]
    pub api_base_url: String,

    /// Glob patterns for paths to skip entirely
    #[serde(rename = "exclude-patterns", default)]
    pub exclude_patterns: Vec<String>,

    /// Exact file names to skip entirely
    #[serde(rename = "exclude-files", default)]
    pub exclude_files: Vec<String>,
}

/// Display strings passed through to the external site renderer
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    #[serde(rename = "site-title", default = "default_site_title")]
    pub site_title: String,

    #[serde(rename = "sidebar-title", default = "default_sidebar_title")]
    pub sidebar_title: String,
}

/// Sync behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Fetch worker pool size
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,

    /// Maximum attempts per file fetch before it is marked failed
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Token bucket refill rate shared by all fetch workers
    #[serde(rename = "requests-per-second", default = "default_requests_per_second")]
    pub requests_per_second: f64,

    /// Token bucket capacity
    #[serde(default = "default_burst")]
    pub burst: u32,

    /// Ignore the persisted manifest and treat every remote entry as added
    #[serde(rename = "force-full-resync", default)]
    pub force_full_resync: bool,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving fragments/, site_tree.json, and manifest.json
    #[serde(rename = "site-dir")]
    pub site_dir: String,
}

fn default_api_base_url() -> String {
    "https://api.example.com".to_string()
}

fn default_site_title() -> String {
    "Documentation".to_string()
}

fn default_sidebar_title() -> String {
    "Contents".to_string()
}

fn default_concurrency() -> u32 {
    DEFAULT_CONCURRENCY
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_requests_per_second() -> f64 {
    8.0
}

fn default_burst() -> u32 {
    16
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_title: default_site_title(),
            sidebar_title: default_sidebar_title(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            max_retries: default_max_retries(),
            requests_per_second: default_requests_per_second(),
            burst: default_burst(),
            force_full_resync: false,
        }
    }
}
