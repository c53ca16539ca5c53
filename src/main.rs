//! Docsync main entry point
//!
//! This is the command-line interface for the docsync documentation
//! synchronizer.

use clap::Parser;
use docsync::config::load_config_with_hash;
use docsync::sync::Coordinator;
use docsync::SyncError;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the bearer token for the remote API
const TOKEN_ENV_VAR: &str = "DOCSYNC_TOKEN";

/// Docsync: keep a documentation site in step with its source repository
///
/// Docsync lists a documentation tree in a remote repository, fetches only
/// the files whose content changed since the last run, converts them to HTML
/// fragments, and rebuilds the navigation tree for the site renderer.
#[derive(Parser, Debug)]
#[command(name = "docsync")]
#[command(version)]
#[command(about = "Sync remote documentation into a browsable site", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Re-fetch every document, ignoring the previous manifest
    #[arg(long)]
    force_full_resync: bool,

    /// Override the configured number of concurrent fetches
    #[arg(long, value_name = "N")]
    concurrency: Option<u32>,

    /// List and diff only; print what would change without writing anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, _config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return ExitCode::from(2);
        }
    };

    // CLI flags override their config counterparts
    if cli.force_full_resync {
        config.sync.force_full_resync = true;
    }
    if let Some(concurrency) = cli.concurrency {
        config.sync.concurrency = concurrency;
    }

    let auth_token = std::env::var(TOKEN_ENV_VAR).ok();
    if auth_token.is_none() {
        tracing::debug!("{} not set; requests go out unauthenticated", TOKEN_ENV_VAR);
    }

    let mut coordinator = match Coordinator::new(config, auth_token.as_deref()) {
        Ok(coordinator) => coordinator,
        Err(e) => {
            tracing::error!("Failed to initialize: {}", e);
            return ExitCode::from(2);
        }
    };

    // Ctrl-C requests cooperative cancellation; the run aborts at the next
    // phase or file boundary without persisting anything.
    let cancel_flag = coordinator.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling sync");
            cancel_flag.store(true, Ordering::SeqCst);
        }
    });

    match coordinator.run(cli.dry_run).await {
        Ok(report) => {
            print!("{}", report);
            if report.has_failures() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(SyncError::Cancelled) => {
            tracing::warn!("Sync cancelled; previous site state left untouched");
            ExitCode::from(2)
        }
        Err(e) => {
            tracing::error!("Sync failed: {}", e);
            ExitCode::from(2)
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("docsync=info,warn"),
            1 => EnvFilter::new("docsync=debug,info"),
            2 => EnvFilter::new("docsync=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
