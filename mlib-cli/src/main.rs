//! mlib - command line front end for the media library client store
//!
//! Restores the session from durable storage, runs one command through the
//! store and prints the result as JSON on stdout. Logs go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use mlib_client::store::Store;
use mlib_common::config::{CliOverrides, ConfigResolver};
use mlib_common::models::SeriesId;
use mlib_common::FileStorage;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter, Registry};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "mlib", version, about = "Media library client")]
struct Cli {
    /// REST API root, e.g. http://127.0.0.1:8081/api/v2/
    #[arg(long, env = "MLIB_API_ROOT", global = true)]
    api_root: Option<String>,

    /// Durable storage file (token, recently viewed series)
    #[arg(long, env = "MLIB_STORAGE_PATH", global = true)]
    storage: Option<PathBuf>,

    /// Configuration file (default: <config dir>/mlib/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sign in and store the API token
    Login {
        #[arg(long)]
        username: String,
        #[arg(long, env = "MLIB_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored API token
    Logout,
    /// Show whether a session is active
    Status,
    /// Series commands
    #[command(subcommand)]
    Series(SeriesCommand),
    /// Show the server configuration
    Config,
    /// Show the signed-in user
    Whoami,
}

#[derive(Debug, Subcommand)]
enum SeriesCommand {
    /// List series in the library
    List {
        #[arg(long, value_enum, default_value_t = StatusFilter::All)]
        status: StatusFilter,
    },
    /// Show one series and add it to the recently viewed list
    Show { id: SeriesId },
    /// Add a series to the library
    Add { title: String },
    /// Recently viewed series, most recent first
    Recent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StatusFilter {
    All,
    Active,
    Ended,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging comes up before config resolution so its warnings are visible.
    // RUST_LOG wins; otherwise start at info and switch to the configured
    // level once it is known.
    let env_filter = EnvFilter::try_from_default_env();
    let level_from_env = env_filter.is_ok();
    let (filter, filter_handle) =
        reload::Layer::new(env_filter.unwrap_or_else(|_| EnvFilter::new("info")));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ConfigResolver::new(CliOverrides {
        api_root: cli.api_root.clone(),
        storage_path: cli.storage.clone(),
        config_file: cli.config.clone(),
    })
    .resolve()
    .context("Failed to load configuration")?;

    if !level_from_env {
        apply_log_level(&filter_handle, &config.logging.level);
    }

    info!("Starting mlib v{}", env!("CARGO_PKG_VERSION"));
    info!(
        api_root = %config.api_root,
        storage = %config.storage_path.display(),
        "Configuration loaded"
    );

    let storage = FileStorage::open(&config.storage_path).with_context(|| {
        format!("Failed to open storage at {}", config.storage_path.display())
    })?;
    let store = Store::new(&config, Arc::new(storage))?;

    let output = commands::run(&store, cli.command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

/// Swap the active filter for the configured level
///
/// An unparsable level is logged and the current filter stays.
fn apply_log_level(handle: &reload::Handle<EnvFilter, Registry>, level: &str) -> bool {
    let filter = match EnvFilter::try_new(level) {
        Ok(filter) => filter,
        Err(e) => {
            warn!(level = %level, error = %e, "Invalid logging level in configuration");
            return false;
        }
    };
    match handle.reload(filter) {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Failed to apply configured logging level");
            false
        }
    }
}
