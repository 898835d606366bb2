//! Config store command line.
//!
//! # Architecture Overview
//!
//! ```text
//!     worker threads ──get/lookup──▶ ┌──────────────────────────────┐
//!                                    │         ConfigCache          │
//!                                    │  read-scope: current? value  │
//!                                    │  write-scope: reload ────────┼──▶ Loader ──▶ config/*.toml
//!                                    └──────────────┬───────────────┘              config/*.json
//!                                                   │
//!                                    ┌──────────────▼───────────────┐
//!                                    │          PermitLock          │
//!                                    │  one permit per reader thread│
//!                                    │  writers collect all permits │
//!                                    └──────────────────────────────┘
//!
//!     SourceWatcher (notify) ──file changed──▶ ConfigCache::reload
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};

use config_store::config::{resolve_settings, SourceWatcher};
use config_store::loader::{FileLoader, Loader};
use config_store::observability::logging::init_tracing;
use config_store::ConfigCache;

#[derive(Parser)]
#[command(name = "config-store")]
#[command(about = "Inspect and watch reloadable configuration sources", long_about = None)]
struct Cli {
    /// Settings file (TOML); defaults apply when omitted
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Override the source directory
    #[arg(short, long)]
    dir: Option<String>,

    /// Override the active environment
    #[arg(short, long)]
    env: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the value at a dotted path (e.g. database.host)
    Get { path: String },
    /// Check whether a source or entry exists
    Has { name: String },
    /// List source names in the source directory
    List,
    /// Load every source and report the outcome
    Load,
    /// Load every source, then reload on change until Ctrl-C
    Watch,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let settings = resolve_settings(cli.settings.as_deref(), |settings| {
        if let Some(dir) = cli.dir {
            settings.cache.dir = dir;
        }
        if let Some(env) = cli.env {
            settings.cache.environment = env;
        }
    })?;

    init_tracing(&settings.observability.log_level);

    tracing::debug!(
        dir = %settings.cache.dir,
        environment = %settings.cache.environment,
        ttl = ?settings.cache.ttl,
        write_timeout_secs = settings.cache.write_timeout_secs,
        "Settings loaded"
    );

    let cache = Arc::new(ConfigCache::from_dir(settings.cache.settings()));

    match cli.command {
        Commands::Get { path } => match cache.lookup(&path)? {
            Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
            None => {
                eprintln!("No value at `{}`", path);
                return Ok(ExitCode::FAILURE);
            }
        },
        Commands::Has { name } => {
            let found = cache.has(&name);
            println!("{}", found);
            if !found {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::List => {
            let dir = &cache.settings().dir;
            for name in FileLoader::new(dir).list_sources(dir)? {
                println!("{}", name);
            }
        }
        Commands::Load => {
            let report = cache.load_all()?;
            let failed: Vec<&str> = report.failed().collect();
            println!(
                "loaded {} source(s), {} failed",
                report.outcomes.len() - failed.len(),
                failed.len()
            );
            if !failed.is_empty() {
                eprintln!("failed: {}", failed.join(", "));
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Watch => {
            cache.load_all()?;
            let (watcher, mut updates) = SourceWatcher::new(
                cache.clone(),
                Duration::from_secs(settings.watch.poll_interval_secs),
            );
            let _handle = watcher.run()?;

            loop {
                tokio::select! {
                    Some(event) = updates.recv() => match event.outcome {
                        Ok(outcome) => tracing::info!(name = %event.name, outcome = outcome.as_str(), "Source reloaded"),
                        Err(e) => tracing::warn!(name = %event.name, error = %e, "Source reload failed"),
                    },
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Shutdown signal received");
                        break;
                    }
                }
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
