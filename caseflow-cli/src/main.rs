//! Caseflow: keep a test-case catalog in sync with a pytest tree and
//! trigger Jenkins runs for selected cases.
//!
//! # Usage
//!
//! ```text
//! caseflow [--config <path>] scan [--root <dir>] [--json]
//! caseflow [--config <path>] sync [--root <dir>] [--db <path>]
//! caseflow [--config <path>] trigger --scripts <a,b,...> [--marker <m>] [--job <name>] [--json]
//! caseflow [--config <path>] ping
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use caseflow_core::Config;
use commands::{ping::PingArgs, scan::ScanArgs, sync::SyncArgs, trigger::TriggerArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "caseflow",
    version,
    about = "Sync pytest cases into a catalog and trigger Jenkins runs",
    long_about = None,
)]
struct Cli {
    /// YAML config file (defaults to ./caseflow.yaml when present).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Discover test cases and print them without touching the database.
    Scan(ScanArgs),

    /// Discover test cases and upsert them into the catalog.
    Sync(SyncArgs),

    /// Request a parameterized build of the Jenkins job.
    Trigger(TriggerArgs),

    /// Check that Jenkins answers with the configured credentials.
    Ping(PingArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    match cli.command {
        Commands::Scan(args) => args.run(config),
        Commands::Sync(args) => args.run(config),
        Commands::Trigger(args) => args.run(config),
        Commands::Ping(args) => args.run(config),
    }
}

/// Logs go to stderr so stdout stays clean for summaries and `--json`.
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
