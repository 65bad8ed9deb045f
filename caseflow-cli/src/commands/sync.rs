//! `caseflow sync`: discover test cases and upsert them into the catalog.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use caseflow_core::Config;
use caseflow_store::{pipeline, SyncReport};

/// Arguments for `caseflow sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Root of the test tree (overrides `scan.root`).
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// SQLite database file (overrides `database.path`).
    #[arg(long)]
    pub db: Option<PathBuf>,
}

impl SyncArgs {
    /// Exits non-zero only for connection or configuration problems; records
    /// the store refused are reported and the run still succeeds.
    pub fn run(self, mut config: Config) -> Result<()> {
        if let Some(root) = self.root {
            config.scan.root = root;
        }
        if let Some(db) = self.db {
            config.database.path = db;
        }

        log_ci_context();
        tracing::info!(
            root = %config.scan.root.display(),
            db = %config.database.path.display(),
            "starting sync"
        );

        let outcome = pipeline::run(&config)
            .with_context(|| format!("sync into {} failed", config.database.path.display()))?;

        match outcome.report {
            None => println!("No test cases found to sync"),
            Some(report) => print_report(&report),
        }
        Ok(())
    }
}

fn log_ci_context() {
    let repository = env::var("GITHUB_REPOSITORY").ok();
    let branch = env::var("GITHUB_REF_NAME").ok();
    if repository.is_some() || branch.is_some() {
        tracing::info!(
            repository = repository.as_deref().unwrap_or("-"),
            branch = branch.as_deref().unwrap_or("-"),
            "running in CI"
        );
    }
}

fn print_report(report: &SyncReport) {
    let summary = format!("Successfully synced {}/{} cases", report.synced, report.total);
    if report.is_complete() {
        println!("{} {summary}", "✓".green());
        return;
    }

    println!("{} {summary}", "!".yellow());
    for failure in &report.failures {
        println!("  {} '{}': {}", "✗".red(), failure.case_key, failure.message);
    }
}
