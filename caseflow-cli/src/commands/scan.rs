//! `caseflow scan`: discovery only, no database.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use caseflow_core::{Config, TestCaseRecord};
use caseflow_scanner::{discover, PytestScanner, ScanReport};

/// Arguments for `caseflow scan`.
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Root of the test tree (overrides `scan.root`).
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl ScanArgs {
    pub fn run(self, mut config: Config) -> Result<()> {
        if let Some(root) = self.root {
            config.scan.root = root;
        }

        let scanner = PytestScanner::new(config.scan.lookback);
        let report = discover(&config.scan.root, &scanner)
            .with_context(|| format!("scan of {} failed", config.scan.root.display()))?;

        if self.json {
            return print_json(&report);
        }
        print_table(&config, report);
        Ok(())
    }
}

#[derive(Serialize)]
struct ScanJson<'a> {
    files_scanned: usize,
    skipped: Vec<SkippedJson>,
    cases: &'a [TestCaseRecord],
}

#[derive(Serialize)]
struct SkippedJson {
    path: String,
    reason: String,
}

#[derive(Tabled)]
struct CaseRow {
    #[tabled(rename = "case key")]
    case_key: String,
    #[tabled(rename = "type")]
    case_type: String,
    #[tabled(rename = "priority")]
    priority: String,
    #[tabled(rename = "owner")]
    owner: String,
    #[tabled(rename = "description")]
    description: String,
}

fn print_json(report: &ScanReport) -> Result<()> {
    let payload = ScanJson {
        files_scanned: report.files_scanned,
        skipped: report
            .skipped
            .iter()
            .map(|s| SkippedJson {
                path: s.path.display().to_string(),
                reason: s.reason.clone(),
            })
            .collect(),
        cases: &report.records,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize scan JSON")?
    );
    Ok(())
}

fn print_table(config: &Config, report: ScanReport) {
    println!(
        "Caseflow v{} | {} | {} files | {} cases",
        env!("CARGO_PKG_VERSION"),
        config.scan.root.display(),
        report.files_scanned,
        report.records.len(),
    );

    if report.records.is_empty() {
        println!("No test cases found.");
    } else {
        let rows: Vec<CaseRow> = report
            .records
            .into_iter()
            .map(|r| CaseRow {
                case_key: r.case_key.to_string(),
                case_type: r.case_type.to_string(),
                priority: r.priority.to_string(),
                owner: r.owner.unwrap_or_else(|| "-".to_string()),
                description: r.description.unwrap_or_default(),
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
    }

    for skipped in &report.skipped {
        println!(
            "{} {} ({})",
            "skipped".yellow(),
            skipped.path.display(),
            skipped.reason
        );
    }
}
