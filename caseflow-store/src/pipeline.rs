//! Shared sync pipeline entrypoint: discover, then upsert.

use std::path::Path;

use caseflow_core::Config;
use caseflow_scanner::{discover, PytestScanner, ScanReport, SourceScanner};

use crate::error::StoreError;
use crate::sink::{CaseSink, SyncReport};
use crate::sqlite::{SinkOptions, SqliteSink};

/// Outcome of one sync run.
#[derive(Debug)]
pub struct SyncOutcome {
    pub scan: ScanReport,
    /// `None` when discovery found nothing and the sink was never opened.
    pub report: Option<SyncReport>,
}

/// Run the configured pipeline: pytest scanner over `scan.root`, SQLite sink
/// at `database.path`.
pub fn run(config: &Config) -> Result<SyncOutcome, StoreError> {
    let scanner = PytestScanner::new(config.scan.lookback);
    run_with(&config.scan.root, &scanner, || {
        SqliteSink::open(&config.database.path, SinkOptions::from(&config.database))
    })
}

/// Discover under `root` with `scanner`, then upsert into the sink produced
/// by `open_sink`.
///
/// The sink is only opened when there is something to write, and is dropped
/// (closing its connection) before this returns, whether or not the batch
/// succeeded.
pub fn run_with<S, F>(
    root: &Path,
    scanner: &dyn SourceScanner,
    open_sink: F,
) -> Result<SyncOutcome, StoreError>
where
    S: CaseSink,
    F: FnOnce() -> Result<S, StoreError>,
{
    let scan = discover(root, scanner)?;
    if scan.records.is_empty() {
        tracing::info!(root = %root.display(), "no test cases to sync");
        return Ok(SyncOutcome { scan, report: None });
    }

    let mut sink = open_sink()?;
    let report = sink.upsert_all(&scan.records)?;
    Ok(SyncOutcome {
        scan,
        report: Some(report),
    })
}
