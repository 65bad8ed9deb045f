//! Error types for caseflow-store.

use std::path::PathBuf;

use thiserror::Error;

use caseflow_scanner::ScanError;

/// All errors that can abort a sync run.
///
/// Per-record insert failures are not errors; they are reported through
/// [`crate::SyncReport::failures`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// Opening, migrating or committing the database failed.
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A schema migration failed.
    #[error("migration v{version} failed: {source}")]
    Migration {
        version: u32,
        #[source]
        source: rusqlite::Error,
    },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Discovery failed before anything was written.
    #[error("scan error: {0}")]
    Scan(#[from] ScanError),

    /// A stored column holds a value the domain types do not accept.
    #[error("unexpected value '{value}' in column {column}")]
    Corrupt { column: &'static str, value: String },
}

/// Convenience constructor for [`StoreError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.into(),
        source,
    }
}
