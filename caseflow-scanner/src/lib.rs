//! Test-case discovery for `caseflow-scanner`.
//!
//! [`discover`] walks a directory tree and hands every matching file to a
//! [`SourceScanner`], which turns source text into [`TestCaseRecord`]s.
//! The shipped scanner is [`PytestScanner`], a regex heuristic over pytest
//! naming conventions. Anything implementing the trait (an AST-backed scanner,
//! another test framework) plugs into the same walk and the same sink.

pub mod discover;
pub mod metadata;
pub mod pytest;

use std::path::{Path, PathBuf};

use caseflow_core::types::{CaseType, TestCaseRecord};
use thiserror::Error;

pub use discover::{discover, ScanReport, SkippedFile};
pub use metadata::{extract_metadata, CaseMetadata};
pub use pytest::PytestScanner;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// One source file handed to a [`SourceScanner`].
#[derive(Debug, Clone, Copy)]
pub struct SourceFile<'a> {
    /// Path as it should appear in `script_path`, `/`-separated.
    pub display_path: &'a str,
    /// Classification inferred from the path relative to the scan root.
    pub case_type: CaseType,
    pub text: &'a str,
}

/// Turns the text of one source file into test-case records.
pub trait SourceScanner {
    /// Whether the walker should read and scan `path` at all.
    fn matches_file(&self, path: &Path) -> bool;

    /// Extract every test case defined in `file`. Never fails: text the
    /// scanner cannot make sense of simply yields no records.
    fn scan_source(&self, file: &SourceFile<'_>) -> Vec<TestCaseRecord>;
}

/// Errors from discovery. Per-file problems are not errors; they are
/// reported through [`ScanReport::skipped`].
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("scan root '{path}' exists but is not a directory")]
    NotADirectory { path: PathBuf },
}
