//! Recursive walk of a test tree.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use caseflow_core::types::{CaseKey, CaseType, TestCaseRecord};
use walkdir::WalkDir;

use crate::{ScanError, SourceFile, SourceScanner};

/// A file the walk could not use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of one discovery run.
#[derive(Debug, Default)]
pub struct ScanReport {
    pub records: Vec<TestCaseRecord>,
    pub files_scanned: usize,
    pub skipped: Vec<SkippedFile>,
}

/// Walk `root` recursively, scanning every file `scanner` accepts.
///
/// A missing root yields an empty report. Unreadable or non-UTF-8 files are
/// skipped with a warning and listed in [`ScanReport::skipped`].
pub fn discover(root: &Path, scanner: &dyn SourceScanner) -> Result<ScanReport, ScanError> {
    let mut report = ScanReport::default();

    if !root.exists() {
        tracing::warn!(root = %root.display(), "test directory not found");
        return Ok(report);
    }
    if !root.is_dir() {
        return Err(ScanError::NotADirectory {
            path: root.to_path_buf(),
        });
    }

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                let path = err.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                tracing::warn!(path = %path.display(), error = %err, "skipping unreadable entry");
                report.skipped.push(SkippedFile {
                    path,
                    reason: err.to_string(),
                });
                continue;
            }
        };
        if !entry.file_type().is_file() || !scanner.matches_file(entry.path()) {
            continue;
        }

        let path = entry.path();
        let text = match read_source(path) {
            Ok(text) => text,
            Err(reason) => {
                tracing::warn!(path = %path.display(), %reason, "skipping file");
                report.skipped.push(SkippedFile {
                    path: path.to_path_buf(),
                    reason,
                });
                continue;
            }
        };

        let relative = path.strip_prefix(root).unwrap_or(path);
        let display_path = path.to_string_lossy().replace('\\', "/");
        let file = SourceFile {
            display_path: &display_path,
            case_type: CaseType::infer_from_path(&relative.to_string_lossy()),
            text: &text,
        };

        report.records.extend(scanner.scan_source(&file));
        report.files_scanned += 1;
    }

    log_key_collisions(&report.records);
    tracing::info!(
        root = %root.display(),
        files = report.files_scanned,
        cases = report.records.len(),
        skipped = report.skipped.len(),
        "discovery finished"
    );
    Ok(report)
}

fn read_source(path: &Path) -> Result<String, String> {
    let bytes = std::fs::read(path).map_err(|e| e.to_string())?;
    String::from_utf8(bytes).map_err(|e| format!("not valid UTF-8: {e}"))
}

/// Bare function keys are not qualified by file, so two files defining the
/// same `test_x` collide on sync and the later record overwrites the earlier.
fn log_key_collisions(records: &[TestCaseRecord]) {
    let mut seen: HashMap<&CaseKey, &str> = HashMap::new();
    for record in records {
        if let Some(first) = seen.insert(&record.case_key, &record.script_path) {
            tracing::warn!(
                case_key = %record.case_key,
                first = %first,
                second = %record.script_path,
                "duplicate case key; the later record wins on sync"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::PytestScanner;

    #[test]
    fn missing_root_is_empty_not_an_error() {
        let dir = TempDir::new().expect("tempdir");
        let report = discover(&dir.path().join("absent"), &PytestScanner::default()).expect("discover");
        assert!(report.records.is_empty());
        assert_eq!(report.files_scanned, 0);
    }

    #[test]
    fn file_root_is_rejected() {
        let dir = TempDir::new().expect("tempdir");
        let file = dir.path().join("test_a.py");
        fs::write(&file, "def test_a():\n    pass\n").expect("write");
        let err = discover(&file, &PytestScanner::default()).unwrap_err();
        assert!(matches!(err, ScanError::NotADirectory { .. }));
    }

    #[test]
    fn non_utf8_file_is_skipped() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join("test_bad.py"), [0xff, 0xfe, 0x00, 0x64]).expect("write");
        fs::write(dir.path().join("test_good.py"), "def test_ok():\n    pass\n").expect("write");

        let report = discover(dir.path(), &PytestScanner::default()).expect("discover");
        assert_eq!(report.files_scanned, 1);
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert!(report.skipped[0].path.ends_with("test_bad.py"));
        assert!(report.skipped[0].reason.contains("UTF-8"));
    }
}
