//! Regex scanner for pytest-style sources.
//!
//! A class body is everything between a `class Test...:` header and the next
//! such header (or end of file). Nested classes, non-test classes and
//! indentation are not modelled; a top-level `def test_...` that follows a
//! test class is attributed to that class.

use std::path::Path;
use std::sync::LazyLock;

use caseflow_core::config::DEFAULT_LOOKBACK;
use caseflow_core::types::{sync_tags, CaseKey, TestCaseRecord};
use regex::Regex;

use crate::metadata::extract_metadata;
use crate::{SourceFile, SourceScanner};

static TEST_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bclass\s+(Test\w+)\s*(?:\([^)]*\))?\s*:").expect("valid regex")
});

static TEST_FUNCTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bdef\s+(test_\w+)\s*\([^)]*\)").expect("valid regex"));

/// Scanner for `test_*.py` files following pytest naming conventions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PytestScanner {
    lookback: usize,
}

impl Default for PytestScanner {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKBACK)
    }
}

/// Byte range of one test class body.
#[derive(Debug)]
struct ClassBody<'a> {
    name: &'a str,
    start: usize,
    end: usize,
}

impl ClassBody<'_> {
    fn contains(&self, offset: usize) -> bool {
        (self.start..self.end).contains(&offset)
    }
}

impl PytestScanner {
    /// `lookback` is the metadata window in characters.
    pub fn new(lookback: usize) -> Self {
        Self { lookback }
    }

    pub fn lookback(&self) -> usize {
        self.lookback
    }

    fn class_bodies<'a>(text: &'a str) -> Vec<ClassBody<'a>> {
        let headers: Vec<_> = TEST_CLASS.captures_iter(text).collect();
        headers
            .iter()
            .enumerate()
            .filter_map(|(i, caps)| {
                let whole = caps.get(0)?;
                let name = caps.get(1)?.as_str();
                let end = headers
                    .get(i + 1)
                    .and_then(|next| next.get(0))
                    .map_or(text.len(), |m| m.start());
                Some(ClassBody {
                    name,
                    start: whole.end(),
                    end,
                })
            })
            .collect()
    }

    fn record(
        &self,
        file: &SourceFile<'_>,
        class_name: Option<&str>,
        function_name: &str,
        def_offset: usize,
    ) -> TestCaseRecord {
        let meta = extract_metadata(file.text, def_offset, self.lookback);
        let (case_key, script_path) = match class_name {
            Some(class) => (
                CaseKey::method(class, function_name),
                format!("{}::{class}::{function_name}", file.display_path),
            ),
            None => (
                CaseKey::function(function_name),
                format!("{}::{function_name}", file.display_path),
            ),
        };

        TestCaseRecord {
            name: case_key.to_string(),
            case_key,
            description: meta.description,
            module: class_name.map(str::to_string),
            case_type: file.case_type,
            priority: meta.priority,
            script_path,
            tags: sync_tags(),
            owner: meta.owner,
        }
    }
}

impl SourceScanner for PytestScanner {
    fn matches_file(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| name.starts_with("test_") && name.ends_with(".py"))
    }

    fn scan_source(&self, file: &SourceFile<'_>) -> Vec<TestCaseRecord> {
        let text = file.text;
        let bodies = Self::class_bodies(text);
        let mut records = Vec::new();

        for body in &bodies {
            for caps in TEST_FUNCTION.captures_iter(&text[body.start..body.end]) {
                let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                    continue;
                };
                records.push(self.record(
                    file,
                    Some(body.name),
                    name.as_str(),
                    body.start + whole.start(),
                ));
            }
        }

        for caps in TEST_FUNCTION.captures_iter(text) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if bodies.iter().any(|b| b.contains(whole.start())) {
                continue;
            }
            records.push(self.record(file, None, name.as_str(), whole.start()));
        }

        tracing::debug!(
            path = %file.display_path,
            classes = bodies.len(),
            cases = records.len(),
            "scanned source"
        );
        records
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
