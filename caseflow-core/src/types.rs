//! Domain types for discovered test cases.
//!
//! A [`TestCaseRecord`] is the unit that flows from the scanner to the sink.
//! All types are serializable via serde so `caseflow scan --json` can emit them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Tags attached to every record produced by a sync run.
pub const SYNC_TAGS: &[&str] = &["auto-synced", "github-actions"];

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Unique identifier of a test case within one sync target.
///
/// `ClassName::method_name` for methods, the bare function name otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseKey(pub String);

impl CaseKey {
    /// Key for a test method scoped to its class.
    pub fn method(class_name: &str, method_name: &str) -> Self {
        Self(format!("{class_name}::{method_name}"))
    }

    /// Key for a top-level test function.
    pub fn function(function_name: &str) -> Self {
        Self(function_name.to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CaseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for CaseKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CaseKey {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Whether a case drives a browser (`ui`) or talks to a service (`api`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CaseType {
    Ui,
    #[default]
    Api,
}

impl CaseType {
    /// `ui` when the lower-cased path contains `ui` anywhere, `api` otherwise.
    pub fn infer_from_path(relative_path: &str) -> Self {
        if relative_path.to_lowercase().contains("ui") {
            CaseType::Ui
        } else {
            CaseType::Api
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CaseType::Ui => "ui",
            CaseType::Api => "api",
        }
    }
}

impl fmt::Display for CaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ui" => Ok(CaseType::Ui),
            "api" => Ok(CaseType::Api),
            other => Err(format!("unknown case type '{other}'; expected: ui, api")),
        }
    }
}

/// Execution priority, `P0` being the most important.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Priority {
    P0,
    #[default]
    P1,
    P2,
    P3,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::P0 => "P0",
            Priority::P1 => "P1",
            Priority::P2 => "P2",
            Priority::P3 => "P3",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "P0" => Ok(Priority::P0),
            "P1" => Ok(Priority::P1),
            "P2" => Ok(Priority::P2),
            "P3" => Ok(Priority::P3),
            other => Err(format!("unknown priority '{other}'; expected: P0, P1, P2, P3")),
        }
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// One discovered test function or method, ready to be upserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCaseRecord {
    pub case_key: CaseKey,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Owning class name; `None` for top-level functions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(rename = "type")]
    pub case_type: CaseType,
    pub priority: Priority,
    /// File path plus pytest node locator, e.g. `tests/test_login.py::TestLogin::test_ok`.
    pub script_path: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

impl TestCaseRecord {
    /// Tags joined the way they are stored in the `tags` column.
    pub fn tags_column(&self) -> String {
        self.tags.join(",")
    }
}

/// Default tag list as owned strings.
pub fn sync_tags() -> Vec<String> {
    SYNC_TAGS.iter().map(|t| t.to_string()).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
