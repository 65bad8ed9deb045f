//! Config file loading: error messages, partial sections, serialization.

use assert_fs::prelude::*;
use caseflow_core::{config::Config, ConfigError};
use predicates::prelude::*;

// ---------------------------------------------------------------------------
// 1. Load error messages
// ---------------------------------------------------------------------------

#[test]
fn corrupt_yaml_returns_parse_error_with_path() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("caseflow.yaml");
    file.write_str(": : corrupt : yaml : !!!\n  - broken: [unclosed")
        .expect("write");

    let err = Config::from_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    let msg = err.to_string();
    assert!(msg.contains("caseflow.yaml"), "must contain file path, got: {msg}");
}

#[test]
fn wrong_type_yaml_returns_parse_error() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("caseflow.yaml");
    file.write_str("- this is a list, not a mapping\n").expect("write");

    let err = Config::from_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
}

// ---------------------------------------------------------------------------
// 2. Partial files
// ---------------------------------------------------------------------------

#[test]
fn empty_file_yields_defaults() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("caseflow.yaml");
    file.write_str("\n").expect("write");

    let cfg = Config::from_file(file.path()).expect("load");
    assert_eq!(cfg, Config::default());
}

#[test]
fn partial_jenkins_section_keeps_other_defaults() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("caseflow.yaml");
    file.write_str(
        "jenkins:\n  base_url: https://ci.example.com/\n  queue_poll_attempts: 2\ndatabase:\n  path: out/cases.db\n",
    )
    .expect("write");

    let cfg = Config::from_file(file.path()).expect("load");
    assert_eq!(cfg.jenkins.base().expect("base"), "https://ci.example.com");
    assert_eq!(cfg.jenkins.queue_poll_attempts, 2);
    assert_eq!(cfg.jenkins.timeout_secs, 30);
    assert_eq!(cfg.database.path, std::path::PathBuf::from("out/cases.db"));
    assert_eq!(cfg.database.source, "git");
}

// ---------------------------------------------------------------------------
// 3. Serialization
// ---------------------------------------------------------------------------

#[test]
fn token_is_never_written_back() {
    let mut cfg = Config::default();
    cfg.jenkins.token = Some("super-secret".to_string());

    let yaml = serde_yaml::to_string(&cfg).expect("serialize");
    assert!(predicate::str::contains("super-secret").not().eval(&yaml));
    assert!(yaml.contains("base_url"));

    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("caseflow.yaml");
    file.write_str(&yaml).expect("write");
    file.assert(predicate::str::contains("lookback: 500"));
}
