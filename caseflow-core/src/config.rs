//! Layered configuration for caseflow.
//!
//! Precedence, lowest to highest:
//!
//! ```text
//! built-in defaults  <  caseflow.yaml (or --config <path>)  <  environment  <  CLI flags
//! ```
//!
//! CLI flags are applied by the binary after [`Config::load`] returns.
//!
//! # API pattern
//!
//! [`Config::load_with`] takes the environment as a lookup closure; tests use
//! it with a `HashMap` instead of mutating the process environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

/// Config file picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "caseflow.yaml";

/// Default bounded lookback, in characters, for metadata attachment.
pub const DEFAULT_LOOKBACK: usize = 500;

// Environment variable names.
pub const ENV_SCAN_ROOT: &str = "CASEFLOW_SCAN_ROOT";
pub const ENV_LOOKBACK: &str = "CASEFLOW_LOOKBACK";
pub const ENV_DB_PATH: &str = "DB_PATH";
pub const ENV_JENKINS_URL: &str = "JENKINS_URL";
pub const ENV_JENKINS_JOB: &str = "JENKINS_JOB";
pub const ENV_JENKINS_USER: &str = "JENKINS_USER";
pub const ENV_JENKINS_TOKEN: &str = "JENKINS_TOKEN";

// ---------------------------------------------------------------------------
// Config structs (matching caseflow.yaml schema)
// ---------------------------------------------------------------------------

/// Top-level configuration, deserialized from YAML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scan: ScanConfig,
    pub database: DatabaseConfig,
    pub jenkins: JenkinsConfig,
}

/// `scan:` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Directory walked for test sources.
    pub root: PathBuf,
    /// Characters inspected before a definition when looking for metadata.
    pub lookback: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("examples"),
            lookback: DEFAULT_LOOKBACK,
        }
    }
}

/// `database:` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database file; created on first sync.
    pub path: PathBuf,
    /// Value written to the `repo_id` system column on insert.
    pub repo_id: i64,
    /// Value written to the `source` system column on insert.
    pub source: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("caseflow.db"),
            repo_id: 1,
            source: "git".to_string(),
        }
    }
}

/// `jenkins:` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JenkinsConfig {
    pub base_url: String,
    pub job: String,
    pub user: String,
    /// API token. Never serialized back out.
    #[serde(skip_serializing)]
    pub token: Option<String>,
    pub timeout_secs: u64,
    pub queue_poll_attempts: u32,
    pub queue_poll_interval_ms: u64,
}

impl Default for JenkinsConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            job: "api-automation".to_string(),
            user: "root".to_string(),
            token: None,
            timeout_secs: 30,
            queue_poll_attempts: 5,
            queue_poll_interval_ms: 1000,
        }
    }
}

impl JenkinsConfig {
    /// The configured base URL without a trailing slash, validated as absolute http(s).
    pub fn base(&self) -> Result<String, ConfigError> {
        let parsed = Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidBaseUrl {
                url: self.base_url.clone(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }
        Ok(self.base_url.trim_end_matches('/').to_string())
    }

    /// The API token, or [`ConfigError::Missing`] when none is configured.
    pub fn token(&self) -> Result<&str, ConfigError> {
        match self.token.as_deref() {
            Some(t) if !t.is_empty() => Ok(t),
            _ => Err(ConfigError::Missing {
                key: "jenkins.token",
                env: ENV_JENKINS_TOKEN,
            }),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn queue_poll_interval(&self) -> Duration {
        Duration::from_millis(self.queue_poll_interval_ms)
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from `path` (or `caseflow.yaml` in the working
    /// directory when present) and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let default_file = Path::new(DEFAULT_CONFIG_FILE);
        let file = match path {
            Some(p) => Some(p),
            None if default_file.is_file() => Some(default_file),
            None => None,
        };
        Self::load_with(file, |key| std::env::var(key).ok())
    }

    /// Load from an optional YAML file, then overlay values from `lookup`.
    ///
    /// An explicitly named file that does not exist is an error.
    pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_env(lookup)?;
        Ok(config)
    }

    /// Parse a YAML config file. Missing sections fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&raw).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(root) = get(ENV_SCAN_ROOT) {
            self.scan.root = PathBuf::from(root);
        }
        if let Some(raw) = get(ENV_LOOKBACK) {
            self.scan.lookback = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_LOOKBACK.to_string(),
                value: raw.clone(),
            })?;
        }
        if let Some(path) = get(ENV_DB_PATH) {
            self.database.path = PathBuf::from(path);
        }
        if let Some(url) = get(ENV_JENKINS_URL) {
            self.jenkins.base_url = url;
        }
        if let Some(job) = get(ENV_JENKINS_JOB) {
            self.jenkins.job = job;
        }
        if let Some(user) = get(ENV_JENKINS_USER) {
            self.jenkins.user = user;
        }
        if let Some(token) = get(ENV_JENKINS_TOKEN) {
            self.jenkins.token = Some(token);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rstest::rstest;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_without_file_or_env() {
        let cfg = Config::load_with(None, |_| None).expect("load");
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.scan.lookback, DEFAULT_LOOKBACK);
        assert_eq!(cfg.scan.root, PathBuf::from("examples"));
        assert_eq!(cfg.database.repo_id, 1);
    }

    #[test]
    fn env_overrides_file_values() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let file = dir.path().join("caseflow.yaml");
        std::fs::write(
            &file,
            "scan:\n  root: suites\n  lookback: 200\njenkins:\n  job: from-file\n",
        )
        .expect("write");

        let vars = env(&[(ENV_JENKINS_JOB, "from-env"), (ENV_JENKINS_TOKEN, "secret")]);
        let cfg = Config::load_with(Some(file.as_path()), |k| vars.get(k).cloned()).expect("load");

        assert_eq!(cfg.scan.root, PathBuf::from("suites"));
        assert_eq!(cfg.scan.lookback, 200);
        assert_eq!(cfg.jenkins.job, "from-env");
        assert_eq!(cfg.jenkins.token().expect("token"), "secret");
        // untouched section keeps defaults
        assert_eq!(cfg.database, DatabaseConfig::default());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let err = Config::load_with(Some(dir.path().join("nope.yaml").as_path()), |_| None).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn malformed_yaml_reports_path() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let file = dir.path().join("caseflow.yaml");
        std::fs::write(&file, "scan: [not, a, map]\n").expect("write");
        let err = Config::load_with(Some(file.as_path()), |_| None).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("caseflow.yaml"));
    }

    #[test]
    fn non_numeric_lookback_is_rejected() {
        let vars = env(&[(ENV_LOOKBACK, "lots")]);
        let err = Config::load_with(None, |k| vars.get(k).cloned()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn blank_token_counts_as_missing() {
        let vars = env(&[(ENV_JENKINS_TOKEN, "  ")]);
        let cfg = Config::load_with(None, |k| vars.get(k).cloned()).expect("load");
        assert!(matches!(cfg.jenkins.token(), Err(ConfigError::Missing { .. })));
    }

    #[rstest]
    #[case("http://ci.example.com:8080/", "http://ci.example.com:8080")]
    #[case("https://ci.example.com", "https://ci.example.com")]
    fn base_trims_trailing_slash(#[case] raw: &str, #[case] expected: &str) {
        let jenkins = JenkinsConfig {
            base_url: raw.to_string(),
            ..JenkinsConfig::default()
        };
        assert_eq!(jenkins.base().expect("base"), expected);
    }

    #[rstest]
    #[case("ci.example.com")]
    #[case("ftp://ci.example.com")]
    fn base_rejects_non_http(#[case] raw: &str) {
        let jenkins = JenkinsConfig {
            base_url: raw.to_string(),
            ..JenkinsConfig::default()
        };
        assert!(matches!(jenkins.base(), Err(ConfigError::InvalidBaseUrl { .. })));
    }
}
