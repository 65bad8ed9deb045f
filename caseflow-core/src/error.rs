//! Error types for caseflow-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure reading the config file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load; includes file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// An environment variable held a value of the wrong shape.
    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },

    /// The Jenkins base URL is not an absolute http(s) URL.
    #[error("invalid Jenkins base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// A setting required by the requested operation was never provided.
    #[error("missing required setting {key}; set it in the config file or via ${env}")]
    Missing {
        key: &'static str,
        env: &'static str,
    },
}
