//! caseflow core library: domain types, configuration, errors.
//!
//! - [`types`]: newtypes and the [`TestCaseRecord`] shared by scanner and sink
//! - [`config`]: layered YAML + environment configuration
//! - [`error`]: [`ConfigError`]

pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::ConfigError;
pub use types::{CaseKey, CaseType, Priority, TestCaseRecord};
