//! # caseflow-store
//!
//! Upsert sink for discovered test cases and the sync pipeline that feeds it.
//!
//! Call [`pipeline::run`] to discover and upsert with the configured scanner
//! and database, or drive a [`CaseSink`] directly.

pub mod error;
mod migrations;
pub mod pipeline;
pub mod sink;
pub mod sqlite;

pub use error::StoreError;
pub use sink::{CaseSink, RecordFailure, SyncReport};
pub use sqlite::{SinkOptions, SqliteSink, StoredCase};
