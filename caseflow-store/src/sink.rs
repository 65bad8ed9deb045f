//! The sink seam between discovery and storage.

use caseflow_core::types::{CaseKey, TestCaseRecord};

use crate::error::StoreError;

/// Destination for discovered records.
///
/// Implementations upsert by [`CaseKey`]: an existing row has its mutable
/// fields overwritten, a new key is inserted.
pub trait CaseSink {
    /// Upsert every record in one batch.
    ///
    /// A failing record is logged and listed in [`SyncReport::failures`];
    /// only connection-level problems return `Err`.
    fn upsert_all(&mut self, records: &[TestCaseRecord]) -> Result<SyncReport, StoreError>;
}

/// One record the sink refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFailure {
    pub case_key: CaseKey,
    pub message: String,
}

/// Outcome of one [`CaseSink::upsert_all`] batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub total: usize,
    pub synced: usize,
    pub failures: Vec<RecordFailure>,
}

impl SyncReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.synced == self.total
    }
}
