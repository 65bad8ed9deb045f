//! SQLite-backed [`CaseSink`].
//!
//! One table, `auto_test_case`, keyed by `case_key`. On conflict the mutable
//! columns (name, description, module, type, priority, tags, owner) are
//! overwritten, the row is re-enabled and `updated_at` refreshed;
//! `created_at`, `script_path`, `repo_id` and `source` keep their first value.
//!
//! A batch runs in a single transaction. A statement that fails for one record
//! only rolls back that statement; the rest of the batch still commits.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{named_params, params, Connection, OptionalExtension};

use caseflow_core::config::DatabaseConfig;
use caseflow_core::types::{CaseKey, TestCaseRecord};

use crate::error::{io_err, StoreError};
use crate::migrations;
use crate::sink::{CaseSink, RecordFailure, SyncReport};

const UPSERT_SQL: &str = r#"
INSERT INTO auto_test_case
    (case_key, name, description, module, type, priority, script_path, tags, owner,
     repo_id, source, enabled, created_at, updated_at)
VALUES
    (:case_key, :name, :description, :module, :type, :priority, :script_path, :tags, :owner,
     :repo_id, :source, 1, :now, :now)
ON CONFLICT(case_key) DO UPDATE SET
    name        = excluded.name,
    description = excluded.description,
    module      = excluded.module,
    type        = excluded.type,
    priority    = excluded.priority,
    tags        = excluded.tags,
    owner       = excluded.owner,
    enabled     = 1,
    updated_at  = excluded.updated_at
"#;

const SELECT_SQL: &str = r#"
SELECT case_key, name, description, module, type, priority, script_path, tags, owner,
       repo_id, source, enabled, created_at, updated_at
FROM auto_test_case
WHERE case_key = ?1
"#;

/// Values written to the system columns on insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkOptions {
    pub repo_id: i64,
    pub source: String,
}

impl Default for SinkOptions {
    fn default() -> Self {
        Self {
            repo_id: 1,
            source: "git".to_string(),
        }
    }
}

impl From<&DatabaseConfig> for SinkOptions {
    fn from(cfg: &DatabaseConfig) -> Self {
        Self {
            repo_id: cfg.repo_id,
            source: cfg.source.clone(),
        }
    }
}

/// A row read back from the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCase {
    pub record: TestCaseRecord,
    pub repo_id: i64,
    pub source: String,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Upsert sink over a single SQLite connection.
///
/// The connection is closed when the sink is dropped.
pub struct SqliteSink {
    conn: Connection,
    options: SinkOptions,
}

impl SqliteSink {
    /// Open or create the database at `path` and apply pending migrations.
    pub fn open(path: &Path, options: SinkOptions) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
        let conn = Connection::open(path)?;
        tracing::debug!(path = %path.display(), "opened database");
        Self::with_connection(conn, options)
    }

    /// Private in-memory database; used by tests.
    pub fn open_in_memory(options: SinkOptions) -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?, options)
    }

    fn with_connection(conn: Connection, options: SinkOptions) -> Result<Self, StoreError> {
        let mut sink = Self { conn, options };
        sink.run_migrations()?;
        Ok(sink)
    }

    fn run_migrations(&mut self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version    INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            );",
        )?;
        let current: u32 = self.conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )?;

        for migration in migrations::all_migrations() {
            if migration.version <= current {
                continue;
            }
            tracing::info!(
                version = migration.version,
                description = migration.description,
                "applying migration"
            );
            let tx = self.conn.transaction()?;
            tx.execute_batch(migration.sql)
                .map_err(|source| StoreError::Migration {
                    version: migration.version,
                    source,
                })?;
            tx.execute(
                "INSERT INTO schema_migrations (version) VALUES (?1)",
                params![migration.version],
            )?;
            tx.commit()?;
        }
        Ok(())
    }

    /// Upsert `records` stamping inserts and updates with `now`.
    pub fn upsert_all_at(
        &mut self,
        records: &[TestCaseRecord],
        now: DateTime<Utc>,
    ) -> Result<SyncReport, StoreError> {
        let stamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);
        let mut report = SyncReport {
            total: records.len(),
            ..SyncReport::default()
        };

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(UPSERT_SQL)?;
            for record in records {
                let tags = record.tags_column();
                let result = stmt.execute(named_params! {
                    ":case_key": record.case_key.as_str(),
                    ":name": record.name,
                    ":description": record.description,
                    ":module": record.module,
                    ":type": record.case_type.as_str(),
                    ":priority": record.priority.as_str(),
                    ":script_path": record.script_path,
                    ":tags": tags,
                    ":owner": record.owner,
                    ":repo_id": self.options.repo_id,
                    ":source": self.options.source,
                    ":now": stamp,
                });
                match result {
                    Ok(_) => report.synced += 1,
                    Err(err) => {
                        tracing::error!(case_key = %record.case_key, error = %err, "failed to sync case");
                        report.failures.push(RecordFailure {
                            case_key: record.case_key.clone(),
                            message: err.to_string(),
                        });
                    }
                }
            }
        }
        tx.commit()?;

        tracing::info!(
            synced = report.synced,
            total = report.total,
            failed = report.failures.len(),
            "upsert batch committed"
        );
        Ok(report)
    }

    /// Read one row back by key.
    pub fn get(&self, key: &CaseKey) -> Result<Option<StoredCase>, StoreError> {
        let raw = self
            .conn
            .query_row(SELECT_SQL, params![key.as_str()], |row| {
                Ok(RawRow {
                    case_key: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    module: row.get(3)?,
                    case_type: row.get(4)?,
                    priority: row.get(5)?,
                    script_path: row.get(6)?,
                    tags: row.get(7)?,
                    owner: row.get(8)?,
                    repo_id: row.get(9)?,
                    source: row.get(10)?,
                    enabled: row.get(11)?,
                    created_at: row.get(12)?,
                    updated_at: row.get(13)?,
                })
            })
            .optional()?;
        raw.map(RawRow::into_stored).transpose()
    }

    /// Number of rows in the table.
    pub fn count(&self) -> Result<usize, StoreError> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM auto_test_case", [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

impl CaseSink for SqliteSink {
    fn upsert_all(&mut self, records: &[TestCaseRecord]) -> Result<SyncReport, StoreError> {
        self.upsert_all_at(records, Utc::now())
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

struct RawRow {
    case_key: String,
    name: String,
    description: Option<String>,
    module: Option<String>,
    case_type: String,
    priority: String,
    script_path: String,
    tags: String,
    owner: Option<String>,
    repo_id: i64,
    source: String,
    enabled: bool,
    created_at: String,
    updated_at: String,
}

impl RawRow {
    fn into_stored(self) -> Result<StoredCase, StoreError> {
        let case_type = self.case_type.parse().map_err(|_| StoreError::Corrupt {
            column: "type",
            value: self.case_type.clone(),
        })?;
        let priority = self.priority.parse().map_err(|_| StoreError::Corrupt {
            column: "priority",
            value: self.priority.clone(),
        })?;
        let tags = self
            .tags
            .split(',')
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();

        Ok(StoredCase {
            record: TestCaseRecord {
                case_key: CaseKey::from(self.case_key),
                name: self.name,
                description: self.description,
                module: self.module,
                case_type,
                priority,
                script_path: self.script_path,
                tags,
                owner: self.owner,
            },
            repo_id: self.repo_id,
            source: self.source,
            enabled: self.enabled,
            created_at: parse_timestamp("created_at", &self.created_at)?,
            updated_at: parse_timestamp("updated_at", &self.updated_at)?,
        })
    }
}

fn parse_timestamp(column: &'static str, raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| StoreError::Corrupt {
            column,
            value: raw.to_string(),
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use caseflow_core::types::{sync_tags, CaseType, Priority};
    use chrono::TimeZone;

    use super::*;

    fn record(key: &str) -> TestCaseRecord {
        TestCaseRecord {
            case_key: CaseKey::from(key),
            name: key.to_string(),
            description: None,
            module: None,
            case_type: CaseType::Api,
            priority: Priority::P1,
            script_path: format!("tests/test_x.py::{key}"),
            tags: sync_tags(),
            owner: None,
        }
    }

    #[test]
    fn migrations_are_idempotent() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let path = dir.path().join("nested").join("cases.db");
        {
            let mut sink = SqliteSink::open(&path, SinkOptions::default()).expect("open");
            sink.upsert_all(&[record("test_a")]).expect("upsert");
        }
        let sink = SqliteSink::open(&path, SinkOptions::default()).expect("reopen");
        assert_eq!(sink.count().expect("count"), 1);
    }

    #[test]
    fn system_columns_come_from_options() {
        let options = SinkOptions {
            repo_id: 7,
            source: "ci".to_string(),
        };
        let mut sink = SqliteSink::open_in_memory(options).expect("open");
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        sink.upsert_all_at(&[record("test_a")], now).expect("upsert");

        let stored = sink.get(&CaseKey::from("test_a")).expect("get").expect("row");
        assert_eq!(stored.repo_id, 7);
        assert_eq!(stored.source, "ci");
        assert!(stored.enabled);
        assert_eq!(stored.created_at, now);
        assert_eq!(stored.updated_at, now);
        assert_eq!(stored.record, record("test_a"));
    }

    #[test]
    fn missing_key_reads_as_none() {
        let sink = SqliteSink::open_in_memory(SinkOptions::default()).expect("open");
        assert!(sink.get(&CaseKey::from("nope")).expect("get").is_none());
    }

    #[test]
    fn empty_batch_commits_nothing() {
        let mut sink = SqliteSink::open_in_memory(SinkOptions::default()).expect("open");
        let report = sink.upsert_all(&[]).expect("upsert");
        assert_eq!(report, SyncReport::default());
        assert!(report.is_complete());
        assert_eq!(sink.count().expect("count"), 0);
    }
}
