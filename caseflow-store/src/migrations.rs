//! SQL migration definitions for the caseflow database.
//!
//! Migrations are applied in order on open. Each one runs inside its own
//! transaction together with its `schema_migrations` row.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: auto_test_case",
        sql: r#"
CREATE TABLE IF NOT EXISTS auto_test_case (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    case_key    TEXT NOT NULL UNIQUE CHECK (length(case_key) > 0),
    name        TEXT NOT NULL,
    description TEXT,
    module      TEXT,
    type        TEXT NOT NULL CHECK (type IN ('ui', 'api')),
    priority    TEXT NOT NULL CHECK (priority IN ('P0', 'P1', 'P2', 'P3')),
    script_path TEXT NOT NULL,
    tags        TEXT NOT NULL,
    owner       TEXT,
    repo_id     INTEGER NOT NULL,
    source      TEXT NOT NULL,
    enabled     INTEGER NOT NULL DEFAULT 1,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_auto_test_case_type ON auto_test_case(type);
"#,
    }]
}
