use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};

use crate::util::{ensure_directory, now_utc_string};

pub const DB_SCHEMA_VERSION: &str = "0.3.0";

pub fn open_store(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_directory(parent)?;
        }
    }

    let connection = Connection::open(db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    configure_connection(&connection)?;
    ensure_schema(&connection)?;
    Ok(connection)
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    connection
        .busy_timeout(Duration::from_secs(5))
        .context("failed to set busy timeout")?;
    Ok(())
}

pub fn ensure_schema(connection: &Connection) -> Result<()> {
    connection.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS metadata (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS documents (
          document_id TEXT PRIMARY KEY,
          filename TEXT NOT NULL,
          sha256 TEXT NOT NULL,
          registered_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS users (
          user_id TEXT PRIMARY KEY,
          display_name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS compliance_scores (
          score_id TEXT PRIMARY KEY,
          document_id TEXT NOT NULL UNIQUE,
          generation INTEGER NOT NULL,
          overall_score REAL NOT NULL,
          structure_score REAL NOT NULL,
          completeness_score REAL NOT NULL,
          sections_found INTEGER NOT NULL,
          total_sections_required INTEGER NOT NULL,
          compliant INTEGER NOT NULL,
          summary TEXT NOT NULL,
          weighting TEXT NOT NULL DEFAULT 'standard',
          evaluated_at TEXT NOT NULL,
          professor_override REAL,
          professor_notes TEXT,
          reviewed_by TEXT,
          reviewed_at TEXT,
          override_stale INTEGER NOT NULL DEFAULT 0,
          FOREIGN KEY(document_id) REFERENCES documents(document_id)
        );

        CREATE TABLE IF NOT EXISTS section_analyses (
          score_id TEXT NOT NULL,
          generation INTEGER NOT NULL,
          ordinal INTEGER NOT NULL,
          section_name TEXT NOT NULL,
          present INTEGER NOT NULL,
          section_score REAL NOT NULL,
          coverage REAL NOT NULL,
          severity TEXT NOT NULL,
          findings TEXT NOT NULL,
          recommendations TEXT NOT NULL,
          evidence_snippet TEXT NOT NULL,
          missing_subclauses TEXT NOT NULL,
          page_number INTEGER,
          section_weight INTEGER NOT NULL,
          PRIMARY KEY (score_id, generation, ordinal),
          FOREIGN KEY(score_id) REFERENCES compliance_scores(score_id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS compliance_score_history (
          history_id INTEGER PRIMARY KEY AUTOINCREMENT,
          document_id TEXT NOT NULL,
          score_id TEXT NOT NULL,
          version_number INTEGER NOT NULL,
          source TEXT NOT NULL,
          overall_score REAL NOT NULL,
          structure_score REAL NOT NULL,
          completeness_score REAL NOT NULL,
          sections_found INTEGER NOT NULL,
          total_sections_required INTEGER NOT NULL,
          compliant INTEGER NOT NULL,
          summary TEXT NOT NULL,
          professor_override REAL,
          professor_notes TEXT,
          reviewed_by TEXT,
          reviewed_at TEXT,
          recorded_by_user_id TEXT NOT NULL,
          recorded_at TEXT NOT NULL,
          evaluated_at TEXT NOT NULL,
          UNIQUE (document_id, version_number)
        );

        CREATE TABLE IF NOT EXISTS history_sequences (
          document_id TEXT PRIMARY KEY,
          last_version INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS grading_criteria (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          owner_id TEXT NOT NULL,
          name TEXT NOT NULL,
          description TEXT NOT NULL DEFAULT '',
          active INTEGER NOT NULL DEFAULT 0,
          overview_weight INTEGER NOT NULL,
          references_weight INTEGER NOT NULL,
          definitions_weight INTEGER NOT NULL,
          organization_weight INTEGER NOT NULL,
          managerial_process_weight INTEGER NOT NULL,
          technical_process_weight INTEGER NOT NULL,
          supporting_process_weight INTEGER NOT NULL,
          additional_plans_weight INTEGER NOT NULL,
          created_at TEXT NOT NULL,
          updated_at TEXT NOT NULL,
          UNIQUE (owner_id, name)
        );
        ",
    )?;

    connection.execute_batch(
        "
        CREATE INDEX IF NOT EXISTS idx_section_analyses_score ON section_analyses(score_id, generation);
        CREATE INDEX IF NOT EXISTS idx_history_document_recorded ON compliance_score_history(document_id, recorded_at);
        CREATE INDEX IF NOT EXISTS idx_grading_criteria_owner_active ON grading_criteria(owner_id, active);
        ",
    )?;

    let now = now_utc_string();
    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_schema_version', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [DB_SCHEMA_VERSION],
    )?;
    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_updated_at', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [now],
    )?;

    Ok(())
}

pub fn read_metadata(connection: &Connection, key: &str) -> Result<Option<String>> {
    let value = connection
        .query_row("SELECT value FROM metadata WHERE key = ?1", [key], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(value)
}

pub fn count_rows(connection: &Connection, sql: &str) -> Result<i64> {
    let count = connection.query_row(sql, [], |row| row.get(0))?;
    Ok(count)
}
