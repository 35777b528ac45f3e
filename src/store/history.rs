use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row, Transaction, params};

use crate::model::{ComplianceScore, ComplianceScoreHistory, HistorySource};
use crate::store::scores::invalid_text;

/// Appends an immutable snapshot of `score`. The version number comes from a
/// per-document sequence bumped in the caller's transaction, which should be
/// `IMMEDIATE` so concurrent archivers never share a version.
pub fn insert_history_snapshot(
    tx: &Transaction<'_>,
    score: &ComplianceScore,
    source: HistorySource,
    recorded_by_user_id: &str,
    recorded_at: DateTime<Utc>,
) -> Result<i64> {
    let existing = count_history_for_document(tx, &score.document_id)?;

    let version_number: i64 = tx
        .query_row(
            "
            INSERT INTO history_sequences(document_id, last_version) VALUES(?1, ?2 + 1)
            ON CONFLICT(document_id) DO UPDATE SET last_version = MAX(last_version, ?2) + 1
            RETURNING last_version
            ",
            params![score.document_id, existing],
            |row| row.get(0),
        )
        .with_context(|| format!("failed to advance history sequence for {}", score.document_id))?;

    tx.execute(
        "
        INSERT INTO compliance_score_history(
          document_id, score_id, version_number, source, overall_score, structure_score,
          completeness_score, sections_found, total_sections_required, compliant, summary,
          professor_override, professor_notes, reviewed_by, reviewed_at,
          recorded_by_user_id, recorded_at, evaluated_at
        )
        VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
        ",
        params![
            score.document_id,
            score.score_id,
            version_number,
            source.as_str(),
            score.overall_score,
            score.structure_score,
            score.completeness_score,
            score.sections_found,
            score.total_sections_required,
            score.compliant,
            score.summary,
            score.professor_override,
            score.professor_notes,
            score.reviewed_by,
            score.reviewed_at,
            recorded_by_user_id,
            recorded_at,
            score.evaluated_at,
        ],
    )
    .with_context(|| {
        format!(
            "failed to archive version {version_number} for {}",
            score.document_id
        )
    })?;

    Ok(version_number)
}

pub fn count_history_for_document(connection: &Connection, document_id: &str) -> Result<i64> {
    let count = connection.query_row(
        "SELECT COUNT(*) FROM compliance_score_history WHERE document_id = ?1",
        [document_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn list_history_for_document(
    connection: &Connection,
    document_id: &str,
) -> Result<Vec<ComplianceScoreHistory>> {
    let mut statement = connection.prepare(
        "
        SELECT
          history_id, document_id, score_id, version_number, source, overall_score,
          structure_score, completeness_score, sections_found, total_sections_required,
          compliant, summary, professor_override, professor_notes, reviewed_by, reviewed_at,
          recorded_by_user_id, recorded_at, evaluated_at
        FROM compliance_score_history
        WHERE document_id = ?1
        ORDER BY recorded_at DESC, version_number DESC
        ",
    )?;

    let mut rows = statement.query([document_id])?;
    let mut out = Vec::<ComplianceScoreHistory>::new();
    while let Some(row) = rows.next()? {
        out.push(history_from_row(row)?);
    }

    Ok(out)
}

fn history_from_row(row: &Row<'_>) -> rusqlite::Result<ComplianceScoreHistory> {
    let source: String = row.get(4)?;
    Ok(ComplianceScoreHistory {
        history_id: row.get(0)?,
        document_id: row.get(1)?,
        score_id: row.get(2)?,
        version_number: row.get(3)?,
        source: HistorySource::parse(&source).ok_or_else(|| invalid_text(4, "source", &source))?,
        overall_score: row.get(5)?,
        structure_score: row.get(6)?,
        completeness_score: row.get(7)?,
        sections_found: row.get(8)?,
        total_sections_required: row.get(9)?,
        compliant: row.get(10)?,
        summary: row.get(11)?,
        professor_override: row.get(12)?,
        professor_notes: row.get(13)?,
        reviewed_by: row.get(14)?,
        reviewed_at: row.get(15)?,
        recorded_by_user_id: row.get(16)?,
        recorded_at: row.get(17)?,
        evaluated_at: row.get(18)?,
    })
}
