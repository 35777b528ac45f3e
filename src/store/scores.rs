use anyhow::{Context, Result};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, Transaction, params};

use crate::engine::{SectionId, Severity};
use crate::model::{ComplianceScore, SectionAnalysis};

const SCORE_COLUMNS: &str = "
    score_id, document_id, generation, overall_score, structure_score, completeness_score,
    sections_found, total_sections_required, compliant, summary, weighting, evaluated_at,
    professor_override, professor_notes, reviewed_by, reviewed_at, override_stale
";

pub fn find_score_by_document(
    connection: &Connection,
    document_id: &str,
) -> Result<Option<ComplianceScore>> {
    let sql = format!("SELECT {SCORE_COLUMNS} FROM compliance_scores WHERE document_id = ?1");
    let score = connection
        .query_row(&sql, [document_id], score_from_row)
        .optional()
        .with_context(|| format!("failed to load compliance score for {document_id}"))?;

    let Some(mut score) = score else {
        return Ok(None);
    };

    score.section_analyses = load_section_analyses(connection, &score.score_id, score.generation)?;
    Ok(Some(score))
}

/// Writes the score and its analyses for the score's current generation, then
/// drops analyses left over from earlier generations. The caller commits.
pub fn save_score(tx: &Transaction<'_>, score: &ComplianceScore) -> Result<()> {
    tx.execute(
        "
        INSERT INTO compliance_scores(
          score_id, document_id, generation, overall_score, structure_score, completeness_score,
          sections_found, total_sections_required, compliant, summary, weighting, evaluated_at,
          professor_override, professor_notes, reviewed_by, reviewed_at, override_stale
        )
        VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
        ON CONFLICT(score_id) DO UPDATE SET
          generation=excluded.generation,
          overall_score=excluded.overall_score,
          structure_score=excluded.structure_score,
          completeness_score=excluded.completeness_score,
          sections_found=excluded.sections_found,
          total_sections_required=excluded.total_sections_required,
          compliant=excluded.compliant,
          summary=excluded.summary,
          weighting=excluded.weighting,
          evaluated_at=excluded.evaluated_at,
          professor_override=excluded.professor_override,
          professor_notes=excluded.professor_notes,
          reviewed_by=excluded.reviewed_by,
          reviewed_at=excluded.reviewed_at,
          override_stale=excluded.override_stale
        ",
        params![
            score.score_id,
            score.document_id,
            score.generation,
            score.overall_score,
            score.structure_score,
            score.completeness_score,
            score.sections_found,
            score.total_sections_required,
            score.compliant,
            score.summary,
            score.weighting,
            score.evaluated_at,
            score.professor_override,
            score.professor_notes,
            score.reviewed_by,
            score.reviewed_at,
            score.override_stale,
        ],
    )
    .with_context(|| format!("failed to save compliance score {}", score.score_id))?;

    {
        let mut statement = tx.prepare(
            "
            INSERT OR REPLACE INTO section_analyses(
              score_id, generation, ordinal, section_name, present, section_score, coverage,
              severity, findings, recommendations, evidence_snippet, missing_subclauses,
              page_number, section_weight
            )
            VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            ",
        )?;

        for (ordinal, analysis) in score.section_analyses.iter().enumerate() {
            statement.execute(params![
                score.score_id,
                score.generation,
                ordinal as i64,
                analysis.section.as_str(),
                analysis.present,
                analysis.section_score,
                analysis.coverage,
                analysis.severity.as_str(),
                analysis.findings,
                analysis.recommendations,
                analysis.evidence_snippet,
                analysis.missing_subclauses,
                analysis.page_number,
                analysis.section_weight,
            ])?;
        }
    }

    tx.execute(
        "DELETE FROM section_analyses WHERE score_id = ?1 AND generation <> ?2",
        params![score.score_id, score.generation],
    )?;

    Ok(())
}

fn load_section_analyses(
    connection: &Connection,
    score_id: &str,
    generation: i64,
) -> Result<Vec<SectionAnalysis>> {
    let mut statement = connection.prepare(
        "
        SELECT
          section_name, present, section_score, coverage, severity, findings,
          recommendations, evidence_snippet, missing_subclauses, page_number, section_weight
        FROM section_analyses
        WHERE score_id = ?1 AND generation = ?2
        ORDER BY ordinal ASC
        ",
    )?;

    let mut rows = statement.query(params![score_id, generation])?;
    let mut out = Vec::<SectionAnalysis>::new();

    while let Some(row) = rows.next()? {
        let section_name: String = row.get(0)?;
        let severity: String = row.get(4)?;
        out.push(SectionAnalysis {
            section: SectionId::parse(&section_name)
                .ok_or_else(|| invalid_text(0, "section_name", &section_name))?,
            present: row.get(1)?,
            section_score: row.get(2)?,
            coverage: row.get(3)?,
            severity: Severity::parse(&severity)
                .ok_or_else(|| invalid_text(4, "severity", &severity))?,
            findings: row.get(5)?,
            recommendations: row.get(6)?,
            evidence_snippet: row.get(7)?,
            missing_subclauses: row.get(8)?,
            page_number: row.get(9)?,
            section_weight: row.get(10)?,
        });
    }

    Ok(out)
}

fn score_from_row(row: &Row<'_>) -> rusqlite::Result<ComplianceScore> {
    Ok(ComplianceScore {
        score_id: row.get(0)?,
        document_id: row.get(1)?,
        generation: row.get(2)?,
        overall_score: row.get(3)?,
        structure_score: row.get(4)?,
        completeness_score: row.get(5)?,
        sections_found: row.get(6)?,
        total_sections_required: row.get(7)?,
        compliant: row.get(8)?,
        summary: row.get(9)?,
        weighting: row.get(10)?,
        section_analyses: Vec::new(),
        evaluated_at: row.get(11)?,
        professor_override: row.get(12)?,
        professor_notes: row.get(13)?,
        reviewed_by: row.get(14)?,
        reviewed_at: row.get(15)?,
        override_stale: row.get(16)?,
    })
}

pub(super) fn invalid_text(column: usize, field: &str, value: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        Type::Text,
        format!("unrecognized {field} value: {value}").into(),
    )
}
