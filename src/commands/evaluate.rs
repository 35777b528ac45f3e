use std::io::{self, Write};

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, TransactionBehavior};
use tracing::{info, warn};

use crate::cli::EvaluateArgs;
use crate::commands::criteria::active_weighting;
use crate::commands::extract::extract_text;
use crate::commands::history::archive_score;
use crate::engine::{TOTAL_SECTIONS_REQUIRED, Weighting, evaluate_text};
use crate::model::{ComplianceReport, ComplianceScore, Document, HistorySource, SectionReport};
use crate::store;
use crate::util::{document_id_from_sha256, sha256_file, write_json_stdout};

/// Inputs for one evaluation pass over a registered document.
#[derive(Debug, Clone)]
pub struct EvaluationRequest {
    pub document: Document,
    pub text: String,
    pub weighting: Weighting,
    pub user_id: String,
}

pub fn run(args: EvaluateArgs) -> Result<()> {
    let db_path = args.store.resolved_db_path();
    let mut connection = store::open_store(&db_path)?;

    let text = extract_text(&args.file)?;
    let sha256 = sha256_file(&args.file)?;
    let filename = args.name.clone().unwrap_or_else(|| {
        args.file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| args.file.display().to_string())
    });
    let document_id = args
        .doc_id
        .clone()
        .unwrap_or_else(|| document_id_from_sha256(&sha256));

    let weighting = match args.criteria_owner.as_deref() {
        Some(owner_id) => active_weighting(&connection, owner_id)?,
        None => Weighting::Standard,
    };

    info!(
        doc_id = %document_id,
        file = %args.file.display(),
        weighting = %weighting.label(),
        "evaluating document"
    );

    let request = EvaluationRequest {
        document: Document {
            document_id,
            filename,
            sha256,
            registered_at: Utc::now(),
        },
        text,
        weighting,
        user_id: args.user.clone(),
    };
    let score = evaluate_document(&mut connection, &request)?;

    let reviewer_name = reviewer_display_name(&connection, &score)?;
    let report = convert_to_dto(&score, &request.document.filename, reviewer_name);

    if args.json {
        write_json_stdout(&report)?;
    } else {
        write_report_text(&report)?;
    }

    Ok(())
}

/// Scores `request.text`, persists the result and archives a snapshot in a
/// single transaction.
///
/// A document that already has a score keeps its `score_id`; the generation is
/// bumped and the twelve analyses are replaced. A prior reviewer override is
/// carried forward and flagged stale.
pub fn evaluate_document(
    connection: &mut Connection,
    request: &EvaluationRequest,
) -> Result<ComplianceScore> {
    let document = &request.document;
    let tx = connection.transaction_with_behavior(TransactionBehavior::Immediate)?;
    store::upsert_document(&tx, document)
        .with_context(|| format!("failed to register document {}", document.document_id))?;

    let previous = store::find_score_by_document(&tx, &document.document_id)?;
    let evaluation = evaluate_text(&request.text, &request.weighting);
    if evaluation.card.sections_found == 0 {
        warn!(doc_id = %document.document_id, "no SPMP sections detected");
    }

    let (score_id, generation) = match previous.as_ref() {
        Some(existing) => (existing.score_id.clone(), existing.generation + 1),
        None => (format!("score-{}", document.document_id), 1),
    };

    let mut score = ComplianceScore {
        score_id,
        document_id: document.document_id.clone(),
        generation,
        overall_score: evaluation.card.overall_score,
        structure_score: evaluation.card.structure_score,
        completeness_score: evaluation.card.completeness_score,
        sections_found: evaluation.card.sections_found,
        total_sections_required: TOTAL_SECTIONS_REQUIRED as u32,
        compliant: evaluation.card.compliant,
        summary: evaluation.summary,
        weighting: request.weighting.label(),
        section_analyses: evaluation.analyses,
        evaluated_at: Utc::now(),
        professor_override: None,
        professor_notes: None,
        reviewed_by: None,
        reviewed_at: None,
        override_stale: false,
    };

    if let Some(existing) = previous.as_ref() {
        score.professor_override = existing.professor_override;
        score.professor_notes = existing.professor_notes.clone();
        score.reviewed_by = existing.reviewed_by.clone();
        score.reviewed_at = existing.reviewed_at;
        score.override_stale = existing.professor_override.is_some();
    }

    let source = if previous.is_some() {
        HistorySource::ReEvaluation
    } else {
        HistorySource::AiEvaluation
    };
    store::save_score(&tx, &score)?;
    archive_score(&tx, Some(&score), source, &request.user_id)?;
    tx.commit()?;

    info!(
        doc_id = %score.document_id,
        generation = score.generation,
        overall = score.overall_score,
        sections_found = score.sections_found,
        compliant = score.compliant,
        override_stale = score.override_stale,
        "stored compliance score"
    );

    Ok(score)
}

pub fn reviewer_display_name(
    connection: &Connection,
    score: &ComplianceScore,
) -> Result<Option<String>> {
    match score.reviewed_by.as_deref() {
        Some(user_id) => store::display_name_for(connection, user_id),
        None => Ok(None),
    }
}

/// Flattens a stored score into the report shape. Missing subclauses become a
/// list; a reviewer without a registered name falls back to the raw user id.
pub fn convert_to_dto(
    score: &ComplianceScore,
    document_name: &str,
    reviewer_name: Option<String>,
) -> ComplianceReport {
    let section_analyses = score
        .section_analyses
        .iter()
        .map(|analysis| SectionReport {
            section_name: analysis.section.display_name().to_string(),
            present: analysis.present,
            section_score: analysis.section_score,
            findings: analysis.findings.clone(),
            recommendations: analysis.recommendations.clone(),
            page_number: analysis.page_number,
            coverage: analysis.coverage,
            severity: analysis.severity,
            evidence_snippet: analysis.evidence_snippet.clone(),
            missing_subclauses: analysis.missing_subclause_list(),
            section_weight: analysis.section_weight,
        })
        .collect();

    ComplianceReport {
        document_id: score.document_id.clone(),
        document_name: document_name.to_string(),
        overall_score: score.overall_score,
        structure_score: score.structure_score,
        completeness_score: score.completeness_score,
        sections_found: score.sections_found,
        total_sections_required: score.total_sections_required,
        compliant: score.compliant,
        summary: score.summary.clone(),
        section_analyses,
        evaluated_at: score.evaluated_at,
        professor_override: score.professor_override,
        professor_notes: score.professor_notes.clone(),
        reviewed_by: score.reviewed_by.clone(),
        reviewed_by_name: reviewer_name.or_else(|| score.reviewed_by.clone()),
        reviewed_at: score.reviewed_at,
        override_stale: score.override_stale,
        effective_score: score.effective_score(),
        weighting: score.weighting.clone(),
    }
}

pub fn write_report_text(report: &ComplianceReport) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    writeln!(output, "Document: {} ({})", report.document_name, report.document_id)?;
    writeln!(
        output,
        "Overall: {:.2}  structure={:.2} completeness={:.2}  compliant={}  weighting={}",
        report.overall_score,
        report.structure_score,
        report.completeness_score,
        report.compliant,
        report.weighting,
    )?;
    if let Some(value) = report.professor_override {
        writeln!(
            output,
            "Override: {:.2} by {}{}",
            value,
            report.reviewed_by_name.as_deref().unwrap_or("unknown"),
            if report.override_stale { " (stale)" } else { "" },
        )?;
        if let Some(notes) = report.professor_notes.as_deref() {
            writeln!(output, "Notes: {notes}")?;
        }
    }
    writeln!(output, "Summary: {}", report.summary)?;
    writeln!(output)?;

    for section in &report.section_analyses {
        let page = section
            .page_number
            .map(|page| page.to_string())
            .unwrap_or_else(|| "-".to_string());
        writeln!(
            output,
            "{:<40} {:<7} score={:>6.2} coverage={:>6.2} severity={:<6} weight={:>2} page={}",
            section.section_name,
            if section.present { "present" } else { "missing" },
            section.section_score,
            section.coverage,
            section.severity.as_str(),
            section.section_weight,
            page,
        )?;
        if !section.missing_subclauses.is_empty() {
            writeln!(output, "    missing: {}", section.missing_subclauses.join("; "))?;
        }
    }

    output.flush()?;
    Ok(())
}
