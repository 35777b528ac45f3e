use anyhow::Result;
use chrono::Utc;
use rusqlite::{Connection, TransactionBehavior};
use thiserror::Error;
use tracing::info;

use crate::cli::OverrideArgs;
use crate::commands::evaluate::{convert_to_dto, reviewer_display_name, write_report_text};
use crate::commands::history::archive_score;
use crate::model::{ComplianceScore, HistorySource};
use crate::store;

#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("override score must be within 0..=100 (got {0})")]
    ScoreOutOfRange(f64),

    #[error("document {0} has no compliance score to override")]
    NoScore(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for ReviewError {
    fn from(err: rusqlite::Error) -> Self {
        ReviewError::Storage(err.into())
    }
}

pub fn run(args: OverrideArgs) -> Result<()> {
    let db_path = args.store.resolved_db_path();
    let mut connection = store::open_store(&db_path)?;

    let score = record_override(
        &mut connection,
        &args.doc_id,
        args.score,
        args.notes.as_deref(),
        &args.user,
    )?;

    let document_name = store::find_document(&connection, &args.doc_id)?
        .map(|document| document.filename)
        .unwrap_or_else(|| args.doc_id.clone());
    let reviewer_name = reviewer_display_name(&connection, &score)?;
    write_report_text(&convert_to_dto(&score, &document_name, reviewer_name))?;

    Ok(())
}

/// Replaces any prior override on the document's current score and archives
/// the result as an `OVERRIDE` snapshot.
pub fn record_override(
    connection: &mut Connection,
    document_id: &str,
    value: f64,
    notes: Option<&str>,
    reviewer_id: &str,
) -> Result<ComplianceScore, ReviewError> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(ReviewError::ScoreOutOfRange(value));
    }

    let tx = connection.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let mut score = store::find_score_by_document(&tx, document_id)?
        .ok_or_else(|| ReviewError::NoScore(document_id.to_string()))?;

    score.professor_override = Some(value);
    score.professor_notes = notes.map(ToOwned::to_owned);
    score.reviewed_by = Some(reviewer_id.to_string());
    score.reviewed_at = Some(Utc::now());
    score.override_stale = false;

    store::save_score(&tx, &score)?;
    archive_score(&tx, Some(&score), HistorySource::Override, reviewer_id)?;
    tx.commit()?;

    info!(
        doc_id = %document_id,
        override_score = value,
        reviewer = %reviewer_id,
        computed = score.overall_score,
        "recorded reviewer override"
    );
    Ok(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::evaluate::{EvaluationRequest, evaluate_document};
    use crate::engine::Weighting;
    use crate::model::Document;

    fn open_with_score(document_id: &str) -> Connection {
        let mut connection = Connection::open_in_memory().expect("in-memory DB should open");
        store::ensure_schema(&connection).expect("schema should apply");
        evaluate_document(
            &mut connection,
            &EvaluationRequest {
                document: Document {
                    document_id: document_id.to_string(),
                    filename: "plan.txt".to_string(),
                    sha256: "b".repeat(64),
                    registered_at: Utc::now(),
                },
                text: "Project overview\nMaster schedule and milestones".to_string(),
                weighting: Weighting::Standard,
                user_id: "prof-a".to_string(),
            },
        )
        .expect("evaluation should succeed");
        connection
    }

    #[test]
    fn override_sets_review_fields_and_archives() {
        let mut connection = open_with_score("doc-a");
        let score =
            record_override(&mut connection, "doc-a", 85.0, Some("Solid plan"), "prof-b").unwrap();

        assert_eq!(score.professor_override, Some(85.0));
        assert_eq!(score.professor_notes.as_deref(), Some("Solid plan"));
        assert_eq!(score.reviewed_by.as_deref(), Some("prof-b"));
        assert!(score.reviewed_at.is_some());
        assert_eq!(score.effective_score(), 85.0);

        let history = store::list_history_for_document(&connection, "doc-a").unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].source, HistorySource::Override);
        assert_eq!(history[0].professor_override, Some(85.0));
        assert_eq!(history[0].recorded_by_user_id, "prof-b");
    }

    #[test]
    fn override_keeps_computed_scores() {
        let mut connection = open_with_score("doc-a");
        let before = store::find_score_by_document(&connection, "doc-a")
            .unwrap()
            .expect("score should exist");

        let after = record_override(&mut connection, "doc-a", 10.0, None, "prof-b").unwrap();

        assert_eq!(after.overall_score, before.overall_score);
        assert_eq!(after.compliant, before.compliant);
        assert_eq!(after.generation, before.generation);
        assert_eq!(after.section_analyses, before.section_analyses);
    }

    #[test]
    fn new_override_clears_stale_flag() {
        let mut connection = open_with_score("doc-a");
        let mut score = record_override(&mut connection, "doc-a", 70.0, None, "prof-b").unwrap();
        score.override_stale = true;
        let tx = connection.transaction().unwrap();
        store::save_score(&tx, &score).unwrap();
        tx.commit().unwrap();

        let replaced =
            record_override(&mut connection, "doc-a", 75.0, Some("Re-checked"), "prof-c").unwrap();
        assert!(!replaced.override_stale);
        assert_eq!(replaced.professor_override, Some(75.0));
        assert_eq!(replaced.reviewed_by.as_deref(), Some("prof-c"));
    }

    #[test]
    fn override_rejects_out_of_range_values() {
        let mut connection = open_with_score("doc-a");
        for value in [-0.5, 100.01, f64::NAN] {
            let err = record_override(&mut connection, "doc-a", value, None, "prof-b").unwrap_err();
            assert!(matches!(err, ReviewError::ScoreOutOfRange(_)));
        }
        assert!(record_override(&mut connection, "doc-a", 100.0, None, "prof-b").is_ok());
        assert!(record_override(&mut connection, "doc-a", 0.0, None, "prof-b").is_ok());
    }

    #[test]
    fn override_requires_existing_score() {
        let mut connection = open_with_score("doc-a");
        let err = record_override(&mut connection, "doc-missing", 50.0, None, "prof-b").unwrap_err();
        assert!(matches!(err, ReviewError::NoScore(ref id) if id == "doc-missing"));
        assert!(
            store::list_history_for_document(&connection, "doc-missing")
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn failed_archive_leaves_previous_override_in_place() {
        let mut connection = open_with_score("doc-a");
        record_override(&mut connection, "doc-a", 60.0, Some("First pass"), "prof-b").unwrap();
        connection
            .execute_batch(
                "CREATE TRIGGER reject_history BEFORE INSERT ON compliance_score_history
                 BEGIN SELECT RAISE(ABORT, 'history unavailable'); END;",
            )
            .unwrap();

        let err = record_override(&mut connection, "doc-a", 95.0, None, "prof-c").unwrap_err();
        assert!(matches!(err, ReviewError::Storage(_)));

        let stored = store::find_score_by_document(&connection, "doc-a")
            .unwrap()
            .expect("score should exist");
        assert_eq!(stored.professor_override, Some(60.0));
        assert_eq!(stored.reviewed_by.as_deref(), Some("prof-b"));
        assert_eq!(
            store::list_history_for_document(&connection, "doc-a")
                .unwrap()
                .len(),
            2
        );
    }
}
