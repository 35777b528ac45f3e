use std::io::{self, Write};

use anyhow::Result;
use chrono::Utc;
use rusqlite::{Connection, Transaction};
use tracing::{debug, info, warn};

use crate::cli::HistoryArgs;
use crate::model::{ComplianceScore, ComplianceScoreHistory, HistorySource};
use crate::store;
use crate::util::write_json_stdout;

pub fn run(args: HistoryArgs) -> Result<()> {
    let db_path = args.store.resolved_db_path();
    let connection = store::open_store(&db_path)?;

    let history = history_for_document(&connection, &args.doc_id)?;
    if history.is_empty() {
        warn!(doc_id = %args.doc_id, "no archived scores for document");
    }
    info!(doc_id = %args.doc_id, versions = history.len(), "loaded score history");

    if args.json {
        write_json_stdout(&history)?;
    } else {
        write_history_table(&args.doc_id, &history)?;
    }

    Ok(())
}

/// Archives a snapshot of `current` inside the caller's transaction, next to
/// the score write it records. Does nothing when there is no score.
pub fn archive_score(
    tx: &Transaction<'_>,
    current: Option<&ComplianceScore>,
    source: HistorySource,
    recorded_by_user_id: &str,
) -> Result<Option<i64>> {
    let Some(score) = current else {
        debug!(source = source.as_str(), "no current score to archive");
        return Ok(None);
    };

    let version =
        store::insert_history_snapshot(tx, score, source, recorded_by_user_id, Utc::now())?;

    info!(
        doc_id = %score.document_id,
        version,
        source = source.as_str(),
        recorded_by = %recorded_by_user_id,
        "archived compliance score"
    );
    Ok(Some(version))
}

/// Archived versions for a document, newest first.
pub fn history_for_document(
    connection: &Connection,
    document_id: &str,
) -> Result<Vec<ComplianceScoreHistory>> {
    store::list_history_for_document(connection, document_id)
}

fn write_history_table(document_id: &str, history: &[ComplianceScoreHistory]) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    writeln!(output, "Document: {document_id}")?;
    writeln!(output, "Versions: {}", history.len())?;
    for entry in history {
        let override_label = entry
            .professor_override
            .map(|value| format!("{value:.2}"))
            .unwrap_or_else(|| "-".to_string());
        writeln!(
            output,
            "v{}\t{}\toverall={:.2} override={}\tcompliant={}\trecorded_by={}\trecorded_at={}",
            entry.version_number,
            entry.source.as_str(),
            entry.overall_score,
            override_label,
            entry.compliant,
            entry.recorded_by_user_id,
            entry.recorded_at.to_rfc3339(),
        )?;
        if let Some(notes) = entry.professor_notes.as_deref() {
            writeln!(output, "\tnotes: {notes}")?;
        }
    }

    output.flush()?;
    Ok(())
}
