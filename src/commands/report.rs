use anyhow::{Result, bail};
use rusqlite::Connection;
use tracing::info;

use crate::cli::ReportArgs;
use crate::commands::evaluate::{convert_to_dto, reviewer_display_name, write_report_text};
use crate::model::ComplianceReport;
use crate::store;
use crate::util::{write_json_pretty, write_json_stdout};

pub fn run(args: ReportArgs) -> Result<()> {
    let db_path = args.store.resolved_db_path();
    let connection = store::open_store(&db_path)?;

    let Some(report) = load_report(&connection, &args.doc_id)? else {
        bail!("document {} has not been evaluated", args.doc_id);
    };

    if let Some(path) = args.output.as_deref() {
        write_json_pretty(path, &report)?;
        info!(path = %path.display(), "wrote compliance report");
    }

    if args.json {
        write_json_stdout(&report)?;
    } else {
        write_report_text(&report)?;
    }

    Ok(())
}

pub fn load_report(connection: &Connection, document_id: &str) -> Result<Option<ComplianceReport>> {
    let Some(score) = store::find_score_by_document(connection, document_id)? else {
        return Ok(None);
    };

    let document_name = store::find_document(connection, document_id)?
        .map(|document| document.filename)
        .unwrap_or_else(|| document_id.to_string());
    let reviewer_name = reviewer_display_name(connection, &score)?;

    Ok(Some(convert_to_dto(&score, &document_name, reviewer_name)))
}
