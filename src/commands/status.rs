use anyhow::Result;
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::store;

const TABLE_COUNTS: [(&str, &str); 6] = [
    ("documents", "SELECT COUNT(*) FROM documents"),
    ("users", "SELECT COUNT(*) FROM users"),
    ("compliance_scores", "SELECT COUNT(*) FROM compliance_scores"),
    ("section_analyses", "SELECT COUNT(*) FROM section_analyses"),
    ("compliance_score_history", "SELECT COUNT(*) FROM compliance_score_history"),
    ("grading_criteria", "SELECT COUNT(*) FROM grading_criteria"),
];

pub fn run(args: StatusArgs) -> Result<()> {
    let db_path = args.store.resolved_db_path();
    info!(cache_root = %args.store.cache_root.display(), "status requested");

    if !db_path.exists() {
        warn!(path = %db_path.display(), "database file missing");
        return Ok(());
    }

    let connection = store::open_store(&db_path)?;
    let schema_version = store::read_metadata(&connection, "db_schema_version")?;
    let updated_at = store::read_metadata(&connection, "db_updated_at")?;

    info!(
        path = %db_path.display(),
        schema_version = %schema_version.unwrap_or_default(),
        updated_at = %updated_at.unwrap_or_default(),
        "database status"
    );

    for (table, sql) in TABLE_COUNTS {
        let rows = store::count_rows(&connection, sql).unwrap_or(0);
        info!(table, rows, "table rows");
    }

    let overrides = store::count_rows(
        &connection,
        "SELECT COUNT(*) FROM compliance_scores WHERE professor_override IS NOT NULL",
    )?;
    let stale = store::count_rows(
        &connection,
        "SELECT COUNT(*) FROM compliance_scores WHERE override_stale = 1",
    )?;
    if stale > 0 {
        warn!(overrides, stale, "overrides predate the latest evaluation");
    } else {
        info!(overrides, "reviewer overrides");
    }

    Ok(())
}
