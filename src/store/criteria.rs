use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, Transaction, params};

use crate::engine::SectionWeights;
use crate::model::{GradingCriteria, GradingCriteriaDraft};

const CRITERIA_COLUMNS: &str = "
    id, owner_id, name, description, active,
    overview_weight, references_weight, definitions_weight, organization_weight,
    managerial_process_weight, technical_process_weight, supporting_process_weight,
    additional_plans_weight, created_at, updated_at
";

pub fn find_criteria(connection: &Connection, id: i64) -> Result<Option<GradingCriteria>> {
    let sql = format!("SELECT {CRITERIA_COLUMNS} FROM grading_criteria WHERE id = ?1");
    let criteria = connection
        .query_row(&sql, [id], criteria_from_row)
        .optional()?;
    Ok(criteria)
}

pub fn find_criteria_by_owner_and_name(
    connection: &Connection,
    owner_id: &str,
    name: &str,
) -> Result<Option<GradingCriteria>> {
    let sql = format!(
        "SELECT {CRITERIA_COLUMNS} FROM grading_criteria WHERE owner_id = ?1 AND name = ?2"
    );
    let criteria = connection
        .query_row(&sql, params![owner_id, name], criteria_from_row)
        .optional()?;
    Ok(criteria)
}

pub fn find_active_criteria(
    connection: &Connection,
    owner_id: &str,
) -> Result<Option<GradingCriteria>> {
    let sql = format!(
        "SELECT {CRITERIA_COLUMNS} FROM grading_criteria
         WHERE owner_id = ?1 AND active = 1
         ORDER BY updated_at DESC, id DESC
         LIMIT 1"
    );
    let criteria = connection
        .query_row(&sql, [owner_id], criteria_from_row)
        .optional()?;
    Ok(criteria)
}

pub fn list_criteria(connection: &Connection, owner_id: &str) -> Result<Vec<GradingCriteria>> {
    let sql = format!(
        "SELECT {CRITERIA_COLUMNS} FROM grading_criteria WHERE owner_id = ?1 ORDER BY name ASC"
    );
    let mut statement = connection.prepare(&sql)?;
    let mut rows = statement.query([owner_id])?;

    let mut out = Vec::<GradingCriteria>::new();
    while let Some(row) = rows.next()? {
        out.push(criteria_from_row(row)?);
    }
    Ok(out)
}

pub fn insert_criteria(
    tx: &Transaction<'_>,
    owner_id: &str,
    draft: &GradingCriteriaDraft,
    now: DateTime<Utc>,
) -> Result<i64> {
    let weights = &draft.weights;
    tx.execute(
        "
        INSERT INTO grading_criteria(
          owner_id, name, description, active,
          overview_weight, references_weight, definitions_weight, organization_weight,
          managerial_process_weight, technical_process_weight, supporting_process_weight,
          additional_plans_weight, created_at, updated_at
        )
        VALUES(?1, ?2, ?3, 0, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)
        ",
        params![
            owner_id,
            draft.name,
            draft.description,
            weights.overview,
            weights.references,
            weights.definitions,
            weights.organization,
            weights.managerial_process,
            weights.technical_process,
            weights.supporting_process,
            weights.additional_plans,
            now,
        ],
    )?;
    Ok(tx.last_insert_rowid())
}

/// Rewrites name, description and weights. The active flag is left to
/// [`activate_criteria`] so sibling deactivation stays in one place.
pub fn update_criteria(
    tx: &Transaction<'_>,
    id: i64,
    draft: &GradingCriteriaDraft,
    now: DateTime<Utc>,
) -> Result<()> {
    let weights = &draft.weights;
    tx.execute(
        "
        UPDATE grading_criteria SET
          name = ?2,
          description = ?3,
          overview_weight = ?4,
          references_weight = ?5,
          definitions_weight = ?6,
          organization_weight = ?7,
          managerial_process_weight = ?8,
          technical_process_weight = ?9,
          supporting_process_weight = ?10,
          additional_plans_weight = ?11,
          updated_at = ?12
        WHERE id = ?1
        ",
        params![
            id,
            draft.name,
            draft.description,
            weights.overview,
            weights.references,
            weights.definitions,
            weights.organization,
            weights.managerial_process,
            weights.technical_process,
            weights.supporting_process,
            weights.additional_plans,
            now,
        ],
    )?;
    Ok(())
}

pub fn set_criteria_inactive(tx: &Transaction<'_>, id: i64, now: DateTime<Utc>) -> Result<()> {
    tx.execute(
        "UPDATE grading_criteria SET active = 0, updated_at = ?2 WHERE id = ?1",
        params![id, now],
    )?;
    Ok(())
}

/// Deactivates every other profile of `owner_id`, then activates `id`.
pub fn activate_criteria(
    tx: &Transaction<'_>,
    id: i64,
    owner_id: &str,
    now: DateTime<Utc>,
) -> Result<usize> {
    let deactivated = tx.execute(
        "
        UPDATE grading_criteria SET active = 0, updated_at = ?3
        WHERE owner_id = ?1 AND id <> ?2 AND active = 1
        ",
        params![owner_id, id, now],
    )?;
    tx.execute(
        "UPDATE grading_criteria SET active = 1, updated_at = ?3 WHERE id = ?1 AND owner_id = ?2",
        params![id, owner_id, now],
    )?;
    Ok(deactivated)
}

pub fn delete_criteria(connection: &Connection, id: i64) -> Result<usize> {
    let deleted = connection.execute("DELETE FROM grading_criteria WHERE id = ?1", [id])?;
    Ok(deleted)
}

fn criteria_from_row(row: &Row<'_>) -> rusqlite::Result<GradingCriteria> {
    Ok(GradingCriteria {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        active: row.get(4)?,
        weights: SectionWeights {
            overview: row.get(5)?,
            references: row.get(6)?,
            definitions: row.get(7)?,
            organization: row.get(8)?,
            managerial_process: row.get(9)?,
            technical_process: row.get(10)?,
            supporting_process: row.get(11)?,
            additional_plans: row.get(12)?,
        },
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}
