use std::io::{self, Write};

use anyhow::Result;
use chrono::Utc;
use rusqlite::{Connection, TransactionBehavior};
use thiserror::Error;
use tracing::info;

use crate::cli::{CriteriaAction, CriteriaArgs, CriteriaWriteArgs};
use crate::engine::{SectionWeights, Weighting};
use crate::model::{GradingCriteria, GradingCriteriaDraft};
use crate::store;
use crate::util::write_json_stdout;

/// Rejections raised while managing grading profiles.
#[derive(Error, Debug)]
pub enum CriteriaError {
    #[error("grading criteria {0} not found")]
    NotFound(i64),

    #[error("grading criteria {criteria_id} is not owned by {owner_id}")]
    NotOwner { criteria_id: i64, owner_id: String },

    #[error("weights must sum to 100 (got {0})")]
    InvalidWeights(u64),

    #[error("duplicate name: {owner_id} already has a grading criteria named '{name}'")]
    DuplicateName { owner_id: String, name: String },

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for CriteriaError {
    fn from(err: rusqlite::Error) -> Self {
        CriteriaError::Storage(err.into())
    }
}

pub fn run(args: CriteriaArgs) -> Result<()> {
    let db_path = args.store.resolved_db_path();
    let mut connection = store::open_store(&db_path)?;

    match args.action {
        CriteriaAction::Create(write) => {
            let owner_id = write.owner.clone();
            let created = create_criteria(&mut connection, &owner_id, &draft_from_args(&write))?;
            info!(id = created.id, owner = %owner_id, active = created.active, "created grading criteria");
            write_json_stdout(&created)?;
        }
        CriteriaAction::Update(update) => {
            let owner_id = update.profile.owner.clone();
            let updated = update_criteria(
                &mut connection,
                update.id,
                &owner_id,
                &draft_from_args(&update.profile),
            )?;
            info!(id = updated.id, owner = %owner_id, active = updated.active, "updated grading criteria");
            write_json_stdout(&updated)?;
        }
        CriteriaAction::Activate(target) => {
            let activated = set_active(&mut connection, target.id, &target.owner)?;
            info!(id = activated.id, owner = %target.owner, "activated grading criteria");
            write_json_stdout(&activated)?;
        }
        CriteriaAction::Delete(target) => {
            delete_criteria(&connection, target.id, &target.owner)?;
            info!(id = target.id, owner = %target.owner, "deleted grading criteria");
        }
        CriteriaAction::List(list) => {
            let profiles = store::list_criteria(&connection, &list.owner)?;
            info!(owner = %list.owner, count = profiles.len(), "listed grading criteria");
            if list.json {
                write_json_stdout(&profiles)?;
            } else {
                write_criteria_table(&profiles)?;
            }
        }
    }

    Ok(())
}

pub fn validate_weights(weights: &SectionWeights) -> bool {
    weights.is_valid()
}

pub fn create_criteria(
    connection: &mut Connection,
    owner_id: &str,
    draft: &GradingCriteriaDraft,
) -> Result<GradingCriteria, CriteriaError> {
    ensure_valid_weights(&draft.weights)?;

    let tx = connection.transaction_with_behavior(TransactionBehavior::Immediate)?;
    if store::find_criteria_by_owner_and_name(&tx, owner_id, &draft.name)?.is_some() {
        return Err(CriteriaError::DuplicateName {
            owner_id: owner_id.to_string(),
            name: draft.name.clone(),
        });
    }

    let now = Utc::now();
    let id = store::insert_criteria(&tx, owner_id, draft, now)?;
    if draft.active {
        store::activate_criteria(&tx, id, owner_id, now)?;
    }
    tx.commit()?;

    load_existing(connection, id)
}

pub fn update_criteria(
    connection: &mut Connection,
    id: i64,
    acting_owner_id: &str,
    draft: &GradingCriteriaDraft,
) -> Result<GradingCriteria, CriteriaError> {
    let tx = connection.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let existing = store::find_criteria(&tx, id)?.ok_or(CriteriaError::NotFound(id))?;
    ensure_owner(&existing, acting_owner_id)?;
    ensure_valid_weights(&draft.weights)?;

    if let Some(conflict) =
        store::find_criteria_by_owner_and_name(&tx, &existing.owner_id, &draft.name)?
    {
        if conflict.id != id {
            return Err(CriteriaError::DuplicateName {
                owner_id: existing.owner_id.clone(),
                name: draft.name.clone(),
            });
        }
    }

    let now = Utc::now();
    store::update_criteria(&tx, id, draft, now)?;
    if draft.active {
        store::activate_criteria(&tx, id, &existing.owner_id, now)?;
    } else {
        store::set_criteria_inactive(&tx, id, now)?;
    }
    tx.commit()?;

    load_existing(connection, id)
}

/// Makes `id` the single active profile of `owner_id`.
pub fn set_active(
    connection: &mut Connection,
    id: i64,
    owner_id: &str,
) -> Result<GradingCriteria, CriteriaError> {
    let tx = connection.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let existing = store::find_criteria(&tx, id)?.ok_or(CriteriaError::NotFound(id))?;
    ensure_owner(&existing, owner_id)?;

    let deactivated = store::activate_criteria(&tx, id, owner_id, Utc::now())?;
    tx.commit()?;

    info!(id, owner = %owner_id, deactivated, "switched active grading criteria");
    load_existing(connection, id)
}

pub fn delete_criteria(
    connection: &Connection,
    id: i64,
    owner_id: &str,
) -> Result<(), CriteriaError> {
    let existing = store::find_criteria(connection, id)?.ok_or(CriteriaError::NotFound(id))?;
    ensure_owner(&existing, owner_id)?;
    store::delete_criteria(connection, id)?;
    Ok(())
}

/// Weighting for an evaluator's active profile, or the default profile when
/// none is active.
pub fn active_weighting(connection: &Connection, owner_id: &str) -> Result<Weighting> {
    let weighting = match store::find_active_criteria(connection, owner_id)? {
        Some(criteria) => Weighting::Profile {
            criteria_id: Some(criteria.id),
            weights: criteria.weights,
        },
        None => Weighting::Profile {
            criteria_id: None,
            weights: SectionWeights::default(),
        },
    };
    Ok(weighting)
}

fn ensure_valid_weights(weights: &SectionWeights) -> Result<(), CriteriaError> {
    if validate_weights(weights) {
        Ok(())
    } else {
        Err(CriteriaError::InvalidWeights(weights.total()))
    }
}

fn ensure_owner(criteria: &GradingCriteria, owner_id: &str) -> Result<(), CriteriaError> {
    if criteria.owner_id == owner_id {
        return Ok(());
    }
    Err(CriteriaError::NotOwner {
        criteria_id: criteria.id,
        owner_id: owner_id.to_string(),
    })
}

fn load_existing(connection: &Connection, id: i64) -> Result<GradingCriteria, CriteriaError> {
    store::find_criteria(connection, id)?.ok_or(CriteriaError::NotFound(id))
}

fn draft_from_args(args: &CriteriaWriteArgs) -> GradingCriteriaDraft {
    GradingCriteriaDraft {
        name: args.name.trim().to_string(),
        description: args.description.clone(),
        active: args.active,
        weights: SectionWeights {
            overview: args.weights.overview,
            references: args.weights.references,
            definitions: args.weights.definitions,
            organization: args.weights.organization,
            managerial_process: args.weights.managerial_process,
            technical_process: args.weights.technical_process,
            supporting_process: args.weights.supporting_process,
            additional_plans: args.weights.additional_plans,
        },
    }
}

fn write_criteria_table(profiles: &[GradingCriteria]) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    writeln!(output, "Profiles: {}", profiles.len())?;
    for profile in profiles {
        let weights = &profile.weights;
        writeln!(
            output,
            "{}\t{}{}\tov={} ref={} def={} org={} mgr={} tech={} sup={} add={}",
            profile.id,
            profile.name,
            if profile.active { " (active)" } else { "" },
            weights.overview,
            weights.references,
            weights.definitions,
            weights.organization,
            weights.managerial_process,
            weights.technical_process,
            weights.supporting_process,
            weights.additional_plans,
        )?;
        if !profile.description.is_empty() {
            writeln!(output, "\t{}", profile.description)?;
        }
    }
    output.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open() -> Connection {
        let connection = Connection::open_in_memory().expect("in-memory DB should open");
        store::ensure_schema(&connection).expect("schema should apply");
        connection
    }

    fn draft(name: &str, active: bool) -> GradingCriteriaDraft {
        GradingCriteriaDraft {
            name: name.to_string(),
            description: String::new(),
            active,
            weights: SectionWeights::default(),
        }
    }

    fn active_ids(connection: &Connection, owner_id: &str) -> Vec<i64> {
        store::list_criteria(connection, owner_id)
            .expect("list should succeed")
            .into_iter()
            .filter(|criteria| criteria.active)
            .map(|criteria| criteria.id)
            .collect()
    }

    #[test]
    fn validate_weights_requires_exact_total() {
        let weights = SectionWeights {
            overview: 10,
            references: 5,
            definitions: 5,
            organization: 15,
            managerial_process: 20,
            technical_process: 20,
            supporting_process: 15,
            additional_plans: 10,
        };
        assert!(validate_weights(&weights));
        assert!(!validate_weights(&SectionWeights {
            technical_process: 21,
            ..weights
        }));
    }

    #[test]
    fn create_rejects_invalid_weights() {
        let mut connection = open();
        let mut invalid = draft("broken", false);
        invalid.weights.overview = 11;

        let err = create_criteria(&mut connection, "prof-a", &invalid).unwrap_err();
        assert!(matches!(err, CriteriaError::InvalidWeights(101)));
        assert!(err.to_string().contains("weights must sum to 100"));
    }

    #[test]
    fn create_rejects_weights_beyond_u32_sum() {
        let mut connection = open();
        let mut invalid = draft("huge", false);
        invalid.weights.overview = u32::MAX;
        invalid.weights.references = 101;

        let err = create_criteria(&mut connection, "prof-a", &invalid).unwrap_err();
        assert!(matches!(err, CriteriaError::InvalidWeights(total) if total > u64::from(u32::MAX)));
        assert!(store::list_criteria(&connection, "prof-a").unwrap().is_empty());
    }

    #[test]
    fn create_rejects_duplicate_name_for_same_owner_only() {
        let mut connection = open();
        create_criteria(&mut connection, "prof-a", &draft("midterm", false)).expect("first create");

        let err = create_criteria(&mut connection, "prof-a", &draft("midterm", false)).unwrap_err();
        assert!(matches!(err, CriteriaError::DuplicateName { .. }));

        create_criteria(&mut connection, "prof-b", &draft("midterm", false))
            .expect("other owner may reuse the name");
    }

    #[test]
    fn activating_profile_deactivates_siblings_but_not_other_owners() {
        let mut connection = open();
        let first = create_criteria(&mut connection, "prof-a", &draft("first", true)).unwrap();
        let second = create_criteria(&mut connection, "prof-a", &draft("second", false)).unwrap();
        let other = create_criteria(&mut connection, "prof-b", &draft("other", true)).unwrap();

        assert_eq!(active_ids(&connection, "prof-a"), vec![first.id]);

        let activated = set_active(&mut connection, second.id, "prof-a").unwrap();
        assert!(activated.active);
        assert_eq!(active_ids(&connection, "prof-a"), vec![second.id]);
        assert_eq!(active_ids(&connection, "prof-b"), vec![other.id]);
    }

    #[test]
    fn creating_active_profile_switches_the_active_one() {
        let mut connection = open();
        create_criteria(&mut connection, "prof-a", &draft("first", true)).unwrap();
        let second = create_criteria(&mut connection, "prof-a", &draft("second", true)).unwrap();

        assert_eq!(active_ids(&connection, "prof-a"), vec![second.id]);
    }

    #[test]
    fn updating_with_inactive_flag_leaves_siblings_untouched() {
        let mut connection = open();
        let first = create_criteria(&mut connection, "prof-a", &draft("first", true)).unwrap();
        let second = create_criteria(&mut connection, "prof-a", &draft("second", false)).unwrap();

        let mut renamed = draft("second-renamed", false);
        renamed.description = "rebalanced".to_string();
        let updated = update_criteria(&mut connection, second.id, "prof-a", &renamed).unwrap();

        assert_eq!(updated.name, "second-renamed");
        assert_eq!(updated.description, "rebalanced");
        assert_eq!(active_ids(&connection, "prof-a"), vec![first.id]);
    }

    #[test]
    fn update_rejects_name_taken_by_sibling() {
        let mut connection = open();
        create_criteria(&mut connection, "prof-a", &draft("first", false)).unwrap();
        let second = create_criteria(&mut connection, "prof-a", &draft("second", false)).unwrap();

        let err =
            update_criteria(&mut connection, second.id, "prof-a", &draft("first", false)).unwrap_err();
        assert!(matches!(err, CriteriaError::DuplicateName { .. }));
    }

    #[test]
    fn ownership_and_existence_are_enforced() {
        let mut connection = open();
        let profile = create_criteria(&mut connection, "prof-a", &draft("first", false)).unwrap();

        let err = set_active(&mut connection, profile.id, "prof-b").unwrap_err();
        assert!(matches!(err, CriteriaError::NotOwner { .. }));

        let err = set_active(&mut connection, profile.id + 100, "prof-a").unwrap_err();
        assert!(matches!(err, CriteriaError::NotFound(_)));

        let err = delete_criteria(&connection, profile.id, "prof-b").unwrap_err();
        assert!(matches!(err, CriteriaError::NotOwner { .. }));

        delete_criteria(&connection, profile.id, "prof-a").expect("owner may delete");
        assert!(store::find_criteria(&connection, profile.id).unwrap().is_none());
    }

    #[test]
    fn active_weighting_falls_back_to_default_profile() {
        let mut connection = open();
        assert_eq!(
            active_weighting(&connection, "prof-a").unwrap(),
            Weighting::Profile {
                criteria_id: None,
                weights: SectionWeights::default(),
            }
        );

        let mut custom = draft("custom", true);
        custom.weights.overview = 5;
        custom.weights.references = 10;
        let created = create_criteria(&mut connection, "prof-a", &custom).unwrap();

        assert_eq!(
            active_weighting(&connection, "prof-a").unwrap(),
            Weighting::Profile {
                criteria_id: Some(created.id),
                weights: custom.weights,
            }
        );
    }
}
