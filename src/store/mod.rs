//! SQLite persistence for documents, compliance scores, score history,
//! grading criteria and users.

mod criteria;
mod db_setup;
mod documents;
mod history;
mod scores;
#[cfg(test)]
mod tests;
mod users;

pub use criteria::{
    activate_criteria, delete_criteria, find_active_criteria, find_criteria,
    find_criteria_by_owner_and_name, insert_criteria, list_criteria, set_criteria_inactive,
    update_criteria,
};
pub use db_setup::{count_rows, ensure_schema, open_store, read_metadata};
pub use documents::{find_document, upsert_document};
pub use history::{insert_history_snapshot, list_history_for_document};
pub use scores::{find_score_by_document, save_score};
pub use users::{display_name_for, upsert_user};
