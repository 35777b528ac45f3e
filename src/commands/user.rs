use anyhow::{Result, bail};
use tracing::info;

use crate::cli::UserArgs;
use crate::store;

pub fn run(args: UserArgs) -> Result<()> {
    let display_name = args.name.trim();
    if display_name.is_empty() {
        bail!("display name for {} must not be empty", args.id);
    }

    let connection = store::open_store(&args.store.resolved_db_path())?;
    store::upsert_user(&connection, &args.id, display_name)?;

    info!(user_id = %args.id, display_name = %display_name, "registered user");
    Ok(())
}
