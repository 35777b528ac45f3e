use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, params};

pub fn upsert_user(connection: &Connection, user_id: &str, display_name: &str) -> Result<()> {
    connection.execute(
        "
        INSERT INTO users(user_id, display_name) VALUES(?1, ?2)
        ON CONFLICT(user_id) DO UPDATE SET display_name=excluded.display_name
        ",
        params![user_id, display_name],
    )?;
    Ok(())
}

pub fn display_name_for(connection: &Connection, user_id: &str) -> Result<Option<String>> {
    let name = connection
        .query_row(
            "SELECT display_name FROM users WHERE user_id = ?1",
            [user_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(name)
}
