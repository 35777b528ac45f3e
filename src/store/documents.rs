use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, params};

use crate::model::Document;

/// Registers a document or refreshes its file details. `registered_at` keeps
/// the first registration time.
pub fn upsert_document(connection: &Connection, document: &Document) -> Result<()> {
    connection.execute(
        "
        INSERT INTO documents(document_id, filename, sha256, registered_at)
        VALUES(?1, ?2, ?3, ?4)
        ON CONFLICT(document_id) DO UPDATE SET
          filename=excluded.filename,
          sha256=excluded.sha256
        ",
        params![
            document.document_id,
            document.filename,
            document.sha256,
            document.registered_at,
        ],
    )?;
    Ok(())
}

pub fn find_document(connection: &Connection, document_id: &str) -> Result<Option<Document>> {
    let document = connection
        .query_row(
            "
            SELECT document_id, filename, sha256, registered_at
            FROM documents
            WHERE document_id = ?1
            ",
            [document_id],
            |row| {
                Ok(Document {
                    document_id: row.get(0)?,
                    filename: row.get(1)?,
                    sha256: row.get(2)?,
                    registered_at: row.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(document)
}
