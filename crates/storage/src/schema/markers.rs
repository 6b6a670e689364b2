#![forbid(unsafe_code)]

use crate::error::SchemaResult;
use crate::time::now_rfc3339;
use rusqlite::{Connection, OptionalExtension, Transaction, params};

pub const MARKER_TABLE: &str = "schema_markers";

pub fn is_set(conn: &Connection, name: &str) -> SchemaResult<bool> {
    if !super::introspect::table_exists(conn, MARKER_TABLE)? {
        return Ok(false);
    }
    let found = conn
        .query_row(
            "SELECT 1 FROM schema_markers WHERE name = ?1",
            params![name],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Written in the same transaction as the rebuild it marks.
pub fn set(tx: &Transaction<'_>, name: &str) -> SchemaResult<()> {
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_markers (
          name TEXT PRIMARY KEY,
          set_at TEXT NOT NULL
        );",
    )?;
    tx.execute(
        "INSERT OR IGNORE INTO schema_markers(name, set_at) VALUES (?1, ?2)",
        params![name, now_rfc3339()],
    )?;
    Ok(())
}
