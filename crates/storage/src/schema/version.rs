#![forbid(unsafe_code)]

use crate::error::{SchemaError, SchemaResult, is_constraint_violation};
use crate::time::now_rfc3339;
use rusqlite::{Connection, Transaction, params};

pub const VERSION_TABLE: &str = "schema_version";

const CREATE_VERSION_TABLE: &str = r#"
        CREATE TABLE IF NOT EXISTS schema_version (
          version INTEGER PRIMARY KEY,
          name TEXT NOT NULL,
          applied_at TEXT NOT NULL
        );
"#;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchemaVersionRecord {
    pub version: u32,
    pub name: String,
    pub applied_at: String,
}

/// Creates the version table when absent. Safe to call on every startup.
pub fn initialize(conn: &Connection) -> SchemaResult<()> {
    conn.execute_batch(CREATE_VERSION_TABLE)?;
    Ok(())
}

/// Highest recorded version, or 0 for a store that has never been versioned.
pub fn current_version(conn: &Connection) -> SchemaResult<u32> {
    if !super::introspect::table_exists(conn, VERSION_TABLE)? {
        return Ok(0);
    }
    let max: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;
    u32::try_from(max).map_err(|_| {
        SchemaError::data_integrity(VERSION_TABLE, format!("recorded version {max} out of range"))
    })
}

/// Records one applied migration inside the caller's batch transaction.
/// Recording the same version twice is a fatal integrity error.
pub fn record_migration(tx: &Transaction<'_>, version: u32, name: &str) -> SchemaResult<()> {
    match tx.execute(
        "INSERT INTO schema_version(version, name, applied_at) VALUES (?1, ?2, ?3)",
        params![version, name, now_rfc3339()],
    ) {
        Ok(_) => Ok(()),
        Err(err) if is_constraint_violation(&err) => Err(SchemaError::data_integrity(
            VERSION_TABLE,
            format!("version {version} ({name}) is already recorded"),
        )),
        Err(err) => Err(err.into()),
    }
}

pub fn history(conn: &Connection) -> SchemaResult<Vec<SchemaVersionRecord>> {
    if !super::introspect::table_exists(conn, VERSION_TABLE)? {
        return Ok(Vec::new());
    }
    let mut stmt = conn.prepare(
        "SELECT version, name, applied_at FROM schema_version ORDER BY version ASC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(SchemaVersionRecord {
            version: row.get(0)?,
            name: row.get(1)?,
            applied_at: row.get(2)?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}
