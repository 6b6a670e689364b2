#![forbid(unsafe_code)]

use super::sql;
use crate::error::{SchemaError, SchemaResult};
use rusqlite::Connection;
use tracing::debug;

pub use sql::BASELINE_TABLES;

/// Creates any missing baseline table or index in one transaction. Existing
/// objects are left untouched, so this doubles as a self-heal on every startup.
pub fn create_base_schema(conn: &mut Connection) -> SchemaResult<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(&sql::full_schema_sql())
        .map_err(|err| SchemaError::ddl("create base schema", err))?;
    tx.commit()?;
    debug!(tables = BASELINE_TABLES.len(), "base schema ensured");
    Ok(())
}
