#![forbid(unsafe_code)]

use crate::error::{SchemaError, SchemaResult};
use crate::schema::introspect::{column_exists, table_exists};
use crate::time::now_rfc3339;
use ct_core::AuditEvent;
use rusqlite::{Connection, params};

pub const AUDIT_TABLE: &str = "audit_log";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditRecord {
    pub id: i64,
    pub user_id: Option<i64>,
    pub occurred_at: String,
    pub event: AuditEvent,
}

const WRITTEN_COLUMNS: [&str; 4] = ["kind", "payload_json", "user_id", "occurred_at"];

/// True when the store has an `audit_log` with the columns this module writes.
pub fn is_available(conn: &Connection) -> SchemaResult<bool> {
    if !table_exists(conn, AUDIT_TABLE)? {
        return Ok(false);
    }
    for column in WRITTEN_COLUMNS {
        if !column_exists(conn, AUDIT_TABLE, column)? {
            return Ok(false);
        }
    }
    Ok(true)
}

pub fn append(conn: &Connection, event: &AuditEvent, user_id: Option<i64>) -> SchemaResult<i64> {
    let payload = event.to_payload_json()?;
    conn.execute(
        "INSERT INTO audit_log(kind, payload_json, user_id, occurred_at) VALUES (?1, ?2, ?3, ?4)",
        params![event.kind(), payload, user_id, now_rfc3339()],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Newest first.
pub fn list_recent(conn: &Connection, limit: usize) -> SchemaResult<Vec<AuditRecord>> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let mut stmt = conn.prepare(
        "SELECT id, kind, payload_json, user_id, occurred_at \
         FROM audit_log \
         ORDER BY id DESC \
         LIMIT ?1",
    )?;
    let rows = stmt.query_map(params![limit], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, Option<i64>>(3)?,
            row.get::<_, String>(4)?,
        ))
    })?;

    let mut out = Vec::new();
    for row in rows {
        let (id, kind, payload, user_id, occurred_at) = row?;
        let event = AuditEvent::from_record(&kind, &payload)
            .map_err(|err| SchemaError::Audit(format!("row {id}: {err}")))?;
        out.push(AuditRecord {
            id,
            user_id,
            occurred_at,
            event,
        });
    }
    Ok(out)
}
