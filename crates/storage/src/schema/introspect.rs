#![forbid(unsafe_code)]

//! Read-only catalog questions. A missing table, column or index is a plain
//! `false` (or an empty list), never an error; names that are not valid
//! identifiers cannot exist and answer the same way.

use crate::error::SchemaResult;
use ct_core::{SqlIdent, is_valid_ident};
use rusqlite::{Connection, OptionalExtension, params};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub decl_type: String,
    pub not_null: bool,
    pub default_sql: Option<String>,
    /// 1-based position in the primary key, 0 when not part of it.
    pub pk: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexInfo {
    pub name: String,
    pub unique: bool,
    /// `None` entries are expression terms.
    pub columns: Vec<Option<String>>,
    pub sql: String,
}

pub fn table_exists(conn: &Connection, name: &str) -> SchemaResult<bool> {
    catalog_entry_exists(conn, "table", name)
}

pub fn index_exists(conn: &Connection, name: &str) -> SchemaResult<bool> {
    catalog_entry_exists(conn, "index", name)
}

pub fn column_exists(conn: &Connection, table: &str, column: &str) -> SchemaResult<bool> {
    if !is_valid_ident(table) || !is_valid_ident(column) {
        return Ok(false);
    }
    let found = conn
        .query_row(
            "SELECT 1 FROM pragma_table_info(?1) WHERE name = ?2 COLLATE NOCASE",
            params![table, column],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

pub fn list_tables(conn: &Connection) -> SchemaResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master \
         WHERE type='table' AND name NOT LIKE 'sqlite_%' \
         ORDER BY name ASC",
    )?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn list_columns(conn: &Connection, table: &str) -> SchemaResult<Vec<ColumnInfo>> {
    if !is_valid_ident(table) {
        return Ok(Vec::new());
    }
    let mut stmt = conn.prepare(
        "SELECT name, type, \"notnull\", dflt_value, pk \
         FROM pragma_table_info(?1) \
         ORDER BY cid ASC",
    )?;
    let rows = stmt.query_map(params![table], |row| {
        Ok(ColumnInfo {
            name: row.get(0)?,
            decl_type: row.get(1)?,
            not_null: row.get::<_, i64>(2)? != 0,
            default_sql: row.get(3)?,
            pk: row.get(4)?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Named indexes on `table`. Automatic indexes backing UNIQUE / PRIMARY KEY
/// constraints are excluded: they come back with the table definition.
pub fn list_indexes(conn: &Connection, table: &str) -> SchemaResult<Vec<IndexInfo>> {
    if !is_valid_ident(table) {
        return Ok(Vec::new());
    }
    let mut stmt = conn.prepare(
        "SELECT il.name, il.\"unique\", m.sql \
         FROM pragma_index_list(?1) AS il \
         JOIN sqlite_master AS m ON m.type = 'index' AND m.name = il.name \
         WHERE m.sql IS NOT NULL \
         ORDER BY il.name ASC",
    )?;
    let rows = stmt.query_map(params![table], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, i64>(1)? != 0,
            row.get::<_, String>(2)?,
        ))
    })?;
    let headers = rows.collect::<Result<Vec<_>, _>>()?;

    let mut out = Vec::with_capacity(headers.len());
    for (name, unique, sql) in headers {
        let columns = index_columns(conn, &name)?;
        out.push(IndexInfo {
            name,
            unique,
            columns,
            sql,
        });
    }
    Ok(out)
}

fn index_columns(conn: &Connection, index: &str) -> SchemaResult<Vec<Option<String>>> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_index_info(?1) ORDER BY seqno ASC")?;
    let rows = stmt.query_map(params![index], |row| row.get::<_, Option<String>>(0))?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn row_count(conn: &Connection, table: &str) -> SchemaResult<i64> {
    let Ok(table) = SqlIdent::try_new(table) else {
        return Ok(0);
    };
    if !table_exists(conn, table.as_str())? {
        return Ok(0);
    }
    Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
        row.get(0)
    })?)
}

fn catalog_entry_exists(conn: &Connection, kind: &str, name: &str) -> SchemaResult<bool> {
    if !is_valid_ident(name) {
        return Ok(false);
    }
    let found = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = ?1 AND name = ?2 COLLATE NOCASE LIMIT 1",
            params![kind, name],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}
