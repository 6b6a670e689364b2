#![forbid(unsafe_code)]

//! Shadow-table rebuild: create `<table>_new` in the target shape, copy every
//! row, drop the original, rename the shadow, recreate indexes. Runs entirely
//! inside the caller's transaction with foreign-key enforcement off.

use super::introspect::{self, IndexInfo};
use super::markers;
use crate::error::{SchemaError, SchemaResult};
use ct_core::{ColumnSource, CompletionMarker, RebuildPlan};
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use std::collections::BTreeSet;
use tracing::{debug, warn};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RebuildOutcome {
    /// The completion marker was already present; nothing ran.
    AlreadyComplete,
    /// The table did not exist and was created directly in its final shape.
    Created,
    Rebuilt { rows: i64, indexes: Vec<String> },
}

pub fn is_complete(conn: &Connection, plan: &RebuildPlan) -> SchemaResult<bool> {
    match plan.marker {
        CompletionMarker::Flag(name) => markers::is_set(conn, name),
        CompletionMarker::ColumnPresent(column) => {
            introspect::column_exists(conn, plan.table.name, column)
        }
    }
}

pub fn rebuild_table(tx: &Transaction<'_>, plan: &RebuildPlan) -> SchemaResult<RebuildOutcome> {
    let table = plan.table.name;
    if is_complete(tx, plan)? {
        debug!(table, marker = %plan.marker.describe(), "rebuild already complete");
        return Ok(RebuildOutcome::AlreadyComplete);
    }
    ensure_foreign_keys_off(tx, table)?;

    if !introspect::table_exists(tx, table)? {
        warn!(table, "rebuild target is missing; creating it in its final shape");
        tx.execute_batch(&plan.table.create_sql())
            .map_err(|err| SchemaError::ddl(format!("create {table}"), err))?;
        create_plan_indexes(tx, plan)?;
        mark_complete(tx, plan)?;
        return Ok(RebuildOutcome::Created);
    }

    let shadow = plan.shadow_name();
    if introspect::table_exists(tx, &shadow)? {
        return Err(SchemaError::data_integrity(
            table,
            format!("shadow table {shadow} already exists"),
        ));
    }

    let source_columns = introspect::list_columns(tx, table)?
        .into_iter()
        .map(|column| column.name)
        .collect::<Vec<_>>();
    let select_list = copy_expressions(plan, &source_columns)?;
    let captured = introspect::list_indexes(tx, table)?;
    let sequence = sequence_value(tx, table)?;
    let source_rows = introspect::row_count(tx, table)?;

    tx.execute_batch(&plan.table.create_sql_as(&shadow, false))
        .map_err(|err| SchemaError::ddl(format!("create {shadow}"), err))?;

    let insert = format!(
        "INSERT INTO {shadow} ({}) SELECT {} FROM {table}",
        plan.table.column_names().join(", "),
        select_list.join(", ")
    );
    tx.execute(&insert, [])
        .map_err(|err| SchemaError::copy(table, err))?;

    let copied = introspect::row_count(tx, &shadow)?;
    if copied != source_rows {
        return Err(SchemaError::data_integrity(
            table,
            format!("copied {copied} of {source_rows} rows into {shadow}"),
        ));
    }

    tx.execute_batch(&format!("DROP TABLE {table}"))
        .map_err(|err| SchemaError::ddl(format!("drop {table}"), err))?;
    tx.execute_batch(&format!("ALTER TABLE {shadow} RENAME TO {table}"))
        .map_err(|err| SchemaError::ddl(format!("rename {shadow} to {table}"), err))?;
    restore_sequence(tx, plan, sequence)?;

    let mut indexes = create_plan_indexes(tx, plan)?;
    indexes.extend(recreate_leftover_indexes(tx, plan, &captured)?);
    mark_complete(tx, plan)?;

    debug!(table, rows = copied, indexes = indexes.len(), "table rebuilt");
    Ok(RebuildOutcome::Rebuilt {
        rows: copied,
        indexes,
    })
}

/// One SELECT term per destination column, in destination order. Refuses
/// plans that leave a new column without a value or silently lose a source
/// column.
fn copy_expressions(plan: &RebuildPlan, source_columns: &[String]) -> SchemaResult<Vec<String>> {
    let table = plan.table.name;
    let has_source = |name: &str| {
        source_columns
            .iter()
            .any(|column| column.eq_ignore_ascii_case(name))
    };

    let mut consumed = BTreeSet::new();
    let mut terms = Vec::with_capacity(plan.table.columns.len());
    for column in plan.table.columns {
        let term = match plan.source_for(column.name) {
            Some(ColumnSource::Column(from)) => {
                if !has_source(from) {
                    return Err(SchemaError::data_integrity(
                        table,
                        format!("column {} maps from missing column {from}", column.name),
                    ));
                }
                consumed.insert(from.to_ascii_lowercase());
                from.to_string()
            }
            Some(ColumnSource::Expr(expr)) => {
                if has_source(column.name) {
                    consumed.insert(column.name.to_ascii_lowercase());
                }
                format!("({expr})")
            }
            None if has_source(column.name) => {
                consumed.insert(column.name.to_ascii_lowercase());
                column.name.to_string()
            }
            None => {
                return Err(SchemaError::data_integrity(
                    table,
                    format!("new column {} has no source expression", column.name),
                ));
            }
        };
        terms.push(term);
    }

    if let Some(lost) = source_columns
        .iter()
        .find(|column| !consumed.contains(&column.to_ascii_lowercase()) && !plan.drops(column))
    {
        return Err(SchemaError::data_integrity(
            table,
            format!("column {lost} would be discarded without being listed as dropped"),
        ));
    }

    Ok(terms)
}

fn ensure_foreign_keys_off(conn: &Connection, table: &str) -> SchemaResult<()> {
    let enforced: i64 = conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0))?;
    if enforced != 0 {
        return Err(SchemaError::data_integrity(
            table,
            "foreign key enforcement must be off while a table is rebuilt",
        ));
    }
    Ok(())
}

fn create_plan_indexes(tx: &Transaction<'_>, plan: &RebuildPlan) -> SchemaResult<Vec<String>> {
    let mut created = Vec::with_capacity(plan.indexes.len());
    for index in plan.indexes {
        tx.execute_batch(&index.create_sql())
            .map_err(|err| SchemaError::ddl(format!("create index {}", index.name), err))?;
        created.push(index.name.to_string());
    }
    Ok(created)
}

fn recreate_leftover_indexes(
    tx: &Transaction<'_>,
    plan: &RebuildPlan,
    captured: &[IndexInfo],
) -> SchemaResult<Vec<String>> {
    let table = plan.table.name;
    let mut recreated = Vec::new();
    for index in captured {
        let planned = plan
            .indexes
            .iter()
            .any(|def| def.name.eq_ignore_ascii_case(&index.name));
        if planned || introspect::index_exists(tx, &index.name)? {
            continue;
        }
        // Expression terms have no column name; their SQL is re-run as captured.
        let missing = index
            .columns
            .iter()
            .flatten()
            .find(|name| !plan.table.has_column(name));
        if let Some(missing) = missing {
            warn!(
                table,
                index = %index.name,
                column = %missing,
                "index not recreated: column was dropped"
            );
            continue;
        }
        tx.execute_batch(&index.sql).map_err(|err| {
            SchemaError::ddl(format!("recreate index {} on {table}", index.name), err)
        })?;
        warn!(table, index = %index.name, "recreated index missing from the rebuild plan");
        recreated.push(index.name.clone());
    }
    Ok(recreated)
}

fn mark_complete(tx: &Transaction<'_>, plan: &RebuildPlan) -> SchemaResult<()> {
    match plan.marker {
        CompletionMarker::Flag(name) => markers::set(tx, name),
        CompletionMarker::ColumnPresent(_) => Ok(()),
    }
}

fn sequence_value(conn: &Connection, table: &str) -> SchemaResult<Option<i64>> {
    if !introspect::table_exists(conn, "sqlite_sequence")? {
        return Ok(None);
    }
    Ok(conn
        .query_row(
            "SELECT seq FROM sqlite_sequence WHERE name = ?1",
            params![table],
            |row| row.get(0),
        )
        .optional()?)
}

// The copy resets AUTOINCREMENT to the highest surviving id; keep the old
// high-water mark so deleted ids are never reissued.
fn restore_sequence(
    tx: &Transaction<'_>,
    plan: &RebuildPlan,
    previous: Option<i64>,
) -> SchemaResult<()> {
    let Some(previous) = previous else {
        return Ok(());
    };
    let autoincrement = plan
        .table
        .columns
        .iter()
        .any(|column| column.decl.to_ascii_uppercase().contains("AUTOINCREMENT"));
    if !autoincrement {
        return Ok(());
    }
    let table = plan.table.name;
    match sequence_value(tx, table)? {
        Some(current) if current >= previous => {}
        Some(_) => {
            tx.execute(
                "UPDATE sqlite_sequence SET seq = ?2 WHERE name = ?1",
                params![table, previous],
            )?;
        }
        None => {
            tx.execute(
                "INSERT INTO sqlite_sequence(name, seq) VALUES (?1, ?2)",
                params![table, previous],
            )?;
        }
    }
    Ok(())
}
