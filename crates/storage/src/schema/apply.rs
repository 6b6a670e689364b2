#![forbid(unsafe_code)]

use super::introspect::{column_exists, index_exists, table_exists};
use super::rebuild::{self, RebuildOutcome};
use crate::error::{SchemaError, SchemaResult};
use ct_core::{Migration, MigrationStep, SchemaProbe};
use rusqlite::{Connection, Transaction};
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    Applied,
    /// The catalog already showed the step's effect.
    Skipped,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepReport {
    pub kind: &'static str,
    pub description: String,
    pub outcome: StepOutcome,
}

/// Runs every step of `migration` in order inside `tx`. Each step consults the
/// catalog first, so a partially applied migration converges on re-run.
pub fn apply_migration(tx: &Transaction<'_>, migration: &Migration) -> SchemaResult<Vec<StepReport>> {
    migration
        .steps
        .iter()
        .map(|step| apply_step(tx, migration, step))
        .collect()
}

fn apply_step(
    tx: &Transaction<'_>,
    migration: &Migration,
    step: &MigrationStep,
) -> SchemaResult<StepReport> {
    let description = step.describe();
    let context = format!("v{} {}: {description}", migration.version, migration.name);

    let outcome = match step {
        MigrationStep::CreateTable(table) => {
            if table_exists(tx, table.name)? {
                StepOutcome::Skipped
            } else {
                tx.execute_batch(&table.create_sql())
                    .map_err(|err| SchemaError::ddl(&context, err))?;
                StepOutcome::Applied
            }
        }
        MigrationStep::CreateIndex(index) => {
            if index_exists(tx, index.name)? {
                StepOutcome::Skipped
            } else {
                tx.execute_batch(&index.create_sql())
                    .map_err(|err| SchemaError::ddl(&context, err))?;
                StepOutcome::Applied
            }
        }
        MigrationStep::AddColumn { table, column } => {
            if column_exists(tx, table, column.name)? {
                StepOutcome::Skipped
            } else {
                tx.execute_batch(&format!("ALTER TABLE {table} ADD COLUMN {}", column.render()))
                    .map_err(|err| SchemaError::ddl(&context, err))?;
                StepOutcome::Applied
            }
        }
        MigrationStep::RebuildWithConstraint(plan) => match rebuild::rebuild_table(tx, plan)? {
            RebuildOutcome::AlreadyComplete => StepOutcome::Skipped,
            RebuildOutcome::Created | RebuildOutcome::Rebuilt { .. } => StepOutcome::Applied,
        },
        MigrationStep::RawStatement { sql, skip_if } => {
            if probe_satisfied(tx, skip_if.as_ref())? {
                StepOutcome::Skipped
            } else {
                tx.execute_batch(sql)
                    .map_err(|err| SchemaError::ddl(&context, err))?;
                StepOutcome::Applied
            }
        }
    };

    debug!(
        version = migration.version,
        step = step.kind(),
        outcome = ?outcome,
        "{description}"
    );
    Ok(StepReport {
        kind: step.kind(),
        description,
        outcome,
    })
}

fn probe_satisfied(conn: &Connection, probe: Option<&SchemaProbe>) -> SchemaResult<bool> {
    match probe {
        None => Ok(false),
        Some(SchemaProbe::Table(table)) => table_exists(conn, table),
        Some(SchemaProbe::Column { table, column }) => column_exists(conn, table, column),
        Some(SchemaProbe::Index(index)) => index_exists(conn, index),
    }
}
