#![forbid(unsafe_code)]

use super::apply::{StepReport, apply_migration};
use super::registry::MigrationRegistry;
use super::version::{self, current_version, record_migration};
use crate::audit;
use crate::error::{SchemaError, SchemaResult};
use ct_core::{AuditEvent, Migration};
use rusqlite::{Connection, TransactionBehavior};
use std::collections::BTreeMap;
use tracing::{debug, error, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunnerState {
    Idle,
    ComputingGap,
    ApplyingBatch,
    Committed,
    RolledBack,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppliedMigration {
    pub version: u32,
    pub name: &'static str,
    pub steps: Vec<StepReport>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunReport {
    pub from_version: u32,
    pub to_version: u32,
    pub applied: Vec<AppliedMigration>,
}

impl RunReport {
    fn up_to_date(version: u32) -> Self {
        Self {
            from_version: version,
            to_version: version,
            applied: Vec::new(),
        }
    }

    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }

    pub fn applied_versions(&self) -> Vec<u32> {
        self.applied.iter().map(|migration| migration.version).collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlannedMigration {
    pub version: u32,
    pub name: &'static str,
    pub steps: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MigrationPlan {
    pub current_version: u32,
    pub target_version: u32,
    pub pending: Vec<PlannedMigration>,
}

impl MigrationPlan {
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Brings a store from its recorded version to the registry's target in a
/// single all-or-nothing batch.
#[derive(Debug)]
pub struct MigrationRunner<'r> {
    registry: &'r MigrationRegistry,
    audit: bool,
    trace: Vec<RunnerState>,
}

impl<'r> MigrationRunner<'r> {
    pub fn new(registry: &'r MigrationRegistry) -> Self {
        Self {
            registry,
            audit: true,
            trace: Vec::new(),
        }
    }

    /// Whether a committed batch appends a `schema_migrated` audit event.
    pub fn with_audit(mut self, audit: bool) -> Self {
        self.audit = audit;
        self
    }

    /// States entered during the last `run`, in order.
    pub fn trace(&self) -> &[RunnerState] {
        &self.trace
    }

    /// Dry run: what `run` would apply, without touching the store.
    pub fn plan(&self, conn: &Connection) -> SchemaResult<MigrationPlan> {
        let current = current_version(conn)?;
        let target = self.registry.target_version();
        if current > target {
            return Err(SchemaError::VersionSkew {
                stored: current,
                target,
            });
        }
        let pending = self
            .registry
            .pending(current)
            .iter()
            .map(|migration| PlannedMigration {
                version: migration.version,
                name: migration.name,
                steps: migration.steps.iter().map(|step| step.describe()).collect(),
            })
            .collect();
        Ok(MigrationPlan {
            current_version: current,
            target_version: target,
            pending,
        })
    }

    pub fn run(&mut self, conn: &mut Connection) -> SchemaResult<RunReport> {
        self.trace.clear();
        self.enter(RunnerState::ComputingGap);
        let result = self.run_inner(conn);
        self.enter(RunnerState::Idle);
        result
    }

    fn run_inner(&mut self, conn: &mut Connection) -> SchemaResult<RunReport> {
        let registry = self.registry;
        version::initialize(conn)?;
        let current = current_version(conn)?;
        let target = registry.target_version();
        if current > target {
            return Err(SchemaError::VersionSkew {
                stored: current,
                target,
            });
        }
        self.warn_on_name_drift(conn)?;

        let pending = registry.pending(current);
        if pending.is_empty() {
            debug!(version = current, "schema up to date");
            return Ok(RunReport::up_to_date(current));
        }

        self.enter(RunnerState::ApplyingBatch);
        let fk_enforced = disable_foreign_keys(conn)?;
        let outcome = apply_batch(conn, pending, current, target, fk_enforced, self.audit);
        let restored = restore_foreign_keys(conn, fk_enforced);

        match outcome {
            Ok(applied) => {
                self.enter(RunnerState::Committed);
                if let Err(restore_err) = restored {
                    warn!(
                        error = %restore_err,
                        "batch committed but foreign key enforcement was not restored"
                    );
                }
                for migration in &applied {
                    info!(
                        version = migration.version,
                        name = migration.name,
                        steps = migration.steps.len(),
                        "migration applied"
                    );
                }
                info!(from = current, to = target, "migration batch committed");
                Ok(RunReport {
                    from_version: current,
                    to_version: target,
                    applied,
                })
            }
            Err(err) => {
                self.enter(RunnerState::RolledBack);
                if let Err(restore_err) = restored {
                    warn!(error = %restore_err, "failed to restore foreign key enforcement");
                }
                error!(
                    from = current,
                    to = target,
                    code = err.code(),
                    error = %err,
                    "migration batch rolled back"
                );
                Err(err)
            }
        }
    }

    fn enter(&mut self, state: RunnerState) {
        self.trace.push(state);
    }

    fn warn_on_name_drift(&self, conn: &Connection) -> SchemaResult<()> {
        for record in version::history(conn)? {
            match self.registry.get(record.version) {
                Some(migration) if migration.name != record.name => warn!(
                    version = record.version,
                    recorded = %record.name,
                    registry = migration.name,
                    "recorded migration name differs from registry"
                ),
                _ => {}
            }
        }
        Ok(())
    }
}

/// Bootstrap-free convenience: runs the registry against `conn` with auditing on.
pub fn run_migrations(
    conn: &mut Connection,
    registry: &MigrationRegistry,
) -> SchemaResult<RunReport> {
    MigrationRunner::new(registry).run(conn)
}

fn apply_batch(
    conn: &mut Connection,
    pending: &[Migration],
    from: u32,
    to: u32,
    check_foreign_keys: bool,
    audit_enabled: bool,
) -> SchemaResult<Vec<AppliedMigration>> {
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|err| SchemaError::ddl("begin migration batch", err))?;

    let preexisting = if check_foreign_keys {
        let violations = foreign_key_violations(&tx)?;
        for ((table, parent), (count, _)) in &violations {
            warn!(
                table = %table,
                parent = %parent,
                rows = count,
                "store already violates foreign keys"
            );
        }
        Some(violations)
    } else {
        None
    };

    let mut applied = Vec::with_capacity(pending.len());
    for migration in pending {
        debug!(version = migration.version, name = migration.name, "applying migration");
        let steps = apply_migration(&tx, migration)?;
        record_migration(&tx, migration.version, migration.name)?;
        applied.push(AppliedMigration {
            version: migration.version,
            name: migration.name,
            steps,
        });
    }

    if let Some(preexisting) = &preexisting {
        ensure_no_new_violations(&tx, preexisting)?;
    }
    if audit_enabled && audit::is_available(&tx)? {
        let event = AuditEvent::SchemaMigrated {
            from_version: from,
            to_version: to,
            applied: applied.iter().map(|migration| migration.version).collect(),
        };
        audit::append(&tx, &event, None)?;
    }

    tx.commit()
        .map_err(|err| SchemaError::ddl("commit migration batch", err))?;
    Ok(applied)
}

/// Returns whether enforcement was on. The pragma is a no-op inside a
/// transaction, so this must run before the batch begins.
fn disable_foreign_keys(conn: &Connection) -> SchemaResult<bool> {
    let enabled: i64 = conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0))?;
    if enabled != 0 {
        conn.pragma_update(None, "foreign_keys", false)?;
    }
    Ok(enabled != 0)
}

fn restore_foreign_keys(conn: &Connection, was_enabled: bool) -> SchemaResult<()> {
    if was_enabled {
        conn.pragma_update(None, "foreign_keys", true)?;
    }
    Ok(())
}

/// Violating row count and first reported rowid per (child table, parent table).
type ViolationCounts = BTreeMap<(String, String), (usize, Option<i64>)>;

fn foreign_key_violations(conn: &Connection) -> SchemaResult<ViolationCounts> {
    let mut stmt = conn.prepare("PRAGMA foreign_key_check")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, Option<i64>>(1)?,
            row.get::<_, String>(2)?,
        ))
    })?;

    let mut counts = ViolationCounts::new();
    for row in rows {
        let (table, rowid, parent) = row?;
        counts.entry((table, parent)).or_insert((0, rowid)).0 += 1;
    }
    Ok(counts)
}

// Orphans that predate the batch are tolerated. Links are compared by count,
// since a rebuild may renumber rowids.
fn ensure_no_new_violations(conn: &Connection, preexisting: &ViolationCounts) -> SchemaResult<()> {
    for (link, (count, first)) in foreign_key_violations(conn)? {
        let before = preexisting.get(&link).map_or(0, |(count, _)| *count);
        if count > before {
            let (table, parent) = link;
            return Err(SchemaError::data_integrity(
                table,
                format!(
                    "{} new row(s) violate foreign keys to {parent} (first reported: rowid {})",
                    count - before,
                    first.map_or_else(|| "?".to_string(), |id| id.to_string())
                ),
            ));
        }
    }
    Ok(())
}
