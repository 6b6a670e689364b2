#![forbid(unsafe_code)]

use crate::cli::{Cli, Command};
use ct_storage::schema::{self, StepOutcome};
use ct_storage::{MigrationRegistry, RunReport, SchemaError, SchemaResult, Store, StoreConfig};
use tracing::info;

pub(crate) fn run(cli: &Cli) -> SchemaResult<()> {
    let config = cli.store_config()?;
    let registry = MigrationRegistry::builtin()?;

    match &cli.command {
        Command::Migrate { .. } => {
            let mut store = Store::open(&config)?;
            info!(path = %config.database.display(), "starting migration");
            let report = store.startup(&registry)?;
            print_report(&report);
        }
        Command::Status => {
            let store = open_existing(&config)?;
            let stored = store.current_version()?;
            let target = registry.target_version();
            println!("stored version: {stored}");
            println!("target version: {target}");
            if stored > target {
                println!("status: store is newer than this build");
            } else {
                println!("pending: {}", registry.pending(stored).len());
            }
        }
        Command::Plan => {
            let store = open_existing(&config)?;
            let plan = store.plan(&registry)?;
            if plan.is_empty() {
                println!("up to date at version {}", plan.current_version);
            }
            for migration in &plan.pending {
                println!("v{} {}", migration.version, migration.name);
                for step in &migration.steps {
                    println!("  - {step}");
                }
            }
        }
        Command::History => {
            let store = open_existing(&config)?;
            for record in store.history()? {
                println!("{:>4}  {:<32} {}", record.version, record.name, record.applied_at);
            }
        }
        Command::Inspect {
            table,
            column,
            index,
        } => {
            let store = open_existing(&config)?;
            inspect(&store, table, column.as_deref(), index.as_deref())?;
        }
    }
    Ok(())
}

fn open_existing(config: &StoreConfig) -> SchemaResult<Store> {
    if !config.database.exists() {
        return Err(SchemaError::Config(format!(
            "no store at {}",
            config.database.display()
        )));
    }
    Store::open(config)
}

fn print_report(report: &RunReport) {
    if report.is_noop() {
        println!("up to date at version {}", report.to_version);
        return;
    }
    println!(
        "migrated {} -> {}",
        report.from_version, report.to_version
    );
    for migration in &report.applied {
        let skipped = migration
            .steps
            .iter()
            .filter(|step| step.outcome == StepOutcome::Skipped)
            .count();
        println!(
            "  v{} {} ({} steps, {skipped} already present)",
            migration.version,
            migration.name,
            migration.steps.len()
        );
    }
}

fn inspect(
    store: &Store,
    table: &str,
    column: Option<&str>,
    index: Option<&str>,
) -> SchemaResult<()> {
    let conn = store.conn();
    if !schema::table_exists(conn, table)? {
        println!("table {table}: absent");
        return Ok(());
    }
    println!("table {table}: present");
    for info in schema::list_columns(conn, table)? {
        let mut flags = Vec::new();
        if info.pk > 0 {
            flags.push("pk".to_string());
        }
        if info.not_null {
            flags.push("not null".to_string());
        }
        if let Some(default) = &info.default_sql {
            flags.push(format!("default {default}"));
        }
        println!("  {} {} {}", info.name, info.decl_type, flags.join(", "));
    }
    for info in schema::list_indexes(conn, table)? {
        let unique = if info.unique { "unique " } else { "" };
        println!("  {unique}index {}", info.name);
    }
    if let Some(column) = column {
        let present = schema::column_exists(conn, table, column)?;
        println!("column {table}.{column}: {}", presence(present));
    }
    if let Some(index) = index {
        let present = schema::index_exists(conn, index)?;
        println!("index {index}: {}", presence(present));
    }
    Ok(())
}

fn presence(present: bool) -> &'static str {
    if present { "present" } else { "absent" }
}
