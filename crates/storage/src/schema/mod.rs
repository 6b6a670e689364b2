#![forbid(unsafe_code)]

pub mod apply;
pub mod bootstrap;
pub mod introspect;
pub mod markers;
mod migrations;
pub mod rebuild;
pub mod registry;
pub mod runner;
mod sql;
pub mod version;

pub use apply::{StepOutcome, StepReport, apply_migration};
pub use bootstrap::{BASELINE_TABLES, create_base_schema};
pub use introspect::{
    ColumnInfo, IndexInfo, column_exists, index_exists, list_columns, list_indexes, list_tables,
    table_exists,
};
pub use rebuild::{RebuildOutcome, rebuild_table};
pub use registry::MigrationRegistry;
pub use runner::{
    AppliedMigration, MigrationPlan, MigrationRunner, PlannedMigration, RunReport, RunnerState,
    run_migrations,
};
pub use version::{SchemaVersionRecord, current_version, history, initialize, record_migration};
