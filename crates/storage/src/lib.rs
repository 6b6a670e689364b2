#![forbid(unsafe_code)]

//! SQLite store lifecycle for the custody app: bootstrap, versioned
//! forward-only migrations, catalog introspection, audit trail.

pub mod audit;
mod config;
mod error;
pub mod schema;
mod store;
mod time;

pub use config::{DEFAULT_BUSY_TIMEOUT_MS, JournalMode, StoreConfig};
pub use error::{SchemaError, SchemaResult};
pub use schema::{
    MigrationPlan, MigrationRegistry, MigrationRunner, RunReport, RunnerState, SchemaVersionRecord,
};
pub use store::Store;
