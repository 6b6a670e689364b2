#![forbid(unsafe_code)]

pub mod audit;
pub mod ident;
pub mod migration;
pub mod schema;
pub mod step;

pub use audit::{AuditDecodeError, AuditEvent};
pub use ident::{SqlIdent, SqlIdentError, is_valid_ident};
pub use migration::{BASELINE_VERSION, Migration, RegistryError, validate_catalog};
pub use schema::{ColumnDef, IndexDef, TableDef};
pub use step::{
    ColumnMapping, ColumnSource, CompletionMarker, MigrationStep, RebuildPlan, SchemaProbe,
};
