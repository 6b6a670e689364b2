#![forbid(unsafe_code)]

use ct_core::RegistryError;
use rusqlite::ErrorCode;
use thiserror::Error;

/// Every failure the schema engine can surface. All of them are fatal at startup:
/// the host must refuse to serve requests and report the error.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A DDL statement was rejected by the backend.
    #[error("structural error ({context}): {source}")]
    Structural {
        context: String,
        #[source]
        source: rusqlite::Error,
    },

    /// A rebuild copy would lose or reject existing rows.
    #[error("data integrity error on {table}: {message}")]
    DataIntegrity { table: String, message: String },

    /// The database file is held by another writer past the busy timeout.
    #[error("store is locked by another writer ({context}): {source}")]
    Concurrency {
        context: String,
        #[source]
        source: rusqlite::Error,
    },

    /// The file was migrated by a newer build than this one.
    #[error("stored schema version {stored} is newer than this build's target {target}")]
    VersionSkew { stored: u32, target: u32 },

    #[error("invalid migration registry: {0}")]
    Registry(#[from] RegistryError),

    #[error("sqlite: {0}")]
    Sql(#[source] rusqlite::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("config: {0}")]
    Config(String),

    #[error("config yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("audit: {0}")]
    Audit(String),
}

pub type SchemaResult<T> = Result<T, SchemaError>;

impl SchemaError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Structural { .. } => "STRUCTURAL",
            Self::DataIntegrity { .. } => "DATA_INTEGRITY",
            Self::Concurrency { .. } => "CONCURRENCY",
            Self::VersionSkew { .. } => "VERSION_SKEW",
            Self::Registry(_) => "REGISTRY",
            Self::Sql(_) => "SQL",
            Self::Io(_) => "IO",
            Self::Config(_) => "CONFIG",
            Self::Yaml(_) => "CONFIG",
            Self::Json(_) => "JSON",
            Self::Audit(_) => "AUDIT",
        }
    }

    /// Taxonomy errors abort startup; the host must not serve requests.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Structural { .. }
                | Self::DataIntegrity { .. }
                | Self::Concurrency { .. }
                | Self::VersionSkew { .. }
                | Self::Registry(_)
        )
    }

    pub fn data_integrity(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DataIntegrity {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Classifies a failed DDL statement: lock contention stays a concurrency
    /// error, everything else is structural.
    pub fn ddl(context: impl Into<String>, source: rusqlite::Error) -> Self {
        let context = context.into();
        if is_lock_error(&source) {
            Self::Concurrency { context, source }
        } else {
            Self::Structural { context, source }
        }
    }

    /// Classifies a failed row copy: constraint failures mean the existing rows
    /// do not fit the new shape.
    pub fn copy(table: &str, source: rusqlite::Error) -> Self {
        if is_lock_error(&source) {
            return Self::Concurrency {
                context: format!("copy rows into {table}"),
                source,
            };
        }
        if is_constraint_violation(&source) {
            return Self::data_integrity(table, format!("rows violate the new shape: {source}"));
        }
        Self::Structural {
            context: format!("copy rows into {table}"),
            source,
        }
    }
}

impl From<rusqlite::Error> for SchemaError {
    fn from(value: rusqlite::Error) -> Self {
        if is_lock_error(&value) {
            Self::Concurrency {
                context: "sqlite".to_string(),
                source: value,
            }
        } else {
            Self::Sql(value)
        }
    }
}

pub(crate) fn is_lock_error(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(code, _) => matches!(
            code.code,
            ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked
        ),
        _ => false,
    }
}

pub(crate) fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(code, _) => code.code == ErrorCode::ConstraintViolation,
        _ => false,
    }
}
