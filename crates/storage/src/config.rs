#![forbid(unsafe_code)]

use crate::error::{SchemaError, SchemaResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 2_000;
const MAX_BUSY_TIMEOUT_MS: u64 = 60_000;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalMode {
    #[default]
    Wal,
    Delete,
}

impl JournalMode {
    pub fn as_pragma(self) -> &'static str {
        match self {
            Self::Wal => "WAL",
            Self::Delete => "DELETE",
        }
    }
}

/// How the host opens its store. Loaded from YAML, e.g.
///
/// ```yaml
/// database: ./data/custody.db
/// busy_timeout_ms: 2000
/// journal_mode: wal
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    pub database: PathBuf,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    #[serde(default)]
    pub journal_mode: JournalMode,
    #[serde(default = "default_true")]
    pub foreign_keys: bool,
    #[serde(default = "default_true")]
    pub audit_migrations: bool,
}

fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

fn default_true() -> bool {
    true
}

impl StoreConfig {
    pub fn new(database: impl Into<PathBuf>) -> Self {
        Self {
            database: database.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: JournalMode::default(),
            foreign_keys: true,
            audit_migrations: true,
        }
    }

    pub fn load(path: impl AsRef<Path>) -> SchemaResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> SchemaResult<Self> {
        let config: StoreConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> SchemaResult<()> {
        if self.database.as_os_str().is_empty() {
            return Err(SchemaError::Config("database path must not be empty".into()));
        }
        if self.busy_timeout_ms == 0 {
            return Err(SchemaError::Config("busy_timeout_ms must be positive".into()));
        }
        if self.busy_timeout_ms > MAX_BUSY_TIMEOUT_MS {
            return Err(SchemaError::Config(format!(
                "busy_timeout_ms must be at most {MAX_BUSY_TIMEOUT_MS}"
            )));
        }
        Ok(())
    }
}
