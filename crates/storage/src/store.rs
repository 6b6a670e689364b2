#![forbid(unsafe_code)]

use crate::config::StoreConfig;
use crate::error::{SchemaError, SchemaResult};
use crate::schema::{
    self, MigrationPlan, MigrationRegistry, MigrationRunner, RunReport, SchemaVersionRecord,
};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// The host's single database handle.
#[derive(Debug)]
pub struct Store {
    conn: Connection,
    path: Option<PathBuf>,
    audit_migrations: bool,
}

impl Store {
    pub fn open(config: &StoreConfig) -> SchemaResult<Self> {
        config.validate()?;
        if let Some(parent) = config
            .database
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
        {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&config.database)?;
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
        let journal_mode: String = conn.query_row(
            &format!("PRAGMA journal_mode = {}", config.journal_mode.as_pragma()),
            [],
            |row| row.get(0),
        )?;
        conn.pragma_update(None, "foreign_keys", config.foreign_keys)?;
        debug!(
            path = %config.database.display(),
            journal_mode = %journal_mode,
            foreign_keys = config.foreign_keys,
            "store opened"
        );

        Ok(Self {
            conn,
            path: Some(config.database.clone()),
            audit_migrations: config.audit_migrations,
        })
    }

    pub fn open_in_memory() -> SchemaResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(Self {
            conn,
            path: None,
            audit_migrations: true,
        })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Bootstrap, then migrate to the registry's target. Any error is fatal:
    /// the host must not serve requests against this store. A store written by
    /// a newer build is rejected before anything is written.
    pub fn startup(&mut self, registry: &MigrationRegistry) -> SchemaResult<RunReport> {
        let stored = schema::current_version(&self.conn)?;
        let target = registry.target_version();
        if stored > target {
            return Err(SchemaError::VersionSkew { stored, target });
        }
        schema::create_base_schema(&mut self.conn)?;
        MigrationRunner::new(registry)
            .with_audit(self.audit_migrations)
            .run(&mut self.conn)
    }

    pub fn plan(&self, registry: &MigrationRegistry) -> SchemaResult<MigrationPlan> {
        MigrationRunner::new(registry).plan(&self.conn)
    }

    pub fn current_version(&self) -> SchemaResult<u32> {
        schema::current_version(&self.conn)
    }

    pub fn history(&self) -> SchemaResult<Vec<SchemaVersionRecord>> {
        schema::history(&self.conn)
    }

    pub fn table_exists(&self, name: &str) -> SchemaResult<bool> {
        schema::table_exists(&self.conn, name)
    }

    pub fn column_exists(&self, table: &str, column: &str) -> SchemaResult<bool> {
        schema::column_exists(&self.conn, table, column)
    }

    pub fn index_exists(&self, name: &str) -> SchemaResult<bool> {
        schema::index_exists(&self.conn, name)
    }
}
