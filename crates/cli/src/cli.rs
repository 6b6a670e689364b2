#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};
use ct_storage::{SchemaError, StoreConfig};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "ct-migrate")]
#[command(about = "Bootstrap, migrate and inspect the custody app's SQLite store")]
#[command(version)]
pub(crate) struct Cli {
    /// Path to a YAML store configuration
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Database file; overrides the configuration file
    #[arg(long, env = "CT_DATABASE", global = true)]
    pub database: Option<PathBuf>,

    /// Bounded wait for a locked store, in milliseconds
    #[arg(long, global = true)]
    pub busy_timeout_ms: Option<u64>,

    /// Log verbosity: error, warn, info, debug
    #[arg(long, default_value = "info", value_parser = ["error", "warn", "info", "debug"], global = true)]
    pub log_level: String,

    /// Log format: text or json
    #[arg(long, default_value = "text", value_parser = ["text", "json"], global = true)]
    pub log_format: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
pub(crate) enum Command {
    /// Create the baseline schema if needed and apply every pending migration
    Migrate {
        /// Do not append a schema_migrated audit event
        #[arg(long)]
        no_audit: bool,
    },

    /// Show the stored version against this build's target
    Status,

    /// List pending migrations and their steps without applying them
    Plan,

    /// List recorded migrations
    History,

    /// Answer catalog questions about one table
    Inspect {
        table: String,

        /// Also report whether this column exists
        #[arg(long)]
        column: Option<String>,

        /// Also report whether this index exists
        #[arg(long)]
        index: Option<String>,
    },
}

impl Cli {
    /// `--config` first, then `--database` / `CT_DATABASE` and flag overrides.
    pub(crate) fn store_config(&self) -> Result<StoreConfig, SchemaError> {
        let mut config = match (&self.config, &self.database) {
            (Some(path), _) => StoreConfig::load(path)?,
            (None, Some(database)) => StoreConfig::new(database),
            (None, None) => {
                return Err(SchemaError::Config(
                    "either --config or --database (CT_DATABASE) is required".to_string(),
                ));
            }
        };
        if let Some(database) = &self.database {
            config.database = database.clone();
        }
        if let Some(timeout) = self.busy_timeout_ms {
            config.busy_timeout_ms = timeout;
        }
        if let Command::Migrate { no_audit: true } = self.command {
            config.audit_migrations = false;
        }
        config.validate()?;
        Ok(config)
    }
}
