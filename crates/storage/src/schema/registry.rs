#![forbid(unsafe_code)]

use super::migrations::BUILTIN;
use ct_core::{Migration, RegistryError, validate_catalog};

/// Validated, ordered migration catalog. Construction is the only place the
/// catalog invariants are checked; every other method may rely on them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MigrationRegistry {
    migrations: Vec<Migration>,
}

impl MigrationRegistry {
    pub fn new(migrations: Vec<Migration>) -> Result<Self, RegistryError> {
        validate_catalog(&migrations)?;
        Ok(Self { migrations })
    }

    pub fn builtin() -> Result<Self, RegistryError> {
        Self::new(BUILTIN.to_vec())
    }

    pub fn all_migrations(&self) -> &[Migration] {
        &self.migrations
    }

    pub fn target_version(&self) -> u32 {
        self.migrations
            .last()
            .map(|migration| migration.version)
            .unwrap_or(0)
    }

    /// Migrations strictly newer than `current`, ascending.
    pub fn pending(&self, current: u32) -> &[Migration] {
        // Versions are gapless from 1, so version v sits at index v - 1.
        let start = usize::try_from(current)
            .unwrap_or(usize::MAX)
            .min(self.migrations.len());
        &self.migrations[start..]
    }

    pub fn get(&self, version: u32) -> Option<&Migration> {
        let index = usize::try_from(version).ok()?.checked_sub(1)?;
        self.migrations.get(index)
    }
}
