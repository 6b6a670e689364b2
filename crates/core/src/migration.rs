#![forbid(unsafe_code)]

use crate::ident::{SqlIdent, SqlIdentError};
use crate::step::MigrationStep;
use std::collections::BTreeSet;

pub const BASELINE_VERSION: u32 = 1;

/// One forward-only schema change. Once shipped, `steps` must never be edited.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub steps: &'static [MigrationStep],
}

impl Migration {
    pub const fn new(version: u32, name: &'static str, steps: &'static [MigrationStep]) -> Self {
        Self {
            version,
            name,
            steps,
        }
    }

    /// Version 1: the shape bootstrap creates. Recorded, never executed.
    pub const fn baseline(name: &'static str) -> Self {
        Self {
            version: BASELINE_VERSION,
            name,
            steps: &[],
        }
    }

    pub fn is_baseline(&self) -> bool {
        self.version == BASELINE_VERSION
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistryError {
    Empty,
    MissingBaseline { first: u32 },
    BaselineHasSteps,
    NotIncreasing { previous: u32, found: u32 },
    Gap { expected: u32, found: u32 },
    EmptyName { version: u32 },
    DuplicateName { name: String },
    InvalidIdentifier {
        version: u32,
        ident: String,
        reason: SqlIdentError,
    },
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "migration registry is empty"),
            Self::MissingBaseline { first } => {
                write!(f, "registry must start at version 1 (first={first})")
            }
            Self::BaselineHasSteps => write!(f, "baseline migration must not carry steps"),
            Self::NotIncreasing { previous, found } => write!(
                f,
                "versions must strictly increase (previous={previous}, found={found})"
            ),
            Self::Gap { expected, found } => {
                write!(f, "version gap (expected={expected}, found={found})")
            }
            Self::EmptyName { version } => write!(f, "migration v{version} has an empty name"),
            Self::DuplicateName { name } => write!(f, "duplicate migration name: {name}"),
            Self::InvalidIdentifier {
                version,
                ident,
                reason,
            } => write!(
                f,
                "migration v{version} uses invalid identifier {ident:?}: {}",
                reason.message()
            ),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Checks the catalog invariants: baseline first and empty, versions gapless
/// and strictly increasing, names unique, identifiers interpolation-safe.
pub fn validate_catalog(migrations: &[Migration]) -> Result<(), RegistryError> {
    let Some(first) = migrations.first() else {
        return Err(RegistryError::Empty);
    };
    if !first.is_baseline() {
        return Err(RegistryError::MissingBaseline {
            first: first.version,
        });
    }
    if !first.steps.is_empty() {
        return Err(RegistryError::BaselineHasSteps);
    }

    let mut names = BTreeSet::new();
    let mut previous: Option<u32> = None;

    for migration in migrations {
        if let Some(previous) = previous {
            if migration.version <= previous {
                return Err(RegistryError::NotIncreasing {
                    previous,
                    found: migration.version,
                });
            }
            if migration.version != previous + 1 {
                return Err(RegistryError::Gap {
                    expected: previous + 1,
                    found: migration.version,
                });
            }
        }
        previous = Some(migration.version);

        let name = migration.name.trim();
        if name.is_empty() {
            return Err(RegistryError::EmptyName {
                version: migration.version,
            });
        }
        if !names.insert(name) {
            return Err(RegistryError::DuplicateName {
                name: name.to_string(),
            });
        }

        for step in migration.steps {
            for ident in step.identifiers() {
                if let Err(reason) = SqlIdent::try_new(ident) {
                    return Err(RegistryError::InvalidIdentifier {
                        version: migration.version,
                        ident: ident.to_string(),
                        reason,
                    });
                }
            }
        }
    }

    Ok(())
}
