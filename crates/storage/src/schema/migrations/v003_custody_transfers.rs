#![forbid(unsafe_code)]

use ct_core::{ColumnDef, IndexDef, Migration, MigrationStep, TableDef};

const CUSTODY_TRANSFERS: TableDef = TableDef::new(
    "custody_transfers",
    &[
        ColumnDef::new("id", "INTEGER PRIMARY KEY AUTOINCREMENT"),
        ColumnDef::new(
            "record_id",
            "INTEGER NOT NULL REFERENCES custody_records(id) ON DELETE CASCADE",
        ),
        ColumnDef::new("from_custodian_id", "INTEGER NOT NULL REFERENCES users(id)"),
        ColumnDef::new("to_custodian_id", "INTEGER NOT NULL REFERENCES users(id)"),
        ColumnDef::new("reason", "TEXT"),
        ColumnDef::new("transferred_at", "TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP"),
    ],
)
.with_constraints(&["CHECK(from_custodian_id <> to_custodian_id)"]);

pub(super) const MIGRATION: Migration = Migration::new(
    3,
    "custody_transfers",
    &[
        MigrationStep::CreateTable(CUSTODY_TRANSFERS),
        MigrationStep::CreateIndex(IndexDef::new(
            "idx_custody_transfers_record",
            "custody_transfers",
            &["record_id", "transferred_at"],
        )),
    ],
);
