#![forbid(unsafe_code)]

use ct_core::{
    ColumnDef, ColumnMapping, CompletionMarker, IndexDef, Migration, MigrationStep, RebuildPlan,
    TableDef,
};

// SQLite cannot alter a CHECK in place; widening `status` needs a rebuild.
const CUSTODY_RECORDS: TableDef = TableDef::new(
    "custody_records",
    &[
        ColumnDef::new("id", "INTEGER PRIMARY KEY AUTOINCREMENT"),
        ColumnDef::new(
            "product_id",
            "INTEGER NOT NULL REFERENCES products(id) ON DELETE CASCADE",
        ),
        ColumnDef::new("custodian_id", "INTEGER NOT NULL REFERENCES users(id)"),
        ColumnDef::new("quantity", "INTEGER NOT NULL DEFAULT 1 CHECK(quantity > 0)"),
        ColumnDef::new(
            "status",
            "TEXT NOT NULL DEFAULT 'active' CHECK(status IN ('active', 'returned', 'transferred'))",
        ),
        ColumnDef::new(
            "condition",
            "TEXT NOT NULL DEFAULT 'good' CHECK(condition IN ('good', 'damaged', 'lost'))",
        ),
        ColumnDef::new("assigned_at", "TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP"),
        ColumnDef::new("returned_at", "TEXT"),
        ColumnDef::new("notes", "TEXT"),
    ],
);

const INDEXES: &[IndexDef] = &[
    IndexDef::new(
        "idx_custody_records_product",
        "custody_records",
        &["product_id"],
    ),
    IndexDef::new(
        "idx_custody_records_custodian",
        "custody_records",
        &["custodian_id", "status"],
    ),
];

pub(super) const MIGRATION: Migration = Migration::new(
    4,
    "custody_status_transferred",
    &[MigrationStep::RebuildWithConstraint(
        RebuildPlan::new(
            CUSTODY_RECORDS,
            CompletionMarker::Flag("custody_records.status_transferred"),
        )
        .with_sources(&[ColumnMapping::expr("condition", "'good'")])
        .with_indexes(INDEXES),
    )],
);
