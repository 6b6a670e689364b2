#![forbid(unsafe_code)]

use ct_core::{ColumnDef, IndexDef, Migration, MigrationStep};

pub(super) const BARCODE_INDEX: IndexDef =
    IndexDef::new("idx_products_barcode", "products", &["barcode"])
        .unique()
        .partial("barcode IS NOT NULL");

pub(super) const MIGRATION: Migration = Migration::new(
    2,
    "product_barcode",
    &[
        MigrationStep::AddColumn {
            table: "products",
            column: ColumnDef::new("barcode", "TEXT"),
        },
        MigrationStep::CreateIndex(BARCODE_INDEX),
    ],
);
