#![forbid(unsafe_code)]

use super::v002_product_barcode::BARCODE_INDEX;
use ct_core::{
    ColumnDef, ColumnMapping, CompletionMarker, IndexDef, Migration, MigrationStep, RebuildPlan,
    TableDef,
};

const PRODUCTS: TableDef = TableDef::new(
    "products",
    &[
        ColumnDef::new("id", "INTEGER PRIMARY KEY AUTOINCREMENT"),
        ColumnDef::new("sku", "TEXT NOT NULL UNIQUE"),
        ColumnDef::new("name", "TEXT NOT NULL"),
        ColumnDef::new("category", "TEXT"),
        ColumnDef::new(
            "price_cents",
            "INTEGER NOT NULL DEFAULT 0 CHECK(price_cents >= 0)",
        ),
        ColumnDef::new("stock_qty", "INTEGER NOT NULL DEFAULT 0 CHECK(stock_qty >= 0)"),
        ColumnDef::new("barcode", "TEXT"),
        ColumnDef::new("created_at", "TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP"),
        ColumnDef::new("updated_at", "TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP"),
    ],
);

const INDEXES: &[IndexDef] = &[
    IndexDef::new("idx_products_name", "products", &["name"]),
    BARCODE_INDEX,
];

pub(super) const MIGRATION: Migration = Migration::new(
    5,
    "product_price_cents",
    &[MigrationStep::RebuildWithConstraint(
        RebuildPlan::new(PRODUCTS, CompletionMarker::ColumnPresent("price_cents"))
            .with_sources(&[ColumnMapping::expr(
                "price_cents",
                "CAST(ROUND(COALESCE(price, 0) * 100) AS INTEGER)",
            )])
            .with_dropped(&["price"])
            .with_indexes(INDEXES),
    )],
);
