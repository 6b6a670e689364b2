#![forbid(unsafe_code)]

// Only columns that no migration ever drops may be indexed here: this batch
// re-runs on every startup, including over fully migrated stores.
pub(super) const SQL: &str = r#"

        CREATE INDEX IF NOT EXISTS idx_products_name ON products(name);
        CREATE INDEX IF NOT EXISTS idx_custody_records_product ON custody_records(product_id);
        CREATE INDEX IF NOT EXISTS idx_custody_records_custodian ON custody_records(custodian_id, status);
        CREATE INDEX IF NOT EXISTS idx_sales_user_created ON sales(user_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_sale_items_sale ON sale_items(sale_id);
        CREATE INDEX IF NOT EXISTS idx_sale_items_product ON sale_items(product_id);
        CREATE INDEX IF NOT EXISTS idx_audit_log_kind_occurred ON audit_log(kind, occurred_at);
"#;
