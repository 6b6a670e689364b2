#![forbid(unsafe_code)]

mod audit;
mod core;
mod custody;
mod indexes;
mod inventory;
mod sales;

/// Baseline (version 1) shape. Every statement is `IF NOT EXISTS`, so running
/// it over a migrated store only fills in what is missing.
pub(super) fn full_schema_sql() -> String {
    let mut sql = String::new();
    sql.push_str(core::SQL);
    sql.push_str(inventory::SQL);
    sql.push_str(custody::SQL);
    sql.push_str(sales::SQL);
    sql.push_str(audit::SQL);
    sql.push_str(indexes::SQL);
    sql
}

/// Tables the baseline owns, in creation order.
pub const BASELINE_TABLES: &[&str] = &[
    "users",
    "settings",
    "products",
    "custody_records",
    "sales",
    "sale_items",
    "audit_log",
];
