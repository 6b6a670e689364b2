#![forbid(unsafe_code)]

use ct_core::{ColumnDef, IndexDef, Migration, MigrationStep};

pub(super) const MIGRATION: Migration = Migration::new(
    6,
    "user_last_login",
    &[
        MigrationStep::AddColumn {
            table: "users",
            column: ColumnDef::new("last_login_at", "TEXT"),
        },
        MigrationStep::CreateIndex(IndexDef::new(
            "idx_audit_log_user",
            "audit_log",
            &["user_id", "occurred_at"],
        )),
        MigrationStep::RawStatement {
            sql: "INSERT OR IGNORE INTO settings(key, value) VALUES ('currency_unit', 'cents')",
            skip_if: None,
        },
    ],
);
