#![forbid(unsafe_code)]

use ct_core::AuditEvent;
use ct_storage::audit;
use ct_storage::schema::create_base_schema;
use ct_storage::{JournalMode, SchemaError, Store, StoreConfig};
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn yaml_config_fills_defaults() {
    let config = StoreConfig::from_yaml("database: ./data/custody.db\n").expect("parse config");
    assert_eq!(config.database, PathBuf::from("./data/custody.db"));
    assert_eq!(config.busy_timeout_ms, ct_storage::DEFAULT_BUSY_TIMEOUT_MS);
    assert_eq!(config.journal_mode, JournalMode::Wal);
    assert!(config.foreign_keys);
    assert!(config.audit_migrations);
}

#[test]
fn yaml_config_rejects_bad_values() {
    let err = StoreConfig::from_yaml("database: a.db\nbusy_timeout_ms: 0\n")
        .expect_err("zero timeout");
    assert_eq!(err.code(), "CONFIG");

    let err = StoreConfig::from_yaml("database: a.db\nbusy_timeout_ms: 600000\n")
        .expect_err("unbounded timeout");
    assert!(matches!(err, SchemaError::Config(_)));

    let err = StoreConfig::from_yaml("database: a.db\nwal: true\n").expect_err("unknown key");
    assert!(matches!(err, SchemaError::Yaml(_)));
    assert_eq!(err.code(), "CONFIG");
}

#[test]
fn config_file_opens_store_with_requested_pragmas() {
    let dir = TempDir::new().expect("temp dir");
    let db = dir.path().join("nested").join("custody.db");
    let config_path = dir.path().join("store.yaml");
    std::fs::write(
        &config_path,
        format!(
            "database: {}\njournal_mode: delete\nforeign_keys: false\n",
            db.display()
        ),
    )
    .expect("write config");

    let config = StoreConfig::load(&config_path).expect("load config");
    let store = Store::open(&config).expect("open store");
    let conn = store.conn();

    let mode: String = conn
        .query_row("PRAGMA journal_mode", [], |row| row.get(0))
        .expect("journal mode");
    assert_eq!(mode, "delete");
    let fk: i64 = conn
        .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
        .expect("foreign keys");
    assert_eq!(fk, 0);
    assert!(db.exists());
}

#[test]
fn audit_rows_round_trip_through_typed_events() {
    let mut store = Store::open_in_memory().expect("open store");
    create_base_schema(store.conn_mut()).expect("bootstrap");
    let conn = store.conn();
    assert!(audit::is_available(conn).expect("probe"));

    conn.execute(
        "INSERT INTO users(id, username, display_name, role) VALUES (1, 'amina', 'Amina', 'admin')",
        [],
    )
    .expect("seed user");

    let first = audit::append(
        conn,
        &AuditEvent::StockAdjusted {
            product_id: 4,
            delta: -2,
            reason: "damaged in transit".to_string(),
        },
        Some(1),
    )
    .expect("append");
    let second = audit::append(
        conn,
        &AuditEvent::CustodyReturned {
            record_id: 9,
            condition_note: Some("scratched".to_string()),
        },
        None,
    )
    .expect("append");
    assert!(second > first);

    let records = audit::list_recent(conn, 10).expect("list");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, second);
    assert_eq!(
        records[0].event,
        AuditEvent::CustodyReturned {
            record_id: 9,
            condition_note: Some("scratched".to_string()),
        }
    );
    assert_eq!(records[1].user_id, Some(1));
    assert_eq!(audit::list_recent(conn, 1).expect("list").len(), 1);
}

#[test]
fn mismatched_audit_row_is_reported() {
    let mut store = Store::open_in_memory().expect("open store");
    create_base_schema(store.conn_mut()).expect("bootstrap");
    store
        .conn()
        .execute(
            "INSERT INTO audit_log(kind, payload_json) VALUES ('sale_recorded', ?1)",
            [r#"{"kind":"user_created","user_id":1,"username":"x","role":"clerk"}"#],
        )
        .expect("insert corrupt row");

    let err = audit::list_recent(store.conn(), 10).expect_err("kind mismatch");
    assert_eq!(err.code(), "AUDIT");
}
