#![forbid(unsafe_code)]

use ct_core::AuditEvent;
use ct_storage::audit;
use ct_storage::schema::{
    BASELINE_TABLES, column_exists, create_base_schema, current_version, index_exists,
    markers, table_exists,
};
use ct_storage::{MigrationRegistry, MigrationRunner, Store, StoreConfig};
use rusqlite::{Connection, params};
use tempfile::TempDir;

fn open_store(dir: &TempDir) -> Store {
    let config = StoreConfig::new(dir.path().join("data").join("custody.db"));
    Store::open(&config).expect("open store")
}

fn foreign_keys_enforced(conn: &Connection) -> bool {
    conn.query_row("PRAGMA foreign_keys", [], |row| row.get::<_, i64>(0))
        .expect("read pragma")
        == 1
}

fn seed_baseline_rows(conn: &Connection) {
    conn.execute_batch(
        "INSERT INTO users(id, username, display_name, role) VALUES
           (1, 'amina', 'Amina', 'admin'),
           (2, 'tomas', 'Tomas', 'custodian');
         INSERT INTO products(id, sku, name, price, stock_qty) VALUES
           (1, 'TAPE-01', 'Tape', 19.99, 10),
           (2, 'GLOVE-02', 'Gloves', 0.1, 4),
           (3, 'TORCH-03', 'Torch', 12.5, 0);
         INSERT INTO custody_records(id, product_id, custodian_id, quantity, status, notes) VALUES
           (1, 1, 2, 2, 'active', 'field kit'),
           (2, 3, 2, 1, 'returned', NULL);
         INSERT INTO sales(id, user_id, total) VALUES (1, 1, 20.09);
         INSERT INTO sale_items(sale_id, product_id, quantity, unit_price) VALUES
           (1, 1, 1, 19.99),
           (1, 2, 1, 0.1);",
    )
    .expect("seed baseline rows");
}

#[test]
fn builtin_catalog_is_valid() {
    let registry = MigrationRegistry::builtin().expect("builtin catalog");
    assert_eq!(registry.target_version(), 6);
    assert!(registry.all_migrations()[0].is_baseline());
    assert_eq!(
        registry.get(5).map(|migration| migration.name),
        Some("product_price_cents")
    );
    assert!(registry.get(0).is_none());
    assert!(registry.get(7).is_none());
    assert_eq!(registry.pending(4).len(), 2);
    assert!(registry.pending(6).is_empty());
}

#[test]
fn fresh_install_reaches_target_in_one_startup() {
    let dir = TempDir::new().expect("temp dir");
    let mut store = open_store(&dir);
    let registry = MigrationRegistry::builtin().expect("builtin catalog");

    let report = store.startup(&registry).expect("startup");
    assert_eq!(report.from_version, 0);
    assert_eq!(report.to_version, 6);
    assert_eq!(report.applied_versions(), vec![1, 2, 3, 4, 5, 6]);

    let conn = store.conn();
    for table in BASELINE_TABLES {
        assert!(table_exists(conn, table).expect("probe"), "{table} missing");
    }
    assert!(table_exists(conn, "custody_transfers").expect("probe"));
    assert!(column_exists(conn, "products", "price_cents").expect("probe"));
    assert!(!column_exists(conn, "products", "price").expect("probe"));
    assert!(column_exists(conn, "custody_records", "condition").expect("probe"));
    assert!(column_exists(conn, "users", "last_login_at").expect("probe"));
    assert!(index_exists(conn, "idx_products_barcode").expect("probe"));
    assert!(index_exists(conn, "idx_custody_records_custodian").expect("probe"));
    assert!(markers::is_set(conn, "custody_records.status_transferred").expect("marker"));
    assert!(foreign_keys_enforced(conn));

    let unit: String = conn
        .query_row(
            "SELECT value FROM settings WHERE key = 'currency_unit'",
            [],
            |row| row.get(0),
        )
        .expect("currency setting");
    assert_eq!(unit, "cents");

    let events = audit::list_recent(conn, 10).expect("audit");
    assert_eq!(events.len(), 1);
    assert_eq!(
        events[0].event,
        AuditEvent::SchemaMigrated {
            from_version: 0,
            to_version: 6,
            applied: vec![1, 2, 3, 4, 5, 6],
        }
    );
    assert_eq!(events[0].user_id, None);
}

#[test]
fn upgrade_from_baseline_preserves_and_converts_rows() {
    let dir = TempDir::new().expect("temp dir");
    let mut store = open_store(&dir);
    let registry = MigrationRegistry::builtin().expect("builtin catalog");

    create_base_schema(store.conn_mut()).expect("bootstrap");
    seed_baseline_rows(store.conn());

    store.startup(&registry).expect("startup");
    let conn = store.conn();

    let prices = conn
        .prepare("SELECT sku, price_cents, stock_qty FROM products ORDER BY id")
        .expect("prepare")
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })
        .expect("query")
        .collect::<Result<Vec<_>, _>>()
        .expect("rows");
    assert_eq!(
        prices,
        vec![
            ("TAPE-01".to_string(), 1999, 10),
            ("GLOVE-02".to_string(), 10, 4),
            ("TORCH-03".to_string(), 1250, 0),
        ]
    );

    let custody = conn
        .prepare("SELECT status, condition, notes FROM custody_records ORDER BY id")
        .expect("prepare")
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        })
        .expect("query")
        .collect::<Result<Vec<_>, _>>()
        .expect("rows");
    assert_eq!(
        custody,
        vec![
            ("active".to_string(), "good".to_string(), Some("field kit".to_string())),
            ("returned".to_string(), "good".to_string(), None),
        ]
    );

    let sale_items: i64 = conn
        .query_row("SELECT COUNT(*) FROM sale_items", [], |row| row.get(0))
        .expect("count");
    assert_eq!(sale_items, 2);

    conn.execute(
        "INSERT INTO custody_records(product_id, custodian_id, status) VALUES (?1, ?2, ?3)",
        params![2, 2, "transferred"],
    )
    .expect("transferred status accepted");
    assert!(
        conn.execute(
            "INSERT INTO products(sku, name, price_cents) VALUES ('NEG-01', 'Broken', -5)",
            [],
        )
        .is_err(),
        "negative prices rejected"
    );
    assert!(
        conn.execute(
            "INSERT INTO custody_records(product_id, custodian_id) VALUES (99, 2)",
            [],
        )
        .is_err(),
        "foreign keys enforced again after the batch"
    );
}

#[test]
fn unconvertible_rows_abort_startup_without_partial_changes() {
    let dir = TempDir::new().expect("temp dir");
    let mut store = open_store(&dir);
    let builtin = MigrationRegistry::builtin().expect("builtin catalog");
    let through_v4 =
        MigrationRegistry::new(builtin.all_migrations()[..4].to_vec()).expect("prefix catalog");

    store.startup(&through_v4).expect("startup at v4");
    store
        .conn()
        .execute(
            "INSERT INTO products(sku, name, price) VALUES ('REFUND-01', 'Refund', -1.0)",
            [],
        )
        .expect("baseline shape accepts negative prices");

    let err = store.startup(&builtin).expect_err("negative price cannot convert");
    assert_eq!(err.code(), "DATA_INTEGRITY");
    assert!(err.is_fatal());

    let conn = store.conn();
    assert_eq!(current_version(conn).expect("version"), 4);
    assert!(column_exists(conn, "products", "price").expect("probe"));
    assert!(!column_exists(conn, "users", "last_login_at").expect("v6 rolled back"));
    assert!(!table_exists(conn, "products_new").expect("shadow rolled back"));
}

#[test]
fn repeated_startups_converge_across_reopen() {
    let dir = TempDir::new().expect("temp dir");
    let registry = MigrationRegistry::builtin().expect("builtin catalog");

    {
        let mut store = open_store(&dir);
        store.startup(&registry).expect("first startup");
    }

    let mut store = open_store(&dir);
    assert_eq!(store.current_version().expect("version"), 6);
    assert!(store.plan(&registry).expect("plan").is_empty());

    let report = store.startup(&registry).expect("second startup");
    assert!(report.is_noop());
    assert_eq!(store.history().expect("history").len(), 6);
    assert_eq!(audit::list_recent(store.conn(), 10).expect("audit").len(), 1);
    assert!(store.path().is_some_and(|path| path.ends_with("custody.db")));
}

#[test]
fn audit_can_be_disabled() {
    let dir = TempDir::new().expect("temp dir");
    let mut store = open_store(&dir);
    create_base_schema(store.conn_mut()).expect("bootstrap");
    let registry = MigrationRegistry::builtin().expect("builtin catalog");

    MigrationRunner::new(&registry)
        .with_audit(false)
        .run(store.conn_mut())
        .expect("migrate");
    assert!(audit::list_recent(store.conn(), 10).expect("audit").is_empty());
}

#[test]
fn older_build_leaves_a_newer_store_untouched() {
    let dir = TempDir::new().expect("temp dir");
    let mut store = open_store(&dir);
    let registry = MigrationRegistry::builtin().expect("builtin catalog");
    store.startup(&registry).expect("startup");

    store
        .conn()
        .execute_batch(
            "DROP TABLE settings;
             INSERT INTO schema_version(version, name, applied_at)
               VALUES (7, 'from_a_newer_build', '2026-10-17T00:00:00Z');",
        )
        .expect("simulate a newer build");
    let cookie: i64 = store
        .conn()
        .query_row("PRAGMA schema_version", [], |row| row.get(0))
        .expect("schema cookie");

    let err = store.startup(&registry).expect_err("newer store must be refused");
    assert_eq!(err.code(), "VERSION_SKEW");

    let conn = store.conn();
    assert!(!table_exists(conn, "settings").expect("probe"));
    assert_eq!(current_version(conn).expect("version"), 7);
    let after: i64 = conn
        .query_row("PRAGMA schema_version", [], |row| row.get(0))
        .expect("schema cookie");
    assert_eq!(after, cookie, "catalog unchanged");
}
