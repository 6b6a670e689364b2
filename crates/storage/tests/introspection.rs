#![forbid(unsafe_code)]

use ct_storage::Store;
use ct_storage::schema::{
    column_exists, index_exists, list_columns, list_indexes, list_tables, table_exists,
};

fn store_with_items() -> Store {
    let store = Store::open_in_memory().expect("open in-memory store");
    store
        .conn()
        .execute_batch(
            "CREATE TABLE items (
               id INTEGER PRIMARY KEY,
               sku TEXT NOT NULL UNIQUE,
               state TEXT DEFAULT 'a'
             );
             CREATE INDEX idx_items_state ON items(state);",
        )
        .expect("seed items");
    store
}

#[test]
fn predicates_answer_false_for_missing_objects() {
    let store = store_with_items();
    let conn = store.conn();

    assert!(table_exists(conn, "items").expect("table probe"));
    assert!(!table_exists(conn, "ghosts").expect("missing table probe"));
    assert!(!table_exists(conn, "idx_items_state").expect("index is not a table"));

    assert!(column_exists(conn, "items", "state").expect("column probe"));
    assert!(!column_exists(conn, "items", "missing").expect("missing column probe"));
    assert!(!column_exists(conn, "ghosts", "state").expect("column of missing table"));

    assert!(index_exists(conn, "idx_items_state").expect("index probe"));
    assert!(!index_exists(conn, "idx_missing").expect("missing index probe"));
}

#[test]
fn invalid_identifiers_answer_false_without_touching_sql() {
    let store = store_with_items();
    let conn = store.conn();

    assert!(!table_exists(conn, "items; DROP TABLE items").expect("injection probe"));
    assert!(!column_exists(conn, "items", "state OR 1=1").expect("injection probe"));
    assert!(!index_exists(conn, "").expect("empty name"));
    assert!(list_columns(conn, "items--").expect("bad name").is_empty());
    assert!(list_indexes(conn, "it ems").expect("bad name").is_empty());

    assert!(table_exists(conn, "items").expect("items survived"));
}

#[test]
fn objects_are_visible_inside_the_creating_transaction() {
    let mut store = store_with_items();
    let tx = store.conn_mut().transaction().expect("begin");

    tx.execute_batch(
        "CREATE TABLE shelves (id INTEGER PRIMARY KEY);
         ALTER TABLE items ADD COLUMN shelf_id INTEGER;
         CREATE INDEX idx_items_shelf ON items(shelf_id);",
    )
    .expect("ddl in transaction");

    assert!(table_exists(&tx, "shelves").expect("probe"));
    assert!(column_exists(&tx, "items", "shelf_id").expect("probe"));
    assert!(index_exists(&tx, "idx_items_shelf").expect("probe"));

    drop(tx);
    let conn = store.conn();
    assert!(!table_exists(conn, "shelves").expect("rolled back"));
    assert!(!column_exists(conn, "items", "shelf_id").expect("rolled back"));
}

#[test]
fn listings_describe_columns_and_named_indexes() {
    let store = store_with_items();
    let conn = store.conn();

    assert_eq!(list_tables(conn).expect("tables"), vec!["items".to_string()]);

    let columns = list_columns(conn, "items").expect("columns");
    let names = columns
        .iter()
        .map(|column| column.name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["id", "sku", "state"]);
    assert_eq!(columns[0].pk, 1);
    assert!(columns[1].not_null);
    assert_eq!(columns[1].decl_type, "TEXT");
    assert_eq!(columns[2].default_sql.as_deref(), Some("'a'"));

    // The UNIQUE(sku) autoindex has no SQL of its own and is not listed.
    let indexes = list_indexes(conn, "items").expect("indexes");
    assert_eq!(indexes.len(), 1);
    assert_eq!(indexes[0].name, "idx_items_state");
    assert!(!indexes[0].unique);
    assert_eq!(indexes[0].columns, vec![Some("state".to_string())]);
    assert!(indexes[0].sql.starts_with("CREATE INDEX idx_items_state"));

    assert!(list_columns(conn, "ghosts").expect("missing table").is_empty());
}
