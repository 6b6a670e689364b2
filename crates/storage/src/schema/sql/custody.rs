#![forbid(unsafe_code)]

pub(super) const SQL: &str = r#"

        CREATE TABLE IF NOT EXISTS custody_records (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          product_id INTEGER NOT NULL REFERENCES products(id) ON DELETE CASCADE,
          custodian_id INTEGER NOT NULL REFERENCES users(id),
          quantity INTEGER NOT NULL DEFAULT 1 CHECK(quantity > 0),
          status TEXT NOT NULL DEFAULT 'active' CHECK(status IN ('active', 'returned')),
          assigned_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
          returned_at TEXT,
          notes TEXT
        );
"#;
