#![forbid(unsafe_code)]

pub(super) const SQL: &str = r#"

        -- `price` is a REAL in the baseline; a later migration moves it to integer cents.
        CREATE TABLE IF NOT EXISTS products (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          sku TEXT NOT NULL UNIQUE,
          name TEXT NOT NULL,
          category TEXT,
          price REAL NOT NULL DEFAULT 0,
          stock_qty INTEGER NOT NULL DEFAULT 0 CHECK(stock_qty >= 0),
          created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
          updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
"#;
