#![forbid(unsafe_code)]

pub(super) const SQL: &str = r#"

        -- Append-only. `payload_json` is a tagged event whose tag equals `kind`.
        CREATE TABLE IF NOT EXISTS audit_log (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          kind TEXT NOT NULL,
          payload_json TEXT NOT NULL,
          user_id INTEGER REFERENCES users(id),
          occurred_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
"#;
