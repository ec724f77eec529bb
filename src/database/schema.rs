// DDL for the relational tables. Every statement is idempotent.

/// `items` table plus the trigger that refreshes `updated_at`.
pub const ITEMS_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS items (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  name TEXT NOT NULL,
  description TEXT,
  created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
  updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
);

CREATE TRIGGER IF NOT EXISTS update_items_updated_at
  AFTER UPDATE ON items
BEGIN
  UPDATE items SET updated_at = CURRENT_TIMESTAMP WHERE id = NEW.id;
END;
"#;

/// Backing table for the persistent KV namespace. `expires_at` is epoch seconds.
pub const KV_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS kv_entries (
  key TEXT PRIMARY KEY NOT NULL,
  value TEXT NOT NULL,
  expires_at INTEGER
);

CREATE INDEX IF NOT EXISTS kv_entries_expires_at ON kv_entries (expires_at);
"#;
