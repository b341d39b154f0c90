pub const SCHEMA_VERSION: i32 = 2;

pub const SCHEMA_V1: &str = r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    id INTEGER PRIMARY KEY,
    version INTEGER NOT NULL
);

-- One row per lead; `data` holds the full JSON record, the other columns
-- mirror it for ordering and filtering
CREATE TABLE IF NOT EXISTS companies (
    id TEXT PRIMARY KEY,
    position INTEGER NOT NULL,
    title TEXT,
    city TEXT,
    state TEXT,
    disposition TEXT,
    data TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_company_position ON companies(position);
CREATE INDEX IF NOT EXISTS idx_company_state ON companies(state);
CREATE INDEX IF NOT EXISTS idx_company_city ON companies(city);
CREATE INDEX IF NOT EXISTS idx_company_disposition ON companies(disposition);
"#;

/// V2 migration: metadata table for bookkeeping such as the last save time
pub const MIGRATION_V2: &str = r#"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;
