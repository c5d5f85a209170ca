/// A schema migration.
#[derive(Debug)]
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub sql: &'static str,
}

const MIGRATION_001: &str = r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Astronomy Picture of the Day entries, one row per calendar date
CREATE TABLE IF NOT EXISTS apod_entries (
    date TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    explanation TEXT,
    media_type TEXT,
    url TEXT,
    hdurl TEXT,
    thumbnail_url TEXT,
    service_version TEXT,
    copyright TEXT,
    fetched_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_apod_media_type ON apod_entries(media_type);
"#;

pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: MIGRATION_001,
}];
