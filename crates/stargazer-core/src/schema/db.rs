use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

use crate::error::Result;
use crate::model::{Entry, StoredEntry, DATE_FORMAT};

use super::migrations::MIGRATIONS;

const UPSERT_ENTRY: &str = "
    INSERT INTO apod_entries (
        date, title, explanation, media_type, url, hdurl,
        thumbnail_url, service_version, copyright, fetched_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
    ON CONFLICT(date) DO UPDATE SET
        title = excluded.title,
        explanation = excluded.explanation,
        media_type = excluded.media_type,
        url = excluded.url,
        hdurl = excluded.hdurl,
        thumbnail_url = excluded.thumbnail_url,
        service_version = excluded.service_version,
        copyright = excluded.copyright,
        fetched_at = excluded.fetched_at";

const SQLITE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SELECT_ENTRY_COLUMNS: &str = "
    SELECT date, title, explanation, media_type, url, hdurl,
           thumbnail_url, service_version, copyright, fetched_at
    FROM apod_entries";

/// First and last stored dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateSpan {
    pub first: NaiveDate,
    pub last: NaiveDate,
}

/// A database connection holding the `apod_entries` table.
#[derive(Debug)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) a database at the given path and apply migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.apply_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.apply_migrations()?;
        Ok(db)
    }

    /// Get a reference to the underlying connection (for advanced queries).
    #[must_use]
    pub const fn conn(&self) -> &Connection {
        &self.conn
    }

    fn apply_migrations(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            [],
        )?;

        let mut stmt = self
            .conn
            .prepare("SELECT version FROM schema_migrations ORDER BY version")?;
        let applied: Vec<u32> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        for migration in MIGRATIONS {
            if !applied.contains(&migration.version) {
                log::info!(
                    "Applying migration {} ({})",
                    migration.version,
                    migration.name
                );
                self.conn.execute_batch(migration.sql)?;
                self.conn.execute(
                    "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
                    rusqlite::params![migration.version, migration.name],
                )?;
            }
        }

        Ok(())
    }
}

// Entry writes
impl Database {
    /// Insert or overwrite entries keyed by date, stamping them with the
    /// current time.
    ///
    /// See [`Database::upsert_entries_at`].
    pub fn upsert_entries(&mut self, entries: &[Entry]) -> Result<usize> {
        self.upsert_entries_at(entries, Utc::now())
    }

    /// Insert or overwrite entries keyed by date in a single transaction.
    ///
    /// Every non-key column is replaced and `fetched_at` is set to
    /// `fetched_at`. If any row fails the whole batch is rolled back.
    ///
    /// Returns the number of entries written, which is always
    /// `entries.len()` on success, even when a row was overwritten with
    /// identical values.
    pub fn upsert_entries_at(
        &mut self,
        entries: &[Entry],
        fetched_at: DateTime<Utc>,
    ) -> Result<usize> {
        let stamp = fetched_at.to_rfc3339();
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(UPSERT_ENTRY)?;
            for entry in entries {
                stmt.execute(rusqlite::params![
                    entry.date_key(),
                    entry.title,
                    entry.explanation,
                    entry.media_type,
                    entry.url,
                    entry.hd_url,
                    entry.thumbnail_url,
                    entry.service_version,
                    entry.copyright,
                    stamp,
                ])?;
            }
        }
        tx.commit()?;

        log::debug!("Upserted {} entries", entries.len());
        Ok(entries.len())
    }
}

// Entry reads
impl Database {
    /// Look up the entry for a single date.
    pub fn get_entry(&self, date: NaiveDate) -> Result<Option<StoredEntry>> {
        let sql = format!("{SELECT_ENTRY_COLUMNS} WHERE date = ?1");
        let entry = self
            .conn
            .query_row(
                &sql,
                [date.format(DATE_FORMAT).to_string()],
                row_to_entry,
            )
            .optional()?;
        Ok(entry)
    }

    /// List entries with `start <= date <= end`, oldest first.
    pub fn list_entries(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<StoredEntry>> {
        let sql = format!("{SELECT_ENTRY_COLUMNS} WHERE date BETWEEN ?1 AND ?2 ORDER BY date");
        let mut stmt = self.conn.prepare(&sql)?;

        let entries = stmt
            .query_map(
                [
                    start.format(DATE_FORMAT).to_string(),
                    end.format(DATE_FORMAT).to_string(),
                ],
                row_to_entry,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(entries)
    }

    /// Total number of stored entries.
    pub fn count_entries(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM apod_entries", [], |row| row.get(0))?;
        Ok(count)
    }

    /// The earliest and latest stored dates, or `None` for an empty table.
    pub fn date_span(&self) -> Result<Option<DateSpan>> {
        let (first, last): (Option<String>, Option<String>) = self.conn.query_row(
            "SELECT MIN(date), MAX(date) FROM apod_entries",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        match (first, last) {
            (Some(first), Some(last)) => Ok(Some(DateSpan {
                first: parse_date(&first)?,
                last: parse_date(&last)?,
            })),
            _ => Ok(None),
        }
    }

    /// Entry counts grouped by `media_type`, most common first.
    ///
    /// Entries without a media type are reported under `None`.
    pub fn media_type_counts(&self) -> Result<Vec<(Option<String>, i64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT media_type, COUNT(*) AS n
             FROM apod_entries
             GROUP BY media_type
             ORDER BY n DESC, media_type",
        )?;

        let counts = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(counts)
    }
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| {
        crate::Error::InvalidData(format!("stored date '{value}' is not YYYY-MM-DD: {e}"))
    })
}

/// Rows written by this crate carry RFC 3339; rows stamped by SQLite's
/// `CURRENT_TIMESTAMP` carry `YYYY-MM-DD HH:MM:SS` in UTC.
fn parse_fetched_at(value: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value)
        .map(|stamp| stamp.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(value, SQLITE_TIMESTAMP_FORMAT)
                .map(|naive| naive.and_utc())
        })
}

fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<StoredEntry> {
    let date_str: String = row.get(0)?;
    let fetched_at_str: String = row.get(9)?;

    let date = NaiveDate::parse_from_str(&date_str, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?;
    let fetched_at = parse_fetched_at(&fetched_at_str)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(9, Type::Text, Box::new(e)))?;

    Ok(StoredEntry {
        entry: Entry {
            date,
            title: row.get(1)?,
            explanation: row.get(2)?,
            media_type: row.get(3)?,
            url: row.get(4)?,
            hd_url: row.get(5)?,
            thumbnail_url: row.get(6)?,
            service_version: row.get(7)?,
            copyright: row.get(8)?,
        },
        fetched_at,
    })
}
