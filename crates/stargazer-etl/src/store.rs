//! Persisting normalized entries into the SQLite store.

use std::path::{Path, PathBuf};

use stargazer_core::model::Entry;
use stargazer_core::schema::Database;

use crate::error::IngestResult;

/// The on-disk entry store.
///
/// Holds only the path; the database is opened per upsert so an empty batch
/// never touches the file.
#[derive(Debug, Clone)]
pub struct Store {
    db_path: PathBuf,
}

impl Store {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Insert or overwrite `entries` keyed by date, all in one transaction.
    ///
    /// Returns the number of entries written (`entries.len()`). An empty
    /// slice returns 0 without opening or creating the database.
    pub fn upsert(&self, entries: &[Entry]) -> IngestResult<usize> {
        if entries.is_empty() {
            log::debug!("No entries to store in {}", self.db_path.display());
            return Ok(0);
        }

        let mut db = Database::open(&self.db_path)?;
        let written = db.upsert_entries(entries)?;
        Ok(written)
    }
}
