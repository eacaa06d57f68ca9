//! SQLite-backed record file
//!
//! The record file is a single SQLite database with one key-value table:
//! content hash to JSON-serialized record. Callers serialize access with
//! the sibling lock file; this module does no locking of its own.

use crate::error::RewindResult;
use crate::record::Record;
use rusqlite::{params, Connection, OpenFlags};
use std::fmt;
use std::path::Path;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS records (
    hash   TEXT PRIMARY KEY,
    record TEXT NOT NULL
)";

/// Storage format for a record file
pub trait RecordBackend: Send + Sync + fmt::Debug {
    /// Read every record, or `None` when `file` does not exist
    fn read_all(&self, file: &Path) -> RewindResult<Option<Vec<Record>>>;

    /// Insert or overwrite one record, creating `file` if needed
    fn write(&self, file: &Path, record: &Record) -> RewindResult<()>;
}

/// Default backend: one SQLite table keyed by hash
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteBackend;

impl RecordBackend for SqliteBackend {
    fn read_all(&self, file: &Path) -> RewindResult<Option<Vec<Record>>> {
        if !file.is_file() {
            return Ok(None);
        }

        let conn = Connection::open_with_flags(file, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        let mut stmt = conn.prepare("SELECT record FROM records ORDER BY hash")?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut records = Vec::with_capacity(rows.len());
        for raw in rows {
            records.push(serde_json::from_str::<Record>(&raw)?);
        }
        Ok(Some(records))
    }

    fn write(&self, file: &Path, record: &Record) -> RewindResult<()> {
        let conn = Connection::open(file)?;
        conn.execute(CREATE_TABLE, [])?;

        let raw = serde_json::to_string(record)?;
        conn.execute(
            "INSERT OR REPLACE INTO records(hash, record) VALUES (?1, ?2)",
            params![record.hash, raw],
        )?;
        Ok(())
    }
}
