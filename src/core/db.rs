use crate::core::error;
use crate::core::schemas;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::time::Duration;

const BUSY_TIMEOUT_SECS: u64 = 5;

/// Open (creating if needed) a record database for writing.
///
/// Records use SQLite's default rollback journal rather than WAL so that a
/// committed record is a single self-contained file.
pub fn db_connect(db_path: &Path) -> Result<Connection, error::LottoError> {
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(Duration::from_secs(BUSY_TIMEOUT_SECS))
        .map_err(error::LottoError::RusqliteError)?;
    conn.query_row("PRAGMA journal_mode=DELETE;", [], |_| Ok(()))
        .map_err(error::LottoError::RusqliteError)?;
    Ok(conn)
}

/// Open an existing record database read-only, never creating one.
pub fn db_open_existing(db_path: &Path) -> Result<Connection, error::LottoError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_ONLY
        | OpenFlags::SQLITE_OPEN_URI
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let conn = Connection::open_with_flags(db_path, flags)?;
    conn.busy_timeout(Duration::from_secs(BUSY_TIMEOUT_SECS))
        .map_err(error::LottoError::RusqliteError)?;
    Ok(conn)
}

pub fn ensure_schema(conn: &Connection) -> Result<(), error::LottoError> {
    conn.execute(schemas::BATCH_DB_SCHEMA_RECORD, [])?;
    conn.execute(schemas::BATCH_DB_SCHEMA_LINES, [])?;
    Ok(())
}
