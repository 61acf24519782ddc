//! Centralized file names and database schema for the batch store.
//!
//! Each variant owns one SQLite file holding exactly one record:
//! a single `record` row (metadata + checksum) and `line_count` rows in `lines`.

pub const RECORD_FILE_SUFFIX: &str = ".db";
pub const TEMP_FILE_SUFFIX: &str = ".db.tmp";
pub const EVENTS_FILE_NAME: &str = "store.events.jsonl";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Bumped whenever the on-disk layout changes. Records with any other value
/// are reported as corrupt rather than guessed at.
pub const RECORD_SCHEMA_VERSION: i64 = 1;

pub const BATCH_DB_SCHEMA_RECORD: &str = "
    CREATE TABLE IF NOT EXISTS record (
        id INTEGER PRIMARY KEY CHECK (id = 1),
        schema_version INTEGER NOT NULL,
        variant TEXT NOT NULL,
        line_count INTEGER NOT NULL,
        created_at INTEGER NOT NULL,
        checksum TEXT NOT NULL
    )
";

/// `main` and `extra` are JSON arrays of integers. A variant without a
/// secondary pool stores `extra` as `[]`; NULL never appears in a valid record.
pub const BATCH_DB_SCHEMA_LINES: &str = "
    CREATE TABLE IF NOT EXISTS lines (
        idx INTEGER PRIMARY KEY,
        main TEXT NOT NULL,
        extra TEXT
    )
";
