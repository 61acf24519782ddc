//! Batch store: one durable record per lottery variant.
//!
//! A record is a standalone SQLite file, `<root>/<variant>.db`. Saves build
//! the complete record in a sibling temp database, commit it, and rename it
//! over the previous file, so readers only ever see the old record or the new
//! one. Each record carries a schema version and a SHA-256 over its lines so
//! that damage is reported as `CorruptRecord` instead of being mistaken for
//! "nothing saved".

use crate::core::broker::DbBroker;
use crate::core::db;
use crate::core::error::LottoError;
use crate::core::schemas;
use crate::core::store::Store;
use crate::core::time;
use crate::plugins::draw::{Batch, DrawLine};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, ErrorCode, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// On-disk shape of a saved batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredBatchRecord {
    pub variant: String,
    pub line_count: u32,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<DrawLine>,
}

impl StoredBatchRecord {
    pub fn checksum(&self) -> Result<String, LottoError> {
        hash_lines(&self.lines)
    }

    pub fn into_batch(self) -> Batch {
        Batch {
            variant: self.variant,
            line_count: self.line_count,
            lines: self.lines,
            created_at: self.created_at,
            persisted: true,
        }
    }
}

/// SHA-256 over the stored JSON form of each line, `<main>|<extra>\n`.
pub fn hash_lines(lines: &[DrawLine]) -> Result<String, LottoError> {
    let mut hasher = Sha256::new();
    for line in lines {
        hasher.update(encode_set(&line.primary)?.as_bytes());
        hasher.update(b"|");
        hasher.update(encode_set(&line.secondary)?.as_bytes());
        hasher.update(b"\n");
    }
    Ok(format!("{:x}", hasher.finalize()))
}

pub struct BatchStore {
    store: Store,
    broker: DbBroker,
}

impl BatchStore {
    pub fn new(store: Store) -> Self {
        let broker = DbBroker::new(&store.events_path());
        Self { store, broker }
    }

    pub fn root(&self) -> &Path {
        &self.store.root
    }

    pub fn record_path(&self, variant: &str) -> Result<PathBuf, LottoError> {
        self.store.record_path(variant)
    }

    pub fn exists(&self, variant: &str) -> Result<bool, LottoError> {
        Ok(self.record_path(variant)?.is_file())
    }

    /// Persist `batch` as the current record for its variant, replacing any
    /// previous one. The record is stamped with the save time, which is returned.
    ///
    /// Any failure is a `StoreWriteError` and leaves the previous record untouched.
    /// Every save writes its own temp file, so concurrent savers of one variant
    /// resolve as last-writer-wins.
    pub fn save(&self, batch: &Batch) -> Result<DateTime<Utc>, LottoError> {
        let path = self.record_path(&batch.variant)?;
        let write_err = |reason: String| LottoError::StoreWriteError {
            path: path.clone(),
            reason,
        };
        if batch.lines.len() != batch.line_count as usize {
            return Err(write_err(format!(
                "batch declares {} lines but holds {}",
                batch.line_count,
                batch.lines.len()
            )));
        }

        let record = StoredBatchRecord {
            variant: batch.variant.clone(),
            line_count: batch.line_count,
            created_at: time::now_secs(),
            lines: batch.lines.clone(),
        };

        self.broker
            .with_mutation("batch.save", &batch.variant, || {
                fs::create_dir_all(&self.store.root)?;
                let tmp = tempfile::Builder::new()
                    .prefix(&format!(".{}.", batch.variant))
                    .suffix(schemas::TEMP_FILE_SUFFIX)
                    .tempfile_in(&self.store.root)?;
                if let Err(e) = write_temp(tmp.path(), &record) {
                    discard(&Store::journal_sidecar(tmp.path()));
                    return Err(e);
                }
                // A failed persist drops the temp file with the error.
                tmp.persist(&path).map_err(|e| LottoError::IoError(e.error))?;
                Ok(())
            })
            .map_err(|e| match e {
                LottoError::StoreWriteError { .. } => e,
                other => write_err(other.to_string()),
            })?;

        log::debug!("saved {} lines to {}", record.line_count, path.display());
        Ok(record.created_at)
    }

    /// Load the current record for `variant` as a persisted batch.
    pub fn load(&self, variant: &str) -> Result<Batch, LottoError> {
        let path = self.record_path(variant)?;
        if !path.is_file() {
            return Err(LottoError::NoSuchRecord(path));
        }
        let conn = db::db_open_existing(&path).map_err(|e| classify(&path, e))?;
        let record = read_record(&conn, &path, variant)?;
        log::debug!("loaded {} lines from {}", record.line_count, path.display());
        Ok(record.into_batch())
    }

    /// Remove the record for `variant`. Returns whether one existed.
    /// Deleting a missing record changes nothing on disk.
    pub fn delete(&self, variant: &str) -> Result<bool, LottoError> {
        let path = self.record_path(variant)?;
        if !path.is_file() {
            return Ok(false);
        }
        self.broker
            .with_mutation("batch.delete", variant, || {
                fs::remove_file(&path)?;
                let sidecar = Store::journal_sidecar(&path);
                if sidecar.exists() {
                    fs::remove_file(&sidecar)?;
                }
                Ok(())
            })
            .map_err(|e| LottoError::StoreWriteError {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        Ok(true)
    }

    /// Variants that currently have a record file, sorted by name.
    pub fn saved_variants(&self) -> Result<Vec<String>, LottoError> {
        if !self.store.root.is_dir() {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        for entry in fs::read_dir(&self.store.root)? {
            let name = entry?.file_name().to_string_lossy().to_string();
            if let Some(stem) = name.strip_suffix(schemas::RECORD_FILE_SUFFIX) {
                if self.store.record_path(stem).is_ok() {
                    out.push(stem.to_string());
                }
            }
        }
        out.sort();
        Ok(out)
    }
}

fn discard(sidecar: &Path) {
    if sidecar.exists() {
        if let Err(e) = fs::remove_file(sidecar) {
            log::warn!("could not remove {}: {}", sidecar.display(), e);
        }
    }
}

fn write_temp(tmp: &Path, record: &StoredBatchRecord) -> Result<(), LottoError> {
    let mut conn = db::db_connect(tmp)?;
    db::ensure_schema(&conn)?;

    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO record(id, schema_version, variant, line_count, created_at, checksum)
         VALUES(1, ?1, ?2, ?3, ?4, ?5)",
        params![
            schemas::RECORD_SCHEMA_VERSION,
            record.variant,
            record.line_count,
            record.created_at.timestamp(),
            record.checksum()?
        ],
    )?;
    {
        let mut stmt = tx.prepare("INSERT INTO lines(idx, main, extra) VALUES(?1, ?2, ?3)")?;
        for (idx, line) in record.lines.iter().enumerate() {
            stmt.execute(params![
                idx as i64,
                encode_set(&line.primary)?,
                encode_set(&line.secondary)?
            ])?;
        }
    }
    tx.commit()?;

    conn.close().map_err(|(_, e)| LottoError::RusqliteError(e))?;
    Ok(())
}

fn encode_set(values: &[u32]) -> Result<String, LottoError> {
    serde_json::to_string(values).map_err(|e| LottoError::IoError(e.into()))
}

/// Environmental failures are read errors; anything else means the file
/// does not hold a record we understand.
fn classify(path: &Path, err: LottoError) -> LottoError {
    match err {
        LottoError::RusqliteError(rusqlite::Error::SqliteFailure(ref f, _))
            if matches!(
                f.code,
                ErrorCode::DatabaseBusy
                    | ErrorCode::DatabaseLocked
                    | ErrorCode::CannotOpen
                    | ErrorCode::PermissionDenied
                    | ErrorCode::SystemIoFailure
                    | ErrorCode::OutOfMemory
            ) =>
        {
            LottoError::StoreReadError {
                path: path.to_path_buf(),
                reason: err.to_string(),
            }
        }
        LottoError::RusqliteError(e) => LottoError::CorruptRecord {
            path: path.to_path_buf(),
            reason: e.to_string(),
        },
        other => other,
    }
}

fn read_record(
    conn: &Connection,
    path: &Path,
    variant: &str,
) -> Result<StoredBatchRecord, LottoError> {
    let corrupt = |reason: String| LottoError::CorruptRecord {
        path: path.to_path_buf(),
        reason,
    };
    let sql = |e: rusqlite::Error| classify(path, LottoError::RusqliteError(e));

    let head = conn
        .query_row(
            "SELECT schema_version, variant, line_count, created_at, checksum
             FROM record WHERE id = 1",
            [],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, String>(4)?,
                ))
            },
        )
        .optional()
        .map_err(sql)?;
    let Some((version, stored_variant, line_count, created_at, checksum)) = head else {
        return Err(corrupt("record row is missing".to_string()));
    };

    if version != schemas::RECORD_SCHEMA_VERSION {
        return Err(corrupt(format!("unsupported schema version {}", version)));
    }
    if stored_variant != variant {
        return Err(corrupt(format!(
            "record belongs to {:?}, not {:?}",
            stored_variant, variant
        )));
    }
    let line_count = u32::try_from(line_count)
        .map_err(|_| corrupt(format!("invalid line count {}", line_count)))?;
    let created_at = time::from_epoch_secs(created_at)
        .ok_or_else(|| corrupt(format!("invalid timestamp {}", created_at)))?;

    let mut stmt = conn
        .prepare("SELECT idx, main, extra FROM lines ORDER BY idx")
        .map_err(sql)?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        })
        .map_err(sql)?;

    let mut lines = Vec::new();
    for (position, row) in rows.enumerate() {
        let (idx, main, extra) = row.map_err(sql)?;
        if idx != position as i64 {
            return Err(corrupt(format!("line {} is missing", position)));
        }
        let primary = decode_set(&main)
            .ok_or_else(|| corrupt(format!("line {} has an invalid primary set", idx)))?;
        if primary.is_empty() {
            return Err(corrupt(format!("line {} has an empty primary set", idx)));
        }
        let extra =
            extra.ok_or_else(|| corrupt(format!("line {} has no secondary marker", idx)))?;
        let secondary = decode_set(&extra)
            .ok_or_else(|| corrupt(format!("line {} has an invalid secondary set", idx)))?;
        lines.push(DrawLine { primary, secondary });
    }

    if lines.len() != line_count as usize {
        return Err(corrupt(format!(
            "expected {} lines, found {}",
            line_count,
            lines.len()
        )));
    }
    if hash_lines(&lines)? != checksum {
        return Err(corrupt("checksum mismatch".to_string()));
    }

    Ok(StoredBatchRecord {
        variant: stored_variant,
        line_count,
        created_at,
        lines,
    })
}

/// Parse a JSON number set, requiring strictly ascending values.
fn decode_set(text: &str) -> Option<Vec<u32>> {
    let values: Vec<u32> = serde_json::from_str(text).ok()?;
    if values.windows(2).all(|w| w[0] < w[1]) {
        Some(values)
    } else {
        None
    }
}
