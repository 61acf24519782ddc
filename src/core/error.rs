use rusqlite;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LottoError {
    #[error("Unknown lottery variant: {0}")]
    UnknownVariant(String),
    #[error("Invalid line count {count}: enter a number in the range {min}-{max}")]
    InvalidLineCount { count: u32, min: u32, max: u32 },
    #[error("Invalid rule for {variant}: {reason}")]
    InvalidRule { variant: String, reason: String },
    #[error("Variant name cannot be used as a store key: {0:?}")]
    InvalidVariantKey(String),
    #[error("Failed to write {}: {reason}", path.display())]
    StoreWriteError { path: PathBuf, reason: String },
    #[error("Failed to read {}: {reason}", path.display())]
    StoreReadError { path: PathBuf, reason: String },
    #[error("No stored record at {}", .0.display())]
    NoSuchRecord(PathBuf),
    #[error("Stored record {} is corrupt: {reason}", path.display())]
    CorruptRecord { path: PathBuf, reason: String },
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("SQLite error: {0}")]
    RusqliteError(#[from] rusqlite::Error),
}
