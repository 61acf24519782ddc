//! Store root abstraction.
//!
//! Every persisted artifact of lotgen lives under a single store root:
//!
//! ```text
//! <root>/config.toml           optional policy + extra variants
//! <root>/<variant>.db          one batch record per variant
//! <root>/store.events.jsonl    append-only mutation journal
//! ```
//!
//! The root directory is created lazily by the first save; reading from a
//! root that does not exist yet is valid and simply finds nothing.

use crate::core::error::LottoError;
use crate::core::schemas;
use std::path::{Path, PathBuf};

/// Handle on a lotgen state directory.
#[derive(Debug, Clone)]
pub struct Store {
    /// Path to the store root directory (may not exist yet)
    pub root: PathBuf,
}

impl Store {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of the backing record for `variant`.
    ///
    /// Fails with `InvalidVariantKey` when the name would escape the root or
    /// collide with the store's own files.
    pub fn record_path(&self, variant: &str) -> Result<PathBuf, LottoError> {
        validate_key(variant)?;
        Ok(self
            .root
            .join(format!("{}{}", variant, schemas::RECORD_FILE_SUFFIX)))
    }

    /// SQLite rollback journal that sits next to a record while a write is open.
    pub fn journal_sidecar(record: &Path) -> PathBuf {
        let mut name = record.as_os_str().to_os_string();
        name.push("-journal");
        PathBuf::from(name)
    }

    pub fn events_path(&self) -> PathBuf {
        self.root.join(schemas::EVENTS_FILE_NAME)
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(schemas::CONFIG_FILE_NAME)
    }
}

pub fn validate_key(variant: &str) -> Result<(), LottoError> {
    let ok = !variant.is_empty()
        && variant
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(LottoError::InvalidVariantKey(variant.to_string()))
    }
}
