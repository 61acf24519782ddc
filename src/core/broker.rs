use crate::core::error;
use crate::core::time;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// The broker is the single path for record mutations.
/// Every save or delete runs through it and leaves one line in the store's
/// audit journal. Reads never touch the journal.
pub struct DbBroker {
    audit_log_path: PathBuf,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BrokerEvent {
    pub ts: String,
    pub event_id: String,
    pub op: String,
    pub variant: String,
    pub status: String,
}

impl DbBroker {
    pub fn new(events_path: &Path) -> Self {
        Self {
            audit_log_path: events_path.to_path_buf(),
        }
    }

    /// Run one mutation and journal whether it committed.
    pub fn with_mutation<F, R>(&self, op: &str, variant: &str, f: F) -> Result<R, error::LottoError>
    where
        F: FnOnce() -> Result<R, error::LottoError>,
    {
        let result = f();
        let status = if result.is_ok() { "success" } else { "error" };
        self.record(op, variant, status);
        result
    }

    /// Append one event. Journal failures never fail the mutation itself.
    pub fn record(&self, op: &str, variant: &str, status: &str) {
        if let Err(e) = self.log_event(op, variant, status) {
            log::warn!(
                "could not append to {}: {}",
                self.audit_log_path.display(),
                e
            );
        }
    }

    fn log_event(&self, op: &str, variant: &str, status: &str) -> Result<(), error::LottoError> {
        let ev = BrokerEvent {
            ts: time::now_epoch_z(),
            event_id: time::new_event_id(),
            op: op.to_string(),
            variant: variant.to_string(),
            status: status.to_string(),
        };
        let line = serde_json::to_string(&ev)
            .map_err(|e| error::LottoError::IoError(e.into()))?;

        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.audit_log_path)
            .map_err(error::LottoError::IoError)?;
        writeln!(f, "{}", line).map_err(error::LottoError::IoError)?;
        Ok(())
    }
}

/// Read back the journal; a missing journal is an empty history.
pub fn read_events(events_path: &Path) -> Result<Vec<BrokerEvent>, error::LottoError> {
    if !events_path.is_file() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(events_path).map_err(error::LottoError::IoError)?;
    let mut out = Vec::new();
    for (n, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let ev: BrokerEvent = serde_json::from_str(line).map_err(|e| {
            error::LottoError::CorruptRecord {
                path: events_path.to_path_buf(),
                reason: format!("line {}: {}", n + 1, e),
            }
        })?;
        out.push(ev);
    }
    Ok(out)
}
