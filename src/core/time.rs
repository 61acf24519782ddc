//! Shared timestamp/event helpers.

use chrono::{DateTime, Local, TimeZone, Utc};
use ulid::Ulid;

/// Display format for stored batch timestamps (local time).
pub const DATE_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Returns unix-epoch seconds with `Z` suffix (e.g. `1771220592Z`).
pub fn now_epoch_z() -> String {
    format!("{}Z", Utc::now().timestamp())
}

pub fn new_event_id() -> String {
    Ulid::new().to_string()
}

/// Truncate to whole seconds, the resolution records are stored at.
pub fn now_secs() -> DateTime<Utc> {
    from_epoch_secs(Utc::now().timestamp()).unwrap_or_else(Utc::now)
}

pub fn from_epoch_secs(secs: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0).single()
}

pub fn display_local(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format(DATE_FORMAT).to_string()
}
