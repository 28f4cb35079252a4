//! Guestbook entry model.
//!
//! Entries are immutable once written. They are stored raw (unescaped) and
//! escaped at render time.

use chrono::{TimeZone, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A single guestbook entry, one JSON object per line in the entry log.
///
/// Field names are part of the on-disk format and must stay readable by
/// independent processes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Opaque record token, 16 hex characters.
    pub id: String,
    /// Unix timestamp (seconds) at submission time.
    pub ts: i64,
    /// Submitted name, stored raw.
    pub name: String,
    /// Submitted message, stored raw. May contain newlines.
    pub message: String,
    /// Truncated submitter fingerprint for abuse attribution.
    pub ip_hash: String,
}

impl Entry {
    /// Build a new entry stamped with the current time and a fresh id.
    pub fn new(name: String, message: String, ip_hash: String) -> Self {
        Self {
            id: generate_entry_id(),
            ts: Utc::now().timestamp(),
            name,
            message,
            ip_hash,
        }
    }

    /// Submission time formatted for display, e.g. `24.08.2026 18:05`.
    pub fn posted_at(&self) -> String {
        match Utc.timestamp_opt(self.ts, 0).single() {
            Some(dt) => dt.format("%d.%m.%Y %H:%M").to_string(),
            None => String::new(),
        }
    }
}

/// Generate a random 16-hex-char entry id.
pub fn generate_entry_id() -> String {
    format!("{:016x}", rand::thread_rng().gen::<u64>())
}
