//! Per-submitter posting cooldown.
//!
//! One marker file per hashed submitter fingerprint; the file's modification
//! time is the last-accepted-post timestamp. Markers are created or
//! refreshed on each accepted post and never deleted, so the directory grows
//! with the number of distinct submitters (see DESIGN.md).
//!
//! Known race: the marker has no lock of its own, so two near-simultaneous
//! posts from the same submitter can both pass `check` before either
//! `stamp`s. Acceptable for this use case.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Default wait between two accepted posts from the same submitter.
pub const DEFAULT_COOLDOWN_SECS: u64 = 30;

/// Returned when a submitter posts again before the cooldown has elapsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CooldownError {
    /// Whole seconds until the submitter may post again, rounded up.
    pub retry_after_seconds: u64,
}

/// Marker-file cooldown limiter.
pub struct CooldownLimiter {
    dir: PathBuf,
    cooldown: Duration,
}

impl CooldownLimiter {
    /// Create the limiter, making the marker directory if absent with
    /// permissive modes (same deployment concern as the entry log).
    pub fn new(dir: impl Into<PathBuf>, cooldown: Duration) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        set_permissive_mode(&dir, 0o777);
        Ok(Self { dir, cooldown })
    }

    fn marker_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.lock", key))
    }

    /// Whether the submitter identified by `key` may post now.
    ///
    /// A missing or unreadable marker counts as allowed; the limiter never
    /// blocks a post because of its own I/O problems.
    pub fn check(&self, key: &str) -> Result<(), CooldownError> {
        let modified = match fs::metadata(self.marker_path(key)).and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(_) => return Ok(()),
        };
        let elapsed = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);
        if elapsed < self.cooldown {
            let remaining = self.cooldown - elapsed;
            Err(CooldownError {
                retry_after_seconds: remaining.as_secs()
                    + u64::from(remaining.subsec_nanos() > 0),
            })
        } else {
            Ok(())
        }
    }

    /// Record an accepted post: create or refresh the marker so its mtime is
    /// now. Called only after the entry was persisted.
    pub fn stamp(&self, key: &str) -> io::Result<()> {
        let path = self.marker_path(key);
        // Content is irrelevant, only the mtime matters.
        File::create(&path)?;
        set_permissive_mode(&path, 0o666);
        Ok(())
    }
}

#[cfg(unix)]
fn set_permissive_mode(path: &Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(mode)) {
        log::debug!("could not set permissions on {:?}: {}", path, e);
    }
}

#[cfg(not(unix))]
fn set_permissive_mode(_path: &Path, _mode: u32) {}
