//! Append-only entry log storage.
//!
//! The log is a flat UTF-8 file with one self-describing JSON record per
//! line, readable and appendable by independent processes. Writers take an
//! exclusive flock scoped to the write, readers a shared flock, so
//! concurrent appends serialize and reads block only against an in-progress
//! write.

use crate::entry::Entry;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Storage operation errors.
#[derive(Debug)]
pub enum StorageError {
    /// I/O error
    Io(std::io::Error),
    /// Record serialization error
    Serialize(serde_json::Error),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "I/O error: {}", e),
            StorageError::Serialize(e) => write!(f, "serialization error: {}", e),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io(e)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialize(e)
    }
}

/// Interface over the entry log so handlers and tests can swap the backing
/// store.
pub trait EntryStore: Send + Sync {
    /// Persist one entry at the end of the log.
    fn append(&self, entry: &Entry) -> Result<(), StorageError>;

    /// The last `limit` entries, most recent first.
    fn read_recent(&self, limit: usize) -> Result<Vec<Entry>, StorageError>;
}

/// Line-delimited JSON log on the local filesystem.
pub struct JsonlStore {
    path: PathBuf,
}

impl JsonlStore {
    /// Open or create the entry log at `path`.
    ///
    /// The parent directory and the file are created if absent, with
    /// permissive modes so the app never fails purely from default
    /// restrictive permissions in its deployment environment.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
            set_permissive_mode(dir, 0o777);
        }

        if !path.exists() {
            File::create(&path)?;
        }
        set_permissive_mode(&path, 0o666);

        log::info!("entry log initialized at {:?}", path);
        Ok(Self { path })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EntryStore for JsonlStore {
    fn append(&self, entry: &Entry) -> Result<(), StorageError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        // Blocking exclusive lock, held only for the write.
        file.lock_exclusive()?;
        let result = write_record(&mut file, entry);
        let _ = FileExt::unlock(&file);
        result
    }

    fn read_recent(&self, limit: usize) -> Result<Vec<Entry>, StorageError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        file.lock_shared()?;
        let result = scan_records(&file);
        let _ = FileExt::unlock(&file);

        let mut entries = result?;
        entries.reverse();
        entries.truncate(limit);
        Ok(entries)
    }
}

fn write_record(file: &mut File, entry: &Entry) -> Result<(), StorageError> {
    let mut line = serde_json::to_string(entry)?;
    line.push('\n');
    file.write_all(line.as_bytes())?;
    file.flush()?;
    Ok(())
}

/// Scan every line of the log in insertion order. Blank and malformed lines
/// (crashes, partial concurrent writes) are skipped silently.
fn scan_records(file: &File) -> Result<Vec<Entry>, StorageError> {
    let mut entries = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Entry>(line) {
            Ok(entry) => entries.push(entry),
            Err(e) => log::debug!("skipping malformed entry line: {}", e),
        }
    }
    Ok(entries)
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

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store(dir: &TempDir) -> JsonlStore {
        JsonlStore::open(dir.path().join("entries.jsonl")).unwrap()
    }

    fn entry(name: &str, message: &str) -> Entry {
        Entry::new(name.to_string(), message.to_string(), "aabbccddeeff0011".to_string())
    }

    #[test]
    fn test_append_then_read_round_trips_bytes() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);

        let original = entry("Grüße 🦀", "Hello\nWorld\n\ntrailing  spaces  ");
        store.append(&original).unwrap();

        let read = store.read_recent(10).unwrap();
        assert_eq!(read.len(), 1);
        assert_eq!(read[0].name, original.name);
        assert_eq!(read[0].message, original.message);
    }

    #[test]
    fn test_read_recent_returns_newest_first_and_truncates() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);

        for i in 0..5 {
            store.append(&entry(&format!("user{}", i), "hi")).unwrap();
        }

        let read = store.read_recent(3).unwrap();
        assert_eq!(read.len(), 3);
        assert_eq!(read[0].name, "user4");
        assert_eq!(read[1].name, "user3");
        assert_eq!(read[2].name, "user2");
    }

    #[test]
    fn test_new_entry_is_first_after_append() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);

        store.append(&entry("old", "first")).unwrap();
        let fresh = entry("new", "second");
        store.append(&fresh).unwrap();

        let read = store.read_recent(1).unwrap();
        assert_eq!(read[0].id, fresh.id);
    }

    #[test]
    fn test_missing_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonlStore {
            path: dir.path().join("never_created.jsonl"),
        };
        assert!(store.read_recent(10).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);

        store.append(&entry("before", "ok")).unwrap();
        fs::write(
            store.path(),
            format!(
                "{}\nnot json at all\n{{\"id\":\"truncated\n\n{}\n",
                serde_json::to_string(&entry("first", "ok")).unwrap(),
                serde_json::to_string(&entry("last", "ok")).unwrap(),
            ),
        )
        .unwrap();

        let read = store.read_recent(10).unwrap();
        assert_eq!(read.len(), 2);
        assert_eq!(read[0].name, "last");
        assert_eq!(read[1].name, "first");
    }

    #[test]
    fn test_concurrent_appends_keep_every_record_well_formed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("entries.jsonl");
        let writers: Vec<_> = (0..4)
            .map(|w| {
                let path = path.clone();
                std::thread::spawn(move || {
                    let store = JsonlStore::open(path).unwrap();
                    for i in 0..25 {
                        store
                            .append(&Entry::new(
                                format!("writer{}", w),
                                format!("message {}", i),
                                "aabbccddeeff0011".to_string(),
                            ))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in writers {
            handle.join().unwrap();
        }

        let store = JsonlStore::open(path).unwrap();
        let read = store.read_recent(1000).unwrap();
        // Interleaving order between writers is unspecified, but nothing
        // may be lost or torn.
        assert_eq!(read.len(), 100);
        for w in 0..4 {
            let count = read
                .iter()
                .filter(|e| e.name == format!("writer{}", w))
                .count();
            assert_eq!(count, 25);
        }
    }
}
