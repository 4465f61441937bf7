//! Storage abstraction over the removable recording medium.
//!
//! The recorder never touches `std::fs` directly: everything goes through
//! `BlockStorage`/`StorageFile` so a removable medium that disappears
//! mid-write surfaces as a `StorageFault` instead of a panic, and so tests
//! can inject faults at any point of a recording.
//!
//! Closing a file is dropping its handle.

use std::fs::{self, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

/// Faults surfaced by the storage medium. None of these panic; all are
/// reported to the caller, which decides what the failure means for the
/// recording in progress.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StorageFault {
    #[error("storage medium unavailable: {0}")]
    Unavailable(String),
    #[error("write truncated: wrote {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },
    #[error("seek to offset {offset} failed: {reason}")]
    SeekFailed { offset: u64, reason: String },
    #[error("flush failed: {0}")]
    FlushFailed(String),
    #[error("i/o failure: {0}")]
    Io(String),
}

/// An open, writable file on the medium.
///
/// `write` returns the number of bytes actually written; a short count is
/// not an error at this layer. The handle is closed by dropping it.
pub trait StorageFile {
    fn write(&mut self, buf: &[u8]) -> Result<usize, StorageFault>;
    fn seek_to(&mut self, offset: u64) -> Result<(), StorageFault>;
    fn flush(&mut self) -> Result<(), StorageFault>;
}

/// Metadata for one stored recording.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub name: String,
    pub size_bytes: u64,
}

/// The removable medium itself.
///
/// Paths are absolute from the storage root (e.g. `/video_1700000000000.avi`).
pub trait BlockStorage {
    type File: StorageFile;

    /// Cheap reachability check, used before a recording starts.
    fn available(&self) -> bool;
    /// Open for writing, creating or truncating the target.
    fn open(&self, path: &str) -> Result<Self::File, StorageFault>;
    fn exists(&self, path: &str) -> bool;
    /// Returns true if the file was removed.
    fn remove(&self, path: &str) -> bool;
    fn list(&self) -> Result<Vec<StoredFile>, StorageFault>;
}

/// `std::fs`-backed storage rooted at a directory (the mounted medium).
#[derive(Debug, Clone)]
pub struct StdStorage {
    root: PathBuf,
}

impl StdStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }

    /// Whole-file read, used by the control surface for downloads.
    pub fn read(&self, path: &str) -> Result<Vec<u8>, StorageFault> {
        fs::read(self.resolve(path)).map_err(|e| StorageFault::Io(e.to_string()))
    }
}

pub struct StdFile {
    inner: fs::File,
}

impl StorageFile for StdFile {
    fn write(&mut self, buf: &[u8]) -> Result<usize, StorageFault> {
        self.inner
            .write(buf)
            .map_err(|e| StorageFault::Io(e.to_string()))
    }

    fn seek_to(&mut self, offset: u64) -> Result<(), StorageFault> {
        self.inner
            .seek(SeekFrom::Start(offset))
            .map(|_| ())
            .map_err(|e| StorageFault::SeekFailed {
                offset,
                reason: e.to_string(),
            })
    }

    fn flush(&mut self) -> Result<(), StorageFault> {
        self.inner
            .sync_all()
            .map_err(|e| StorageFault::FlushFailed(e.to_string()))
    }
}

impl BlockStorage for StdStorage {
    type File = StdFile;

    fn available(&self) -> bool {
        self.root.is_dir()
    }

    fn open(&self, path: &str) -> Result<StdFile, StorageFault> {
        let target = self.resolve(path);
        let inner = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&target)
            .map_err(|e| StorageFault::Unavailable(format!("{}: {}", target.display(), e)))?;
        Ok(StdFile { inner })
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).exists()
    }

    fn remove(&self, path: &str) -> bool {
        fs::remove_file(self.resolve(path)).is_ok()
    }

    fn list(&self) -> Result<Vec<StoredFile>, StorageFault> {
        let entries = fs::read_dir(&self.root)
            .map_err(|e| StorageFault::Unavailable(format!("{}: {}", self.root.display(), e)))?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StorageFault::Io(e.to_string()))?;
            let meta = entry.metadata().map_err(|e| StorageFault::Io(e.to_string()))?;
            if !meta.is_file() {
                continue;
            }
            files.push(StoredFile {
                name: entry.file_name().to_string_lossy().into_owned(),
                size_bytes: meta.len(),
            });
        }
        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_write_list_remove() {
        let dir = tempdir().unwrap();
        let storage = StdStorage::new(dir.path());
        assert!(storage.available());

        let mut file = storage.open("/clip.avi").unwrap();
        assert_eq!(file.write(b"abcd").unwrap(), 4);
        file.flush().unwrap();
        drop(file);

        assert!(storage.exists("/clip.avi"));
        let listed = storage.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "clip.avi");
        assert_eq!(listed[0].size_bytes, 4);

        assert!(storage.remove("/clip.avi"));
        assert!(!storage.exists("/clip.avi"));
        assert!(!storage.remove("/clip.avi"));
    }

    #[test]
    fn test_seek_overwrites_in_place() {
        let dir = tempdir().unwrap();
        let storage = StdStorage::new(dir.path());

        let mut file = storage.open("/clip.avi").unwrap();
        file.write(b"00000000").unwrap();
        file.seek_to(2).unwrap();
        file.write(b"XY").unwrap();
        drop(file);

        assert_eq!(storage.read("/clip.avi").unwrap(), b"00XY0000");
    }

    #[test]
    fn test_missing_root_is_unavailable() {
        let storage = StdStorage::new("/definitely/not/mounted");
        assert!(!storage.available());
        assert!(storage.open("/clip.avi").is_err());
    }
}
