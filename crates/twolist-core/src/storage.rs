//! Key-value storage for string blobs
//!
//! The store only needs atomic get/set of whole values by key. Two backends:
//! a directory of files, and an in-memory map.

use crate::{Error, Result};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// String blobs addressed by key
pub trait Storage {
    /// Read the value under `key`, `None` if it was never written
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value under `key`
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// One file per key in a data directory
///
/// `@toDos` is stored as `toDos.json`. Writes go to a temp file that is then
/// renamed over the target, so readers never see a partial value.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key.trim_start_matches('@')))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Io(e)),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");

        let written = write_file(&tmp, value).and_then(|()| fs::rename(&tmp, &path));
        if written.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        Ok(written?)
    }
}

fn write_file(path: &Path, value: &str) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(value.as_bytes())?;
    file.sync_all()
}

/// In-memory backend
///
/// Used by tests and `--ephemeral` sessions. Writes can be made to fail to
/// simulate an unavailable device.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    values: HashMap<String, String>,
    fail_writes: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value without going through `set`
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }

    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes {
            return Err(Error::Storage(format!("write to {} rejected", key)));
        }
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_storage_missing_key() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(dir.path().join("data"));
        assert_eq!(storage.get("@toDos").unwrap(), None);
    }

    #[test]
    fn test_file_storage_set_get() {
        let dir = TempDir::new().unwrap();
        let mut storage = FileStorage::new(dir.path().join("data"));

        storage.set("@mode", "true").unwrap();
        assert_eq!(storage.get("@mode").unwrap().as_deref(), Some("true"));
        assert!(dir.path().join("data").join("mode.json").exists());

        storage.set("@mode", "false").unwrap();
        assert_eq!(storage.get("@mode").unwrap().as_deref(), Some("false"));
        assert!(!dir.path().join("data").join("mode.json.tmp").exists());
    }

    #[test]
    fn test_file_storage_failed_rename_cleans_up() {
        let dir = TempDir::new().unwrap();
        let mut storage = FileStorage::new(dir.path());
        // A directory in the way makes the final rename fail
        fs::create_dir_all(dir.path().join("toDos.json").join("blocker")).unwrap();

        assert!(matches!(storage.set("@toDos", "{}"), Err(Error::Io(_))));
        assert!(!dir.path().join("toDos.json.tmp").exists());
    }

    #[test]
    fn test_memory_storage_failing_writes() {
        let mut storage = MemoryStorage::new().with("@mode", "true");
        storage.set_fail_writes(true);
        assert!(matches!(storage.set("@mode", "false"), Err(Error::Storage(_))));
        assert_eq!(storage.get("@mode").unwrap().as_deref(), Some("true"));
    }
}
