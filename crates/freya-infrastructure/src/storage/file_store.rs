//! File-backed key-value store.
//!
//! Entries are kept in a single JSON object. Writes take an exclusive lock on a
//! sibling `.lock` file, go to a temporary file, are fsynced, and then renamed over
//! the original so a crash never leaves a half-written store.

use async_trait::async_trait;
use freya_core::error::{FreyaError, Result};
use freya_core::storage::KeyValueStore;
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};
use tracing::warn;

type Entries = BTreeMap<String, String>;

/// JSON file key-value store with atomic updates.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    path: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(path: &Path) -> Result<Entries> {
        if !path.exists() {
            return Ok(Entries::new());
        }
        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Entries::new());
        }
        match serde_json::from_str(&content) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                // A corrupt store only holds recoverable hints; start over.
                warn!(
                    target: "freya::storage",
                    path = %path.display(),
                    error = %e,
                    "Discarding unreadable local store"
                );
                Ok(Entries::new())
            }
        }
    }

    fn write_entries(path: &Path, entries: &Entries) -> Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| FreyaError::io("Local store path has no parent directory"))?;
        let file_name = path
            .file_name()
            .ok_or_else(|| FreyaError::io("Local store path has no file name"))?;
        let tmp_path = parent.join(format!(".{}.tmp", file_name.to_string_lossy()));

        let content = serde_json::to_string_pretty(entries)?;
        {
            let mut tmp = File::create(&tmp_path)?;
            tmp.write_all(content.as_bytes())?;
            tmp.sync_all()?;
        }
        fs::rename(&tmp_path, path)?;
        Ok(())
    }

    /// Runs `f` against the entries under the exclusive lock and writes them back.
    fn update_blocking<F>(path: &Path, f: F) -> Result<()>
    where
        F: FnOnce(&mut Entries),
    {
        let _lock = FileLock::acquire(path)?;
        let mut entries = Self::read_entries(path)?;
        f(&mut entries);
        Self::write_entries(path, &entries)
    }

    async fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut Entries) + Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || Self::update_blocking(&path, f))
            .await
            .map_err(|e| FreyaError::internal(format!("Failed to join task: {}", e)))?
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path.clone();
        let entries = tokio::task::spawn_blocking(move || Self::read_entries(&path))
            .await
            .map_err(|e| FreyaError::internal(format!("Failed to join task: {}", e)))??;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let (key, value) = (key.to_string(), value.to_string());
        self.update(move |entries| {
            entries.insert(key, value);
        })
        .await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let key = key.to_string();
        self.update(move |entries| {
            entries.remove(&key);
        })
        .await
    }
}

/// A file lock guard. The lock is released when the handle closes.
///
/// The `.lock` file itself is never deleted: unlinking it would let a waiter locked
/// on the old inode and a newcomer on a fresh one both hold the lock.
struct FileLock {
    _file: File,
}

impl FileLock {
    fn acquire(path: &Path) -> Result<Self> {
        let lock_path = path.with_extension("lock");

        if let Some(parent) = lock_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        #[cfg(unix)]
        {
            use fs2::FileExt;
            file.lock_exclusive().map_err(|e| {
                FreyaError::io(format!("Failed to acquire local store lock: {}", e))
            })?;
        }

        Ok(FileLock { _file: file })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_values_survive_a_new_handle() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");

        let store = FileKeyValueStore::new(&path);
        store.set("freya-activeSessionId-u1", "s1").await.unwrap();

        let reopened = FileKeyValueStore::new(&path);
        assert_eq!(
            reopened.get("freya-activeSessionId-u1").await.unwrap().as_deref(),
            Some("s1")
        );
    }

    #[tokio::test]
    async fn test_missing_file_reads_as_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileKeyValueStore::new(temp_dir.path().join("nested").join("store.json"));
        assert_eq!(store.get("anything").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_remove_and_no_leftovers() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");
        let store = FileKeyValueStore::new(&path);

        store.set("a", "1").await.unwrap();
        store.set("b", "2").await.unwrap();
        store.remove("a").await.unwrap();

        assert_eq!(store.get("a").await.unwrap(), None);
        assert_eq!(store.get("b").await.unwrap().as_deref(), Some("2"));
        assert!(!temp_dir.path().join(".store.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_lock_file_outlives_writes() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");
        let store = FileKeyValueStore::new(&path);

        store.set("a", "1").await.unwrap();
        let lock_path = temp_dir.path().join("store.lock");
        assert!(lock_path.exists());

        // Released on drop, so the next writer gets it without the file being recreated.
        let guard = FileLock::acquire(&path).unwrap();
        drop(guard);
        store.set("b", "2").await.unwrap();
        assert!(lock_path.exists());
        assert_eq!(store.get("b").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_replaced_on_write() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = FileKeyValueStore::new(&path);
        assert_eq!(store.get("a").await.unwrap(), None);
        store.set("a", "1").await.unwrap();
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("1"));
    }
}
