//! Durable snapshot file for the catalog.
//!
//! The file is a pretty-printed JSON array of item records. Every save
//! replaces the whole file: the snapshot is written to a sibling temporary
//! file and renamed over the target, so a reader sees either the old or the
//! new snapshot, never a partial one.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use thiserror::Error;
use tokio::fs;

use crate::domain::Item;

/// Errors that can occur while writing or locking the catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Catalog is in use by another process: {}", .path.display())]
    Locked { path: PathBuf },
}

impl CatalogError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// What reading the durable file produced
#[derive(Debug)]
pub enum LoadOutcome {
    /// File decoded successfully
    Loaded(Vec<Item>),

    /// No file at the path
    Missing,

    /// File read but not valid catalog JSON
    Corrupt(serde_json::Error),

    /// File present but could not be read
    Unreadable(io::Error),
}

/// File-backed catalog snapshot
#[derive(Debug, Clone)]
pub struct CatalogStore {
    path: PathBuf,
}

impl CatalogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the path to the snapshot file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the advisory lock file (`<catalog>.lock`)
    pub fn lock_path(&self) -> PathBuf {
        sibling(&self.path, "lock")
    }

    /// Read and decode the snapshot. Never fails; the outcome says what
    /// happened.
    pub async fn read(&self) -> LoadOutcome {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return LoadOutcome::Missing,
            Err(e) => return LoadOutcome::Unreadable(e),
        };

        match decode(&bytes) {
            Ok(items) => LoadOutcome::Loaded(items),
            Err(e) => LoadOutcome::Corrupt(e),
        }
    }

    /// Overwrite the snapshot with `items`
    pub async fn write(&self, items: &[Item]) -> Result<(), CatalogError> {
        let content = encode(items)?;

        // Ensure parent directory exists
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| CatalogError::io(parent, e))?;
        }

        let tmp_path = sibling(&self.path, "tmp");
        fs::write(&tmp_path, content)
            .await
            .map_err(|e| CatalogError::io(&tmp_path, e))?;

        if let Err(e) = fs::rename(&tmp_path, &self.path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(CatalogError::io(&self.path, e));
        }

        Ok(())
    }

    /// Take an exclusive advisory lock on the catalog. The lock is held
    /// until the returned guard is dropped.
    pub fn lock(&self) -> Result<CatalogLock, CatalogError> {
        let lock_path = self.lock_path();

        if let Some(parent) = lock_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| CatalogError::io(parent, e))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| CatalogError::io(&lock_path, e))?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(CatalogLock {
                file,
                path: lock_path,
            }),
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                Err(CatalogError::Locked { path: self.path.clone() })
            }
            Err(e) => Err(CatalogError::io(&lock_path, e)),
        }
    }
}

/// Exclusive hold on a catalog; released on drop
#[derive(Debug)]
pub struct CatalogLock {
    file: File,
    path: PathBuf,
}

impl CatalogLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CatalogLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// Encode items as a JSON array indented with four spaces
pub fn encode(items: &[Item]) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    items.serialize(&mut serializer)?;
    buf.push(b'\n');
    Ok(buf)
}

/// Decode a JSON array of item records
pub fn decode(bytes: &[u8]) -> Result<Vec<Item>, serde_json::Error> {
    serde_json::from_slice(bytes)
}

/// `catalog.json` -> `catalog.json.<suffix>`
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ItemStatus;
    use tempfile::TempDir;

    fn create_test_store() -> (CatalogStore, TempDir) {
        let temp = TempDir::new().unwrap();
        let store = CatalogStore::new(temp.path().join("catalog.json"));
        (store, temp)
    }

    #[test]
    fn test_encode_format() {
        let items = vec![Item::new("ISBN1", "Dune", "Herbert").with_status(ItemStatus::Issued)];
        let text = String::from_utf8(encode(&items).unwrap()).unwrap();

        assert!(text.starts_with("[\n    {\n        \"key\": \"ISBN1\","));
        assert!(text.contains("\"status\": \"issued\""));
        assert!(text.ends_with("]\n"));
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let (store, _temp) = create_test_store();
        assert!(matches!(store.read().await, LoadOutcome::Missing));
    }

    #[tokio::test]
    async fn test_read_corrupt_file() {
        let (store, _temp) = create_test_store();
        fs::write(store.path(), b"[{\"key\": \"ISBN1\", \"title\": ")
            .await
            .unwrap();

        assert!(matches!(store.read().await, LoadOutcome::Corrupt(_)));
    }

    #[tokio::test]
    async fn test_read_directory_is_unreadable() {
        let temp = TempDir::new().unwrap();
        let store = CatalogStore::new(temp.path());

        assert!(matches!(store.read().await, LoadOutcome::Unreadable(_)));
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let (store, _temp) = create_test_store();
        let items = vec![
            Item::new("ISBN1", "Dune", "Herbert"),
            Item::new("ISBN2", "Emma", "Austen").with_status(ItemStatus::Issued),
        ];

        store.write(&items).await.unwrap();

        match store.read().await {
            LoadOutcome::Loaded(loaded) => assert_eq!(loaded, items),
            other => panic!("Expected Loaded, got {:?}", other),
        }
        assert!(!sibling(store.path(), "tmp").exists());
    }

    #[tokio::test]
    async fn test_write_creates_parent_directory() {
        let temp = TempDir::new().unwrap();
        let store = CatalogStore::new(temp.path().join("nested").join("catalog.json"));

        store.write(&[]).await.unwrap();
        assert!(store.path().exists());
    }

    #[tokio::test]
    async fn test_write_fails_when_parent_is_a_file() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let store = CatalogStore::new(blocker.join("catalog.json"));

        let result = store.write(&[Item::new("ISBN1", "Dune", "Herbert")]).await;
        assert!(matches!(result, Err(CatalogError::Io { .. })));
    }

    #[test]
    fn test_second_lock_is_rejected() {
        let (store, _temp) = create_test_store();

        let guard = store.lock().unwrap();
        assert!(guard.path().ends_with("catalog.json.lock"));

        let second = store.lock();
        assert!(matches!(second, Err(CatalogError::Locked { .. })));

        drop(guard);
        assert!(store.lock().is_ok());
    }
}
