//! In-memory catalog backed by a JSON snapshot.
//!
//! The catalog owns every item, keeps keys unique and mediates all access to
//! the durable file. Loading never fails: a missing, unreadable or corrupt
//! file leaves an empty catalog and an event explaining why.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use crate::domain::{CatalogEvent, EventKind, Item};

use super::observer::EventSink;
use super::store::{CatalogError, CatalogStore, LoadOutcome};

/// Result of inserting an item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddResult {
    /// Appended and saved
    Added,

    /// Another item already uses this key; nothing changed
    DuplicateKey(String),
}

impl AddResult {
    /// Check if the item went in
    pub fn is_added(&self) -> bool {
        matches!(self, Self::Added)
    }
}

/// Catalog of all items
pub struct Catalog {
    items: Vec<Item>,
    store: CatalogStore,
    sink: Arc<dyn EventSink>,
}

impl Catalog {
    /// Create an empty catalog without reading the store
    pub fn new(store: CatalogStore, sink: Arc<dyn EventSink>) -> Self {
        Self {
            items: Vec::new(),
            store,
            sink,
        }
    }

    /// Create a catalog and load it from the store
    pub async fn open(store: CatalogStore, sink: Arc<dyn EventSink>) -> Self {
        let mut catalog = Self::new(store, sink);
        catalog.load().await;
        catalog
    }

    /// Get the snapshot file path
    pub fn path(&self) -> &Path {
        self.store.path()
    }

    /// Replace the in-memory items with the snapshot on disk
    pub async fn load(&mut self) {
        let path = self.store.path().display().to_string();

        self.items = match self.store.read().await {
            LoadOutcome::Loaded(items) => {
                let items = self.dedup_loaded(items);
                self.emit(CatalogEvent::new(
                    EventKind::CatalogLoaded,
                    format!("Catalog loaded from {} ({} items)", path, items.len()),
                ));
                items
            }
            LoadOutcome::Missing => {
                self.emit(CatalogEvent::new(
                    EventKind::CatalogMissing,
                    format!("Catalog file not found ({}), starting empty", path),
                ));
                Vec::new()
            }
            LoadOutcome::Corrupt(e) => {
                self.emit(
                    CatalogEvent::new(
                        EventKind::CatalogCorrupt,
                        format!("Catalog file {} is corrupted, starting empty", path),
                    )
                    .with_error(e),
                );
                Vec::new()
            }
            LoadOutcome::Unreadable(e) => {
                self.emit(
                    CatalogEvent::new(
                        EventKind::CatalogUnreadable,
                        format!("Failed to read catalog file {}, starting empty", path),
                    )
                    .with_error(e),
                );
                Vec::new()
            }
        };
    }

    /// Keep the first record for each key
    fn dedup_loaded(&self, items: Vec<Item>) -> Vec<Item> {
        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(items.len());

        for item in items {
            if seen.insert(item.key().to_string()) {
                kept.push(item);
            } else {
                self.emit(
                    CatalogEvent::new(
                        EventKind::DuplicateKey,
                        "Dropped duplicate record while loading catalog",
                    )
                    .with_key(item.key()),
                );
            }
        }

        kept
    }

    /// Save the catalog to disk. A failure is reported and returned.
    pub async fn save(&self) -> Result<(), CatalogError> {
        match self.store.write(&self.items).await {
            Ok(()) => {
                self.emit(CatalogEvent::new(
                    EventKind::CatalogSaved,
                    format!("Catalog saved to {}", self.store.path().display()),
                ));
                Ok(())
            }
            Err(e) => {
                self.emit(
                    CatalogEvent::new(EventKind::SaveFailed, "Failed to save catalog")
                        .with_error(&e),
                );
                Err(e)
            }
        }
    }

    /// Insert a new item and save. Rejects (without saving) an item whose
    /// key is already present.
    pub async fn add(&mut self, item: Item) -> Result<AddResult, CatalogError> {
        if self.contains_key(item.key()) {
            let key = item.key().to_string();
            self.emit(
                CatalogEvent::new(EventKind::DuplicateKey, "Attempted to add an item with a duplicate key")
                    .with_key(&key),
            );
            return Ok(AddResult::DuplicateKey(key));
        }

        self.items.push(item);
        self.save().await?;
        Ok(AddResult::Added)
    }

    /// Check whether any item uses `key`
    pub fn contains_key(&self, key: &str) -> bool {
        self.items.iter().any(|i| i.key() == key)
    }

    /// Get an item by exact key
    pub fn find_by_key(&self, key: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.key() == key)
    }

    /// Issue the item with `key` in memory. `None` when no item has the
    /// key, otherwise whether the status changed along with the item.
    /// Saving is left to the caller.
    pub fn issue(&mut self, key: &str) -> Option<(bool, &Item)> {
        let item = self.find_by_key_mut(key)?;
        let changed = item.issue();
        Some((changed, &*item))
    }

    /// Return the item with `key` in memory. Same contract as [`Catalog::issue`].
    pub fn return_item(&mut self, key: &str) -> Option<(bool, &Item)> {
        let item = self.find_by_key_mut(key)?;
        let changed = item.return_item();
        Some((changed, &*item))
    }

    fn find_by_key_mut(&mut self, key: &str) -> Option<&mut Item> {
        self.items.iter_mut().find(|i| i.key() == key)
    }

    /// Search titles (case-insensitive substring match), catalog order
    pub fn find_by_title(&self, text: &str) -> Vec<&Item> {
        let text_lower = text.to_lowercase();

        self.items
            .iter()
            .filter(|item| item.title().to_lowercase().contains(&text_lower))
            .collect()
    }

    /// All items in insertion order
    pub fn all(&self) -> &[Item] {
        &self.items
    }

    /// Get the number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn emit(&self, event: CatalogEvent) {
        self.sink.emit(event);
    }

    pub(crate) fn sink(&self) -> Arc<dyn EventSink> {
        Arc::clone(&self.sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::observer::MemorySink;
    use crate::domain::ItemStatus;
    use tempfile::TempDir;

    async fn create_test_catalog() -> (Catalog, Arc<MemorySink>, TempDir) {
        let temp = TempDir::new().unwrap();
        let sink = MemorySink::new();
        let store = CatalogStore::new(temp.path().join("catalog.json"));
        let catalog = Catalog::open(store, sink.clone()).await;
        (catalog, sink, temp)
    }

    #[tokio::test]
    async fn test_open_without_file_is_empty() {
        let (catalog, sink, _temp) = create_test_catalog().await;

        assert!(catalog.is_empty());
        assert_eq!(sink.kinds(), vec![EventKind::CatalogMissing]);
    }

    #[tokio::test]
    async fn test_catalog_add_and_get() {
        let (mut catalog, _sink, _temp) = create_test_catalog().await;

        let result = catalog.add(Item::new("ISBN1", "Dune", "Herbert")).await.unwrap();
        assert!(result.is_added());
        assert_eq!(catalog.len(), 1);

        let item = catalog.find_by_key("ISBN1").unwrap();
        assert_eq!(item.title(), "Dune");
        assert!(catalog.find_by_key("isbn1").is_none());
    }

    #[tokio::test]
    async fn test_add_saves_immediately() {
        let (mut catalog, sink, _temp) = create_test_catalog().await;

        catalog.add(Item::new("ISBN1", "Dune", "Herbert")).await.unwrap();

        assert!(catalog.path().exists());
        assert_eq!(sink.count(EventKind::CatalogSaved), 1);
    }

    #[tokio::test]
    async fn test_duplicate_key_is_rejected() {
        let (mut catalog, sink, _temp) = create_test_catalog().await;

        catalog.add(Item::new("ISBN1", "Dune", "Herbert")).await.unwrap();
        let result = catalog.add(Item::new("ISBN1", "Dune 2", "Someone")).await.unwrap();

        assert_eq!(result, AddResult::DuplicateKey("ISBN1".to_string()));
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.find_by_key("ISBN1").unwrap().title(), "Dune");
        assert_eq!(sink.count(EventKind::DuplicateKey), 1);
        // Only the first add saved
        assert_eq!(sink.count(EventKind::CatalogSaved), 1);
    }

    #[tokio::test]
    async fn test_catalog_search() {
        let (mut catalog, _sink, _temp) = create_test_catalog().await;

        catalog.add(Item::new("1", "Dune", "Herbert")).await.unwrap();
        catalog.add(Item::new("2", "Children of Dune", "Herbert")).await.unwrap();
        catalog.add(Item::new("3", "Emma", "Austen")).await.unwrap();

        let results = catalog.find_by_title("DUNE");
        let keys: Vec<&str> = results.iter().map(|i| i.key()).collect();
        assert_eq!(keys, vec!["1", "2"]);

        assert!(catalog.find_by_title("python").is_empty());
        // Author is not searched
        assert!(catalog.find_by_title("austen").is_empty());
    }

    #[tokio::test]
    async fn test_reload_restores_items() {
        let (mut catalog, _sink, temp) = create_test_catalog().await;

        catalog.add(Item::new("ISBN1", "Dune", "Herbert")).await.unwrap();
        catalog.add(Item::new("ISBN2", "Emma", "Austen")).await.unwrap();
        assert!(catalog.issue("ISBN2").unwrap().0);
        catalog.save().await.unwrap();

        let store = CatalogStore::new(temp.path().join("catalog.json"));
        let reloaded = Catalog::open(store, MemorySink::new()).await;

        assert_eq!(reloaded.all(), catalog.all());
        assert_eq!(
            reloaded.find_by_key("ISBN2").unwrap().status(),
            ItemStatus::Issued
        );
    }

    #[tokio::test]
    async fn test_corrupt_file_loads_empty() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("catalog.json");
        std::fs::write(&path, "{ not json").unwrap();

        let sink = MemorySink::new();
        let catalog = Catalog::open(CatalogStore::new(&path), sink.clone()).await;

        assert!(catalog.is_empty());
        assert_eq!(sink.kinds(), vec![EventKind::CatalogCorrupt]);
        assert!(sink.events()[0].error.is_some());
    }

    #[tokio::test]
    async fn test_duplicate_records_in_file_keep_first() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("catalog.json");
        std::fs::write(
            &path,
            r#"[
                {"key": "ISBN1", "title": "Dune", "author": "Herbert", "status": "available"},
                {"key": "ISBN1", "title": "Impostor", "author": "Nobody", "status": "issued"}
            ]"#,
        )
        .unwrap();

        let sink = MemorySink::new();
        let catalog = Catalog::open(CatalogStore::new(&path), sink.clone()).await;

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.find_by_key("ISBN1").unwrap().title(), "Dune");
        assert_eq!(
            sink.kinds(),
            vec![EventKind::DuplicateKey, EventKind::CatalogLoaded]
        );
    }

    #[tokio::test]
    async fn test_save_failure_is_surfaced() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("blocker");
        std::fs::write(&blocker, b"file").unwrap();

        let sink = MemorySink::new();
        let mut catalog = Catalog::open(
            CatalogStore::new(blocker.join("catalog.json")),
            sink.clone(),
        )
        .await;
        // The parent "directory" is a file, so the read fails too
        assert!(catalog.is_empty());

        let result = catalog.add(Item::new("ISBN1", "Dune", "Herbert")).await;

        assert!(result.is_err());
        // The append stays in memory; only the snapshot is behind
        assert_eq!(catalog.len(), 1);
        assert_eq!(sink.count(EventKind::SaveFailed), 1);
    }

    #[tokio::test]
    async fn test_lifecycle_changes_only_status() {
        let (mut catalog, _sink, _temp) = create_test_catalog().await;
        catalog.add(Item::new("ISBN1", "Dune", "Herbert")).await.unwrap();
        catalog.add(Item::new("ISBN2", "Emma", "Austen")).await.unwrap();

        let (changed, item) = catalog.issue("ISBN2").unwrap();
        assert!(changed);
        assert_eq!(item.status(), ItemStatus::Issued);

        let (changed, _) = catalog.issue("ISBN2").unwrap();
        assert!(!changed);

        let (changed, item) = catalog.return_item("ISBN2").unwrap();
        assert!(changed);
        assert_eq!(item.status(), ItemStatus::Available);

        assert!(catalog.issue("missing").is_none());
        assert!(catalog.return_item("missing").is_none());

        let keys: HashSet<&str> = catalog.all().iter().map(|i| i.key()).collect();
        assert_eq!(keys.len(), catalog.len());
        assert_eq!(catalog.find_by_key("ISBN2").unwrap().title(), "Emma");
    }
}
