//! Request/response surface over the catalog.
//!
//! A [`Session`] turns [`Request`]s into [`Response`]s regardless of where
//! the requests come from (the interactive shell, a one-shot CLI command or
//! a test). Every successful mutation is saved before the response is
//! returned.

use std::sync::Arc;

use thiserror::Error;

use crate::domain::{CatalogEvent, EventKind, Item};

use super::catalog::{AddResult, Catalog};
use super::observer::EventSink;
use super::store::CatalogError;

/// Errors a request can surface
#[derive(Debug, Error)]
pub enum SessionError {
    /// The change was applied in memory but the snapshot was not written
    #[error("Change was not saved: {source}")]
    NotPersisted {
        #[source]
        source: CatalogError,
    },
}

/// One logical request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    AddItem {
        title: String,
        author: String,
        key: String,
    },
    IssueItem {
        key: String,
    },
    ReturnItem {
        key: String,
    },
    ListAll,
    SearchByTitle {
        text: String,
    },
    SearchByKey {
        key: String,
    },
    Exit,
}

/// Which lifecycle action a request asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Issue,
    Return,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Issue => "issue",
            Action::Return => "return",
        }
    }
}

/// Outcome of a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// New item stored
    Added(Item),

    /// Key already taken, nothing changed
    DuplicateKey { key: String },

    /// Item lent out
    Issued(Item),

    /// Item back on the shelf
    Returned(Item),

    /// No item has this key
    NotFound { key: String, action: Action },

    /// The item is already in the state the action would move it to
    AlreadyInState { item: Item, action: Action },

    /// Items from a list or search request
    Items(Vec<Item>),

    /// Request fields were blank
    InvalidInput { reason: String },

    /// Session finished
    Closed,
}

/// Dispatcher over a catalog
pub struct Session {
    catalog: Catalog,
    sink: Arc<dyn EventSink>,
}

impl Session {
    pub fn new(catalog: Catalog) -> Self {
        let sink = catalog.sink();
        Self { catalog, sink }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Handle one request
    pub async fn handle(&mut self, request: Request) -> Result<Response, SessionError> {
        match request {
            Request::AddItem { title, author, key } => self.add_item(&title, &author, &key).await,
            Request::IssueItem { key } => self.transition(&key, Action::Issue).await,
            Request::ReturnItem { key } => self.transition(&key, Action::Return).await,
            Request::ListAll => Ok(Response::Items(self.list_all())),
            Request::SearchByTitle { text } => Ok(Response::Items(self.search_by_title(&text))),
            Request::SearchByKey { key } => Ok(Response::Items(self.search_by_key(&key))),
            Request::Exit => Ok(self.close().await),
        }
    }

    async fn add_item(
        &mut self,
        title: &str,
        author: &str,
        key: &str,
    ) -> Result<Response, SessionError> {
        let (title, author, key) = (title.trim(), author.trim(), key.trim());
        if title.is_empty() || author.is_empty() || key.is_empty() {
            return Ok(self.reject_input("Item details cannot be empty"));
        }

        let item = Item::new(key, title, author);
        let result = self
            .catalog
            .add(item.clone())
            .await
            .map_err(|source| SessionError::NotPersisted { source })?;

        match result {
            AddResult::Added => {
                self.emit(
                    CatalogEvent::new(EventKind::ItemAdded, format!("Added {}", item)).with_key(key),
                );
                Ok(Response::Added(item))
            }
            AddResult::DuplicateKey(key) => Ok(Response::DuplicateKey { key }),
        }
    }

    async fn transition(&mut self, key: &str, action: Action) -> Result<Response, SessionError> {
        let key = key.trim();
        if key.is_empty() {
            return Ok(self.reject_input("Key cannot be empty"));
        }

        let outcome = match action {
            Action::Issue => self.catalog.issue(key),
            Action::Return => self.catalog.return_item(key),
        };
        let Some((changed, item)) = outcome.map(|(changed, item)| (changed, item.clone())) else {
            self.emit(
                CatalogEvent::new(
                    EventKind::ItemNotFound,
                    format!("Key not found for {} request", action.as_str()),
                )
                .with_key(key),
            );
            return Ok(Response::NotFound {
                key: key.to_string(),
                action,
            });
        };

        if !changed {
            self.emit(
                CatalogEvent::new(
                    EventKind::AlreadyInState,
                    format!("Cannot {}: item is already {}", action.as_str(), item.status()),
                )
                .with_key(key),
            );
            return Ok(Response::AlreadyInState { item, action });
        }

        self.catalog
            .save()
            .await
            .map_err(|source| SessionError::NotPersisted { source })?;

        let (kind, response) = match action {
            Action::Issue => (EventKind::ItemIssued, Response::Issued(item.clone())),
            Action::Return => (EventKind::ItemReturned, Response::Returned(item.clone())),
        };
        self.emit(
            CatalogEvent::new(kind, format!("{} is now {}", item.title(), item.status()))
                .with_key(key),
        );

        Ok(response)
    }

    /// Every item, sorted by title (case-insensitive)
    fn list_all(&self) -> Vec<Item> {
        let mut items = self.catalog.all().to_vec();
        items.sort_by_cached_key(|item| item.title().to_lowercase());
        items
    }

    fn search_by_title(&self, text: &str) -> Vec<Item> {
        let text = text.trim();
        let results: Vec<Item> = if text.is_empty() {
            Vec::new()
        } else {
            self.catalog.find_by_title(text).into_iter().cloned().collect()
        };

        if results.is_empty() {
            self.emit(CatalogEvent::new(
                EventKind::NoResults,
                "No items matched the title search",
            ));
        }
        results
    }

    fn search_by_key(&self, key: &str) -> Vec<Item> {
        let key = key.trim();
        let results: Vec<Item> = self.catalog.find_by_key(key).cloned().into_iter().collect();

        if results.is_empty() {
            self.emit(
                CatalogEvent::new(EventKind::NoResults, "No item matched the key search")
                    .with_key(key),
            );
        }
        results
    }

    /// Final save. A failure is reported but does not stop the exit.
    async fn close(&mut self) -> Response {
        if let Err(e) = self.catalog.save().await {
            self.emit(
                CatalogEvent::new(
                    EventKind::ShutdownSaveFailed,
                    "Failed to save catalog during shutdown",
                )
                .with_error(e),
            );
        }
        self.emit(CatalogEvent::new(EventKind::SessionClosed, "Session closed"));
        Response::Closed
    }

    /// Report unusable input from the front end
    pub fn reject_input(&self, reason: &str) -> Response {
        self.emit(CatalogEvent::new(EventKind::InvalidInput, reason));
        Response::InvalidInput {
            reason: reason.to_string(),
        }
    }

    fn emit(&self, event: CatalogEvent) {
        self.sink.emit(event);
    }
}
