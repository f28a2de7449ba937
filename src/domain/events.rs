//! Observable events emitted by the catalog and the session.
//!
//! Events are handed to an injected [`EventSink`](crate::core::EventSink)
//! instead of a process-wide logger, so callers decide where they go.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A single observable event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogEvent {
    /// When this event occurred
    pub timestamp: DateTime<Utc>,

    /// Type of event
    pub kind: EventKind,

    /// Human-readable summary
    pub summary: String,

    /// Item key involved (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// Error message for failure kinds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CatalogEvent {
    /// Create a new event with the current timestamp
    pub fn new(kind: EventKind, summary: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
            summary: summary.into(),
            key: None,
            error: None,
        }
    }

    /// Attach the item key this event is about
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Attach an error message
    pub fn with_error(mut self, error: impl ToString) -> Self {
        self.error = Some(error.to_string());
        self
    }
}

/// Types of events the core emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Durable file read and decoded
    CatalogLoaded,

    /// No durable file yet, starting empty
    CatalogMissing,

    /// Durable file could not be decoded, starting empty
    CatalogCorrupt,

    /// Durable file exists but could not be read, starting empty
    CatalogUnreadable,

    /// Snapshot written
    CatalogSaved,

    /// Snapshot could not be written
    SaveFailed,

    /// Insert rejected because the key is taken
    DuplicateKey,

    ItemAdded,
    ItemIssued,
    ItemReturned,

    /// No item with the requested key
    ItemNotFound,

    /// Issue/return on an item already in the target state
    AlreadyInState,

    /// A search matched nothing
    NoResults,

    /// Blank or malformed request input
    InvalidInput,

    /// Session ended after its final save
    SessionClosed,

    /// Final save on exit failed
    ShutdownSaveFailed,
}

/// How loudly an event should be reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl EventKind {
    /// Stable snake_case name
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::CatalogLoaded => "catalog_loaded",
            EventKind::CatalogMissing => "catalog_missing",
            EventKind::CatalogCorrupt => "catalog_corrupt",
            EventKind::CatalogUnreadable => "catalog_unreadable",
            EventKind::CatalogSaved => "catalog_saved",
            EventKind::SaveFailed => "save_failed",
            EventKind::DuplicateKey => "duplicate_key",
            EventKind::ItemAdded => "item_added",
            EventKind::ItemIssued => "item_issued",
            EventKind::ItemReturned => "item_returned",
            EventKind::ItemNotFound => "item_not_found",
            EventKind::AlreadyInState => "already_in_state",
            EventKind::NoResults => "no_results",
            EventKind::InvalidInput => "invalid_input",
            EventKind::SessionClosed => "session_closed",
            EventKind::ShutdownSaveFailed => "shutdown_save_failed",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            EventKind::CatalogCorrupt
            | EventKind::CatalogUnreadable
            | EventKind::SaveFailed
            | EventKind::ShutdownSaveFailed => Severity::Error,
            EventKind::DuplicateKey | EventKind::InvalidInput => Severity::Warn,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
