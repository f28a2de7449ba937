//! Event sinks.
//!
//! The catalog and the session report what they did through an
//! `Arc<dyn EventSink>` handed to them at construction.

use std::sync::{Arc, Mutex};

use tracing::{error, info, warn};

use crate::domain::{CatalogEvent, EventKind, Severity};

/// Receiver for catalog events
pub trait EventSink: Send + Sync {
    fn emit(&self, event: CatalogEvent);
}

/// Forwards events to `tracing`, at a level chosen by the event kind
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TracingSink {
    pub fn shared() -> Arc<dyn EventSink> {
        Arc::new(Self)
    }
}

impl EventSink for TracingSink {
    fn emit(&self, event: CatalogEvent) {
        let kind = event.kind.as_str();
        let key = event.key.as_deref().unwrap_or("-");
        let error = event.error.as_deref().unwrap_or("");

        match event.kind.severity() {
            Severity::Info => info!(event = kind, key, "{}", event.summary),
            Severity::Warn => warn!(event = kind, key, "{}", event.summary),
            Severity::Error => error!(event = kind, key, error, "{}", event.summary),
        }
    }
}

/// Keeps every event in memory (used by tests)
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<CatalogEvent>>,
}

impl MemorySink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Snapshot of everything emitted so far
    pub fn events(&self) -> Vec<CatalogEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Kinds emitted so far, in order
    pub fn kinds(&self) -> Vec<EventKind> {
        self.events().into_iter().map(|e| e.kind).collect()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.events().iter().filter(|e| e.kind == kind).count()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: CatalogEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
