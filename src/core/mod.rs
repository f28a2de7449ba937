//! Core catalog logic.
//!
//! This module contains:
//! - Store: JSON snapshot file, atomic overwrite, advisory lock
//! - Catalog: in-memory items with unique keys
//! - Session: request/response dispatcher over a catalog
//! - Observer: injected sinks for catalog events

pub mod catalog;
pub mod observer;
pub mod session;
pub mod store;

// Re-export commonly used types
pub use catalog::{AddResult, Catalog};
pub use observer::{EventSink, MemorySink, TracingSink};
pub use session::{Action, Request, Response, Session, SessionError};
pub use store::{CatalogError, CatalogLock, CatalogStore, LoadOutcome};
