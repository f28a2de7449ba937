//! shelfmark - Single-user library catalog manager
//!
//! Keeps a catalog of items (books) that can be added, issued, returned,
//! listed and searched. The catalog lives in memory and is saved as a JSON
//! snapshot after every successful change.
//!
//! # Modules
//!
//! - `domain`: Data structures (Item, ItemStatus, CatalogEvent)
//! - `core`: Catalog, snapshot store, request session, event sinks
//! - `config`: Path and logging configuration
//! - `cli`: Command-line interface and interactive shell
//!
//! # Usage
//!
//! ```bash
//! # Interactive menu
//! shelfmark
//!
//! # One-shot commands
//! shelfmark add "Dune" "Frank Herbert" ISBN1
//! shelfmark issue ISBN1
//! shelfmark list
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use crate::core::{Catalog, CatalogStore, Request, Response, Session, SessionError};
pub use crate::domain::{CatalogEvent, EventKind, Item, ItemStatus};
