//! Domain types for the catalog.
//!
//! - Item: one tracked unit with a key and a lifecycle status
//! - Events: observable records of what the core did

pub mod events;
pub mod item;

// Re-export commonly used types
pub use events::{CatalogEvent, EventKind, Severity};
pub use item::{Item, ItemStatus, UnknownStatus};
