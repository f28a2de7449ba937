//! Catalog items and their two-state lifecycle.
//!
//! An [`Item`] is one physical unit (a book) identified by a unique key.
//! Its status moves only through [`Item::issue`] and [`Item::return_item`]:
//!
//! ```text
//! Available --issue()--> Issued
//! Issued --return_item()--> Available
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Lifecycle status of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    /// On the shelf, can be issued
    Available,

    /// Lent out, can be returned
    Issued,
}

impl Default for ItemStatus {
    fn default() -> Self {
        Self::Available
    }
}

impl ItemStatus {
    /// Lowercase form used in the durable file
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Available => "available",
            ItemStatus::Issued => "issued",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status text that is neither "available" nor "issued"
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown item status: {0:?}")]
pub struct UnknownStatus(pub String);

impl FromStr for ItemStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "available" => Ok(ItemStatus::Available),
            "issued" => Ok(ItemStatus::Issued),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for ItemStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A single tracked item.
///
/// Fields are private: the key never changes after creation and the status
/// only changes through the lifecycle methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Unique identifier (ISBN for books). Older files call it `isbn`.
    #[serde(alias = "isbn")]
    key: String,

    title: String,

    author: String,

    #[serde(default)]
    status: ItemStatus,
}

impl Item {
    /// Create a new, available item
    pub fn new(
        key: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            author: author.into(),
            status: ItemStatus::Available,
        }
    }

    /// Start from a given status. Production code only gets issued items
    /// through [`Item::issue`] or by decoding a snapshot.
    #[cfg(test)]
    pub(crate) fn with_status(mut self, status: ItemStatus) -> Self {
        self.status = status;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn status(&self) -> ItemStatus {
        self.status
    }

    /// Check if the item is on the shelf
    pub fn is_available(&self) -> bool {
        self.status == ItemStatus::Available
    }

    /// Lend the item out. Returns false (and changes nothing) if it is
    /// already issued.
    pub fn issue(&mut self) -> bool {
        if self.is_available() {
            self.status = ItemStatus::Issued;
            true
        } else {
            false
        }
    }

    /// Take the item back. Returns false (and changes nothing) if it was
    /// not issued.
    pub fn return_item(&mut self) -> bool {
        if self.status == ItemStatus::Issued {
            self.status = ItemStatus::Available;
            true
        } else {
            false
        }
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Title: {} | Author: {} | Key: {} | Status: {}",
            self.title,
            self.author,
            self.key,
            self.status.as_str().to_uppercase()
        )
    }
}
