//! Local persistence for trail progress.
//!
//! Progress lives in a single `SQLite` file under the storage root:
//!
//! ```text
//! <root>/
//!   progress.sqlite   # kv table: namespaced key -> JSON value
//! ```
//!
//! The engine never talks to a backend directly. It goes through
//! [`ProgressStore`], which maps trail state onto string keys of any
//! [`KeyValueStore`] and never lets a storage failure reach the caller.

mod memory;
mod progress;
mod sqlite;

use std::{io, path::PathBuf};

pub use memory::MemoryStore;
pub use progress::ProgressStore;
pub use sqlite::SqliteStore;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = core::result::Result<T, StorageError>;

/// A durable string-keyed store. Last write wins; no transactions.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes a key. Idempotent.
    fn remove(&self, key: &str) -> Result<()>;
}

/// Returns the default storage root: `~/.waymark/`.
pub fn default_root() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".waymark"))
}
