//! `SQLite`-backed key-value store.

use std::{fs, path::Path};

use rusqlite::{Connection, OptionalExtension};

use super::{KeyValueStore, Result};

const FILE_NAME: &str = "progress.sqlite";

/// Key-value store persisted in `<root>/progress.sqlite`.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) the store under the given root directory.
    ///
    /// The directory is created if it doesn't exist.
    pub fn open(root: &Path) -> Result<Self> {
        fs::create_dir_all(root)?;
        let conn = Connection::open(root.join(FILE_NAME))?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                 key   TEXT PRIMARY KEY NOT NULL,
                 value TEXT NOT NULL
             );",
        )?;
        Ok(Self { conn })
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            [key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    fn test_store() -> (TempDir, SqliteStore) {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::open(&dir.path().join("waymark")).unwrap();
        (dir, store)
    }

    #[test]
    fn set_and_get() {
        let (_dir, store) = test_store();

        store.set("a", "1").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn missing_key_is_none() {
        let (_dir, store) = test_store();
        assert!(store.get("missing").unwrap().is_none());
    }

    #[test]
    fn last_write_wins() {
        let (_dir, store) = test_store();

        store.set("a", "1").unwrap();
        store.set("a", "2").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn remove_is_idempotent() {
        let (_dir, store) = test_store();

        store.set("a", "1").unwrap();
        store.remove("a").unwrap();
        store.remove("a").unwrap();
        assert!(store.get("a").unwrap().is_none());
    }

    #[test]
    fn survives_reopen() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("waymark");

        SqliteStore::open(&root).unwrap().set("a", "kept").unwrap();
        let reopened = SqliteStore::open(&root).unwrap();

        assert_eq!(reopened.get("a").unwrap().as_deref(), Some("kept"));
    }
}
