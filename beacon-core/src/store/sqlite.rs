// SPDX-FileCopyrightText: 2026 Beacon Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! SQLite-backed key/value store.
//!
//! Values are stored as JSON text in a single `preferences` table. Writes go
//! through `INSERT OR REPLACE`, so each key update is a single atomic
//! statement.

use std::path::Path;
use std::sync::{Mutex, PoisonError};

use rusqlite::{params, Connection, OptionalExtension};

use super::{KeyValueStore, StorageError};

/// Durable store over a local SQLite database.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens or creates a store database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        Self::from_connection(Connection::open(path)?)
    }

    /// Creates an in-memory store (for tests).
    pub fn in_memory() -> Result<Self, StorageError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS preferences (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StorageError> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let text: Option<String> = conn
            .query_row(
                "SELECT value FROM preferences WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        match text {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    fn put(&self, key: &str, value: serde_json::Value) -> Result<(), StorageError> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        conn.execute(
            "INSERT OR REPLACE INTO preferences (key, value) VALUES (?1, ?2)",
            params![key, value.to_string()],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        conn.execute("DELETE FROM preferences WHERE key = ?1", params![key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{get_typed, put_typed};

    #[test]
    fn test_sqlite_store_round_trip() {
        let store = SqliteStore::in_memory().unwrap();

        store.put("key", serde_json::json!(["a", "b"])).unwrap();
        assert_eq!(
            store.get("key").unwrap(),
            Some(serde_json::json!(["a", "b"]))
        );

        store.put("key", serde_json::json!(42)).unwrap();
        assert_eq!(store.get("key").unwrap(), Some(serde_json::json!(42)));

        store.remove("key").unwrap();
        assert!(store.get("key").unwrap().is_none());
    }

    #[test]
    fn test_typed_helpers() {
        let store = SqliteStore::in_memory().unwrap();

        put_typed(&store, "tags", &vec!["news".to_string(), "sports".to_string()]).unwrap();
        let tags: Option<Vec<String>> = get_typed(&store, "tags").unwrap();
        assert_eq!(tags, Some(vec!["news".to_string(), "sports".to_string()]));
    }
}
