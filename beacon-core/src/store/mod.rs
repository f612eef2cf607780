// SPDX-FileCopyrightText: 2026 Beacon Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Persistent key/value store.
//!
//! The synchronization core treats persistence as an external collaborator:
//! a typed key/value store with atomic per-key writes. [`SqliteStore`] is the
//! provided durable implementation; [`MemoryStore`] backs tests and
//! ephemeral hosts.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Key/value persistence collaborator. Each key is written atomically.
pub trait KeyValueStore: Send + Sync {
    /// Reads the JSON value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StorageError>;

    /// Writes `value` under `key`, replacing any previous value.
    fn put(&self, key: &str, value: serde_json::Value) -> Result<(), StorageError>;

    /// Removes `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Reads and deserializes a typed value.
pub fn get_typed<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    match store.get(key)? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

/// Serializes and writes a typed value.
pub fn put_typed<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    store.put(key, serde_json::to_value(value)?)
}

/// Storage error types.
#[derive(Debug, Error)]
pub enum StorageError {
    /// SQLite error.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Stored value could not be serialized or deserialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
