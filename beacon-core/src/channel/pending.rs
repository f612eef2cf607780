// SPDX-FileCopyrightText: 2026 Beacon Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Pending mutation queue.
//!
//! Uncommitted local edits live here until a registration cycle uploads
//! them. The queue keeps its entries collapsed at all times, persists them
//! through the key/value store, and commits an uploaded snapshot without
//! touching mutations enqueued while the upload was in flight.

use std::sync::{Arc, Mutex, PoisonError};

use log::warn;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::store::{get_typed, put_typed, KeyValueStore, StorageError};

/// Mutation kinds that collapse deterministically.
pub trait Collapsible: Sized {
    /// Collapses `mutations` preserving the cumulative effect of FIFO
    /// application.
    fn collapse(mutations: Vec<Self>) -> Vec<Self>;
}

/// Store-backed queue of uncommitted mutations for one scope.
///
/// The store key is the scope: channel and named-user queues coexist under
/// different keys. Each queue carries its own mutex; edits may arrive from
/// arbitrary caller contexts.
pub struct PendingMutations<M> {
    store: Arc<dyn KeyValueStore>,
    key: String,
    entries: Mutex<Vec<M>>,
}

impl<M> PendingMutations<M>
where
    M: Collapsible + Clone + PartialEq + Serialize + DeserializeOwned,
{
    /// Creates a queue over the given store key, loading any persisted
    /// entries. Unreadable persisted state is dropped with a warning.
    pub fn new(store: Arc<dyn KeyValueStore>, key: &str) -> Self {
        let entries = match get_typed::<Vec<M>>(store.as_ref(), key) {
            Ok(Some(entries)) => entries,
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("dropping unreadable pending mutations under {key}: {e}");
                Vec::new()
            }
        };

        Self {
            store,
            key: key.to_string(),
            entries: Mutex::new(entries),
        }
    }

    /// Appends a mutation and re-collapses the queue.
    pub fn enqueue(&self, mutation: M) -> Result<(), StorageError> {
        let mut entries = self.lock();
        entries.push(mutation);
        let collapsed = M::collapse(std::mem::take(&mut *entries));
        *entries = collapsed;
        self.persist(&entries)
    }

    /// Snapshot of the collapsed entries, without removing them.
    pub fn peek_collapsed(&self) -> Vec<M> {
        self.lock().clone()
    }

    /// Removes exactly the entries of a previously peeked snapshot (first
    /// occurrence each). Mutations enqueued after the peek are preserved,
    /// including ones that collapsed with snapshot entries in the meantime.
    pub fn commit(&self, snapshot: &[M]) -> Result<(), StorageError> {
        let mut entries = self.lock();
        for uploaded in snapshot {
            if let Some(position) = entries.iter().position(|e| e == uploaded) {
                entries.remove(position);
            }
        }
        self.persist(&entries)
    }

    /// Drops all entries. Used on identity loss and consent withdrawal.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.lock().clear();
        self.store.remove(&self.key)
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<M>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, entries: &[M]) -> Result<(), StorageError> {
        if entries.is_empty() {
            self.store.remove(&self.key)
        } else {
            put_typed(self.store.as_ref(), &self.key, &entries.to_vec())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::TagGroupMutation;
    use crate::store::MemoryStore;

    fn tags(values: &[&str]) -> std::collections::BTreeSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_enqueue_collapses() {
        let store = Arc::new(MemoryStore::new());
        let queue: PendingMutations<TagGroupMutation> =
            PendingMutations::new(store, "test.pending");

        queue
            .enqueue(TagGroupMutation::add("device", tags(&["news"])))
            .unwrap();
        queue
            .enqueue(TagGroupMutation::add("device", tags(&["sports"])))
            .unwrap();

        assert_eq!(
            queue.peek_collapsed(),
            vec![TagGroupMutation::add("device", tags(&["news", "sports"]))]
        );
    }

    #[test]
    fn test_commit_preserves_concurrent_enqueues() {
        let store = Arc::new(MemoryStore::new());
        let queue: PendingMutations<TagGroupMutation> =
            PendingMutations::new(store, "test.pending");

        queue
            .enqueue(TagGroupMutation::add("device", tags(&["news"])))
            .unwrap();
        let snapshot = queue.peek_collapsed();

        // Arrives while the snapshot is being uploaded.
        queue
            .enqueue(TagGroupMutation::add("other", tags(&["late"])))
            .unwrap();

        queue.commit(&snapshot).unwrap();

        assert_eq!(
            queue.peek_collapsed(),
            vec![TagGroupMutation::add("other", tags(&["late"]))]
        );
    }

    #[test]
    fn test_queue_reloads_from_store() {
        let store = Arc::new(MemoryStore::new());
        {
            let queue: PendingMutations<TagGroupMutation> =
                PendingMutations::new(store.clone(), "test.pending");
            queue
                .enqueue(TagGroupMutation::add("device", tags(&["news"])))
                .unwrap();
        }

        let reloaded: PendingMutations<TagGroupMutation> =
            PendingMutations::new(store, "test.pending");
        assert_eq!(reloaded.len(), 1);
        assert_eq!(
            reloaded.peek_collapsed(),
            vec![TagGroupMutation::add("device", tags(&["news"]))]
        );
    }

    #[test]
    fn test_clear_wipes_entries_and_store() {
        let store = Arc::new(MemoryStore::new());
        let queue: PendingMutations<TagGroupMutation> =
            PendingMutations::new(store.clone(), "test.pending");

        queue
            .enqueue(TagGroupMutation::add("device", tags(&["news"])))
            .unwrap();
        queue.clear().unwrap();

        assert!(queue.is_empty());
        let reloaded: PendingMutations<TagGroupMutation> =
            PendingMutations::new(store, "test.pending");
        assert!(reloaded.is_empty());
    }
}
