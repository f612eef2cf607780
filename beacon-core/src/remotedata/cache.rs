// SPDX-FileCopyrightText: 2026 Beacon Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Typed payload cache.
//!
//! Holds the latest document per type plus the fetch bookkeeping: the
//! conditional token and the metadata it was obtained under, and the last
//! refresh time used by the foreground rate limit. The document set is
//! replaced wholesale per successful fetch; readers never observe a partial
//! replacement.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::warn;

use crate::store::{get_typed, put_typed, KeyValueStore, StorageError};

use super::payload::{FetchMetadata, RemoteDataPayload};

const PAYLOADS_KEY: &str = "beacon.remotedata.payloads";
const LAST_MODIFIED_KEY: &str = "beacon.remotedata.last_modified";
const LAST_METADATA_KEY: &str = "beacon.remotedata.last_metadata";
const LAST_REFRESH_TIME_KEY: &str = "beacon.remotedata.last_refresh_time";

#[derive(Default)]
struct CacheInner {
    payloads: HashMap<String, RemoteDataPayload>,
    last_modified: Option<String>,
    token_metadata: Option<FetchMetadata>,
    last_refresh_ms: u64,
}

/// Store-backed cache of the latest remote data set.
pub struct PayloadCache {
    store: Arc<dyn KeyValueStore>,
    inner: Mutex<CacheInner>,
}

impl PayloadCache {
    /// Creates a cache over the store, loading any persisted state.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let mut inner = CacheInner::default();

        match get_typed::<Vec<RemoteDataPayload>>(store.as_ref(), PAYLOADS_KEY) {
            Ok(Some(payloads)) => {
                inner.payloads = payloads
                    .into_iter()
                    .map(|p| (p.payload_type.clone(), p))
                    .collect();
            }
            Ok(None) => {}
            Err(e) => warn!("dropping unreadable remote data cache: {e}"),
        }
        inner.last_modified = get_typed(store.as_ref(), LAST_MODIFIED_KEY).ok().flatten();
        inner.token_metadata = get_typed(store.as_ref(), LAST_METADATA_KEY).ok().flatten();
        inner.last_refresh_ms = get_typed(store.as_ref(), LAST_REFRESH_TIME_KEY)
            .ok()
            .flatten()
            .unwrap_or(0);

        Self {
            store,
            inner: Mutex::new(inner),
        }
    }

    /// Latest payload for a type, or the empty sentinel.
    pub fn payload_for_type(&self, payload_type: &str) -> RemoteDataPayload {
        self.lock()
            .payloads
            .get(payload_type)
            .cloned()
            .unwrap_or_else(|| RemoteDataPayload::empty(payload_type))
    }

    /// Latest payloads for each requested type, in request order, with the
    /// empty sentinel standing in for absent types.
    pub fn payloads_for_types(&self, types: &[String]) -> Vec<RemoteDataPayload> {
        let inner = self.lock();
        types
            .iter()
            .map(|t| {
                inner
                    .payloads
                    .get(t)
                    .cloned()
                    .unwrap_or_else(|| RemoteDataPayload::empty(t))
            })
            .collect()
    }

    /// The stored conditional token, if it was obtained under metadata equal
    /// to `current`.
    pub fn conditional_token(&self, current: &FetchMetadata) -> Option<String> {
        let inner = self.lock();
        if inner.token_metadata.as_ref() == Some(current) {
            inner.last_modified.clone()
        } else {
            None
        }
    }

    /// Replaces the cached set, the conditional token, and its origin
    /// metadata in one step, and records the refresh time.
    pub fn replace_all(
        &self,
        payloads: Vec<RemoteDataPayload>,
        last_modified: Option<String>,
        metadata: FetchMetadata,
        now_ms: u64,
    ) -> Result<(), StorageError> {
        let mut inner = self.lock();
        inner.payloads = payloads
            .into_iter()
            .map(|p| (p.payload_type.clone(), p))
            .collect();
        inner.last_modified = last_modified;
        inner.token_metadata = Some(metadata);
        inner.last_refresh_ms = now_ms;

        let payloads: Vec<&RemoteDataPayload> = inner.payloads.values().collect();
        put_typed(self.store.as_ref(), PAYLOADS_KEY, &payloads)?;
        match &inner.last_modified {
            Some(token) => put_typed(self.store.as_ref(), LAST_MODIFIED_KEY, token)?,
            None => self.store.remove(LAST_MODIFIED_KEY)?,
        }
        put_typed(self.store.as_ref(), LAST_METADATA_KEY, &inner.token_metadata)?;
        put_typed(self.store.as_ref(), LAST_REFRESH_TIME_KEY, &now_ms)?;
        Ok(())
    }

    /// Records a refresh without touching the cached set (304 responses).
    pub fn record_refresh(&self, now_ms: u64) -> Result<(), StorageError> {
        self.lock().last_refresh_ms = now_ms;
        put_typed(self.store.as_ref(), LAST_REFRESH_TIME_KEY, &now_ms)
    }

    /// Time of the last successful refresh in ms, 0 if never refreshed.
    pub fn last_refresh_ms(&self) -> u64 {
        self.lock().last_refresh_ms
    }

    /// Drops the conditional token so the next fetch is unconditional.
    pub fn clear_token(&self) -> Result<(), StorageError> {
        let mut inner = self.lock();
        inner.last_modified = None;
        inner.token_metadata = None;
        self.store.remove(LAST_MODIFIED_KEY)?;
        self.store.remove(LAST_METADATA_KEY)
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
