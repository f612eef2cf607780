// SPDX-FileCopyrightText: 2026 Beacon Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Remote data engine.
//!
//! Owns the typed payload cache, turns application signals (foreground,
//! locale change, push hint, URL config change) into coalesced refresh jobs,
//! performs the conditional fetch, and distributes changed values to
//! subscribers.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use log::{debug, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::config::RuntimeConfig;
use crate::device::DeviceInfoSource;
use crate::job::{JobHandler, JobInfo, JobResult, JobScheduler};
use crate::registry::RegistryClient;
use crate::store::KeyValueStore;

use super::cache::PayloadCache;
use super::payload::{FetchMetadata, RemoteDataPayload};

/// Job action handled by the remote data engine.
pub const ACTION_REFRESH: &str = "beacon.remotedata.refresh";

/// Receives changed remote data values for one subscription.
pub trait RemoteDataListener: Send + Sync {
    /// Called with the current value per subscribed type, in subscription
    /// order. Absent types appear as the empty sentinel.
    fn on_update(&self, payloads: &[RemoteDataPayload]);
}

struct Subscription {
    id: Uuid,
    types: Vec<String>,
    listener: Arc<dyn RemoteDataListener>,
    /// The value(s) last delivered to this subscription; emission happens
    /// only when the observed value(s) differ.
    last_emitted: Mutex<Option<Vec<RemoteDataPayload>>>,
}

/// Fetches typed documents and distributes changes to subscribers.
pub struct RemoteDataEngine {
    config: RuntimeConfig,
    cache: PayloadCache,
    client: Arc<dyn RegistryClient>,
    scheduler: Arc<dyn JobScheduler>,
    clock: Arc<dyn Clock>,
    device_info: Arc<dyn DeviceInfoSource>,
    subscriptions: RwLock<Vec<Arc<Subscription>>>,
    // Serializes refresh attempts; concurrent jobs coalesce at the scheduler.
    sync_lock: Mutex<()>,
}

impl RemoteDataEngine {
    pub fn new(
        config: RuntimeConfig,
        store: Arc<dyn KeyValueStore>,
        client: Arc<dyn RegistryClient>,
        scheduler: Arc<dyn JobScheduler>,
        clock: Arc<dyn Clock>,
        device_info: Arc<dyn DeviceInfoSource>,
    ) -> Self {
        Self {
            config,
            cache: PayloadCache::new(store),
            client,
            scheduler,
            clock,
            device_info,
            subscriptions: RwLock::new(Vec::new()),
            sync_lock: Mutex::new(()),
        }
    }

    /// Subscribes a listener to one or more payload types. The current
    /// value(s) are delivered immediately; afterwards the listener only
    /// hears values that differ from its previous delivery.
    pub fn subscribe(
        &self,
        types: Vec<String>,
        listener: Arc<dyn RemoteDataListener>,
    ) -> Uuid {
        let subscription = Arc::new(Subscription {
            id: Uuid::new_v4(),
            types,
            listener,
            last_emitted: Mutex::new(None),
        });

        self.subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(subscription.clone());

        self.evaluate(&subscription);
        subscription.id
    }

    /// Removes a subscription. Returns false if the id is unknown.
    pub fn unsubscribe(&self, id: Uuid) -> bool {
        let mut subscriptions = self
            .subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = subscriptions.len();
        subscriptions.retain(|s| s.id != id);
        subscriptions.len() != before
    }

    /// Latest cached payload for a type, or the empty sentinel.
    pub fn payload_for_type(&self, payload_type: &str) -> RemoteDataPayload {
        self.cache.payload_for_type(payload_type)
    }

    /// The application moved to the foreground. Rate-limited by the
    /// configured minimum refresh interval.
    pub fn on_foreground(&self) {
        let interval = self.config.foreground_refresh_interval.as_millis() as u64;
        let elapsed = self
            .clock
            .now_ms()
            .saturating_sub(self.cache.last_refresh_ms());
        if elapsed >= interval {
            self.dispatch_refresh();
        } else {
            debug!("skipping remote data refresh, within rate limit");
        }
    }

    /// The device locale changed; the cached token no longer matches the
    /// fetch metadata, so the next fetch is effectively unconditional.
    pub fn on_locale_changed(&self) {
        self.dispatch_refresh();
    }

    /// An incoming push may carry a remote-data refresh hint.
    pub fn on_push_received(&self, refresh_hint: bool) {
        if refresh_hint {
            self.dispatch_refresh();
        }
    }

    /// The remote-data URL configuration changed. Drops the conditional
    /// token and refreshes unconditionally.
    pub fn on_url_config_updated(&self) {
        if let Err(e) = self.cache.clear_token() {
            warn!("failed to clear remote data token: {e}");
        }
        self.dispatch_refresh();
    }

    fn dispatch_refresh(&self) {
        self.scheduler
            .dispatch(JobInfo::new(ACTION_REFRESH).requires_network());
    }

    fn current_metadata(&self) -> FetchMetadata {
        let mut delivery_channels = self.device_info.delivery_channels();
        delivery_channels.sort();

        FetchMetadata {
            sdk_version: crate::SDK_VERSION.to_string(),
            language: self.device_info.language(),
            country: self.device_info.country(),
            manufacturer: self.device_info.manufacturer(),
            delivery_channels,
        }
    }

    fn on_refresh(&self) -> JobResult {
        let _sync = self.sync_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let metadata = self.current_metadata();
        let token = self.cache.conditional_token(&metadata);

        let response = match self.client.fetch_remote_data(token.as_deref(), &metadata) {
            Ok(response) => response,
            Err(e) => {
                debug!("remote data fetch failed, will retry: {e}");
                return JobResult::Retry;
            }
        };

        if response.is_not_modified() {
            debug!("remote data unchanged");
            if let Err(e) = self.cache.record_refresh(self.clock.now_ms()) {
                warn!("failed to record remote data refresh: {e}");
            }
            return JobResult::Finished;
        }

        if response.is_success() {
            debug!("remote data refreshed, {} payload(s)", response.payloads.len());
            if let Err(e) = self.cache.replace_all(
                response.payloads,
                response.last_modified,
                metadata,
                self.clock.now_ms(),
            ) {
                warn!("failed to persist remote data cache: {e}");
            }
            self.notify_all();
            return JobResult::Finished;
        }

        if response.is_retryable() {
            debug!(
                "remote data fetch failed with status {}, will retry",
                response.status
            );
            return JobResult::Retry;
        }

        debug!("remote data fetch failed with status {}", response.status);
        JobResult::Finished
    }

    fn notify_all(&self) {
        let subscriptions: Vec<Arc<Subscription>> = self
            .subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for subscription in subscriptions {
            self.evaluate(&subscription);
        }
    }

    /// Emits to one subscription if the observed value(s) differ from the
    /// value(s) last delivered to it.
    fn evaluate(&self, subscription: &Subscription) {
        let current = self.cache.payloads_for_types(&subscription.types);

        let mut last = subscription
            .last_emitted
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if last.as_ref() == Some(&current) {
            return;
        }
        *last = Some(current.clone());
        drop(last);

        subscription.listener.on_update(&current);
    }
}

impl JobHandler for RemoteDataEngine {
    fn perform(&self, job: &JobInfo) -> JobResult {
        if job.action != ACTION_REFRESH {
            return JobResult::Finished;
        }
        self.on_refresh()
    }
}
