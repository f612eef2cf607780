// SPDX-FileCopyrightText: 2026 Beacon Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Channel registrar.
//!
//! State machine reconciling the local channel identity and profile with the
//! remote registry. One scheduler-driven sync operation drives everything:
//! it creates the channel when none exists, updates it when the payload
//! changed or went stale, recovers from registration conflicts by recreating
//! the channel, and uploads pending tag/attribute mutations afterwards.
//! Every invocation is a fresh idempotent attempt against persisted state.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::clock::Clock;
use crate::config::RuntimeConfig;
use crate::device::DeviceInfoSource;
use crate::events::{ChannelObserver, EventDispatcher, IdentifierBroadcast};
use crate::job::{JobHandler, JobInfo, JobResult, JobScheduler};
use crate::registry::{ChannelResponse, RegistryClient, RequestError};
use crate::store::{get_typed, put_typed, KeyValueStore, StorageError};

use super::attributes::AttributeMutation;
use super::payload::ChannelPayload;
use super::pending::{Collapsible, PendingMutations};
use super::tags::TagGroupMutation;

/// Job action handled by the registrar.
pub const ACTION_UPDATE_CHANNEL: &str = "beacon.channel.update";

// Store keys
const CHANNEL_ID_KEY: &str = "beacon.channel.id";
const TAGS_KEY: &str = "beacon.channel.tags";
const LAST_PAYLOAD_KEY: &str = "beacon.channel.last_registration_payload";
const LAST_REGISTRATION_TIME_KEY: &str = "beacon.channel.last_registration_time";
const PENDING_TAG_MUTATIONS_KEY: &str = "beacon.channel.pending_tag_mutations";
const PENDING_ATTRIBUTE_MUTATIONS_KEY: &str = "beacon.channel.pending_attribute_mutations";

/// Max time between registration updates.
const REREGISTRATION_INTERVAL_MS: u64 = 24 * 60 * 60 * 1000;

/// Tags longer than this are dropped on edit.
const MAX_TAG_LENGTH: usize = 127;

/// Observable registration state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationState {
    /// No channel identity exists.
    Unregistered,
    /// A creation attempt is in flight.
    Creating,
    /// A channel identity exists and matches the last accepted payload.
    Registered,
    /// An update attempt is in flight.
    Updating,
}

/// Contributes extension fields to every registration payload.
///
/// Feature modules register one of these instead of being discovered; the
/// registrar calls every extender each time it builds a payload.
pub trait PayloadExtender: Send + Sync {
    fn extend(&self, payload: &mut ChannelPayload);
}

/// Reconciles local channel state with the remote registry.
pub struct ChannelRegistrar {
    config: RuntimeConfig,
    store: Arc<dyn KeyValueStore>,
    client: Arc<dyn RegistryClient>,
    scheduler: Arc<dyn JobScheduler>,
    clock: Arc<dyn Clock>,
    device_info: Arc<dyn DeviceInfoSource>,
    events: EventDispatcher,
    broadcast: RwLock<Option<Arc<dyn IdentifierBroadcast>>>,
    extenders: RwLock<Vec<Arc<dyn PayloadExtender>>>,
    pending_tags: PendingMutations<TagGroupMutation>,
    pending_attributes: PendingMutations<AttributeMutation>,
    creation_delay_enabled: AtomicBool,
    data_collection_enabled: AtomicBool,
    state: Mutex<RegistrationState>,
    // Serializes sync attempts; concurrent jobs coalesce at the scheduler.
    sync_lock: Mutex<()>,
}

impl ChannelRegistrar {
    pub fn new(
        config: RuntimeConfig,
        store: Arc<dyn KeyValueStore>,
        client: Arc<dyn RegistryClient>,
        scheduler: Arc<dyn JobScheduler>,
        clock: Arc<dyn Clock>,
        device_info: Arc<dyn DeviceInfoSource>,
    ) -> Self {
        let channel_id: Option<String> = get_typed(store.as_ref(), CHANNEL_ID_KEY)
            .ok()
            .flatten();
        let creation_delay = channel_id.is_none() && config.channel_creation_delay_enabled;
        let state = if channel_id.is_some() {
            RegistrationState::Registered
        } else {
            RegistrationState::Unregistered
        };

        Self {
            pending_tags: PendingMutations::new(store.clone(), PENDING_TAG_MUTATIONS_KEY),
            pending_attributes: PendingMutations::new(
                store.clone(),
                PENDING_ATTRIBUTE_MUTATIONS_KEY,
            ),
            config,
            store,
            client,
            scheduler,
            clock,
            device_info,
            events: EventDispatcher::new(),
            broadcast: RwLock::new(None),
            extenders: RwLock::new(Vec::new()),
            creation_delay_enabled: AtomicBool::new(creation_delay),
            data_collection_enabled: AtomicBool::new(true),
            state: Mutex::new(state),
            sync_lock: Mutex::new(()),
        }
    }

    /// The channel identifier, or `None` until first successful creation.
    pub fn channel_id(&self) -> Option<String> {
        get_typed(self.store.as_ref(), CHANNEL_ID_KEY).ok().flatten()
    }

    /// Current registration state.
    pub fn registration_state(&self) -> RegistrationState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a channel lifecycle observer.
    pub fn add_observer(&self, observer: Arc<dyn ChannelObserver>) {
        self.events.add_observer(observer);
    }

    /// Installs the system-wide broadcast hook used when extended broadcasts
    /// are enabled.
    pub fn set_identifier_broadcast(&self, broadcast: Arc<dyn IdentifierBroadcast>) {
        *self
            .broadcast
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(broadcast);
    }

    /// Registers a payload extender.
    pub fn add_payload_extender(&self, extender: Arc<dyn PayloadExtender>) {
        self.extenders
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(extender);
    }

    /// Current channel tags.
    pub fn tags(&self) -> BTreeSet<String> {
        get_typed(self.store.as_ref(), TAGS_KEY)
            .ok()
            .flatten()
            .unwrap_or_default()
    }

    /// Replaces the channel tags and schedules a registration update.
    pub fn set_tags(&self, tags: BTreeSet<String>) -> Result<(), StorageError> {
        if !self.data_collection_enabled.load(Ordering::SeqCst) {
            warn!("unable to set tags, data collection is disabled");
            return Ok(());
        }

        put_typed(self.store.as_ref(), TAGS_KEY, &normalize_tags(tags))?;
        self.dispatch_update_job(false);
        Ok(())
    }

    /// Enqueues tag group mutations and schedules a registration update.
    pub fn apply_tag_group_mutations(
        &self,
        mutations: Vec<TagGroupMutation>,
    ) -> Result<(), StorageError> {
        if !self.data_collection_enabled.load(Ordering::SeqCst) {
            warn!("unable to apply tag group edits, data collection is disabled");
            return Ok(());
        }
        if mutations.is_empty() {
            return Ok(());
        }

        for mutation in mutations {
            self.pending_tags.enqueue(mutation)?;
        }
        self.dispatch_update_job(false);
        Ok(())
    }

    /// Enqueues attribute mutations and schedules a registration update.
    pub fn apply_attribute_mutations(
        &self,
        mutations: Vec<AttributeMutation>,
    ) -> Result<(), StorageError> {
        if !self.data_collection_enabled.load(Ordering::SeqCst) {
            warn!("unable to apply attribute edits, data collection is disabled");
            return Ok(());
        }
        if mutations.is_empty() {
            return Ok(());
        }

        for mutation in mutations {
            self.pending_attributes.enqueue(mutation)?;
        }
        self.dispatch_update_job(false);
        Ok(())
    }

    /// Sets an attribute, stamped with the current time.
    pub fn set_attribute(
        &self,
        key: &str,
        value: serde_json::Value,
    ) -> Result<(), StorageError> {
        self.apply_attribute_mutations(vec![AttributeMutation::set(
            key,
            value,
            self.clock.now_ms(),
        )])
    }

    /// Removes an attribute, stamped with the current time.
    pub fn remove_attribute(&self, key: &str) -> Result<(), StorageError> {
        self.apply_attribute_mutations(vec![AttributeMutation::remove(key, self.clock.now_ms())])
    }

    /// Pending tag mutations, collapsed.
    pub fn pending_tag_mutations(&self) -> Vec<TagGroupMutation> {
        self.pending_tags.peek_collapsed()
    }

    /// Pending attribute mutations, collapsed.
    pub fn pending_attribute_mutations(&self) -> Vec<AttributeMutation> {
        self.pending_attributes.peek_collapsed()
    }

    /// Whether channel creation is currently deferred pending
    /// [`enable_channel_creation`](Self::enable_channel_creation).
    pub fn is_channel_creation_delayed(&self) -> bool {
        self.creation_delay_enabled.load(Ordering::SeqCst)
    }

    /// Lifts the creation-delay gate and schedules registration.
    pub fn enable_channel_creation(&self) {
        if self.creation_delay_enabled.swap(false, Ordering::SeqCst) {
            self.dispatch_update_job(false);
        }
    }

    /// Schedules a registration update.
    pub fn update_registration(&self) {
        self.dispatch_update_job(false);
    }

    /// The device locale changed; registration payloads pick it up on the
    /// next cycle.
    pub fn on_locale_changed(&self) {
        self.dispatch_update_job(false);
    }

    /// The registry URL configuration changed; performs a full update (or
    /// creates the channel if none exists yet).
    pub fn on_url_config_updated(&self) {
        self.dispatch_update_job(true);
    }

    /// Toggles data collection. Disabling clears tags and all pending
    /// mutations; either way a registration update is scheduled.
    pub fn set_data_collection_enabled(&self, enabled: bool) -> Result<(), StorageError> {
        self.data_collection_enabled.store(enabled, Ordering::SeqCst);
        if !enabled {
            self.store.remove(TAGS_KEY)?;
            self.pending_tags.clear()?;
            self.pending_attributes.clear()?;
        }
        self.dispatch_update_job(false);
        Ok(())
    }

    fn dispatch_update_job(&self, force_full_update: bool) {
        let mut job = JobInfo::new(ACTION_UPDATE_CHANNEL).requires_network();
        if force_full_update {
            job = job.force_full_update();
        }
        self.scheduler.dispatch(job);
    }

    /// Builds the next registration payload from device state, tags, and
    /// registered extenders.
    fn next_payload(&self) -> ChannelPayload {
        let data_collection = self.data_collection_enabled.load(Ordering::SeqCst);

        let mut payload = ChannelPayload {
            device_type: Some(self.device_info.platform()),
            set_tags: true,
            tags: Some(self.tags()),
            timezone: self.device_info.timezone(),
            language: self.device_info.language(),
            country: self.device_info.country(),
            app_version: self.device_info.app_version(),
            sdk_version: Some(crate::SDK_VERSION.to_string()),
            device_model: if data_collection {
                self.device_info.device_model()
            } else {
                None
            },
            carrier: if data_collection {
                self.device_info.carrier()
            } else {
                None
            },
            extensions: Default::default(),
        };

        for extender in self
            .extenders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
        {
            extender.extend(&mut payload);
        }

        payload
    }

    fn should_update_registration(&self, payload: &ChannelPayload) -> bool {
        let last_payload = match self.last_payload() {
            Some(last) => last,
            None => {
                debug!("should update registration: no last payload");
                return true;
            }
        };

        let elapsed = self
            .clock
            .now_ms()
            .saturating_sub(self.last_registration_time());
        if elapsed >= REREGISTRATION_INTERVAL_MS {
            debug!("should update registration: last success over 24h ago");
            return true;
        }

        if *payload != last_payload {
            debug!("should update registration: payload changed");
            return true;
        }

        false
    }

    fn create_channel(&self) -> JobResult {
        self.set_state(RegistrationState::Creating);
        let payload = self.next_payload();

        let response = match self.client.create_channel(&payload) {
            Ok(response) => response,
            Err(e) => {
                debug!("channel registration failed, will retry: {e}");
                self.set_state(RegistrationState::Unregistered);
                return JobResult::Retry;
            }
        };

        if response.is_success() {
            let channel_id = match response.channel_id {
                Some(id) => id,
                None => {
                    warn!("channel creation response carried no identifier, will retry");
                    self.set_state(RegistrationState::Unregistered);
                    return JobResult::Retry;
                }
            };

            info!("channel created: {channel_id}");
            self.store_put(CHANNEL_ID_KEY, &channel_id);
            self.set_last_payload(&payload);
            self.set_state(RegistrationState::Registered);
            self.events.notify_created(&channel_id);

            if self.config.extended_broadcasts_enabled {
                let broadcast = self
                    .broadcast
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .clone();
                if let Some(broadcast) = broadcast {
                    broadcast.channel_created(&channel_id);
                }
            }

            return JobResult::Finished;
        }

        self.set_state(RegistrationState::Unregistered);
        if response.is_retryable() {
            debug!(
                "channel registration failed with status {}, will retry",
                response.status
            );
            return JobResult::Retry;
        }

        debug!("channel registration failed with status {}", response.status);
        JobResult::Finished
    }

    fn update_channel(&self, channel_id: &str, force_full_update: bool) -> JobResult {
        let payload = self.next_payload();
        if !force_full_update && !self.should_update_registration(&payload) {
            debug!("channel already up to date");
            return JobResult::Finished;
        }

        self.set_state(RegistrationState::Updating);

        let update_payload = if force_full_update {
            payload.clone()
        } else {
            payload.minimized(self.last_payload().as_ref())
        };

        let response = match self.client.update_channel(channel_id, &update_payload) {
            Ok(response) => response,
            Err(e) => {
                debug!("channel registration failed, will retry: {e}");
                self.set_state(RegistrationState::Registered);
                return JobResult::Retry;
            }
        };

        if response.is_success() {
            info!("channel updated: {channel_id}");
            // The full payload is the comparison base for future diffs, not
            // the minimized body that went over the wire.
            self.set_last_payload(&payload);
            self.set_state(RegistrationState::Registered);
            self.events.notify_updated(channel_id);
            return JobResult::Finished;
        }

        if response.is_retryable() {
            debug!(
                "channel registration failed with status {}, will retry",
                response.status
            );
            self.set_state(RegistrationState::Registered);
            return JobResult::Retry;
        }

        if response.is_conflict() {
            debug!("channel registration conflict, clearing identity and recreating");
            self.store_remove(LAST_PAYLOAD_KEY);
            self.store_remove(LAST_REGISTRATION_TIME_KEY);
            self.store_remove(CHANNEL_ID_KEY);
            self.set_state(RegistrationState::Unregistered);
            return self.create_channel();
        }

        debug!("channel registration failed with status {}", response.status);
        self.set_state(RegistrationState::Registered);
        JobResult::Finished
    }

    /// Uploads both mutation queues. Registration state is never rolled
    /// back on failure; the cycle reports retry instead.
    fn upload_pending_mutations(&self, channel_id: &str) -> bool {
        let tags_ok = self.upload_batch("tag", &self.pending_tags, |batch| {
            self.client.upload_tag_mutations(channel_id, batch)
        });
        let attributes_ok = self.upload_batch("attribute", &self.pending_attributes, |batch| {
            self.client.upload_attribute_mutations(channel_id, batch)
        });
        tags_ok && attributes_ok
    }

    fn upload_batch<M, F>(&self, kind: &str, queue: &PendingMutations<M>, send: F) -> bool
    where
        M: Collapsible + Clone + PartialEq + Serialize + DeserializeOwned,
        F: FnOnce(&[M]) -> Result<ChannelResponse, RequestError>,
    {
        let snapshot = queue.peek_collapsed();
        if snapshot.is_empty() {
            return true;
        }

        let response = match send(&snapshot) {
            Ok(response) => response,
            Err(e) => {
                debug!("{kind} mutation upload failed, will retry: {e}");
                return false;
            }
        };

        if response.is_success() {
            debug!("uploaded {} {kind} mutation(s)", snapshot.len());
        } else if response.is_retryable() {
            debug!(
                "{kind} mutation upload failed with status {}, will retry",
                response.status
            );
            return false;
        } else {
            warn!(
                "{kind} mutation upload failed with status {}, discarding batch",
                response.status
            );
        }

        if let Err(e) = queue.commit(&snapshot) {
            warn!("failed to commit uploaded {kind} mutations: {e}");
        }
        true
    }

    fn last_payload(&self) -> Option<ChannelPayload> {
        match get_typed(self.store.as_ref(), LAST_PAYLOAD_KEY) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("failed to read last registration payload: {e}");
                None
            }
        }
    }

    fn set_last_payload(&self, payload: &ChannelPayload) {
        self.store_put(LAST_PAYLOAD_KEY, payload);
        self.store_put(LAST_REGISTRATION_TIME_KEY, &self.clock.now_ms());
    }

    fn last_registration_time(&self) -> u64 {
        let time: u64 = get_typed(self.store.as_ref(), LAST_REGISTRATION_TIME_KEY)
            .ok()
            .flatten()
            .unwrap_or(0);

        // A timestamp in the future means the clock moved backwards.
        if time > self.clock.now_ms() {
            debug!("resetting last registration time");
            self.store_put(LAST_REGISTRATION_TIME_KEY, &0u64);
            return 0;
        }

        time
    }

    fn set_state(&self, state: RegistrationState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    fn store_put<T: Serialize>(&self, key: &str, value: &T) {
        if let Err(e) = put_typed(self.store.as_ref(), key, value) {
            warn!("failed to persist {key}: {e}");
        }
    }

    fn store_remove(&self, key: &str) {
        if let Err(e) = self.store.remove(key) {
            warn!("failed to remove {key}: {e}");
        }
    }
}

impl JobHandler for ChannelRegistrar {
    fn perform(&self, job: &JobInfo) -> JobResult {
        if job.action != ACTION_UPDATE_CHANNEL {
            return JobResult::Finished;
        }

        let _sync = self.sync_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let channel_id = self.channel_id();
        if channel_id.is_none() && self.creation_delay_enabled.load(Ordering::SeqCst) {
            debug!("channel registration is currently disabled");
            return JobResult::Finished;
        }

        let result = match &channel_id {
            None => self.create_channel(),
            Some(id) => self.update_channel(id, job.force_full_update),
        };
        if result != JobResult::Finished {
            return result;
        }

        // Registration may have just assigned (or replaced) the identity.
        match self.channel_id() {
            Some(id) => {
                if self.upload_pending_mutations(&id) {
                    JobResult::Finished
                } else {
                    JobResult::Retry
                }
            }
            None => JobResult::Finished,
        }
    }
}

fn normalize_tags(tags: BTreeSet<String>) -> BTreeSet<String> {
    tags.into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| {
            if tag.is_empty() || tag.len() > MAX_TAG_LENGTH {
                warn!("ignoring invalid tag of length {}", tag.len());
                false
            } else {
                true
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_tags() {
        let tags: BTreeSet<String> = [
            "  news ".to_string(),
            "".to_string(),
            "   ".to_string(),
            "x".repeat(200),
            "ok".to_string(),
        ]
        .into();

        let normalized = normalize_tags(tags);
        assert_eq!(
            normalized,
            ["news".to_string(), "ok".to_string()].into()
        );
    }
}
