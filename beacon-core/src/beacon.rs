// SPDX-FileCopyrightText: 2026 Beacon Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Beacon orchestrator.
//!
//! Main entry point for the SDK.

use std::sync::Arc;

use crate::channel::{ChannelRegistrar, ACTION_UPDATE_CHANNEL};
use crate::clock::{Clock, SystemClock};
use crate::config::RuntimeConfig;
use crate::device::DeviceInfoSource;
use crate::job::{JobHandler, JobInfo, JobResult, JobScheduler};
use crate::registry::RegistryClient;
use crate::remotedata::{RemoteDataEngine, ACTION_REFRESH};
use crate::store::KeyValueStore;

/// Explicit context owning both sync engines.
///
/// Constructed once at startup from the host's collaborators and passed by
/// reference wherever it is needed; there is no hidden global instance.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use beacon_core::{Beacon, RuntimeConfig, SqliteStore, StaticDeviceInfo};
/// use beacon_core::registry::HttpRegistryClient;
///
/// let config = RuntimeConfig::new("app-key", "app-secret");
/// let store = Arc::new(SqliteStore::open("beacon.db")?);
/// let client = Arc::new(HttpRegistryClient::new(&config)?);
/// let beacon = Beacon::new(config, store, client, scheduler, device_info);
///
/// // The host scheduler routes jobs back here:
/// let result = beacon.perform_job(&job);
///
/// beacon.start();
/// ```
pub struct Beacon {
    channel: Arc<ChannelRegistrar>,
    remote_data: Arc<RemoteDataEngine>,
}

impl Beacon {
    /// Creates a Beacon instance with the wall clock.
    pub fn new(
        config: RuntimeConfig,
        store: Arc<dyn KeyValueStore>,
        client: Arc<dyn RegistryClient>,
        scheduler: Arc<dyn JobScheduler>,
        device_info: Arc<dyn DeviceInfoSource>,
    ) -> Self {
        Self::with_clock(
            config,
            store,
            client,
            scheduler,
            device_info,
            Arc::new(SystemClock),
        )
    }

    /// Creates a Beacon instance with a custom time source.
    pub fn with_clock(
        config: RuntimeConfig,
        store: Arc<dyn KeyValueStore>,
        client: Arc<dyn RegistryClient>,
        scheduler: Arc<dyn JobScheduler>,
        device_info: Arc<dyn DeviceInfoSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let channel = Arc::new(ChannelRegistrar::new(
            config.clone(),
            store.clone(),
            client.clone(),
            scheduler.clone(),
            clock.clone(),
            device_info.clone(),
        ));
        let remote_data = Arc::new(RemoteDataEngine::new(
            config,
            store,
            client,
            scheduler,
            clock,
            device_info,
        ));

        Self {
            channel,
            remote_data,
        }
    }

    /// Schedules initial registration, unless channel creation is deferred
    /// and no identity exists yet.
    pub fn start(&self) {
        if self.channel.channel_id().is_some() || !self.channel.is_channel_creation_delayed() {
            self.channel.update_registration();
        }
    }

    /// The channel registrar.
    pub fn channel(&self) -> &Arc<ChannelRegistrar> {
        &self.channel
    }

    /// The remote data engine.
    pub fn remote_data(&self) -> &Arc<RemoteDataEngine> {
        &self.remote_data
    }

    /// Routes a scheduler-invoked job to the engine that owns its action.
    pub fn perform_job(&self, job: &JobInfo) -> JobResult {
        match job.action.as_str() {
            ACTION_UPDATE_CHANNEL => self.channel.perform(job),
            ACTION_REFRESH => self.remote_data.perform(job),
            _ => JobResult::Finished,
        }
    }

    /// The application moved to the foreground.
    pub fn on_foreground(&self) {
        self.remote_data.on_foreground();
    }

    /// The device locale changed; both engines refresh.
    pub fn on_locale_changed(&self) {
        self.channel.on_locale_changed();
        self.remote_data.on_locale_changed();
    }

    /// The registry/remote-data URL configuration changed.
    pub fn on_url_config_updated(&self) {
        self.channel.on_url_config_updated();
        self.remote_data.on_url_config_updated();
    }

    /// An incoming push was received.
    pub fn on_push_received(&self, refresh_hint: bool) {
        self.remote_data.on_push_received(refresh_hint);
    }
}
