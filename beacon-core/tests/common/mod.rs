//! Shared test collaborators.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use beacon_core::clock::Clock;
use beacon_core::device::{DeviceInfoSource, StaticDeviceInfo};
use beacon_core::events::{ChannelObserver, IdentifierBroadcast};
use beacon_core::job::{JobInfo, JobScheduler};
use beacon_core::remotedata::{RemoteDataListener, RemoteDataPayload};

/// Settable clock.
pub struct TestClock {
    now_ms: Mutex<u64>,
}

impl TestClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now_ms: Mutex::new(start_ms),
        }
    }

    pub fn advance(&self, ms: u64) {
        *self.now_ms.lock().unwrap_or_else(PoisonError::into_inner) += ms;
    }
}

impl Clock for TestClock {
    fn now_ms(&self) -> u64 {
        *self.now_ms.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Scheduler that records dispatched jobs instead of running them.
#[derive(Default)]
pub struct TestScheduler {
    jobs: Mutex<Vec<JobInfo>>,
}

impl TestScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatched(&self) -> Vec<JobInfo> {
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn dispatch_count(&self) -> usize {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn clear(&self) {
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl JobScheduler for TestScheduler {
    fn dispatch(&self, job: JobInfo) {
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(job);
    }
}

/// Channel observer counting callbacks.
#[derive(Default)]
pub struct CountingObserver {
    pub created: AtomicUsize,
    pub updated: AtomicUsize,
    pub last_channel_id: Mutex<Option<String>>,
}

impl CountingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn updated_count(&self) -> usize {
        self.updated.load(Ordering::SeqCst)
    }

    pub fn last_id(&self) -> Option<String> {
        self.last_channel_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ChannelObserver for CountingObserver {
    fn on_channel_created(&self, channel_id: &str) {
        self.created.fetch_add(1, Ordering::SeqCst);
        *self
            .last_channel_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(channel_id.to_string());
    }

    fn on_channel_updated(&self, channel_id: &str) {
        self.updated.fetch_add(1, Ordering::SeqCst);
        *self
            .last_channel_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(channel_id.to_string());
    }
}

/// Broadcast hook recording the identifiers it was handed.
#[derive(Default)]
pub struct RecordingBroadcast {
    pub channel_ids: Mutex<Vec<String>>,
}

impl RecordingBroadcast {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn received(&self) -> Vec<String> {
        self.channel_ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl IdentifierBroadcast for RecordingBroadcast {
    fn channel_created(&self, channel_id: &str) {
        self.channel_ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(channel_id.to_string());
    }
}

/// Remote data listener collecting every emission.
#[derive(Default)]
pub struct CollectingListener {
    emissions: Mutex<Vec<Vec<RemoteDataPayload>>>,
}

impl CollectingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emissions(&self) -> Vec<Vec<RemoteDataPayload>> {
        self.emissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn emission_count(&self) -> usize {
        self.emissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl RemoteDataListener for CollectingListener {
    fn on_update(&self, payloads: &[RemoteDataPayload]) {
        self.emissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(payloads.to_vec());
    }
}

/// Device info whose locale can be switched mid-test.
pub struct SwitchableDeviceInfo {
    inner: Mutex<StaticDeviceInfo>,
}

impl SwitchableDeviceInfo {
    pub fn new(info: StaticDeviceInfo) -> Self {
        Self {
            inner: Mutex::new(info),
        }
    }

    pub fn set_language(&self, language: &str) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .language = Some(language.to_string());
    }

    fn inner(&self) -> StaticDeviceInfo {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl DeviceInfoSource for SwitchableDeviceInfo {
    fn platform(&self) -> String {
        self.inner().platform
    }

    fn language(&self) -> Option<String> {
        self.inner().language
    }

    fn country(&self) -> Option<String> {
        self.inner().country
    }

    fn timezone(&self) -> Option<String> {
        self.inner().timezone
    }

    fn app_version(&self) -> Option<String> {
        self.inner().app_version
    }

    fn device_model(&self) -> Option<String> {
        self.inner().device_model
    }

    fn carrier(&self) -> Option<String> {
        self.inner().carrier
    }

    fn manufacturer(&self) -> Option<String> {
        self.inner().manufacturer
    }

    fn delivery_channels(&self) -> Vec<String> {
        self.inner().delivery_channels
    }
}
