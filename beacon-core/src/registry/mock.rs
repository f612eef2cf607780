// SPDX-FileCopyrightText: 2026 Beacon Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Mock registry client for tests.
//!
//! Responses are scripted per operation with `queue_*` and consumed in FIFO
//! order; an empty queue yields a success response. Every call is recorded
//! with its arguments.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use crate::channel::{AttributeMutation, ChannelPayload, TagGroupMutation};
use crate::remotedata::FetchMetadata;

use super::client::RegistryClient;
use super::response::{ChannelResponse, RemoteDataResponse, RequestError};

/// A recorded registry call with its arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    CreateChannel(ChannelPayload),
    UpdateChannel {
        channel_id: String,
        payload: ChannelPayload,
    },
    UploadTags {
        channel_id: String,
        mutations: Vec<TagGroupMutation>,
    },
    UploadAttributes {
        channel_id: String,
        mutations: Vec<AttributeMutation>,
    },
    FetchRemoteData {
        token: Option<String>,
        metadata: FetchMetadata,
    },
}

/// Scripted [`RegistryClient`] that records every call.
#[derive(Default)]
pub struct MockRegistryClient {
    create_responses: Mutex<VecDeque<Result<ChannelResponse, RequestError>>>,
    update_responses: Mutex<VecDeque<Result<ChannelResponse, RequestError>>>,
    tag_responses: Mutex<VecDeque<Result<ChannelResponse, RequestError>>>,
    attribute_responses: Mutex<VecDeque<Result<ChannelResponse, RequestError>>>,
    remote_data_responses: Mutex<VecDeque<Result<RemoteDataResponse, RequestError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockRegistryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response for the next `create_channel` call.
    pub fn queue_create_response(&self, response: Result<ChannelResponse, RequestError>) {
        lock(&self.create_responses).push_back(response);
    }

    /// Queues a response for the next `update_channel` call.
    pub fn queue_update_response(&self, response: Result<ChannelResponse, RequestError>) {
        lock(&self.update_responses).push_back(response);
    }

    /// Queues a response for the next `upload_tag_mutations` call.
    pub fn queue_tag_response(&self, response: Result<ChannelResponse, RequestError>) {
        lock(&self.tag_responses).push_back(response);
    }

    /// Queues a response for the next `upload_attribute_mutations` call.
    pub fn queue_attribute_response(&self, response: Result<ChannelResponse, RequestError>) {
        lock(&self.attribute_responses).push_back(response);
    }

    /// Queues a response for the next `fetch_remote_data` call.
    pub fn queue_remote_data_response(&self, response: Result<RemoteDataResponse, RequestError>) {
        lock(&self.remote_data_responses).push_back(response);
    }

    /// All calls made so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    /// Total number of calls made so far.
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Forgets recorded calls (queued responses are kept).
    pub fn clear_calls(&self) {
        lock(&self.calls).clear();
    }

    fn record(&self, call: RecordedCall) {
        lock(&self.calls).push(call);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RegistryClient for MockRegistryClient {
    fn create_channel(&self, payload: &ChannelPayload) -> Result<ChannelResponse, RequestError> {
        self.record(RecordedCall::CreateChannel(payload.clone()));
        lock(&self.create_responses)
            .pop_front()
            .unwrap_or_else(|| Ok(ChannelResponse::created("mock-channel")))
    }

    fn update_channel(
        &self,
        channel_id: &str,
        payload: &ChannelPayload,
    ) -> Result<ChannelResponse, RequestError> {
        self.record(RecordedCall::UpdateChannel {
            channel_id: channel_id.to_string(),
            payload: payload.clone(),
        });
        lock(&self.update_responses)
            .pop_front()
            .unwrap_or_else(|| Ok(ChannelResponse::ok()))
    }

    fn upload_tag_mutations(
        &self,
        channel_id: &str,
        mutations: &[TagGroupMutation],
    ) -> Result<ChannelResponse, RequestError> {
        self.record(RecordedCall::UploadTags {
            channel_id: channel_id.to_string(),
            mutations: mutations.to_vec(),
        });
        lock(&self.tag_responses)
            .pop_front()
            .unwrap_or_else(|| Ok(ChannelResponse::ok()))
    }

    fn upload_attribute_mutations(
        &self,
        channel_id: &str,
        mutations: &[AttributeMutation],
    ) -> Result<ChannelResponse, RequestError> {
        self.record(RecordedCall::UploadAttributes {
            channel_id: channel_id.to_string(),
            mutations: mutations.to_vec(),
        });
        lock(&self.attribute_responses)
            .pop_front()
            .unwrap_or_else(|| Ok(ChannelResponse::ok()))
    }

    fn fetch_remote_data(
        &self,
        token: Option<&str>,
        metadata: &FetchMetadata,
    ) -> Result<RemoteDataResponse, RequestError> {
        self.record(RecordedCall::FetchRemoteData {
            token: token.map(str::to_string),
            metadata: metadata.clone(),
        });
        lock(&self.remote_data_responses)
            .pop_front()
            .unwrap_or_else(|| {
                Ok(RemoteDataResponse {
                    status: 200,
                    payloads: Vec::new(),
                    last_modified: None,
                })
            })
    }
}
