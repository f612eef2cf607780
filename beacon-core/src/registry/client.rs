// SPDX-FileCopyrightText: 2026 Beacon Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Registry client trait.

use crate::channel::{AttributeMutation, ChannelPayload, TagGroupMutation};
use crate::remotedata::FetchMetadata;

use super::response::{ChannelResponse, RemoteDataResponse, RequestError};

/// Logical contract against the remote registry.
///
/// Implementations perform one blocking request per call and classify the
/// outcome by HTTP status; an `Err` means no usable response was obtained
/// (always retryable).
pub trait RegistryClient: Send + Sync {
    /// Registers a new channel. A 2xx response carries the assigned
    /// identifier.
    fn create_channel(&self, payload: &ChannelPayload) -> Result<ChannelResponse, RequestError>;

    /// Updates an existing channel registration.
    fn update_channel(
        &self,
        channel_id: &str,
        payload: &ChannelPayload,
    ) -> Result<ChannelResponse, RequestError>;

    /// Uploads a collapsed batch of tag group mutations.
    fn upload_tag_mutations(
        &self,
        channel_id: &str,
        mutations: &[TagGroupMutation],
    ) -> Result<ChannelResponse, RequestError>;

    /// Uploads a collapsed batch of attribute mutations.
    fn upload_attribute_mutations(
        &self,
        channel_id: &str,
        mutations: &[AttributeMutation],
    ) -> Result<ChannelResponse, RequestError>;

    /// Fetches typed documents. `token` is the conditional token from a
    /// previous 200; the returned payloads are tagged with `metadata`.
    fn fetch_remote_data(
        &self,
        token: Option<&str>,
        metadata: &FetchMetadata,
    ) -> Result<RemoteDataResponse, RequestError>;
}
