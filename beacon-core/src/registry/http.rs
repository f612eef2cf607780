// SPDX-FileCopyrightText: 2026 Beacon Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! HTTP registry client.
//!
//! Blocking `reqwest` implementation of [`RegistryClient`]. All requests
//! authenticate with the app key/secret; remote-data fetches carry device
//! metadata in the query string and use `If-Modified-Since` /
//! `Last-Modified` as the conditional token.

use reqwest::blocking::Client;

use crate::channel::{AttributeMutation, ChannelPayload, TagGroupMutation};
use crate::config::RuntimeConfig;
use crate::remotedata::{FetchMetadata, RemoteDataPayload};

use super::client::RegistryClient;
use super::response::{is_success, ChannelResponse, RemoteDataResponse, RequestError};

const CHANNEL_PATH: &str = "api/channels";
const TAGS_PATH: &str = "api/channels/tags";
const ATTRIBUTES_PATH: &str = "api/channels/attributes";
const REMOTE_DATA_PATH: &str = "api/remote-data";

/// Manufacturers reported to the remote-data service.
const MANUFACTURERS_ALLOWED: &[&str] = &["huawei"];

/// Registry client over blocking HTTP.
pub struct HttpRegistryClient {
    client: Client,
    device_url: String,
    remote_data_url: String,
    app_key: String,
    app_secret: String,
}

#[derive(serde::Deserialize)]
struct CreateBody {
    channel_id: String,
}

#[derive(serde::Deserialize)]
struct RemoteDataBody {
    payloads: Vec<WirePayload>,
}

#[derive(serde::Deserialize)]
struct WirePayload {
    #[serde(rename = "type")]
    payload_type: String,
    timestamp: u64,
    #[serde(default = "empty_data")]
    data: serde_json::Value,
}

fn empty_data() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

impl HttpRegistryClient {
    /// Creates a client from the runtime config.
    pub fn new(config: &RuntimeConfig) -> Result<Self, RequestError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(format!("Beacon/{}", crate::SDK_VERSION))
            .build()?;

        Ok(Self {
            client,
            device_url: config.device_url.trim_end_matches('/').to_string(),
            remote_data_url: config.remote_data_url.trim_end_matches('/').to_string(),
            app_key: config.app_key.clone(),
            app_secret: config.app_secret.clone(),
        })
    }

    fn channel_status(&self, response: reqwest::blocking::Response) -> ChannelResponse {
        ChannelResponse {
            status: response.status().as_u16(),
            channel_id: None,
        }
    }
}

impl RegistryClient for HttpRegistryClient {
    fn create_channel(&self, payload: &ChannelPayload) -> Result<ChannelResponse, RequestError> {
        let url = format!("{}/{}/", self.device_url, CHANNEL_PATH);
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.app_key, Some(&self.app_secret))
            .json(payload)
            .send()?;

        let status = response.status().as_u16();
        if !is_success(status) {
            return Ok(ChannelResponse {
                status,
                channel_id: None,
            });
        }

        let body: CreateBody = response
            .json()
            .map_err(|e| RequestError::Malformed(format!("creation response: {e}")))?;

        Ok(ChannelResponse {
            status,
            channel_id: Some(body.channel_id),
        })
    }

    fn update_channel(
        &self,
        channel_id: &str,
        payload: &ChannelPayload,
    ) -> Result<ChannelResponse, RequestError> {
        let url = format!("{}/{}/{}", self.device_url, CHANNEL_PATH, channel_id);
        let response = self
            .client
            .put(&url)
            .basic_auth(&self.app_key, Some(&self.app_secret))
            .json(payload)
            .send()?;

        Ok(self.channel_status(response))
    }

    fn upload_tag_mutations(
        &self,
        channel_id: &str,
        mutations: &[TagGroupMutation],
    ) -> Result<ChannelResponse, RequestError> {
        let url = format!("{}/{}/", self.device_url, TAGS_PATH);
        let body = serde_json::json!({
            "audience": { "channel_id": channel_id },
            "tags": mutations,
        });

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.app_key, Some(&self.app_secret))
            .json(&body)
            .send()?;

        Ok(self.channel_status(response))
    }

    fn upload_attribute_mutations(
        &self,
        channel_id: &str,
        mutations: &[AttributeMutation],
    ) -> Result<ChannelResponse, RequestError> {
        let url = format!("{}/{}/{}", self.device_url, ATTRIBUTES_PATH, channel_id);
        let body = serde_json::json!({ "attributes": mutations });

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.app_key, Some(&self.app_secret))
            .json(&body)
            .send()?;

        Ok(self.channel_status(response))
    }

    fn fetch_remote_data(
        &self,
        token: Option<&str>,
        metadata: &FetchMetadata,
    ) -> Result<RemoteDataResponse, RequestError> {
        let url = format!("{}/{}/{}", self.remote_data_url, REMOTE_DATA_PATH, self.app_key);

        let mut query: Vec<(&str, String)> =
            vec![("sdk_version", metadata.sdk_version.clone())];
        if let Some(language) = &metadata.language {
            query.push(("language", language.clone()));
        }
        if let Some(country) = &metadata.country {
            query.push(("country", country.clone()));
        }
        if let Some(manufacturer) = &metadata.manufacturer {
            if MANUFACTURERS_ALLOWED.contains(&manufacturer.to_lowercase().as_str()) {
                query.push(("manufacturer", manufacturer.clone()));
            }
        }
        if !metadata.delivery_channels.is_empty() {
            query.push(("delivery_channels", metadata.delivery_channels.join(",")));
        }

        let mut request = self
            .client
            .get(&url)
            .basic_auth(&self.app_key, Some(&self.app_secret))
            .query(&query);

        if let Some(token) = token {
            request = request.header(reqwest::header::IF_MODIFIED_SINCE, token);
        }

        let response = request.send()?;
        let status = response.status().as_u16();

        if !is_success(status) {
            return Ok(RemoteDataResponse {
                status,
                payloads: Vec::new(),
                last_modified: None,
            });
        }

        let last_modified = response
            .headers()
            .get(reqwest::header::LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body: RemoteDataBody = response
            .json()
            .map_err(|e| RequestError::Malformed(format!("remote-data response: {e}")))?;

        let payloads = body
            .payloads
            .into_iter()
            .map(|wire| RemoteDataPayload {
                payload_type: wire.payload_type,
                timestamp: wire.timestamp,
                data: wire.data,
                metadata: metadata.clone(),
            })
            .collect();

        Ok(RemoteDataResponse {
            status,
            payloads,
            last_modified,
        })
    }
}
