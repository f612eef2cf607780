// SPDX-FileCopyrightText: 2026 Beacon Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Runtime configuration.

use std::time::Duration;

/// Configuration for a Beacon instance.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Application key used as the basic-auth user for registry calls.
    pub app_key: String,

    /// Application secret used as the basic-auth password.
    pub app_secret: String,

    /// Base URL of the device registry (channel create/update, tag and
    /// attribute uploads).
    pub device_url: String,

    /// Base URL of the remote-data service.
    pub remote_data_url: String,

    /// Defer channel creation until the host explicitly enables it.
    pub channel_creation_delay_enabled: bool,

    /// Emit a system-wide broadcast when a channel identifier becomes
    /// available.
    pub extended_broadcasts_enabled: bool,

    /// Minimum interval between foreground-triggered remote-data refreshes.
    pub foreground_refresh_interval: Duration,

    /// HTTP timeout for registry requests.
    pub request_timeout: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            app_key: String::new(),
            app_secret: String::new(),
            device_url: "https://device.beacon-sdk.io".to_string(),
            remote_data_url: "https://remote-data.beacon-sdk.io".to_string(),
            channel_creation_delay_enabled: false,
            extended_broadcasts_enabled: false,
            foreground_refresh_interval: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl RuntimeConfig {
    /// Creates a config with the given app credentials.
    pub fn new(app_key: impl Into<String>, app_secret: impl Into<String>) -> Self {
        Self {
            app_key: app_key.into(),
            app_secret: app_secret.into(),
            ..Self::default()
        }
    }

    /// Defer channel creation until `enable_channel_creation` is called.
    pub fn with_channel_creation_delay(mut self) -> Self {
        self.channel_creation_delay_enabled = true;
        self
    }

    /// Broadcast the channel identifier system-wide once created.
    pub fn with_extended_broadcasts(mut self) -> Self {
        self.extended_broadcasts_enabled = true;
        self
    }

    /// Override the foreground refresh rate limit.
    pub fn with_foreground_refresh_interval(mut self, interval: Duration) -> Self {
        self.foreground_refresh_interval = interval;
        self
    }
}
