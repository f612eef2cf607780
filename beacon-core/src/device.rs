// SPDX-FileCopyrightText: 2026 Beacon Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Platform device information.
//!
//! Registration payloads and remote-data fetch metadata are built from
//! whatever the platform reports at the time of the attempt. Hosts implement
//! [`DeviceInfoSource`] against their platform APIs; [`StaticDeviceInfo`] is
//! a fixed-value implementation for tests and simple hosts.

/// Platform-agnostic source of device and locale information.
pub trait DeviceInfoSource: Send + Sync {
    /// Platform identifier sent as the payload device type (e.g. "android").
    fn platform(&self) -> String;

    /// ISO 639 two-letter language code, if known.
    fn language(&self) -> Option<String>;

    /// ISO 3166 two-letter country code, if known.
    fn country(&self) -> Option<String>;

    /// Olson timezone identifier, if known.
    fn timezone(&self) -> Option<String>;

    /// Host application version.
    fn app_version(&self) -> Option<String>;

    /// Device model name.
    fn device_model(&self) -> Option<String>;

    /// Mobile carrier name, if any.
    fn carrier(&self) -> Option<String>;

    /// Device manufacturer, lowercased.
    fn manufacturer(&self) -> Option<String>;

    /// Delivery channels available on this device (e.g. push transports).
    fn delivery_channels(&self) -> Vec<String>;
}

/// Fixed-value device info for tests and hosts without platform lookups.
#[derive(Debug, Clone, Default)]
pub struct StaticDeviceInfo {
    pub platform: String,
    pub language: Option<String>,
    pub country: Option<String>,
    pub timezone: Option<String>,
    pub app_version: Option<String>,
    pub device_model: Option<String>,
    pub carrier: Option<String>,
    pub manufacturer: Option<String>,
    pub delivery_channels: Vec<String>,
}

impl StaticDeviceInfo {
    /// A minimal android device reporting only a platform and locale.
    pub fn android(language: &str, country: &str) -> Self {
        Self {
            platform: "android".to_string(),
            language: Some(language.to_string()),
            country: Some(country.to_string()),
            ..Self::default()
        }
    }
}

impl DeviceInfoSource for StaticDeviceInfo {
    fn platform(&self) -> String {
        self.platform.clone()
    }

    fn language(&self) -> Option<String> {
        self.language.clone()
    }

    fn country(&self) -> Option<String> {
        self.country.clone()
    }

    fn timezone(&self) -> Option<String> {
        self.timezone.clone()
    }

    fn app_version(&self) -> Option<String> {
        self.app_version.clone()
    }

    fn device_model(&self) -> Option<String> {
        self.device_model.clone()
    }

    fn carrier(&self) -> Option<String> {
        self.carrier.clone()
    }

    fn manufacturer(&self) -> Option<String> {
        self.manufacturer.clone()
    }

    fn delivery_channels(&self) -> Vec<String> {
        self.delivery_channels.clone()
    }
}
