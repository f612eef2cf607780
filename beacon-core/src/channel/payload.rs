// SPDX-FileCopyrightText: 2026 Beacon Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Channel registration payload.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Snapshot of the device/profile fields sent on registration.
///
/// Field-level equality against the last accepted payload decides whether a
/// registration update is needed at all, and [`minimized`](Self::minimized)
/// reduces the update body to the fields that changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,

    /// Whether `tags` is authoritative for this registration.
    #[serde(default)]
    pub set_tags: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeSet<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdk_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrier: Option<String>,

    /// Extension fields contributed by registered payload extenders.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: BTreeMap<String, serde_json::Value>,
}

impl ChannelPayload {
    /// Returns a payload reduced to the fields that differ from `last`, the
    /// last payload the server accepted. With no previous payload the full
    /// payload is returned.
    pub fn minimized(&self, last: Option<&ChannelPayload>) -> ChannelPayload {
        let last = match last {
            Some(last) => last,
            None => return self.clone(),
        };

        let mut minimized = self.clone();

        if minimized.set_tags && last.set_tags && minimized.tags == last.tags {
            minimized.set_tags = false;
            minimized.tags = None;
        }

        minimized.device_type = changed(&self.device_type, &last.device_type);
        minimized.timezone = changed(&self.timezone, &last.timezone);
        minimized.language = changed(&self.language, &last.language);
        minimized.country = changed(&self.country, &last.country);
        minimized.app_version = changed(&self.app_version, &last.app_version);
        minimized.sdk_version = changed(&self.sdk_version, &last.sdk_version);
        minimized.device_model = changed(&self.device_model, &last.device_model);
        minimized.carrier = changed(&self.carrier, &last.carrier);

        minimized
            .extensions
            .retain(|key, value| last.extensions.get(key) != Some(value));

        minimized
    }
}

fn changed(current: &Option<String>, last: &Option<String>) -> Option<String> {
    if current == last {
        None
    } else {
        current.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> ChannelPayload {
        ChannelPayload {
            device_type: Some("android".to_string()),
            set_tags: true,
            tags: Some(["news".to_string()].into()),
            timezone: Some("Europe/Zurich".to_string()),
            language: Some("de".to_string()),
            country: Some("CH".to_string()),
            app_version: Some("3.1.0".to_string()),
            sdk_version: Some("0.1.0".to_string()),
            device_model: Some("Pixel 9".to_string()),
            carrier: Some("Swisscom".to_string()),
            extensions: [("push_address".to_string(), serde_json::json!("token-1"))].into(),
        }
    }

    #[test]
    fn test_minimized_without_last_is_full() {
        let full = payload();
        assert_eq!(full.minimized(None), full);
    }

    #[test]
    fn test_minimized_drops_unchanged_fields() {
        let last = payload();
        let mut current = payload();
        current.language = Some("fr".to_string());

        let minimized = current.minimized(Some(&last));

        assert_eq!(minimized.language, Some("fr".to_string()));
        assert_eq!(minimized.timezone, None);
        assert_eq!(minimized.app_version, None);
        assert_eq!(minimized.carrier, None);
        assert!(!minimized.set_tags);
        assert_eq!(minimized.tags, None);
        assert!(minimized.extensions.is_empty());
    }

    #[test]
    fn test_minimized_keeps_changed_tags() {
        let last = payload();
        let mut current = payload();
        current.tags = Some(["news".to_string(), "sports".to_string()].into());

        let minimized = current.minimized(Some(&last));

        assert!(minimized.set_tags);
        assert_eq!(minimized.tags, current.tags);
    }

    #[test]
    fn test_minimized_keeps_new_and_changed_extensions() {
        let last = payload();
        let mut current = payload();
        current
            .extensions
            .insert("partner_device_id".to_string(), serde_json::json!("a-1"));

        let minimized = current.minimized(Some(&last));

        assert_eq!(minimized.extensions.len(), 1);
        assert_eq!(
            minimized.extensions.get("partner_device_id"),
            Some(&serde_json::json!("a-1"))
        );
    }

    #[test]
    fn test_payload_equality_detects_change() {
        let a = payload();
        let mut b = payload();
        assert_eq!(a, b);

        b.timezone = Some("Europe/Paris".to_string());
        assert_ne!(a, b);
    }
}
