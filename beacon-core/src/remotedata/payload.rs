// SPDX-FileCopyrightText: 2026 Beacon Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Remote data payload types.

use serde::{Deserialize, Serialize};

/// Device metadata a fetch request is built from.
///
/// A conditional token obtained under one metadata snapshot is only valid
/// while the current metadata still equals it; any change (locale override,
/// new delivery channel) forces an unconditional fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchMetadata {
    pub sdk_version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub delivery_channels: Vec<String>,
}

/// A typed configuration document.
///
/// Exactly one latest instance exists per type. The empty sentinel
/// (timestamp 0, empty data) stands in for types that were never fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteDataPayload {
    #[serde(rename = "type")]
    pub payload_type: String,

    /// Server-side modification time in ms; monotonic per type.
    pub timestamp: u64,

    pub data: serde_json::Value,

    /// Metadata of the fetch that produced this payload.
    #[serde(default)]
    pub metadata: FetchMetadata,
}

impl RemoteDataPayload {
    pub fn new(
        payload_type: &str,
        timestamp: u64,
        data: serde_json::Value,
        metadata: FetchMetadata,
    ) -> Self {
        Self {
            payload_type: payload_type.to_string(),
            timestamp,
            data,
            metadata,
        }
    }

    /// Sentinel for a type that was never fetched.
    pub fn empty(payload_type: &str) -> Self {
        Self {
            payload_type: payload_type.to_string(),
            timestamp: 0,
            data: serde_json::Value::Object(serde_json::Map::new()),
            metadata: FetchMetadata::default(),
        }
    }

    /// True for the never-fetched sentinel.
    pub fn is_empty(&self) -> bool {
        self.timestamp == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_sentinel() {
        let empty = RemoteDataPayload::empty("config");
        assert!(empty.is_empty());
        assert_eq!(empty, RemoteDataPayload::empty("config"));
        assert_ne!(empty, RemoteDataPayload::empty("other"));
    }

    #[test]
    fn test_metadata_participates_in_equality() {
        let metadata = FetchMetadata {
            sdk_version: "0.1.0".to_string(),
            language: Some("en".to_string()),
            ..FetchMetadata::default()
        };
        let a = RemoteDataPayload::new("config", 10, serde_json::json!({"k": 1}), metadata.clone());
        let b = RemoteDataPayload::new(
            "config",
            10,
            serde_json::json!({"k": 1}),
            FetchMetadata::default(),
        );

        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }
}
