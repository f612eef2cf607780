// SPDX-FileCopyrightText: 2026 Beacon Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Response types and status classification.
//!
//! Status classes: 2xx success; 409 conflict (registration only); 429 and
//! 5xx retryable; any other 4xx terminal.

use thiserror::Error;

use crate::remotedata::RemoteDataPayload;

/// Response to a channel create/update or mutation upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelResponse {
    /// HTTP status code.
    pub status: u16,

    /// Server-assigned channel identifier (creation responses only).
    pub channel_id: Option<String>,
}

impl ChannelResponse {
    /// Success response without an identifier.
    pub fn ok() -> Self {
        Self {
            status: 200,
            channel_id: None,
        }
    }

    /// Creation response carrying a new identifier.
    pub fn created(channel_id: &str) -> Self {
        Self {
            status: 201,
            channel_id: Some(channel_id.to_string()),
        }
    }

    /// Failure response with the given status.
    pub fn error(status: u16) -> Self {
        Self {
            status,
            channel_id: None,
        }
    }

    pub fn is_success(&self) -> bool {
        is_success(self.status)
    }

    pub fn is_retryable(&self) -> bool {
        is_retryable(self.status)
    }

    pub fn is_conflict(&self) -> bool {
        self.status == 409
    }
}

/// Response to a remote-data fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteDataResponse {
    /// HTTP status code (200, 304, or an error status).
    pub status: u16,

    /// Parsed documents, tagged with the metadata the fetch was built from.
    /// Empty unless `status` is 200.
    pub payloads: Vec<RemoteDataPayload>,

    /// Conditional token for the next fetch (Last-Modified marker).
    pub last_modified: Option<String>,
}

impl RemoteDataResponse {
    /// 304 Not Modified response.
    pub fn not_modified() -> Self {
        Self {
            status: 304,
            payloads: Vec::new(),
            last_modified: None,
        }
    }

    /// Failure response with the given status.
    pub fn error(status: u16) -> Self {
        Self {
            status,
            payloads: Vec::new(),
            last_modified: None,
        }
    }

    pub fn is_success(&self) -> bool {
        is_success(self.status)
    }

    pub fn is_not_modified(&self) -> bool {
        self.status == 304
    }

    pub fn is_retryable(&self) -> bool {
        is_retryable(self.status)
    }
}

pub(crate) fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

pub(crate) fn is_retryable(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

/// A request that produced no usable response. Always retryable.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The request never reached the server or the connection dropped.
    #[error("transport error: {0}")]
    Transport(String),

    /// HTTP stack failure.
    #[cfg(feature = "http-client")]
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server replied 2xx but the body could not be interpreted.
    #[error("malformed response: {0}")]
    Malformed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(ChannelResponse::ok().is_success());
        assert!(ChannelResponse::created("id").is_success());
        assert!(!ChannelResponse::error(400).is_success());

        assert!(ChannelResponse::error(429).is_retryable());
        assert!(ChannelResponse::error(500).is_retryable());
        assert!(ChannelResponse::error(503).is_retryable());
        assert!(!ChannelResponse::error(400).is_retryable());
        assert!(!ChannelResponse::error(404).is_retryable());

        assert!(ChannelResponse::error(409).is_conflict());
        assert!(!ChannelResponse::error(409).is_retryable());
    }

    #[test]
    fn test_remote_data_classification() {
        assert!(RemoteDataResponse::not_modified().is_not_modified());
        assert!(!RemoteDataResponse::not_modified().is_success());
        assert!(RemoteDataResponse::error(502).is_retryable());
        assert!(!RemoteDataResponse::error(404).is_retryable());
    }
}
