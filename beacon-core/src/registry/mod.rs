// SPDX-FileCopyrightText: 2026 Beacon Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Registry transport.
//!
//! [`RegistryClient`] is the logical contract against the remote registry:
//! channel create/update, tag and attribute batch uploads, and typed-document
//! fetches. [`HttpRegistryClient`] is the provided implementation over
//! `reqwest`; [`MockRegistryClient`] records calls and replays scripted
//! responses for tests.

mod client;
#[cfg(feature = "http-client")]
mod http;
mod mock;
mod response;

pub use client::RegistryClient;
#[cfg(feature = "http-client")]
pub use http::HttpRegistryClient;
pub use mock::{MockRegistryClient, RecordedCall};
pub use response::{ChannelResponse, RemoteDataResponse, RequestError};
