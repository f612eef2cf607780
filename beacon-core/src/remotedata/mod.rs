// SPDX-FileCopyrightText: 2026 Beacon Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Remote data.
//!
//! Polls the remote-data service for typed configuration documents and fans
//! them out to subscribers. Fetches are conditional (a stored Last-Modified
//! token, honored only while the fetch metadata it was obtained under is
//! still current), the cached document set is replaced atomically per
//! successful fetch, and each subscription only hears about values that
//! differ from what it last received.

mod cache;
mod engine;
mod payload;

pub use cache::PayloadCache;
pub use engine::{RemoteDataEngine, RemoteDataListener, ACTION_REFRESH};
pub use payload::{FetchMetadata, RemoteDataPayload};
