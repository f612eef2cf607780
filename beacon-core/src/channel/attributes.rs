// SPDX-FileCopyrightText: 2026 Beacon Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Attribute mutations.
//!
//! Attributes are typed profile key/values with last-write-wins semantics:
//! each mutation carries its creation timestamp, and only the most recently
//! timestamped mutation per key survives collapsing.

use serde::{Deserialize, Serialize};

use super::pending::Collapsible;

/// Whether a mutation sets or removes its key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeAction {
    Set,
    Remove,
}

/// A single attribute edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeMutation {
    pub action: AttributeAction,
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    /// Creation time in ms, used for last-write-wins ordering.
    pub timestamp: u64,
}

impl AttributeMutation {
    pub fn set(key: &str, value: serde_json::Value, timestamp: u64) -> Self {
        Self {
            action: AttributeAction::Set,
            key: key.to_string(),
            value: Some(value),
            timestamp,
        }
    }

    pub fn remove(key: &str, timestamp: u64) -> Self {
        Self {
            action: AttributeAction::Remove,
            key: key.to_string(),
            value: None,
            timestamp,
        }
    }
}

/// Keeps only the most recently timestamped mutation per key; equal
/// timestamps resolve to the later arrival. Survivors keep arrival order.
pub fn collapse_attribute_mutations(mutations: Vec<AttributeMutation>) -> Vec<AttributeMutation> {
    let mut latest: Vec<(usize, AttributeMutation)> = Vec::new();

    for (arrival, mutation) in mutations.into_iter().enumerate() {
        match latest.iter_mut().find(|(_, m)| m.key == mutation.key) {
            Some(entry) if entry.1.timestamp <= mutation.timestamp => {
                *entry = (arrival, mutation);
            }
            Some(_) => {}
            None => latest.push((arrival, mutation)),
        }
    }

    latest.sort_by_key(|(arrival, _)| *arrival);
    latest.into_iter().map(|(_, m)| m).collect()
}

impl Collapsible for AttributeMutation {
    fn collapse(mutations: Vec<Self>) -> Vec<Self> {
        collapse_attribute_mutations(mutations)
    }
}
