// SPDX-FileCopyrightText: 2026 Beacon Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tag group mutations.
//!
//! Tags are set-valued labels scoped to a named group. Edits queue as
//! mutations and collapse deterministically before upload: within a group a
//! later add cancels a pending remove of the same value (and vice versa),
//! and a set replaces everything queued before it, with later adds and
//! removes folding into the set.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::pending::Collapsible;

/// An add/remove/set of tags within one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagGroupMutation {
    pub group: String,
    #[serde(flatten)]
    pub op: TagOp,
}

/// The operation a tag mutation performs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagOp {
    Add(BTreeSet<String>),
    Remove(BTreeSet<String>),
    Set(BTreeSet<String>),
}

impl TagGroupMutation {
    pub fn add<I: IntoIterator<Item = String>>(group: &str, tags: I) -> Self {
        Self {
            group: group.to_string(),
            op: TagOp::Add(tags.into_iter().collect()),
        }
    }

    pub fn remove<I: IntoIterator<Item = String>>(group: &str, tags: I) -> Self {
        Self {
            group: group.to_string(),
            op: TagOp::Remove(tags.into_iter().collect()),
        }
    }

    pub fn set<I: IntoIterator<Item = String>>(group: &str, tags: I) -> Self {
        Self {
            group: group.to_string(),
            op: TagOp::Set(tags.into_iter().collect()),
        }
    }

    /// Applies this mutation to a local view of grouped tags.
    pub fn apply(&self, groups: &mut BTreeMap<String, BTreeSet<String>>) {
        match &self.op {
            TagOp::Add(tags) => {
                if !tags.is_empty() {
                    groups
                        .entry(self.group.clone())
                        .or_default()
                        .extend(tags.iter().cloned());
                }
            }
            TagOp::Remove(tags) => {
                if let Some(group) = groups.get_mut(&self.group) {
                    for tag in tags {
                        group.remove(tag);
                    }
                    if group.is_empty() {
                        groups.remove(&self.group);
                    }
                }
            }
            TagOp::Set(tags) => {
                if tags.is_empty() {
                    groups.remove(&self.group);
                } else {
                    groups.insert(self.group.clone(), tags.clone());
                }
            }
        }
    }
}

#[derive(Default)]
struct GroupState {
    set: Option<BTreeSet<String>>,
    adds: BTreeSet<String>,
    removes: BTreeSet<String>,
}

/// Collapses mutations so that applying the result to any starting tag state
/// has the same cumulative effect as applying the originals in FIFO order.
pub fn collapse_tag_mutations(mutations: Vec<TagGroupMutation>) -> Vec<TagGroupMutation> {
    // Group order follows first appearance.
    let mut groups: Vec<(String, GroupState)> = Vec::new();

    for mutation in mutations {
        let index = match groups.iter().position(|(g, _)| *g == mutation.group) {
            Some(index) => index,
            None => {
                groups.push((mutation.group.clone(), GroupState::default()));
                groups.len() - 1
            }
        };
        let state = &mut groups[index].1;

        match mutation.op {
            TagOp::Add(tags) => {
                if let Some(set) = &mut state.set {
                    set.extend(tags);
                } else {
                    for tag in &tags {
                        state.removes.remove(tag);
                    }
                    state.adds.extend(tags);
                }
            }
            TagOp::Remove(tags) => {
                if let Some(set) = &mut state.set {
                    for tag in &tags {
                        set.remove(tag);
                    }
                } else {
                    for tag in &tags {
                        state.adds.remove(tag);
                    }
                    state.removes.extend(tags);
                }
            }
            TagOp::Set(tags) => {
                state.set = Some(tags);
                state.adds.clear();
                state.removes.clear();
            }
        }
    }

    let mut collapsed = Vec::new();
    for (group, state) in groups {
        if let Some(set) = state.set {
            collapsed.push(TagGroupMutation {
                group,
                op: TagOp::Set(set),
            });
            continue;
        }
        if !state.removes.is_empty() {
            collapsed.push(TagGroupMutation {
                group: group.clone(),
                op: TagOp::Remove(state.removes),
            });
        }
        if !state.adds.is_empty() {
            collapsed.push(TagGroupMutation {
                group,
                op: TagOp::Add(state.adds),
            });
        }
    }
    collapsed
}

impl Collapsible for TagGroupMutation {
    fn collapse(mutations: Vec<Self>) -> Vec<Self> {
        collapse_tag_mutations(mutations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_add_cancels_pending_remove() {
        let collapsed = collapse_tag_mutations(vec![
            TagGroupMutation::remove("device", tags(&["news"])),
            TagGroupMutation::add("device", tags(&["news"])),
        ]);

        assert_eq!(
            collapsed,
            vec![TagGroupMutation::add("device", tags(&["news"]))]
        );
    }

    #[test]
    fn test_remove_cancels_pending_add() {
        let collapsed = collapse_tag_mutations(vec![
            TagGroupMutation::add("device", tags(&["news", "sports"])),
            TagGroupMutation::remove("device", tags(&["news"])),
        ]);

        assert_eq!(
            collapsed,
            vec![
                TagGroupMutation::remove("device", tags(&["news"])),
                TagGroupMutation::add("device", tags(&["sports"])),
            ]
        );
    }

    #[test]
    fn test_set_replaces_pending_edits() {
        let collapsed = collapse_tag_mutations(vec![
            TagGroupMutation::add("device", tags(&["news"])),
            TagGroupMutation::remove("device", tags(&["sports"])),
            TagGroupMutation::set("device", tags(&["music"])),
        ]);

        assert_eq!(
            collapsed,
            vec![TagGroupMutation::set("device", tags(&["music"]))]
        );
    }

    #[test]
    fn test_edits_fold_into_pending_set() {
        let collapsed = collapse_tag_mutations(vec![
            TagGroupMutation::set("device", tags(&["music"])),
            TagGroupMutation::add("device", tags(&["news"])),
            TagGroupMutation::remove("device", tags(&["music"])),
        ]);

        assert_eq!(
            collapsed,
            vec![TagGroupMutation::set("device", tags(&["news"]))]
        );
    }

    #[test]
    fn test_groups_collapse_independently() {
        let collapsed = collapse_tag_mutations(vec![
            TagGroupMutation::add("a", tags(&["one"])),
            TagGroupMutation::add("b", tags(&["two"])),
            TagGroupMutation::remove("a", tags(&["one"])),
        ]);

        assert_eq!(
            collapsed,
            vec![
                TagGroupMutation::remove("a", tags(&["one"])),
                TagGroupMutation::add("b", tags(&["two"])),
            ]
        );
    }

    #[test]
    fn test_serde_shape() {
        let mutation = TagGroupMutation::add("device", tags(&["news"]));
        let json = serde_json::to_value(&mutation).unwrap();
        assert_eq!(json, serde_json::json!({"group": "device", "add": ["news"]}));

        let back: TagGroupMutation = serde_json::from_value(json).unwrap();
        assert_eq!(back, mutation);
    }
}
