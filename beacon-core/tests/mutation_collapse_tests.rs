//! Property tests for mutation collapsing.

use std::collections::{BTreeMap, BTreeSet};

use proptest::prelude::*;

use beacon_core::channel::{
    collapse_attribute_mutations, collapse_tag_mutations, AttributeMutation, TagGroupMutation,
    TagOp,
};

fn tag_mutation_strategy() -> impl Strategy<Value = TagGroupMutation> {
    let group = prop::sample::select(vec!["g0", "g1"]);
    let values = prop::collection::btree_set(prop::sample::select(vec!["a", "b", "c"]), 0..=3);

    (group, 0..3u8, values).prop_map(|(group, kind, values)| {
        let values: BTreeSet<String> = values.into_iter().map(str::to_string).collect();
        match kind {
            0 => TagGroupMutation::add(group, values),
            1 => TagGroupMutation::remove(group, values),
            _ => TagGroupMutation::set(group, values),
        }
    })
}

fn attribute_mutation_strategy() -> impl Strategy<Value = AttributeMutation> {
    let key = prop::sample::select(vec!["k0", "k1", "k2"]);

    (key, 0..5u64, any::<bool>(), 0..10u64).prop_map(|(key, timestamp, is_set, value)| {
        if is_set {
            AttributeMutation::set(key, serde_json::json!(value), timestamp)
        } else {
            AttributeMutation::remove(key, timestamp)
        }
    })
}

proptest! {
    /// Applying the collapsed list to an empty tag state yields the same
    /// result as applying every raw edit in arrival order.
    #[test]
    fn collapsed_tag_mutations_preserve_cumulative_effect(
        mutations in prop::collection::vec(tag_mutation_strategy(), 0..24)
    ) {
        let mut raw_result = BTreeMap::new();
        for mutation in &mutations {
            mutation.apply(&mut raw_result);
        }

        let collapsed = collapse_tag_mutations(mutations);
        let mut collapsed_result = BTreeMap::new();
        for mutation in &collapsed {
            mutation.apply(&mut collapsed_result);
        }

        prop_assert_eq!(raw_result, collapsed_result);
    }

    /// A group collapses to a single set, or to at most one remove plus one
    /// add.
    #[test]
    fn collapsed_tag_mutations_are_minimal(
        mutations in prop::collection::vec(tag_mutation_strategy(), 0..24)
    ) {
        let collapsed = collapse_tag_mutations(mutations);
        for group in ["g0", "g1"] {
            let ops: Vec<_> = collapsed.iter().filter(|m| m.group == group).collect();
            prop_assert!(ops.len() <= 2);

            if ops.iter().any(|m| matches!(m.op, TagOp::Set(_))) {
                prop_assert_eq!(ops.len(), 1);
            }
        }
    }

    /// Exactly the most recently timestamped mutation survives per key, with
    /// equal timestamps resolved to the later arrival.
    #[test]
    fn collapsed_attribute_mutations_keep_latest_per_key(
        mutations in prop::collection::vec(attribute_mutation_strategy(), 0..24)
    ) {
        // Independent fold of the expected winner per key.
        let mut winners: BTreeMap<String, AttributeMutation> = BTreeMap::new();
        for mutation in &mutations {
            match winners.get(&mutation.key) {
                Some(current) if current.timestamp > mutation.timestamp => {}
                _ => {
                    winners.insert(mutation.key.clone(), mutation.clone());
                }
            }
        }

        let collapsed = collapse_attribute_mutations(mutations);

        prop_assert_eq!(collapsed.len(), winners.len());
        for survivor in &collapsed {
            prop_assert_eq!(Some(survivor), winners.get(&survivor.key));
        }
    }
}
