/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

//! Property-based tests for the tree engine using `proptest`.

use std::collections::BTreeMap;
use std::ops::ControlFlow;

use multi_index_tree::{KeyKind, KeyValue, Registry, TreeError};

proptest::proptest! {
    // Inserting any key sequence (duplicates rejected along the way) leaves
    // a tree that satisfies the AVL invariants, walks in ascending order,
    // and answers every fetch with the payload of the first insert.
    #[test]
    fn prop_inserts_preserve_invariants_and_lookups(
        keys in proptest::collection::vec(-2000i64..2000, 1..300)
    ) {
        let registry: Registry<i64> = Registry::new();
        let id = registry.create_single("prop", KeyKind::I64.into(), None).unwrap();
        let descriptor = registry.descriptor(id).unwrap();

        let mut reference = BTreeMap::new();
        for (position, key) in keys.iter().enumerate() {
            let payload = position as i64;
            match registry.insert(id, 0, &KeyValue::I64(*key), payload) {
                Ok(()) => {
                    // First insert of this key wins.
                    reference.insert(*key, payload);
                }
                Err(TreeError::DuplicateKey) => {
                    proptest::prop_assert!(reference.contains_key(key));
                }
                Err(other) => return Err(proptest::test_runner::TestCaseError::fail(other.to_string())),
            }
        }

        descriptor.check_tree_invariants();
        proptest::prop_assert_eq!(descriptor.len(0).unwrap(), reference.len());

        let mut walked = Vec::new();
        descriptor
            .for_each_in_order(0, |key, payload| {
                let KeyValue::I64(k) = key else { unreachable!() };
                walked.push((*k, *payload));
                ControlFlow::Continue(())
            })
            .unwrap();
        let expected: Vec<(i64, i64)> = reference.iter().map(|(k, v)| (*k, *v)).collect();
        proptest::prop_assert_eq!(walked, expected);

        for (key, payload) in &reference {
            proptest::prop_assert_eq!(
                registry.fetch(id, 0, &KeyValue::I64(*key)).unwrap(),
                Some(*payload)
            );
        }
    }

    // The in-order sequence depends only on the key set, not on the order
    // the keys arrived in.
    #[test]
    fn prop_in_order_walk_is_insertion_order_independent(
        keys in proptest::collection::hash_set(0u32..5000, 1..200),
        seed in proptest::prelude::any::<u64>(),
    ) {
        use rand::prelude::*;

        let sorted: Vec<u32> = {
            let mut v: Vec<u32> = keys.iter().copied().collect();
            v.sort_unstable();
            v
        };
        let shuffled: Vec<u32> = {
            let mut v = sorted.clone();
            v.shuffle(&mut StdRng::seed_from_u64(seed));
            v
        };

        let registry: Registry<u32> = Registry::new();
        let a = registry.create_single("ordered", KeyKind::U32.into(), None).unwrap();
        let b = registry.create_single("shuffled", KeyKind::U32.into(), None).unwrap();
        for k in &sorted {
            registry.insert(a, 0, &KeyValue::U32(*k), *k).unwrap();
        }
        for k in &shuffled {
            registry.insert(b, 0, &KeyValue::U32(*k), *k).unwrap();
        }

        let walk = |id| {
            let mut out = Vec::new();
            registry
                .descriptor(id)
                .unwrap()
                .for_each_in_order(0, |key, _| {
                    let KeyValue::U32(k) = key else { unreachable!() };
                    out.push(*k);
                    ControlFlow::Continue(())
                })
                .unwrap();
            out
        };

        proptest::prop_assert_eq!(walk(a), sorted.clone());
        proptest::prop_assert_eq!(walk(b), sorted);
    }
}
