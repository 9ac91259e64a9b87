/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

//! Tests for per-index tree operations.

use std::ops::ControlFlow;
use std::thread;

use multi_index_tree::{
    IndexSpec, KeyKind, KeyValue, Registry, Timestamp, TreeError,
};
use rand::prelude::*;

fn in_order_keys(registry: &Registry<i64>, id: multi_index_tree::TreeId, index: usize) -> Vec<KeyValue> {
    let descriptor = registry.descriptor(id).unwrap();
    let mut keys = Vec::new();
    descriptor
        .for_each_in_order(index, |key, _| {
            keys.push(key.clone());
            ControlFlow::Continue(())
        })
        .unwrap();
    keys
}

#[test]
fn insert_then_fetch_round_trips() {
    let registry: Registry<i64> = Registry::new();
    let id = registry.create_single("basic", KeyKind::I32.into(), None).unwrap();

    registry.insert(id, 0, &KeyValue::I32(42), 420).unwrap();
    registry.insert(id, 0, &KeyValue::I32(-7), -70).unwrap();

    assert_eq!(registry.fetch(id, 0, &KeyValue::I32(42)).unwrap(), Some(420));
    assert_eq!(registry.fetch(id, 0, &KeyValue::I32(-7)).unwrap(), Some(-70));
    assert_eq!(registry.fetch(id, 0, &KeyValue::I32(0)).unwrap(), None);
}

#[test]
fn duplicate_key_is_rejected_and_tree_unchanged() {
    let registry: Registry<i64> = Registry::new();
    let id = registry.create_single("dups", KeyKind::U64.into(), None).unwrap();
    let descriptor = registry.descriptor(id).unwrap();

    registry.insert(id, 0, &KeyValue::U64(5), 1).unwrap();
    let err = registry.insert(id, 0, &KeyValue::U64(5), 2).unwrap_err();
    assert_eq!(err, TreeError::DuplicateKey);

    // The first payload survives and nothing was added.
    assert_eq!(registry.fetch(id, 0, &KeyValue::U64(5)).unwrap(), Some(1));
    assert_eq!(descriptor.len(0).unwrap(), 1);
    descriptor.check_tree_invariants();
}

#[test]
fn wrong_kind_keys_are_reported_not_misread() {
    let registry: Registry<i64> = Registry::new();
    let id = registry.create_single("typed", KeyKind::I32.into(), None).unwrap();

    let err = registry.insert(id, 0, &KeyValue::U32(1), 0).unwrap_err();
    assert_eq!(
        err,
        TreeError::KeyKindMismatch {
            expected: KeyKind::I32,
            actual: KeyKind::U32,
        }
    );

    registry.insert(id, 0, &KeyValue::I32(1), 0).unwrap();
    let err = registry.fetch(id, 0, &KeyValue::from("1")).unwrap_err();
    assert_eq!(
        err,
        TreeError::KeyKindMismatch {
            expected: KeyKind::I32,
            actual: KeyKind::Str,
        }
    );
}

#[test]
fn unknown_index_is_a_caller_error() {
    let registry: Registry<i64> = Registry::new();
    let id = registry.create_single("narrow", KeyKind::I32.into(), None).unwrap();

    let err = registry.fetch(id, 3, &KeyValue::I32(1)).unwrap_err();
    assert_eq!(err, TreeError::UnknownIndex { index: 3, count: 1 });
}

#[test]
fn in_order_traversal_is_sorted_and_can_stop_early() {
    let registry: Registry<i64> = Registry::new();
    let id = registry.create_single("walk", KeyKind::I64.into(), None).unwrap();

    let mut keys: Vec<i64> = (0..500).collect();
    keys.shuffle(&mut StdRng::seed_from_u64(7));
    for k in &keys {
        registry.insert(id, 0, &KeyValue::I64(*k), *k).unwrap();
    }

    let walked = in_order_keys(&registry, id, 0);
    let expected: Vec<KeyValue> = (0..500).map(KeyValue::I64).collect();
    assert_eq!(walked, expected);

    let descriptor = registry.descriptor(id).unwrap();
    let mut visited = 0;
    descriptor
        .for_each_in_order(0, |_, _| {
            visited += 1;
            if visited == 10 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .unwrap();
    assert_eq!(visited, 10);
}

#[test]
fn ascending_inserts_stay_balanced() {
    let registry: Registry<i64> = Registry::new();
    let id = registry.create_single("worstcase", KeyKind::I32.into(), None).unwrap();
    let descriptor = registry.descriptor(id).unwrap();

    // Ascending keys are the classic unbalanced-BST worst case; rotations
    // must keep the height within the AVL bound (~1.44 * log2(n)).
    for k in 1..=1024 {
        registry.insert(id, 0, &KeyValue::I32(k), i64::from(k)).unwrap();
    }

    descriptor.check_tree_invariants();
    let height = descriptor.height(0).unwrap();
    assert!(height <= 14, "height {height} exceeds the AVL bound for 1024 nodes");
    assert_eq!(descriptor.len(0).unwrap(), 1024);
}

#[test]
fn indices_are_independent_orderings_over_the_same_payloads() {
    let registry: Registry<i64> = Registry::new();
    let id = registry
        .create(
            "two-views",
            &[
                IndexSpec::new(KeyKind::U32.into()),
                IndexSpec::new(KeyKind::Str.into()),
            ],
        )
        .unwrap();

    for (n, name) in [(3u32, "carol"), (1, "alice"), (2, "bob")] {
        registry.insert(id, 0, &KeyValue::U32(n), i64::from(n)).unwrap();
        registry.insert(id, 1, &KeyValue::from(name), i64::from(n)).unwrap();
    }

    assert_eq!(registry.fetch(id, 0, &KeyValue::U32(2)).unwrap(), Some(2));
    assert_eq!(registry.fetch(id, 1, &KeyValue::from("bob")).unwrap(), Some(2));

    // Tearing down one index leaves the other intact.
    let descriptor = registry.descriptor(id).unwrap();
    descriptor.clear(0).unwrap();
    assert_eq!(descriptor.len(0).unwrap(), 0);
    assert_eq!(registry.fetch(id, 0, &KeyValue::U32(2)).unwrap(), None);
    assert_eq!(registry.fetch(id, 1, &KeyValue::from("bob")).unwrap(), Some(2));

    // A cleared index accepts fresh inserts.
    registry.insert(id, 0, &KeyValue::U32(9), 9).unwrap();
    assert_eq!(registry.fetch(id, 0, &KeyValue::U32(9)).unwrap(), Some(9));
}

#[test]
fn timestamp_keys_order_seconds_first() {
    let registry: Registry<i64> = Registry::new();
    let id = registry.create_single("times", KeyKind::Time.into(), None).unwrap();

    let stamps = [
        Timestamp { seconds: 2, micros: 0 },
        Timestamp { seconds: 1, micros: 999_999 },
        Timestamp { seconds: 1, micros: 5 },
        Timestamp { seconds: 3, micros: 1 },
    ];
    for (i, stamp) in stamps.iter().enumerate() {
        registry.insert(id, 0, &KeyValue::Time(*stamp), i as i64).unwrap();
    }

    let walked = in_order_keys(&registry, id, 0);
    let expected = [
        KeyValue::Time(Timestamp { seconds: 1, micros: 5 }),
        KeyValue::Time(Timestamp { seconds: 1, micros: 999_999 }),
        KeyValue::Time(Timestamp { seconds: 2, micros: 0 }),
        KeyValue::Time(Timestamp { seconds: 3, micros: 1 }),
    ];
    assert_eq!(walked, expected);
}

#[test]
fn i128_keys_cover_the_full_range() {
    let registry: Registry<i64> = Registry::new();
    let id = registry.create_single("wide", KeyKind::I128.into(), None).unwrap();

    for (i, k) in [i128::MIN, -1, 0, 1, i128::MAX].iter().enumerate() {
        registry.insert(id, 0, &KeyValue::I128(*k), i as i64).unwrap();
    }

    assert_eq!(registry.fetch(id, 0, &KeyValue::I128(i128::MIN)).unwrap(), Some(0));
    assert_eq!(registry.fetch(id, 0, &KeyValue::I128(i128::MAX)).unwrap(), Some(4));

    let walked = in_order_keys(&registry, id, 0);
    let expected: Vec<KeyValue> = [i128::MIN, -1, 0, 1, i128::MAX]
        .into_iter()
        .map(KeyValue::I128)
        .collect();
    assert_eq!(walked, expected);
}

#[test]
fn concurrent_writers_on_distinct_indices_do_not_interfere() {
    const PER_INDEX: i32 = 2000;

    let registry: Registry<i64> = Registry::new();
    let id = registry
        .create(
            "parallel",
            &[
                IndexSpec::new(KeyKind::I32.into()),
                IndexSpec::new(KeyKind::I32.into()),
            ],
        )
        .unwrap();
    let descriptor = registry.descriptor(id).unwrap();

    thread::scope(|scope| {
        for index in 0..2 {
            let descriptor = &descriptor;
            scope.spawn(move || {
                for k in 0..PER_INDEX {
                    descriptor.insert(index, &KeyValue::I32(k), i64::from(k)).unwrap();
                }
            });
        }
    });

    descriptor.check_tree_invariants();
    assert_eq!(descriptor.len(0).unwrap(), PER_INDEX as usize);
    assert_eq!(descriptor.len(1).unwrap(), PER_INDEX as usize);
}

#[test]
fn concurrent_fetches_share_the_read_lock() {
    let registry: Registry<i64> = Registry::new();
    let id = registry.create_single("readers", KeyKind::I32.into(), None).unwrap();
    for k in 0..1000 {
        registry.insert(id, 0, &KeyValue::I32(k), i64::from(k) * 2).unwrap();
    }
    let descriptor = registry.descriptor(id).unwrap();

    thread::scope(|scope| {
        for _ in 0..8 {
            let descriptor = &descriptor;
            scope.spawn(move || {
                for k in 0..1000 {
                    let hit = descriptor.fetch(0, &KeyValue::I32(k)).unwrap();
                    assert_eq!(hit, Some(i64::from(k) * 2));
                }
            });
        }
    });
}
