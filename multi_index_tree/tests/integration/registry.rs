/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

//! Tests for tree registration, id assignment, and destruction.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use multi_index_tree::{IndexSpec, KeyFlags, KeyKind, KeyValue, Registry, TreeError};

#[test]
fn ids_are_assigned_smallest_first() {
    let registry: Registry<u64> = Registry::new();

    let a = registry.create_single("a", KeyKind::I32.into(), None).unwrap();
    let b = registry.create_single("b", KeyKind::I32.into(), None).unwrap();
    let c = registry.create_single("c", KeyKind::I32.into(), None).unwrap();

    assert_eq!(a.value(), 0);
    assert_eq!(b.value(), 1);
    assert_eq!(c.value(), 2);
    assert_eq!(registry.len(), 3);
}

#[test]
fn destroyed_ids_are_reused() {
    let registry: Registry<u64> = Registry::new();

    let _a = registry.create_single("a", KeyKind::I32.into(), None).unwrap();
    let b = registry.create_single("b", KeyKind::I32.into(), None).unwrap();
    let _c = registry.create_single("c", KeyKind::I32.into(), None).unwrap();

    registry.destroy(b).unwrap();
    assert_eq!(registry.len(), 2);

    // The gap left by `b` is the smallest unused id.
    let d = registry.create_single("d", KeyKind::I32.into(), None).unwrap();
    assert_eq!(d.value(), 1);

    // With the gap filled, assignment continues past the end.
    let e = registry.create_single("e", KeyKind::I32.into(), None).unwrap();
    assert_eq!(e.value(), 3);
}

// Creating the same name twice: the second attempt fails and the registry
// keeps exactly one tree under that name.
#[test]
fn duplicate_names_are_rejected() {
    let registry: Registry<u64> = Registry::new();

    let first = registry.create_single("orders", KeyKind::U64.into(), None).unwrap();
    let err = registry
        .create_single("orders", KeyKind::U64.into(), None)
        .unwrap_err();

    assert_eq!(err, TreeError::DuplicateName(String::from("orders")));
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.find_by_name("orders"), Some(first));
}

#[test]
fn find_by_name_scans_the_directory() {
    let registry: Registry<u64> = Registry::new();
    let id = registry.create_single("needle", KeyKind::I32.into(), None).unwrap();
    registry.create_single("other", KeyKind::I32.into(), None).unwrap();

    assert_eq!(registry.find_by_name("needle"), Some(id));
    assert_eq!(registry.find_by_name("missing"), None);
}

#[test]
fn stale_ids_are_reported() {
    let registry: Registry<u64> = Registry::new();
    let stale = registry.create_single("gone", KeyKind::I32.into(), None).unwrap();
    registry.destroy(stale).unwrap();

    assert_eq!(
        registry.fetch(stale, 0, &KeyValue::I32(1)).unwrap_err(),
        TreeError::UnknownTree(stale)
    );
    assert_eq!(
        registry.insert(stale, 0, &KeyValue::I32(1), 0).unwrap_err(),
        TreeError::UnknownTree(stale)
    );
    assert_eq!(
        registry.destroy(stale).unwrap_err(),
        TreeError::UnknownTree(stale)
    );
}

#[test]
fn destroy_unregisters_the_tree() {
    let registry: Registry<u64> = Registry::new();
    let id = registry.create_single("ephemeral", KeyKind::I32.into(), None).unwrap();
    registry.insert(id, 0, &KeyValue::I32(1), 10).unwrap();

    registry.destroy(id).unwrap();
    assert_eq!(registry.find_by_name("ephemeral"), None);
    assert!(matches!(
        registry.fetch(id, 0, &KeyValue::I32(1)),
        Err(TreeError::UnknownTree(_))
    ));
}

#[test]
fn destroy_with_overrides_the_index_cleanup() {
    let index_cleanup_calls = Arc::new(AtomicUsize::new(0));
    let override_calls = Arc::new(AtomicUsize::new(0));

    let registry: Registry<u64> = Registry::new();
    let counter = Arc::clone(&index_cleanup_calls);
    let id = registry
        .create_single(
            "overridden",
            KeyKind::U64.into(),
            Some(Arc::new(move |_payload: u64| {
                counter.fetch_add(1, Ordering::Relaxed);
            })),
        )
        .unwrap();

    for k in 0..4 {
        registry.insert(id, 0, &KeyValue::U64(k), k).unwrap();
    }

    let counter = Arc::clone(&override_calls);
    registry
        .destroy_with(
            id,
            Arc::new(move |_payload: u64| {
                counter.fetch_add(1, Ordering::Relaxed);
            }),
        )
        .unwrap();

    assert_eq!(override_calls.load(Ordering::Relaxed), 4);
    assert_eq!(index_cleanup_calls.load(Ordering::Relaxed), 0);
}

#[test]
fn bad_flags_fail_at_creation_time() {
    let registry: Registry<u64> = Registry::new();

    let err = registry
        .create_single("none", KeyFlags::empty(), None)
        .unwrap_err();
    assert!(matches!(err, TreeError::UnrecognizedKeyKind(_)));

    let err = registry
        .create_single("two", KeyKind::I32 | KeyKind::U32, None)
        .unwrap_err();
    assert!(matches!(err, TreeError::UnrecognizedKeyKind(_)));

    // Rejected creations leave no trace.
    assert!(registry.is_empty());
}

#[test]
fn index_count_is_bounded() {
    let registry: Registry<u64> = Registry::new();

    let err = registry.create("zero", &[]).unwrap_err();
    assert_eq!(err, TreeError::InvalidIndexCount { got: 0 });

    let too_many: Vec<IndexSpec<u64>> =
        (0..9).map(|_| IndexSpec::new(KeyKind::I32.into())).collect();
    let err = registry.create("nine", &too_many).unwrap_err();
    assert_eq!(err, TreeError::InvalidIndexCount { got: 9 });
}

#[test]
fn concurrent_creates_assign_unique_ids() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 25;

    let registry: Registry<u64> = Registry::new();
    let mut ids = Vec::new();

    thread::scope(|scope| {
        let mut handles = Vec::new();
        for t in 0..THREADS {
            let registry = &registry;
            handles.push(scope.spawn(move || {
                let mut mine = Vec::new();
                for i in 0..PER_THREAD {
                    let name = format!("tree-{t}-{i}");
                    mine.push(registry.create_single(&name, KeyKind::I32.into(), None).unwrap());
                }
                mine
            }));
        }
        for handle in handles {
            ids.extend(handle.join().unwrap());
        }
    });

    let unique: HashSet<u32> = ids.iter().map(|id| id.value()).collect();
    assert_eq!(unique.len(), THREADS * PER_THREAD);
    assert_eq!(registry.len(), THREADS * PER_THREAD);
}
