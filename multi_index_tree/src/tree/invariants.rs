/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

//! Debug invariant checks for tree indices.
//!
//! Gated behind the `unittest` feature so tests can re-validate structural
//! invariants after mutations without the checks shipping in production
//! builds.

use std::cmp::Ordering;

use super::TreeDescriptor;
use crate::key::{KeyDispatch, KeyValue};
use crate::node::TreeNode;

impl<P> TreeDescriptor<P> {
    /// Walk every index and panic if a stored height, a balance factor, the
    /// BST ordering, or the memoized node count is wrong.
    pub fn check_tree_invariants(&self) {
        for (i, idx) in self.indices.iter().enumerate() {
            let state = idx.state.read();
            let counted = check_node(&idx.dispatch, state.root.as_deref(), None, None);
            assert_eq!(
                counted, state.node_count,
                "index {i}: memoized node_count {} does not match the {counted} reachable nodes",
                state.node_count,
            );
        }
    }
}

/// Recursively check the subtree at `node`, returning its node count.
///
/// `lower`/`upper` are the exclusive key bounds inherited from ancestors.
fn check_node<P>(
    dispatch: &KeyDispatch,
    node: Option<&TreeNode<P>>,
    lower: Option<&KeyValue>,
    upper: Option<&KeyValue>,
) -> usize {
    let Some(node) = node else {
        return 0;
    };

    let left_height = TreeNode::child_height(&node.left);
    let right_height = TreeNode::child_height(&node.right);
    assert_eq!(
        node.height,
        left_height.max(right_height) + 1,
        "stored height {} is inconsistent with child heights (left={left_height}, right={right_height})",
        node.height,
    );
    assert!(
        (left_height - right_height).abs() <= 1,
        "balance factor {} exceeds the AVL bound (left={left_height}, right={right_height})",
        left_height - right_height,
    );

    let key = node.key();
    if let Some(lower) = lower {
        assert_eq!(
            dispatch.compare(lower, key),
            Ordering::Less,
            "BST ordering violated: a key is not greater than its lower bound",
        );
    }
    if let Some(upper) = upper {
        assert_eq!(
            dispatch.compare(key, upper),
            Ordering::Less,
            "BST ordering violated: a key is not less than its upper bound",
        );
    }

    1 + check_node(dispatch, node.left.as_deref(), lower, Some(key))
        + check_node(dispatch, node.right.as_deref(), Some(key), upper)
}
