/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

//! Write path: descent, height maintenance, and rotations.
//!
//! Insertion descends recursively to an empty child, attaches a node
//! acquired from the pool, and rebalances on the way back up. A single
//! insertion perturbs subtree heights by at most one level, so at most one
//! corrective rotation (possibly compound) fixes the whole path; once it
//! has been applied, the remaining unwind only refreshes heights.

use std::cmp::Ordering;

use super::TreeDescriptor;
use crate::error::TreeError;
use crate::key::{KeyDispatch, KeyValue};
use crate::node::{Entry, TreeNode};
use crate::pool::NodePool;

/// What the unwinding recursion still has to do.
#[derive(Debug, Default, Clone, Copy)]
struct InsertOutcome {
    /// Set once the corrective rotation has been applied; ancestors then
    /// skip their balance checks.
    rebalanced: bool,
}

impl<P> TreeDescriptor<P> {
    /// Insert `key` → `payload` into the given index.
    ///
    /// The key is copied into node-owned storage by the index's copier; the
    /// tree takes ownership of the payload.
    ///
    /// Duplicate keys are rejected: inserting a key that compares equal to
    /// one already in the index returns [`TreeError::DuplicateKey`], leaves
    /// the index unchanged, and drops the offered payload.
    ///
    /// A capped pool that cannot supply a node fails the insert with
    /// [`TreeError::Pool`]; the index is left in its pre-call state.
    pub fn insert(&self, index: usize, key: &KeyValue, payload: P) -> Result<(), TreeError> {
        let idx = self.index(index)?;
        idx.check_key_kind(key)?;

        let mut state = idx.state.write();
        let mut outcome = InsertOutcome::default();
        insert_into(
            &self.pool,
            &idx.dispatch,
            &mut state.root,
            key,
            payload,
            &mut outcome,
        )?;
        state.node_count += 1;
        Ok(())
    }
}

fn insert_into<P>(
    pool: &NodePool<P>,
    dispatch: &KeyDispatch,
    link: &mut Option<Box<TreeNode<P>>>,
    key: &KeyValue,
    payload: P,
    outcome: &mut InsertOutcome,
) -> Result<(), TreeError> {
    let Some(node) = link else {
        let mut node = pool.acquire()?;
        node.entry = Some(Entry {
            key: dispatch.copy(key),
            payload,
        });
        node.height = 1;
        *link = Some(node);
        return Ok(());
    };

    match dispatch.compare(key, node.key()) {
        Ordering::Equal => return Err(TreeError::DuplicateKey),
        Ordering::Less => insert_into(pool, dispatch, &mut node.left, key, payload, outcome)?,
        Ordering::Greater => insert_into(pool, dispatch, &mut node.right, key, payload, outcome)?,
    }

    node.update_height();
    if !outcome.rebalanced {
        rebalance(dispatch, node, key, outcome);
    }
    Ok(())
}

/// Check the balance factor at `node` and apply the corrective rotation if
/// the insertion unbalanced it.
///
/// The rotation case is chosen by comparing the inserted key against the
/// heavy child's key: an insertion into the outer grandchild takes a single
/// rotation, an insertion into the inner grandchild takes the compound one.
fn rebalance<P>(
    dispatch: &KeyDispatch,
    node: &mut Box<TreeNode<P>>,
    inserted: &KeyValue,
    outcome: &mut InsertOutcome,
) {
    let balance = node.balance_factor();
    if balance > 1 {
        let left = node.left.as_deref().expect("a left-heavy node has a left child");
        if dispatch.compare(inserted, left.key()) == Ordering::Less {
            // left-left
            rotate_right(node);
        } else {
            // left-right
            rotate_left(node.left.as_mut().expect("a left-heavy node has a left child"));
            rotate_right(node);
        }
        outcome.rebalanced = true;
    } else if balance < -1 {
        let right = node
            .right
            .as_deref()
            .expect("a right-heavy node has a right child");
        if dispatch.compare(inserted, right.key()) == Ordering::Greater {
            // right-right
            rotate_left(node);
        } else {
            // right-left
            rotate_right(
                node.right
                    .as_mut()
                    .expect("a right-heavy node has a right child"),
            );
            rotate_left(node);
        }
        outcome.rebalanced = true;
    }
}

/// Rotate the subtree left: the right child becomes the subtree root.
///
/// Preserves the in-order key sequence; both touched nodes get their
/// heights refreshed.
fn rotate_left<P>(node: &mut Box<TreeNode<P>>) {
    let mut right = node
        .right
        .take()
        .expect("rotating left requires a right child");
    node.right = right.left.take();
    node.update_height();
    std::mem::swap(node, &mut right);
    node.left = Some(right);
    node.update_height();
}

/// Rotate the subtree right: the left child becomes the subtree root.
fn rotate_right<P>(node: &mut Box<TreeNode<P>>) {
    let mut left = node
        .left
        .take()
        .expect("rotating right requires a left child");
    node.left = left.right.take();
    node.update_height();
    std::mem::swap(node, &mut left);
    node.right = Some(left);
    node.update_height();
}
