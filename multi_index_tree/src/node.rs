/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

//! The tree node record.

use node_pool::PoolItem;

use crate::key::KeyValue;

/// The occupancy of an in-tree node: its key and the caller's payload.
#[derive(Debug)]
pub(crate) struct Entry<P> {
    pub(crate) key: KeyValue,
    pub(crate) payload: P,
}

/// A node of a balanced search tree.
///
/// A node owns its subtrees exclusively. `height` is maintained by the
/// write path: an absent child counts as height 0, so a leaf has height 1
/// and every node satisfies `height == 1 + max(child heights)`.
///
/// A node sitting on the pool's free-list is *vacant*: no entry, no
/// children, height 0. Every node reachable from an index root is occupied.
#[derive(Debug)]
pub(crate) struct TreeNode<P> {
    pub(crate) left: Option<Box<TreeNode<P>>>,
    pub(crate) right: Option<Box<TreeNode<P>>>,
    pub(crate) height: i32,
    pub(crate) entry: Option<Entry<P>>,
}

impl<P> TreeNode<P> {
    pub(crate) fn key(&self) -> &KeyValue {
        &self
            .entry
            .as_ref()
            .expect("an in-tree node always has an entry")
            .key
    }

    pub(crate) fn payload(&self) -> &P {
        &self
            .entry
            .as_ref()
            .expect("an in-tree node always has an entry")
            .payload
    }

    pub(crate) fn child_height(child: &Option<Box<Self>>) -> i32 {
        child.as_deref().map_or(0, |node| node.height)
    }

    pub(crate) fn update_height(&mut self) {
        self.height = Self::child_height(&self.left).max(Self::child_height(&self.right)) + 1;
    }

    /// `height(left) - height(right)`; positive means left-heavy.
    pub(crate) fn balance_factor(&self) -> i32 {
        Self::child_height(&self.left) - Self::child_height(&self.right)
    }
}

impl<P> PoolItem for TreeNode<P> {
    fn vacant() -> Self {
        Self {
            left: None,
            right: None,
            height: 0,
            entry: None,
        }
    }

    fn reclaim(&mut self) {
        self.left = None;
        self.right = None;
        self.height = 0;
        self.entry = None;
    }
}
