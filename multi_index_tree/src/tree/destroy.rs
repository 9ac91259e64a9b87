/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

//! Teardown: post-order release of an index's nodes back to the pool.
//!
//! Every node's payload is handed to the index's cleanup (or dropped, the
//! default release) exactly once, then the cleared node returns to the
//! free-list. Teardown holds the index's write lock for its duration, so
//! readers never observe a partially torn-down index.

use std::sync::Arc;

use super::{PayloadCleanup, TreeDescriptor};
use crate::error::TreeError;
use crate::node::TreeNode;
use crate::pool::NodePool;

impl<P> TreeDescriptor<P> {
    /// Tear down one index: release every node, leaving the index empty but
    /// usable for further inserts.
    ///
    /// The index's cleanup callback (if any) receives each payload exactly
    /// once, in post-order.
    pub fn clear(&self, index: usize) -> Result<(), TreeError> {
        let idx = self.index(index)?;
        let mut state = idx.state.write();
        if let Some(root) = state.root.take() {
            release_subtree(&self.pool, root, idx.cleanup.as_deref());
        }
        state.node_count = 0;
        Ok(())
    }

    /// Tear down every index of this tree.
    ///
    /// `override_cleanup` replaces each index's own cleanup when given (the
    /// destroy-with-callback form); otherwise each index uses its own.
    pub(crate) fn teardown(&self, override_cleanup: Option<&Arc<dyn PayloadCleanup<P>>>) {
        for idx in &self.indices {
            let cleanup = override_cleanup
                .map(|cleanup| &**cleanup)
                .or(idx.cleanup.as_deref());
            let mut state = idx.state.write();
            if let Some(root) = state.root.take() {
                release_subtree(&self.pool, root, cleanup);
            }
            state.node_count = 0;
        }
    }
}

fn release_subtree<P>(
    pool: &NodePool<P>,
    mut node: Box<TreeNode<P>>,
    cleanup: Option<&dyn PayloadCleanup<P>>,
) {
    if let Some(left) = node.left.take() {
        release_subtree(pool, left, cleanup);
    }
    if let Some(right) = node.right.take() {
        release_subtree(pool, right, cleanup);
    }

    let entry = node
        .entry
        .take()
        .expect("an in-tree node always has an entry");
    match cleanup {
        Some(cleanup) => cleanup.release(entry.payload),
        None => drop(entry.payload),
    }
    pool.release(node);
}
