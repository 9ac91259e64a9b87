/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

//! Read path: point lookups and ordered traversal.
//!
//! Both run under the index's read lock, so any number of them proceed
//! concurrently while writers wait.

use std::cmp::Ordering;
use std::ops::ControlFlow;

use super::TreeDescriptor;
use crate::error::TreeError;
use crate::key::KeyValue;
use crate::node::TreeNode;

impl<P> TreeDescriptor<P> {
    /// Look up a key in the given index.
    ///
    /// Returns a clone of the stored payload on a hit (`P = Arc<…>` makes
    /// this a reference-count bump) and `Ok(None)` when the key is absent.
    /// Unknown indices and wrong-kind keys are reported as errors, never as
    /// "not found".
    pub fn fetch(&self, index: usize, key: &KeyValue) -> Result<Option<P>, TreeError>
    where
        P: Clone,
    {
        let idx = self.index(index)?;
        idx.check_key_kind(key)?;

        let state = idx.state.read();
        let mut cursor = state.root.as_deref();
        while let Some(node) = cursor {
            cursor = match idx.dispatch.compare(key, node.key()) {
                Ordering::Equal => return Ok(Some(node.payload().clone())),
                Ordering::Less => node.left.as_deref(),
                Ordering::Greater => node.right.as_deref(),
            };
        }
        Ok(None)
    }

    /// Visit every key/payload pair of an index in ascending key order,
    /// stopping early if the visitor breaks.
    ///
    /// Runs under the index's read lock; the visitor must not call back
    /// into this index.
    pub fn for_each_in_order(
        &self,
        index: usize,
        mut visitor: impl FnMut(&KeyValue, &P) -> ControlFlow<()>,
    ) -> Result<(), TreeError> {
        let idx = self.index(index)?;
        let state = idx.state.read();
        let _ = walk_in_order(state.root.as_deref(), &mut visitor);
        Ok(())
    }

    /// The height of an index's tree: 0 when empty, 1 for a single node.
    pub fn height(&self, index: usize) -> Result<i32, TreeError> {
        let idx = self.index(index)?;
        let state = idx.state.read();
        Ok(state.root.as_deref().map_or(0, |root| root.height))
    }
}

fn walk_in_order<P>(
    node: Option<&TreeNode<P>>,
    visitor: &mut impl FnMut(&KeyValue, &P) -> ControlFlow<()>,
) -> ControlFlow<()> {
    let Some(node) = node else {
        return ControlFlow::Continue(());
    };
    walk_in_order(node.left.as_deref(), visitor)?;
    visitor(node.key(), node.payload())?;
    walk_in_order(node.right.as_deref(), visitor)
}
