/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

//! The shared node pool backing every tree of a registry.
//!
//! This is a thin typed wrapper around [`node_pool::Pool`], binding it to
//! the tree node record. Keeping the wrapper here lets the engine hand out
//! and take back nodes without exposing the node layout.

use std::fmt;

use node_pool::{Pool, PoolConfig, PoolError, PoolStats};

use crate::node::TreeNode;

/// The pool tree nodes are acquired from and released to.
///
/// One pool is shared by every tree of a [`Registry`](crate::Registry); a
/// node belongs to exactly one tree index from `acquire` until the index is
/// torn down and the node is released. Hold the pool in an `Arc` to share
/// it, pre-size it with [`NodePool::grow`], and watch conservation with
/// [`NodePool::stats`].
pub struct NodePool<P> {
    inner: Pool<TreeNode<P>>,
}

impl<P> NodePool<P> {
    /// Create an unbounded pool with the default chunk size.
    pub fn new() -> Self {
        Self { inner: Pool::new() }
    }

    /// Create a pool with explicit sizing parameters.
    ///
    /// A capped pool turns node exhaustion into a recoverable insert
    /// failure; see [`node_pool::PoolError::Exhausted`].
    ///
    /// # Panics
    ///
    /// Panics if `config.chunk_size` is zero.
    pub fn with_config(config: PoolConfig) -> Self {
        Self {
            inner: Pool::with_config(config),
        }
    }

    /// Allocate `chunk_size` vacant nodes onto the free-list.
    pub fn grow(&self, chunk_size: usize) -> Result<(), PoolError> {
        self.inner.grow(chunk_size)
    }

    /// Snapshot the pool's node accounting.
    pub fn stats(&self) -> PoolStats {
        self.inner.stats()
    }

    pub(crate) fn acquire(&self) -> Result<Box<TreeNode<P>>, PoolError> {
        self.inner.acquire()
    }

    pub(crate) fn release(&self, node: Box<TreeNode<P>>) {
        self.inner.release(node);
    }
}

impl<P> Default for NodePool<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> fmt::Debug for NodePool<P> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_tuple("NodePool").field(&self.inner).finish()
    }
}
