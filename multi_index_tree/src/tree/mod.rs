/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

//! Tree descriptors and the per-index balanced tree engine.
//!
//! A [`TreeDescriptor`] carries a name, a registry-assigned id, and one or
//! more independent indices over the same payload set. Each index is a
//! self-balancing binary search tree with its own key kind, comparator, and
//! reader/writer lock: fetches on one index run concurrently, writes are
//! exclusive per index, and different indices (or different trees) never
//! contend with each other.
//!
//! The implementation is split into sub-modules by concern:
//! - [`insert`][]: write path (descent, height maintenance, rotations)
//! - [`find`][]: read path (fetch, ordered traversal)
//! - [`destroy`][]: teardown (post-order release back to the pool)

mod destroy;
mod find;
mod insert;
#[cfg(feature = "unittest")]
mod invariants;

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::TreeError;
use crate::key::{KeyDispatch, KeyFlags, KeyKind, KeyValue};
use crate::node::TreeNode;
use crate::pool::NodePool;
use crate::registry::TreeId;

/// The most indices a single tree may carry.
pub const MAX_INDEXES: usize = 8;

/// Callback invoked once per node payload during ordered teardown.
///
/// Blanket-implemented for closures. When an index has no cleanup, the
/// engine's default release applies: the payload is dropped.
pub trait PayloadCleanup<P>: Send + Sync {
    /// Take ownership of a payload leaving the tree.
    fn release(&self, payload: P);
}

impl<P, F> PayloadCleanup<P> for F
where
    F: Fn(P) + Send + Sync,
{
    fn release(&self, payload: P) {
        self(payload)
    }
}

/// Per-index configuration supplied at tree creation.
pub struct IndexSpec<P> {
    /// The flags word naming this index's key kind (exactly one bit).
    pub flags: KeyFlags,
    /// Optional payload cleanup, invoked once per node at teardown.
    pub cleanup: Option<Arc<dyn PayloadCleanup<P>>>,
}

impl<P> IndexSpec<P> {
    /// An index spec without a cleanup callback.
    pub fn new(flags: KeyFlags) -> Self {
        Self {
            flags,
            cleanup: None,
        }
    }

    /// An index spec with a cleanup callback.
    pub fn with_cleanup(flags: KeyFlags, cleanup: Arc<dyn PayloadCleanup<P>>) -> Self {
        Self {
            flags,
            cleanup: Some(cleanup),
        }
    }
}

impl<P> Clone for IndexSpec<P> {
    fn clone(&self) -> Self {
        Self {
            flags: self.flags,
            cleanup: self.cleanup.clone(),
        }
    }
}

impl<P> fmt::Debug for IndexSpec<P> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("IndexSpec")
            .field("flags", &self.flags)
            .field("cleanup", &self.cleanup.is_some())
            .finish()
    }
}

/// The lock-protected state of one index.
pub(crate) struct IndexState<P> {
    pub(crate) root: Option<Box<TreeNode<P>>>,
    pub(crate) node_count: usize,
}

/// One index of a tree: its dispatch pair, optional cleanup, and the
/// lock-protected root.
pub(crate) struct TreeIndex<P> {
    pub(crate) dispatch: KeyDispatch,
    pub(crate) cleanup: Option<Arc<dyn PayloadCleanup<P>>>,
    pub(crate) state: RwLock<IndexState<P>>,
}

impl<P> TreeIndex<P> {
    fn from_spec(spec: &IndexSpec<P>) -> Result<Self, TreeError> {
        Ok(Self {
            dispatch: KeyDispatch::resolve(spec.flags)?,
            cleanup: spec.cleanup.clone(),
            state: RwLock::new(IndexState {
                root: None,
                node_count: 0,
            }),
        })
    }

    pub(crate) fn check_key_kind(&self, key: &KeyValue) -> Result<(), TreeError> {
        let expected = self.dispatch.kind();
        let actual = key.kind();
        if expected == actual {
            Ok(())
        } else {
            Err(TreeError::KeyKindMismatch { expected, actual })
        }
    }
}

/// A named, registry-owned tree with one or more independent indices.
///
/// Descriptors are created through [`Registry::create`](crate::Registry::create)
/// and handed out as `Arc`s; all operations take `&self` and synchronize on
/// the addressed index's own lock. Nodes come from the registry's shared
/// [`NodePool`] and return to it at teardown.
pub struct TreeDescriptor<P> {
    name: Box<str>,
    id: TreeId,
    indices: Box<[TreeIndex<P>]>,
    pool: Arc<NodePool<P>>,
}

impl<P> TreeDescriptor<P> {
    pub(crate) fn new(
        name: &str,
        id: TreeId,
        specs: &[IndexSpec<P>],
        pool: Arc<NodePool<P>>,
    ) -> Result<Self, TreeError> {
        if specs.is_empty() || specs.len() > MAX_INDEXES {
            return Err(TreeError::InvalidIndexCount { got: specs.len() });
        }
        let indices = specs
            .iter()
            .map(TreeIndex::from_spec)
            .collect::<Result<Vec<_>, _>>()?
            .into_boxed_slice();
        Ok(Self {
            name: name.into(),
            id,
            indices,
            pool,
        })
    }

    /// The tree's unique, immutable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The registry-assigned id.
    pub const fn id(&self) -> TreeId {
        self.id
    }

    /// How many indices this tree carries.
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// The key kind a given index was created with.
    pub fn key_kind(&self, index: usize) -> Result<KeyKind, TreeError> {
        Ok(self.index(index)?.dispatch.kind())
    }

    /// Number of keys currently stored in a given index.
    pub fn len(&self, index: usize) -> Result<usize, TreeError> {
        Ok(self.index(index)?.state.read().node_count)
    }

    /// Whether a given index stores no keys.
    pub fn is_empty(&self, index: usize) -> Result<bool, TreeError> {
        Ok(self.len(index)? == 0)
    }

    pub(crate) fn index(&self, index: usize) -> Result<&TreeIndex<P>, TreeError> {
        self.indices.get(index).ok_or(TreeError::UnknownIndex {
            index,
            count: self.indices.len(),
        })
    }
}

impl<P> fmt::Debug for TreeDescriptor<P> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("TreeDescriptor")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("indices", &self.indices.len())
            .finish()
    }
}

impl<P> Drop for TreeDescriptor<P> {
    fn drop(&mut self) {
        // A descriptor dropped without going through Registry::destroy
        // (e.g. the registry itself is dropped) still owes each index its
        // ordered teardown: cleanup once per node, nodes back to the pool.
        self.teardown(None);
    }
}
