/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

//! The named directory of tree descriptors.
//!
//! A [`Registry`] owns every tree created through it plus the node pool
//! they all draw from. The directory is a [`concurrent_list::List`] of
//! descriptors kept sorted by id; one registry-wide reader/writer lock
//! serializes create/destroy/lookup, so id assignment (scanning the sorted
//! directory for the first gap) can never race. The registry lock is
//! independent of every per-index tree lock: tree operations resolve their
//! descriptor under the shared lock, drop it, and then work against the
//! index's own lock.

use std::fmt;
use std::ops::ControlFlow;
use std::sync::Arc;

use concurrent_list::List;
use parking_lot::RwLock;

use crate::error::TreeError;
use crate::key::{KeyFlags, KeyValue};
use crate::pool::NodePool;
use crate::tree::{IndexSpec, PayloadCleanup, TreeDescriptor};

/// The id of a registered tree.
///
/// Ids are unique among currently-registered trees: creation assigns the
/// smallest non-negative integer not in use, and a destroyed tree's id is
/// available for reuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct TreeId(u32);

impl TreeId {
    /// The raw id value.
    pub const fn value(self) -> u32 {
        self.0
    }

    pub(crate) const fn new(raw: u32) -> Self {
        Self(raw)
    }
}

/// A named, lockable directory of trees sharing one node pool.
///
/// See the [module docs](self) for the locking rules and the
/// [crate docs](crate) for a usage example.
pub struct Registry<P> {
    pool: Arc<NodePool<P>>,
    directory: RwLock<List<Arc<TreeDescriptor<P>>>>,
}

impl<P> Registry<P> {
    /// Create a registry with its own unbounded node pool.
    pub fn new() -> Self {
        Self::with_pool(Arc::new(NodePool::new()))
    }

    /// Create a registry drawing nodes from the given pool.
    ///
    /// Several registries may share one pool; a capped pool bounds the
    /// total number of nodes across all of them.
    pub fn with_pool(pool: Arc<NodePool<P>>) -> Self {
        Self {
            pool,
            directory: RwLock::new(List::new()),
        }
    }

    /// The node pool this registry's trees draw from.
    pub fn pool(&self) -> &Arc<NodePool<P>> {
        &self.pool
    }

    /// Create and register a tree with the given per-index specs.
    ///
    /// Fails with [`TreeError::DuplicateName`] if the name is taken, with
    /// [`TreeError::InvalidIndexCount`] for zero or too many indices, and
    /// with [`TreeError::UnrecognizedKeyKind`] if any index's flags word
    /// does not name exactly one key kind. The new tree gets the smallest
    /// id not currently in use.
    pub fn create(&self, name: &str, specs: &[IndexSpec<P>]) -> Result<TreeId, TreeError> {
        let directory = self.directory.write();

        let mut name_taken = false;
        directory.for_each(|tree| {
            if tree.name() == name {
                name_taken = true;
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        if name_taken {
            return Err(TreeError::DuplicateName(name.to_owned()));
        }

        // The directory is sorted by id, so the first position whose id
        // differs from its rank is the smallest gap; no gap means the next
        // id past the end.
        let mut next_id = 0u32;
        directory.for_each(|tree| {
            if tree.id().value() == next_id {
                next_id += 1;
                ControlFlow::Continue(())
            } else {
                ControlFlow::Break(())
            }
        });

        let descriptor = Arc::new(TreeDescriptor::new(
            name,
            TreeId::new(next_id),
            specs,
            Arc::clone(&self.pool),
        )?);
        let id = descriptor.id();
        directory.append(descriptor);
        directory.sort(|a, b| a.id().cmp(&b.id()));
        Ok(id)
    }

    /// Create a single-index tree.
    ///
    /// Convenience wrapper over [`Registry::create`] for the common case of
    /// one index with optional cleanup.
    pub fn create_single(
        &self,
        name: &str,
        flags: KeyFlags,
        cleanup: Option<Arc<dyn PayloadCleanup<P>>>,
    ) -> Result<TreeId, TreeError> {
        self.create(name, &[IndexSpec { flags, cleanup }])
    }

    /// Look up a tree id by name. Linear scan under the shared lock.
    pub fn find_by_name(&self, name: &str) -> Option<TreeId> {
        let directory = self.directory.read();
        let mut found = None;
        directory.for_each(|tree| {
            if tree.name() == name {
                found = Some(tree.id());
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        found
    }

    /// Resolve an id to its descriptor.
    ///
    /// The descriptor is returned as an `Arc`, so callers can run tree
    /// operations without holding the registry lock.
    pub fn descriptor(&self, id: TreeId) -> Result<Arc<TreeDescriptor<P>>, TreeError> {
        let directory = self.directory.read();
        let mut found = None;
        directory.for_each(|tree| {
            if tree.id() == id {
                found = Some(Arc::clone(tree));
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        found.ok_or(TreeError::UnknownTree(id))
    }

    /// Insert `key` → `payload` into index `index` of tree `id`.
    ///
    /// See [`TreeDescriptor::insert`] for the per-index contract.
    pub fn insert(
        &self,
        id: TreeId,
        index: usize,
        key: &KeyValue,
        payload: P,
    ) -> Result<(), TreeError> {
        self.descriptor(id)?.insert(index, key, payload)
    }

    /// Look up `key` in index `index` of tree `id`.
    ///
    /// See [`TreeDescriptor::fetch`] for the per-index contract.
    pub fn fetch(&self, id: TreeId, index: usize, key: &KeyValue) -> Result<Option<P>, TreeError>
    where
        P: Clone,
    {
        self.descriptor(id)?.fetch(index, key)
    }

    /// Destroy a tree: tear down every index (each node's payload goes to
    /// the index's cleanup exactly once, nodes return to the pool), then
    /// unregister the descriptor. The id becomes available for reuse.
    pub fn destroy(&self, id: TreeId) -> Result<(), TreeError> {
        self.destroy_inner(id, None)
    }

    /// Destroy a tree, overriding every index's cleanup with the given one.
    pub fn destroy_with(
        &self,
        id: TreeId,
        cleanup: Arc<dyn PayloadCleanup<P>>,
    ) -> Result<(), TreeError> {
        self.destroy_inner(id, Some(cleanup))
    }

    fn destroy_inner(
        &self,
        id: TreeId,
        override_cleanup: Option<Arc<dyn PayloadCleanup<P>>>,
    ) -> Result<(), TreeError> {
        let descriptor = self.descriptor(id)?;
        descriptor.teardown(override_cleanup.as_ref());

        let directory = self.directory.write();
        directory.remove_if(|tree| tree.id() == id);
        Ok(())
    }

    /// How many trees are currently registered.
    pub fn len(&self) -> usize {
        self.directory.read().len()
    }

    /// Whether the registry holds no trees.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<P> Default for Registry<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> fmt::Debug for Registry<P> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("Registry")
            .field("trees", &self.len())
            .field("pool", &self.pool)
            .finish()
    }
}
