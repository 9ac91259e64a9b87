/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

#![warn(missing_debug_implementations, missing_docs, unreachable_pub)]
//! A named registry of multi-index, generically-keyed balanced search trees.
//!
//! Trees are created by name through a [`Registry`] and addressed by a
//! numeric [`TreeId`]. Each tree carries up to [`MAX_INDEXES`] independent
//! indices over the same payload set; an index is a self-balancing binary
//! search tree (AVL rotations on insert) keyed by one of the fixed
//! primitive [`KeyKind`]s, with its own reader/writer lock. Nodes are drawn
//! from a shared, growable [`NodePool`] and recycled at teardown, so steady
//! insert/destroy churn settles into a stable allocation footprint.
//!
//! # Concurrency
//!
//! Fetches on one index run concurrently; inserts and teardown are
//! exclusive per index. Different indices of one tree, and different trees,
//! never contend. Registration (create/destroy/name lookup) is serialized
//! by the registry's own lock, which is never held across a tree operation.
//!
//! # Payload ownership
//!
//! The payload type is a generic parameter. The tree owns every inserted
//! payload value; [`TreeDescriptor::fetch`] returns a clone, so indexing
//! shared data is typically done with `P = Arc<…>`. An index created with a
//! [`PayloadCleanup`] hands each payload to it exactly once during
//! teardown; without one, payloads are simply dropped.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use multi_index_tree::{IndexSpec, KeyKind, KeyValue, Registry, TreeError};
//!
//! fn main() -> Result<(), TreeError> {
//!     let registry: Registry<Arc<str>> = Registry::new();
//!
//!     // One tree, two independent orderings over the same payloads.
//!     let id = registry.create(
//!         "users",
//!         &[
//!             IndexSpec::new(KeyKind::U64.into()),
//!             IndexSpec::new(KeyKind::Str.into()),
//!         ],
//!     )?;
//!
//!     let alice: Arc<str> = Arc::from("alice");
//!     registry.insert(id, 0, &KeyValue::U64(7), Arc::clone(&alice))?;
//!     registry.insert(id, 1, &KeyValue::from("alice"), alice)?;
//!
//!     assert_eq!(
//!         registry.fetch(id, 0, &KeyValue::U64(7))?.as_deref(),
//!         Some("alice")
//!     );
//!     assert_eq!(registry.find_by_name("users"), Some(id));
//!
//!     registry.destroy(id)?;
//!     assert_eq!(registry.find_by_name("users"), None);
//!     Ok(())
//! }
//! ```

mod error;
mod key;
mod node;
mod pool;
mod registry;
mod tree;

pub use error::{TreeError, UnrecognizedKeyKind};
pub use key::{CompareFn, CopyFn, KeyDispatch, KeyFlags, KeyKind, KeyValue, Timestamp};
pub use node_pool::{PoolConfig, PoolError, PoolStats};
pub use pool::NodePool;
pub use registry::{Registry, TreeId};
pub use tree::{IndexSpec, MAX_INDEXES, PayloadCleanup, TreeDescriptor};
