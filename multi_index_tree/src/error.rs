/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

//! Error types for tree creation, registration, and per-index operations.
//!
//! Every failure is reported synchronously to the caller; nothing is logged
//! or swallowed inside the library.

use node_pool::PoolError;
use thiserror::Error;

use crate::key::KeyKind;
use crate::registry::TreeId;

/// The flags word passed at tree creation did not name exactly one
/// recognized key kind.
///
/// Raised at creation time only: a tree that exists always has a valid
/// dispatch pair per index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("flags {flags:#06x} must name exactly one recognized key kind")]
pub struct UnrecognizedKeyKind {
    /// The offending raw flags word.
    pub flags: u16,
}

/// The error type for registry and tree operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// A tree with the requested name is already registered. No state was
    /// changed.
    #[error("a tree named `{0}` is already registered")]
    DuplicateName(String),

    /// No tree is currently registered under the given id. This is a caller
    /// error (stale or fabricated handle), reported rather than treated as
    /// "not found".
    #[error("no tree is registered under {0:?}")]
    UnknownTree(TreeId),

    /// The index number is out of bounds for the addressed tree. Caller
    /// error, reported rather than treated as "not found".
    #[error("index {index} is out of bounds: the tree has {count} indices")]
    UnknownIndex {
        /// The requested index number.
        index: usize,
        /// How many indices the tree actually has.
        count: usize,
    },

    /// A tree must declare between 1 and [`MAX_INDEXES`](crate::MAX_INDEXES)
    /// indices.
    #[error("a tree must declare between 1 and 8 indices, got {got}")]
    InvalidIndexCount {
        /// The declared index count.
        got: usize,
    },

    /// The key is already present in the addressed index. The tree is
    /// unchanged and the offered payload has been dropped.
    #[error("the key is already present in this index")]
    DuplicateKey,

    /// The key's kind does not match the kind the index was created with.
    #[error("the index is keyed by {expected:?} but the key is a {actual:?}")]
    KeyKindMismatch {
        /// The kind the index was created with.
        expected: KeyKind,
        /// The kind of the key that was passed in.
        actual: KeyKind,
    },

    /// The flags word at tree creation did not resolve to a key kind.
    #[error(transparent)]
    UnrecognizedKeyKind(#[from] UnrecognizedKeyKind),

    /// The shared node pool could not supply a node; the insert was aborted
    /// with the tree in its pre-call state.
    #[error(transparent)]
    Pool(#[from] PoolError),
}
