/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

#![warn(missing_debug_implementations, missing_docs, unreachable_pub)]
//! A growable pool of reusable, heap-allocated records.
//!
//! `Pool` pre-allocates fixed-layout records in chunks and serves them from
//! a free-list, so workloads that create and destroy many records of one
//! type (tree nodes, queue entries, ...) pay for a heap allocation only the
//! first time a record is created. Records circulate as `Box<T>`: the
//! allocation handed out by [`Pool::acquire`] is the very allocation a
//! previous [`Pool::release`] returned, once the pool is warm.
//!
//! The free-list is a [`concurrent_list::List`]; one pool-wide mutex
//! serializes `acquire`/`release`/`grow`. Every critical section is O(1)
//! apart from the bulk allocation inside `grow`, and the lock is never held
//! across anything the pool's caller does with a record.
//!
//! # Capacity
//!
//! A pool is unbounded by default: `acquire` grows it by
//! [`PoolConfig::chunk_size`] records whenever the free-list runs dry. With
//! [`PoolConfig::max_records`] set, growth stops at the cap and `acquire`
//! reports [`PoolError::Exhausted`] instead; the caller decides whether to
//! fail the surrounding operation or release records first.
//!
//! # Examples
//!
//! ```
//! use node_pool::{Pool, PoolItem};
//!
//! struct Buffer {
//!     bytes: Vec<u8>,
//! }
//!
//! impl PoolItem for Buffer {
//!     fn vacant() -> Self {
//!         Buffer { bytes: Vec::new() }
//!     }
//!
//!     fn reclaim(&mut self) {
//!         self.bytes.clear();
//!     }
//! }
//!
//! let pool: Pool<Buffer> = Pool::new();
//!
//! let mut record = pool.acquire().unwrap();
//! record.bytes.extend_from_slice(b"scratch");
//! pool.release(record);
//!
//! let stats = pool.stats();
//! assert_eq!(stats.in_flight, 0);
//! assert_eq!(stats.available, stats.total);
//! ```

use std::fmt;

use concurrent_list::List;
use parking_lot::Mutex;
use thiserror::Error;

/// A record type that can live in a [`Pool`].
pub trait PoolItem {
    /// Construct an empty record, the state records have while they sit on
    /// the free-list.
    fn vacant() -> Self;

    /// Reset a record to its vacant state.
    ///
    /// Called by [`Pool::release`] before the record rejoins the free-list;
    /// implementations must drop or detach everything the record acquired
    /// while it was in flight (child links, owned content, ...).
    fn reclaim(&mut self);
}

/// Sizing parameters for a [`Pool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// How many records a transparent grow adds to the free-list.
    pub chunk_size: usize,
    /// Upper bound on the number of records the pool will ever allocate.
    /// `None` means unbounded.
    pub max_records: Option<usize>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1024,
            max_records: None,
        }
    }
}

/// The error type returned by [`Pool::acquire`] and [`Pool::grow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PoolError {
    /// The pool's [`PoolConfig::max_records`] cap has been reached and no
    /// record is available. Recoverable: releasing a record makes the next
    /// `acquire` succeed.
    #[error("record pool exhausted: capacity cap of {limit} records reached")]
    Exhausted {
        /// The configured cap.
        limit: usize,
    },
}

/// A point-in-time accounting snapshot of a [`Pool`].
///
/// `total` is the number of records ever allocated; at all times
/// `total == available + in_flight`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Records allocated over the pool's lifetime.
    pub total: usize,
    /// Records currently sitting on the free-list.
    pub available: usize,
    /// Records currently held by callers.
    pub in_flight: usize,
}

struct PoolState<T> {
    free: List<Box<T>>,
    total: usize,
}

/// A growable pool of reusable `Box<T>` records.
///
/// See the [module docs](self) for an overview.
pub struct Pool<T: PoolItem> {
    state: Mutex<PoolState<T>>,
    config: PoolConfig,
}

impl<T: PoolItem> Pool<T> {
    /// Create an unbounded pool with the default chunk size.
    ///
    /// No records are allocated until the first [`Pool::acquire`] or
    /// [`Pool::grow`].
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    /// Create a pool with explicit sizing parameters.
    ///
    /// # Panics
    ///
    /// Panics if `config.chunk_size` is zero.
    pub fn with_config(config: PoolConfig) -> Self {
        assert!(config.chunk_size > 0, "pool chunk size must be non-zero");
        Self {
            state: Mutex::new(PoolState {
                free: List::new(),
                total: 0,
            }),
            config,
        }
    }

    /// Pop one record off the free-list, growing the pool first if it is
    /// empty.
    ///
    /// Fails only when the pool is capped and the cap has been reached.
    pub fn acquire(&self) -> Result<Box<T>, PoolError> {
        let mut state = self.state.lock();
        if state.free.is_empty() {
            Self::grow_locked(&mut state, self.config.chunk_size, self.config.max_records)?;
        }
        Ok(state
            .free
            .pop_head()
            .expect("a successful grow leaves at least one record on the free-list"))
    }

    /// Reset a record and return it to the free-list.
    pub fn release(&self, mut record: Box<T>) {
        record.reclaim();
        let state = self.state.lock();
        state.free.prepend(record);
    }

    /// Allocate `chunk_size` records onto the free-list.
    ///
    /// With a capped pool the grant is clipped to the remaining headroom;
    /// a pool already at its cap reports [`PoolError::Exhausted`].
    pub fn grow(&self, chunk_size: usize) -> Result<(), PoolError> {
        let mut state = self.state.lock();
        Self::grow_locked(&mut state, chunk_size, self.config.max_records)
    }

    fn grow_locked(
        state: &mut PoolState<T>,
        chunk_size: usize,
        max_records: Option<usize>,
    ) -> Result<(), PoolError> {
        let grant = match max_records {
            Some(limit) => {
                let headroom = limit.saturating_sub(state.total);
                if headroom == 0 {
                    return Err(PoolError::Exhausted { limit });
                }
                chunk_size.min(headroom)
            }
            None => chunk_size,
        };
        for _ in 0..grant {
            state.free.prepend(Box::new(T::vacant()));
        }
        state.total += grant;
        Ok(())
    }

    /// Snapshot the pool's record accounting.
    pub fn stats(&self) -> PoolStats {
        let state = self.state.lock();
        let available = state.free.len();
        PoolStats {
            total: state.total,
            available,
            in_flight: state.total - available,
        }
    }
}

impl<T: PoolItem> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: PoolItem> fmt::Debug for Pool<T> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = self.stats();
        fmt.debug_struct("Pool")
            .field("total", &stats.total)
            .field("available", &stats.available)
            .field("in_flight", &stats.in_flight)
            .finish()
    }
}
