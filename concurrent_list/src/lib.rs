/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

#![warn(missing_debug_implementations, missing_docs, unreachable_pub)]
//! A thread-safe, generic doubly linked list.
//!
//! `List` supports O(1) insertion and removal at both ends, ordered
//! traversal with early exit, a stable in-place sort, and predicate-based
//! bulk removal. Every instance carries its own reader/writer lock, so a
//! `List` can be shared freely between threads: readers (`for_each`,
//! `peek_head`, `len`, ...) run concurrently, writers (`append`, `pop_head`,
//! `sort`, ...) are mutually exclusive.
//!
//! Elements live in a vector of slots chained together by `u32` indices.
//! Vacant slots form an internal free chain and are reused by later
//! insertions, so a list that churns through elements settles into a stable
//! allocation footprint instead of hitting the allocator on every insert.
//!
//! # Cleanup
//!
//! A list can be created with a [`Cleanup`] callback. The callback receives
//! every element discarded by [`List::remove_if`], [`List::clear`], or the
//! list being dropped. Elements handed back to the caller (by
//! [`List::pop_head`] / [`List::pop_tail`]) are *not* passed to the
//! callback; ownership moves to the caller instead.
//!
//! # Re-entrancy
//!
//! The visitor of [`List::for_each`], the comparator of [`List::sort`], and
//! the predicate of [`List::remove_if`] run while the list's lock is held.
//! Calling back into the same list from inside one of these callbacks
//! deadlocks and is not supported. Cleanup callbacks are invoked after the
//! lock has been released and are free to touch the list.
//!
//! # Examples
//!
//! Boundary insertion and removal:
//!
//! ```
//! # use concurrent_list::List;
//! let list = List::new();
//! list.append(1);
//! list.append(2);
//! list.prepend(0);
//!
//! assert_eq!(list.len(), 3);
//! assert_eq!(list.pop_head(), Some(0));
//! assert_eq!(list.pop_tail(), Some(2));
//! assert_eq!(list.pop_head(), Some(1));
//! assert_eq!(list.pop_head(), None);
//! ```
//!
//! Traversal stops when the visitor breaks:
//!
//! ```
//! # use concurrent_list::List;
//! use std::ops::ControlFlow;
//!
//! let list = List::new();
//! for i in 0..5 {
//!     list.append(i);
//! }
//!
//! let mut seen = Vec::new();
//! list.for_each(|&value| {
//!     seen.push(value);
//!     if value == 2 {
//!         ControlFlow::Break(())
//!     } else {
//!         ControlFlow::Continue(())
//!     }
//! });
//! assert_eq!(seen, [0, 1, 2]);
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::mem;
use std::ops::ControlFlow;
use std::sync::Arc;

use parking_lot::RwLock;

/// Callback invoked on every element discarded by the list.
///
/// Blanket-implemented for closures, so `Arc::new(|value| ...)` is enough
/// for most callers. Invoked by [`List::remove_if`], [`List::clear`], and
/// when the list is dropped; see the [module docs](self) for the exact
/// ownership rules.
pub trait Cleanup<T>: Send + Sync {
    /// Take ownership of a discarded element.
    fn release(&self, value: T);
}

impl<T, F> Cleanup<T> for F
where
    F: Fn(T) + Send + Sync,
{
    fn release(&self, value: T) {
        self(value)
    }
}

/// A slot in the backing vector.
///
/// Occupied slots hold an element and its neighbor links; vacant slots are
/// chained into a free list and reused by later insertions.
enum Slot<T> {
    Occupied {
        value: T,
        next: Option<u32>,
        prev: Option<u32>,
    },
    Vacant {
        next_free: Option<u32>,
    },
}

/// The lock-protected state of a [`List`].
struct ListCore<T> {
    slots: Vec<Slot<T>>,
    free: Option<u32>,
    head: Option<u32>,
    tail: Option<u32>,
    len: usize,
}

impl<T> ListCore<T> {
    const fn empty() -> Self {
        Self {
            slots: Vec::new(),
            free: None,
            head: None,
            tail: None,
            len: 0,
        }
    }

    fn value(&self, idx: u32) -> &T {
        let Slot::Occupied { value, .. } = &self.slots[idx as usize] else {
            unreachable!("list links never point at vacant slots")
        };
        value
    }

    /// Return `(next, prev)` for an occupied slot.
    fn links(&self, idx: u32) -> (Option<u32>, Option<u32>) {
        let Slot::Occupied { next, prev, .. } = &self.slots[idx as usize] else {
            unreachable!("list links never point at vacant slots")
        };
        (*next, *prev)
    }

    fn set_next(&mut self, idx: u32, new_next: Option<u32>) {
        let Slot::Occupied { next, .. } = &mut self.slots[idx as usize] else {
            unreachable!("list links never point at vacant slots")
        };
        *next = new_next;
    }

    fn set_prev(&mut self, idx: u32, new_prev: Option<u32>) {
        let Slot::Occupied { prev, .. } = &mut self.slots[idx as usize] else {
            unreachable!("list links never point at vacant slots")
        };
        *prev = new_prev;
    }

    /// Store a value in a vacant slot (or a fresh one) and return its index.
    ///
    /// # Panics
    ///
    /// Panics if the backing vector would exceed `u32::MAX` slots.
    fn insert_slot(&mut self, value: T, next: Option<u32>, prev: Option<u32>) -> u32 {
        let slot = Slot::Occupied { value, next, prev };
        match self.free {
            Some(idx) => {
                let Slot::Vacant { next_free } = self.slots[idx as usize] else {
                    unreachable!("the free chain only holds vacant slots")
                };
                self.free = next_free;
                self.slots[idx as usize] = slot;
                idx
            }
            None => {
                assert!(
                    self.slots.len() < u32::MAX as usize,
                    "list exceeded maximum capacity of {} slots",
                    u32::MAX
                );
                self.slots.push(slot);
                (self.slots.len() - 1) as u32
            }
        }
    }

    /// Detach an occupied slot from the chain and return its value.
    ///
    /// The slot joins the free chain for reuse.
    fn unlink(&mut self, idx: u32) -> T {
        let (next, prev) = self.links(idx);
        match prev {
            Some(prev) => self.set_next(prev, next),
            None => self.head = next,
        }
        match next {
            Some(next) => self.set_prev(next, prev),
            None => self.tail = prev,
        }
        self.len -= 1;

        let slot = mem::replace(
            &mut self.slots[idx as usize],
            Slot::Vacant { next_free: self.free },
        );
        self.free = Some(idx);
        let Slot::Occupied { value, .. } = slot else {
            unreachable!("list links never point at vacant slots")
        };
        value
    }

    fn push_back(&mut self, value: T) {
        let idx = self.insert_slot(value, None, self.tail);
        match self.tail {
            Some(tail) => self.set_next(tail, Some(idx)),
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
        self.len += 1;
    }

    fn push_front(&mut self, value: T) {
        let idx = self.insert_slot(value, self.head, None);
        match self.head {
            Some(head) => self.set_prev(head, Some(idx)),
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
        self.len += 1;
    }

    /// Swap the values of two distinct occupied slots, leaving links alone.
    fn swap_values(&mut self, a: u32, b: u32) {
        debug_assert_ne!(a, b);
        let (lo, hi) = if a < b {
            (a as usize, b as usize)
        } else {
            (b as usize, a as usize)
        };
        let (front, back) = self.slots.split_at_mut(hi);
        let (Slot::Occupied { value: lo_value, .. }, Slot::Occupied { value: hi_value, .. }) =
            (&mut front[lo], &mut back[0])
        else {
            unreachable!("list links never point at vacant slots")
        };
        mem::swap(lo_value, hi_value);
    }

    /// Stable adjacent-swap sort over the chain.
    ///
    /// O(n²) worst case; the lists this crate backs internally (node pools,
    /// tree registries) stay small enough for that to be a non-issue.
    fn sort_by(&mut self, cmp: &mut dyn FnMut(&T, &T) -> Ordering) {
        if self.len < 2 {
            return;
        }
        loop {
            let mut swapped = false;
            let mut cur = self.head;
            while let Some(idx) = cur {
                let Some(next) = self.links(idx).0 else {
                    break;
                };
                // Swapping only on Greater keeps equal elements in order.
                if cmp(self.value(idx), self.value(next)) == Ordering::Greater {
                    self.swap_values(idx, next);
                    swapped = true;
                }
                cur = Some(next);
            }
            if !swapped {
                break;
            }
        }
    }
}

/// A thread-safe doubly linked list.
///
/// See the [module docs](self) for an overview, the locking rules, and the
/// re-entrancy restriction on callbacks.
pub struct List<T> {
    core: RwLock<ListCore<T>>,
    cleanup: Option<Arc<dyn Cleanup<T>>>,
}

impl<T> List<T> {
    /// Create an empty list without a cleanup callback.
    ///
    /// Discarded elements are simply dropped.
    pub const fn new() -> Self {
        Self {
            core: RwLock::new(ListCore::empty()),
            cleanup: None,
        }
    }

    /// Create an empty list with a cleanup callback.
    ///
    /// The callback receives every element discarded by [`List::remove_if`],
    /// [`List::clear`], or the list being dropped.
    pub fn with_cleanup(cleanup: Arc<dyn Cleanup<T>>) -> Self {
        Self {
            core: RwLock::new(ListCore::empty()),
            cleanup: Some(cleanup),
        }
    }

    /// Append a value at the tail. O(1).
    pub fn append(&self, value: T) {
        self.core.write().push_back(value);
    }

    /// Insert a value at the head. O(1).
    pub fn prepend(&self, value: T) {
        self.core.write().push_front(value);
    }

    /// Remove and return the head element, or `None` if the list is empty.
    pub fn pop_head(&self) -> Option<T> {
        let mut core = self.core.write();
        let idx = core.head?;
        Some(core.unlink(idx))
    }

    /// Remove and return the tail element, or `None` if the list is empty.
    pub fn pop_tail(&self) -> Option<T> {
        let mut core = self.core.write();
        let idx = core.tail?;
        Some(core.unlink(idx))
    }

    /// Inspect the head element without removing it.
    ///
    /// Returns `None` if the list is empty. The accessor runs under the
    /// read lock and must not call back into this list.
    pub fn peek_head<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let core = self.core.read();
        let idx = core.head?;
        Some(f(core.value(idx)))
    }

    /// Inspect the tail element without removing it.
    ///
    /// Returns `None` if the list is empty. The accessor runs under the
    /// read lock and must not call back into this list.
    pub fn peek_tail<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let core = self.core.read();
        let idx = core.tail?;
        Some(f(core.value(idx)))
    }

    /// Number of elements currently in the list.
    pub fn len(&self) -> usize {
        self.core.read().len
    }

    /// Whether the list holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Visit elements in list order until the visitor breaks or the list
    /// ends.
    ///
    /// Runs under the read lock: concurrent readers proceed, writers wait,
    /// and the visitor must not call back into this list.
    pub fn for_each(&self, mut visitor: impl FnMut(&T) -> ControlFlow<()>) {
        let core = self.core.read();
        let mut cur = core.head;
        while let Some(idx) = cur {
            if visitor(core.value(idx)).is_break() {
                break;
            }
            cur = core.links(idx).0;
        }
    }

    /// Sort the list in place using the given three-way comparator.
    ///
    /// The sort is stable: elements that compare equal keep their relative
    /// order. Adjacent-swap based, O(n²) worst case. The comparator runs
    /// under the write lock and must not call back into this list.
    pub fn sort(&self, mut cmp: impl FnMut(&T, &T) -> Ordering) {
        self.core.write().sort_by(&mut cmp);
    }

    /// Remove every element for which the predicate returns `true`,
    /// passing each removed element to the cleanup callback (or dropping it
    /// when the list has none). Returns the number of elements removed.
    ///
    /// The predicate runs under the write lock and must not call back into
    /// this list; the cleanup callback runs after the lock is released.
    pub fn remove_if(&self, mut predicate: impl FnMut(&T) -> bool) -> usize {
        let mut removed = Vec::new();
        {
            let mut core = self.core.write();
            let mut cur = core.head;
            while let Some(idx) = cur {
                let next = core.links(idx).0;
                if predicate(core.value(idx)) {
                    removed.push(core.unlink(idx));
                }
                cur = next;
            }
        }
        let count = removed.len();
        self.discard(removed);
        count
    }

    /// Remove every element, passing each to the cleanup callback (or
    /// dropping it when the list has none).
    ///
    /// The cleanup callback runs after the lock is released.
    pub fn clear(&self) {
        let mut drained = Vec::new();
        {
            let mut core = self.core.write();
            while let Some(idx) = core.head {
                drained.push(core.unlink(idx));
            }
        }
        self.discard(drained);
    }

    fn discard(&self, values: Vec<T>) {
        match &self.cleanup {
            Some(cleanup) => {
                for value in values {
                    cleanup.release(value);
                }
            }
            None => drop(values),
        }
    }
}

impl<T> Default for List<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for List<T> {
    fn drop(&mut self) {
        let core = self.core.get_mut();
        while let Some(idx) = core.head {
            let value = core.unlink(idx);
            match &self.cleanup {
                Some(cleanup) => cleanup.release(value),
                None => drop(value),
            }
        }
    }
}

impl<T> fmt::Debug for List<T> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("List").field("len", &self.len()).finish()
    }
}
