/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

//! Key kinds, key values, and the per-kind comparator/copier dispatch.
//!
//! Every index of a tree is keyed by exactly one [`KeyKind`], chosen by a
//! flags bit at tree creation. [`KeyDispatch::resolve`] validates the flags
//! word and returns the comparator/copier pair for that kind; the pair is
//! cached on the index descriptor so no per-comparison kind switch happens
//! on the hot path.
//!
//! Comparators are three-way ([`Ordering`]); only the sign of the outcome
//! carries meaning. String keys compare byte-wise lexicographically,
//! timestamps by seconds then microseconds, and fixed-width integers by the
//! native ordering of their signedness.

use std::cmp::Ordering;

use enumflags2::{BitFlags, bitflags};

use crate::error::UnrecognizedKeyKind;

/// The key kinds an index can be created with, one bit each.
///
/// Exactly one bit must be set in the flags word passed at tree creation;
/// the kind is fixed for the lifetime of the index.
#[bitflags]
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// Owned string, byte-wise lexicographic order.
    Str = 1 << 0,
    /// Signed 8-bit integer.
    I8 = 1 << 1,
    /// Signed 16-bit integer.
    I16 = 1 << 2,
    /// Signed 32-bit integer.
    I32 = 1 << 3,
    /// Signed 64-bit integer.
    I64 = 1 << 4,
    /// Unsigned 8-bit integer.
    U8 = 1 << 5,
    /// Unsigned 16-bit integer.
    U16 = 1 << 6,
    /// Unsigned 32-bit integer.
    U32 = 1 << 7,
    /// Unsigned 64-bit integer.
    U64 = 1 << 8,
    /// Signed 128-bit integer.
    I128 = 1 << 9,
    /// Timestamp, ordered by seconds then microseconds.
    Time = 1 << 10,
}

/// A set of [`KeyKind`] bits, as passed to tree creation.
pub type KeyFlags = BitFlags<KeyKind>;

/// A seconds + microseconds timestamp key.
///
/// The derived ordering compares `seconds` first and breaks ties on
/// `micros`, matching the field order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    /// Whole seconds.
    pub seconds: i64,
    /// Microseconds within the second.
    pub micros: u32,
}

/// A key stored by value in a tree node: one fixed-size tagged slot per
/// node, tagged by [`KeyKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyValue {
    /// An owned string key.
    Str(Box<str>),
    /// A signed 8-bit key.
    I8(i8),
    /// A signed 16-bit key.
    I16(i16),
    /// A signed 32-bit key.
    I32(i32),
    /// A signed 64-bit key.
    I64(i64),
    /// An unsigned 8-bit key.
    U8(u8),
    /// An unsigned 16-bit key.
    U16(u16),
    /// An unsigned 32-bit key.
    U32(u32),
    /// An unsigned 64-bit key.
    U64(u64),
    /// A signed 128-bit key.
    I128(i128),
    /// A timestamp key.
    Time(Timestamp),
}

impl KeyValue {
    /// The kind tag of this key value.
    pub const fn kind(&self) -> KeyKind {
        match self {
            Self::Str(_) => KeyKind::Str,
            Self::I8(_) => KeyKind::I8,
            Self::I16(_) => KeyKind::I16,
            Self::I32(_) => KeyKind::I32,
            Self::I64(_) => KeyKind::I64,
            Self::U8(_) => KeyKind::U8,
            Self::U16(_) => KeyKind::U16,
            Self::U32(_) => KeyKind::U32,
            Self::U64(_) => KeyKind::U64,
            Self::I128(_) => KeyKind::I128,
            Self::Time(_) => KeyKind::Time,
        }
    }
}

impl From<&str> for KeyValue {
    fn from(value: &str) -> Self {
        Self::Str(value.into())
    }
}

impl From<String> for KeyValue {
    fn from(value: String) -> Self {
        Self::Str(value.into())
    }
}

impl From<Timestamp> for KeyValue {
    fn from(value: Timestamp) -> Self {
        Self::Time(value)
    }
}

macro_rules! key_value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for KeyValue {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

key_value_from! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    i128 => I128,
}

/// A three-way key comparator. Only the sign of the result is meaningful.
pub type CompareFn = fn(&KeyValue, &KeyValue) -> Ordering;

/// A key copier: clones a caller-supplied key into node-owned storage.
pub type CopyFn = fn(&KeyValue) -> KeyValue;

/// The comparator/copier pair for one key kind.
///
/// Resolved once per index at tree creation by [`KeyDispatch::resolve`] and
/// cached on the index descriptor.
#[derive(Debug, Clone, Copy)]
pub struct KeyDispatch {
    kind: KeyKind,
    compare_fn: CompareFn,
    copy_fn: CopyFn,
}

impl KeyDispatch {
    /// Resolve a flags word into the dispatch pair for its key kind.
    ///
    /// Fails unless exactly one recognized kind bit is set.
    pub fn resolve(flags: KeyFlags) -> Result<Self, UnrecognizedKeyKind> {
        let kind = flags
            .exactly_one()
            .ok_or(UnrecognizedKeyKind { flags: flags.bits() })?;
        let (compare_fn, copy_fn): (CompareFn, CopyFn) = match kind {
            KeyKind::Str => (cmp_str, copy_str),
            KeyKind::I8 => (cmp_i8, copy_i8),
            KeyKind::I16 => (cmp_i16, copy_i16),
            KeyKind::I32 => (cmp_i32, copy_i32),
            KeyKind::I64 => (cmp_i64, copy_i64),
            KeyKind::U8 => (cmp_u8, copy_u8),
            KeyKind::U16 => (cmp_u16, copy_u16),
            KeyKind::U32 => (cmp_u32, copy_u32),
            KeyKind::U64 => (cmp_u64, copy_u64),
            KeyKind::I128 => (cmp_i128, copy_i128),
            KeyKind::Time => (cmp_time, copy_time),
        };
        Ok(Self {
            kind,
            compare_fn,
            copy_fn,
        })
    }

    /// Resolve a raw flags word, as stored or transmitted by callers that
    /// do not use the typed [`KeyFlags`] representation.
    ///
    /// Bits outside the recognized kind set fail the same way zero or
    /// multiple kind bits do.
    pub fn resolve_raw(bits: u16) -> Result<Self, UnrecognizedKeyKind> {
        let flags = KeyFlags::from_bits(bits).map_err(|_| UnrecognizedKeyKind { flags: bits })?;
        Self::resolve(flags)
    }

    /// The key kind this dispatch pair was resolved for.
    pub const fn kind(&self) -> KeyKind {
        self.kind
    }

    /// Compare two keys of this dispatch's kind.
    pub fn compare(&self, a: &KeyValue, b: &KeyValue) -> Ordering {
        (self.compare_fn)(a, b)
    }

    /// Copy a caller-supplied key into node-owned storage.
    pub fn copy(&self, key: &KeyValue) -> KeyValue {
        (self.copy_fn)(key)
    }
}

fn cmp_str(a: &KeyValue, b: &KeyValue) -> Ordering {
    let (KeyValue::Str(a), KeyValue::Str(b)) = (a, b) else {
        unreachable!("dispatch guarantees Str keys")
    };
    a.as_bytes().cmp(b.as_bytes())
}

fn copy_str(key: &KeyValue) -> KeyValue {
    let KeyValue::Str(s) = key else {
        unreachable!("dispatch guarantees Str keys")
    };
    KeyValue::Str(s.clone())
}

macro_rules! scalar_key_ops {
    ($($cmp:ident, $copy:ident, $variant:ident);* $(;)?) => {
        $(
            fn $cmp(a: &KeyValue, b: &KeyValue) -> Ordering {
                let (KeyValue::$variant(a), KeyValue::$variant(b)) = (a, b) else {
                    unreachable!(concat!("dispatch guarantees ", stringify!($variant), " keys"))
                };
                a.cmp(b)
            }

            fn $copy(key: &KeyValue) -> KeyValue {
                let KeyValue::$variant(v) = key else {
                    unreachable!(concat!("dispatch guarantees ", stringify!($variant), " keys"))
                };
                KeyValue::$variant(*v)
            }
        )*
    };
}

scalar_key_ops! {
    cmp_i8, copy_i8, I8;
    cmp_i16, copy_i16, I16;
    cmp_i32, copy_i32, I32;
    cmp_i64, copy_i64, I64;
    cmp_u8, copy_u8, U8;
    cmp_u16, copy_u16, U16;
    cmp_u32, copy_u32, U32;
    cmp_u64, copy_u64, U64;
    cmp_i128, copy_i128, I128;
    cmp_time, copy_time, Time;
}
