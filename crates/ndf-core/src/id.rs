//! Strongly-typed identifiers.
//!
//! Every identifier is an opaque `u64` token, never a pointer. Tables
//! encode a slot index and a generation into the token so that a stale
//! identifier can be detected at access time instead of dereferenced.

use std::fmt;

/// Identifies one caller-visible access to an array object (an ACB entry).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(pub u64);

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for HandleId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Identifies a reserved, not-yet-realized storage slot (a PCB entry).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlaceholderId(pub u64);

impl fmt::Display for PlaceholderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for PlaceholderId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Identifies one open underlying object (a DCB entry).
///
/// Shared by every handle derived from the same stored object,
/// including sections.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DcbId(pub u64);

impl fmt::Display for DcbId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for DcbId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Identifies an array inside the external container store.
///
/// Issued by the store. Deleting the array invalidates every copy of the
/// id; re-creating an array at the same location yields a fresh id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoreId(pub u64);

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for StoreId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}
