//! Error types for the NDF control-block layer.
//!
//! [`NdfError`] is returned by every handle-level operation;
//! [`StoreError`] is what the external container store reports and is
//! surfaced through [`NdfError::Store`] unchanged.

use std::error::Error;
use std::fmt;

use crate::id::{HandleId, StoreId};
use crate::types::{Component, NumericType};

/// Coarse category of an [`NdfError`], for matching without payloads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A location, placeholder or mapping does not resolve.
    NotFound,
    /// A map or structural change conflicts with an outstanding map.
    AlreadyMapped,
    /// Malformed shape, bounds or dimension count.
    InvalidBounds,
    /// A type name outside the supported set.
    UnsupportedType,
    /// A released or invalidated handle.
    AlreadyInvalid,
    /// A component that holds no values was read.
    Undefined,
    /// Buffer lengths disagree.
    LengthMismatch,
    /// A side-quality link that would form a chain or loop.
    InvalidLink,
    /// The container store failed.
    Store,
}

/// Errors from handle-level operations.
#[derive(Clone, Debug, PartialEq)]
pub enum NdfError {
    /// A location, placeholder or mapping does not resolve.
    NotFound {
        /// What was looked up.
        what: String,
    },
    /// A write map was requested while the component is mapped, or a
    /// structural change was requested while any map is outstanding.
    AlreadyMapped {
        /// The component concerned.
        component: Component,
        /// Which rule was violated.
        reason: String,
    },
    /// Malformed shape, bounds or dimension count.
    InvalidBounds {
        /// Description of the problem.
        reason: String,
    },
    /// A type name that is not one of the supported element types.
    UnsupportedType {
        /// The offending name, exactly as supplied.
        name: String,
    },
    /// The handle was released or invalidated by a cascade.
    AlreadyInvalid {
        /// The stale handle.
        handle: HandleId,
    },
    /// A read or update map of a component that holds no values.
    Undefined {
        /// The undefined component.
        component: Component,
    },
    /// A buffer does not have the number of elements required.
    LengthMismatch {
        /// Elements required.
        expected: usize,
        /// Elements supplied.
        actual: usize,
    },
    /// A side-quality link was refused.
    InvalidLink {
        /// Why the link was refused.
        reason: String,
    },
    /// The container store reported a failure.
    Store(StoreError),
}

impl NdfError {
    /// The category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::AlreadyMapped { .. } => ErrorKind::AlreadyMapped,
            Self::InvalidBounds { .. } => ErrorKind::InvalidBounds,
            Self::UnsupportedType { .. } => ErrorKind::UnsupportedType,
            Self::AlreadyInvalid { .. } => ErrorKind::AlreadyInvalid,
            Self::Undefined { .. } => ErrorKind::Undefined,
            Self::LengthMismatch { .. } => ErrorKind::LengthMismatch,
            Self::InvalidLink { .. } => ErrorKind::InvalidLink,
            Self::Store(_) => ErrorKind::Store,
        }
    }
}

impl fmt::Display for NdfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { what } => write!(f, "not found: {what}"),
            Self::AlreadyMapped { component, reason } => {
                write!(f, "the {component} component is already mapped: {reason}")
            }
            Self::InvalidBounds { reason } => write!(f, "invalid bounds: {reason}"),
            Self::UnsupportedType { name } => write!(f, "unsupported type '{name}'"),
            Self::AlreadyInvalid { handle } => write!(f, "identifier {handle} is invalid"),
            Self::Undefined { component } => {
                write!(f, "the {component} component is in an undefined state")
            }
            Self::LengthMismatch { expected, actual } => {
                write!(f, "buffer has {actual} elements, expected {expected}")
            }
            Self::InvalidLink { reason } => write!(f, "invalid side-quality link: {reason}"),
            Self::Store(e) => write!(f, "store: {e}"),
        }
    }
}

impl Error for NdfError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for NdfError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

/// Errors reported by an [`ArrayStore`](crate::ArrayStore).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreError {
    /// Nothing exists at the location.
    NotFound {
        /// The location looked up.
        location: String,
    },
    /// Something already exists at the location.
    AlreadyExists {
        /// The occupied location.
        location: String,
    },
    /// The location's parent group does not exist.
    ParentMissing {
        /// The location whose parent is missing.
        location: String,
    },
    /// A path component is not a legal name.
    InvalidName {
        /// The rejected name.
        name: String,
    },
    /// The id refers to an array that was deleted or never existed.
    InvalidId {
        /// The stale id.
        id: StoreId,
    },
    /// Data written does not match the array's element type.
    TypeMismatch {
        /// The array's element type.
        expected: NumericType,
        /// The type supplied.
        actual: NumericType,
    },
    /// Data written does not match the array's element count, or the
    /// imaginary part does not match the array's complex flag.
    ShapeMismatch {
        /// Description of the mismatch.
        reason: String,
    },
    /// A failure injected by a test harness.
    Injected {
        /// The operation that was made to fail.
        op: &'static str,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { location } => write!(f, "no object at {location}"),
            Self::AlreadyExists { location } => write!(f, "an object already exists at {location}"),
            Self::ParentMissing { location } => write!(f, "parent of {location} does not exist"),
            Self::InvalidName { name } => write!(f, "'{name}' is not a valid object name"),
            Self::InvalidId { id } => write!(f, "array id {id} is invalid"),
            Self::TypeMismatch { expected, actual } => {
                write!(f, "array holds {expected} but {actual} was supplied")
            }
            Self::ShapeMismatch { reason } => write!(f, "shape mismatch: {reason}"),
            Self::Injected { op } => write!(f, "injected failure in {op}"),
        }
    }
}

impl Error for StoreError {}
