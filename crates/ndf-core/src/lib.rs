//! Core types and traits for the NDF control-block layer.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by every other crate in the workspace:
//! identifiers, the closed set of numeric element types and their
//! sentinel ("bad") values, pixel bounds, typed array buffers, error
//! types, status chaining, and the [`ArrayStore`] collaborator trait.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod bounds;
pub mod buffer;
pub mod error;
pub mod id;
pub mod location;
pub mod sentinel;
pub mod status;
pub mod traits;
pub mod types;

pub use bounds::{Bounds, MAX_DIMS};
pub use buffer::ArrayBuffer;
pub use error::{ErrorKind, NdfError, StoreError};
pub use id::{DcbId, HandleId, PlaceholderId, StoreId};
pub use location::Location;
pub use sentinel::{Element, Sentinel};
pub use status::{inherit, Status, StatusChain};
pub use traits::{ArrayInfo, ArrayParts, ArrayStore};
pub use types::{AccessMode, Component, ComponentState, FullType, NumericType, StorageForm};
