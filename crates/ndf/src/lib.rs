//! NDF: handle-based access to n-dimensional data objects.
//!
//! This is the top-level facade crate that re-exports the public API of
//! the NDF sub-crates. Adding `ndf` as a single dependency is enough for
//! most users.
//!
//! # Quick start
//!
//! ```rust
//! use ndf::prelude::*;
//!
//! let mut lib = Library::new(MemStore::new());
//! let location = Location::parse("/image").unwrap();
//!
//! // Reserve a location, then create a 4×3 `_REAL` object there.
//! let placeholder = lib.reserve(&location).unwrap();
//! let h = lib.create(placeholder, "_REAL", &[1, 1], &[4, 3]).unwrap();
//!
//! // Flag one pixel in the Quality component.
//! let quality = lib
//!     .map(h, Component::Quality, NumericType::UByte, AccessMode::Write)
//!     .unwrap();
//! quality.real.as_mut_slice::<u8>().unwrap()[5] = 1;
//! lib.unmap(h, Component::Quality).unwrap();
//!
//! // With badbits set, reading Data masks the flagged pixel.
//! lib.set_badbits(h, 1).unwrap();
//! let data = lib
//!     .map(h, Component::Data, NumericType::Real, AccessMode::Read)
//!     .unwrap();
//! assert_eq!(data.real.count_bad(), 1);
//! lib.unmap(h, Component::Data).unwrap();
//!
//! // Discarding Quality reports whether there was anything to discard.
//! assert!(lib.reset(h, Component::Quality).unwrap());
//! assert!(!lib.is_defined(h, Component::Quality).unwrap());
//! lib.release(h).unwrap();
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `ndf-core` | Ids, bounds, buffers, sentinels, errors, the store trait |
//! | [`store`] | `ndf-store` | The in-memory container store |
//! | [`quality`] | `ndf-quality` | Quality masking kernels |
//! | [`access`] | `ndf-access` | The [`Library`](access::Library) and its handle tables |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, traits and ids (`ndf-core`).
///
/// Contains [`types::Bounds`], [`types::ArrayBuffer`], the per-type bad
/// values of [`types::Element`], the error types and the
/// [`types::ArrayStore`] trait that a container backend implements.
pub use ndf_core as types;

/// Container stores (`ndf-store`).
pub use ndf_store as store;

/// Quality masking (`ndf-quality`).
///
/// [`quality::mask_buffers`] masks typed buffers;
/// [`quality::mask_raw`] works on raw bytes named by a type string.
pub use ndf_quality as quality;

/// Handle tables, mapping and component lifecycle (`ndf-access`).
pub use ndf_access as access;

/// Common imports for typical NDF usage.
///
/// ```rust
/// use ndf::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use ndf_core::{
        AccessMode, ArrayBuffer, ArrayStore, Bounds, Component, ComponentState, Element, FullType,
        HandleId, Location, NumericType, PlaceholderId, StorageForm,
    };

    // Errors
    pub use ndf_core::{ErrorKind, NdfError, Status, StoreError};

    // Store
    pub use ndf_store::MemStore;

    // Masking
    pub use ndf_quality::{mask_buffers, mask_raw};

    // Library
    pub use ndf_access::{Library, LibraryConfig, MappedArray};
}
