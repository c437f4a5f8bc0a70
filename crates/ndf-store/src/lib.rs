//! In-memory hierarchical array store.
//!
//! [`MemStore`] is the reference [`ArrayStore`](ndf_core::ArrayStore):
//! a tree of groups and typed arrays keyed by [`Location`](ndf_core::Location),
//! with per-array serial ids so that deletion invalidates every
//! outstanding [`StoreId`](ndf_core::StoreId) and re-creation never
//! resurrects an old one.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod mem;

pub use mem::MemStore;
