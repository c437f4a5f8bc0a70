//! Handle-based access to NDF objects.
//!
//! A [`Library`] sits between callers and an [`ArrayStore`](ndf_core::ArrayStore).
//! Callers never see store ids; they hold small opaque [`HandleId`](ndf_core::HandleId)s
//! resolved through three tables:
//!
//! - the **ACB** table, one entry per handle (base or section);
//! - the **DCB** table, one reference-counted entry per open object,
//!   shared by all its handles and holding per-component map counters;
//! - the **PCB** table, one entry per reserved location awaiting
//!   creation.
//!
//! The map counters are the central exclusivity rule: a component may be
//! mapped for reading by any number of handles, but writing, resetting,
//! retyping or reshaping it requires that no handle has it mapped.
//!
//! # Creation protocol
//!
//! [`Library::reserve`] issues a placeholder; [`Library::create`]
//! consumes it exactly once, leaving either a new object and base handle
//! or, on failure, nothing at all in the store.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod acb;
pub mod config;
pub mod dcb;
pub mod library;
pub mod pcb;

mod lifecycle;
mod mapping;
mod region;
mod table;

pub use acb::{AccessControlBlock, MappedArray};
pub use config::{ConfigError, LibraryConfig};
pub use dcb::{ComponentSlot, DataControlBlock};
pub use library::{Library, BADBITS_ATTRIBUTE};
pub use pcb::Placeholder;
