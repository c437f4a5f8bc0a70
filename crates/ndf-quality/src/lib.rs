//! Quality masking.
//!
//! Converts a quality array into "bad pixel" flags: every cell whose
//! quality byte shares a bit with the badbits mask is overwritten with
//! the sentinel of its type in each of up to four parallel buffers
//! (typically the real and imaginary parts of Data and Variance).
//!
//! Three entry points share one kernel:
//!
//! - [`mask_slices`]: typed slices, generic over [`Element`](ndf_core::Element).
//! - [`mask_buffers`]: [`ArrayBuffer`](ndf_core::ArrayBuffer)s, dispatched on
//!   the buffer variant.
//! - [`mask_raw`]: raw bytes plus a type name such as `"_REAL"`.
//!
//! Masking never reads the numeric buffers; it only overwrites flagged
//! cells, so it is idempotent and safe on buffers already holding
//! sentinels. The quality array itself is never modified.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod dispatch;
pub mod kernel;
pub mod raw;

pub use dispatch::mask_buffers;
pub use kernel::{flagged_count, mask_slices, MaskTargets, MAX_TARGETS};
pub use raw::mask_raw;
