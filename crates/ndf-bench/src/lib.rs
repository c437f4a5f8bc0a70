//! Benchmark profiles for the NDF handle and masking layers.
//!
//! - [`image_profile`]: a 2-d `_REAL` object with defined Quality and a
//!   deterministic scattering of flagged pixels
//! - [`flag_every`]: the Quality pattern used by the profiles

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use ndf_access::Library;
use ndf_core::{AccessMode, ArrayBuffer, Component, HandleId, Location, NdfError, NumericType};
use ndf_store::MemStore;

/// Quality bytes for `n` pixels, with bit 0 set on every `stride`-th.
pub fn flag_every(n: usize, stride: usize) -> Vec<u8> {
    (0..n)
        .map(|i| u8::from(stride > 0 && i % stride == 0))
        .collect()
}

/// Build a library holding one `nx` x `ny` `_REAL` object at `/bench`.
///
/// Data holds `0, 1, 2, ...`; Quality flags every 97th pixel with bit 0.
/// Badbits are left at zero so reads are unmasked until the caller sets
/// them.
pub fn image_profile(nx: i64, ny: i64) -> Result<(Library<MemStore>, HandleId), NdfError> {
    let mut lib = Library::new(MemStore::new());
    let location = Location::parse("/bench")?;
    let placeholder = lib.reserve(&location)?;
    let h = lib.create(placeholder, "_REAL", &[1, 1], &[nx, ny])?;
    let n = lib.bounds(h)?.cell_count();

    lib.map(h, Component::Data, NumericType::Real, AccessMode::Write)?
        .real = ArrayBuffer::from_vec((0..n).map(|i| i as f32).collect::<Vec<_>>());
    lib.unmap(h, Component::Data)?;

    lib.map(h, Component::Quality, NumericType::UByte, AccessMode::Write)?
        .real = ArrayBuffer::from_vec(flag_every(n, 97));
    lib.unmap(h, Component::Quality)?;
    Ok((lib, h))
}
