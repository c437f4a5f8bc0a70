//! The generic masking kernel.

use ndf_core::{Element, NdfError};

/// Maximum number of parallel buffers masked in one pass.
pub const MAX_TARGETS: usize = 4;

/// Up to [`MAX_TARGETS`] parallel buffers; `None` slots are skipped.
pub type MaskTargets<'a, T> = [Option<&'a mut [T]>; MAX_TARGETS];

/// Mask every supplied target against `quality` and `badbits`.
///
/// For each cell `i`, if `quality[i] & badbits != 0` then `target[i]` is
/// set to `T::BAD` in every supplied target; other cells are untouched.
/// Returns whether any cell was flagged.
///
/// # Errors
///
/// [`NdfError::LengthMismatch`] if a supplied target is shorter than
/// `quality`. Lengths are checked before anything is written.
pub fn mask_slices<T: Element>(
    quality: &[u8],
    badbits: u8,
    targets: &mut MaskTargets<'_, T>,
) -> Result<bool, NdfError> {
    for target in targets.iter().flatten() {
        if target.len() < quality.len() {
            return Err(NdfError::LengthMismatch {
                expected: quality.len(),
                actual: target.len(),
            });
        }
    }
    if badbits == 0 {
        return Ok(false);
    }

    let mut bad = false;
    for (i, &q) in quality.iter().enumerate() {
        if q & badbits != 0 {
            bad = true;
            for target in targets.iter_mut().flatten() {
                target[i] = T::BAD;
            }
        }
    }
    Ok(bad)
}

/// Number of cells `quality` flags under `badbits`.
pub fn flagged_count(quality: &[u8], badbits: u8) -> usize {
    quality.iter().filter(|&&q| q & badbits != 0).count()
}
