//! Masking of [`ArrayBuffer`]s, dispatched on the element type.

use ndf_core::{with_numeric_type, ArrayBuffer, NdfError};

use crate::kernel::{mask_slices, MaskTargets, MAX_TARGETS};

/// Mask up to four buffers of one element type.
///
/// All supplied buffers must hold the same element type; `None` slots are
/// skipped. With no buffers supplied the call only reports whether any
/// cell is flagged.
///
/// # Errors
///
/// - [`NdfError::UnsupportedType`] if the buffers disagree on element type;
///   the name reported is the first disagreeing type.
/// - [`NdfError::LengthMismatch`] if a buffer is shorter than `quality`.
pub fn mask_buffers(
    quality: &[u8],
    badbits: u8,
    targets: [Option<&mut ArrayBuffer>; MAX_TARGETS],
) -> Result<bool, NdfError> {
    let mut kinds = targets.iter().flatten().map(|b| b.kind());
    let Some(kind) = kinds.next() else {
        let mut none: MaskTargets<'_, u8> = [None, None, None, None];
        return mask_slices(quality, badbits, &mut none);
    };
    if let Some(other) = kinds.find(|&k| k != kind) {
        return Err(NdfError::UnsupportedType {
            name: format!("{other} mixed with {kind}"),
        });
    }

    with_numeric_type!(kind, T => {
        let mut slices: MaskTargets<'_, T> =
            targets.map(|t| t.and_then(|b| b.as_mut_slice::<T>()));
        mask_slices(quality, badbits, &mut slices)
    })
}
