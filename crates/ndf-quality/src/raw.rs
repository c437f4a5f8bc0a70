//! Masking of raw byte buffers identified by a type name.
//!
//! This is the entry point for callers that hold untyped storage, e.g.
//! bytes handed across a language boundary. The type name is parsed
//! case-insensitively; buffers need not be aligned for the element type.

use ndf_core::{with_numeric_type, Element, NdfError, NumericType};

use crate::kernel::{mask_slices, MaskTargets, MAX_TARGETS};

/// Mask up to four native-endian byte buffers holding elements of the
/// type named by `type_name` (e.g. `"_REAL"`, `"_uword"`).
///
/// # Errors
///
/// - [`NdfError::UnsupportedType`] carrying `type_name` verbatim if it is
///   not one of the eight supported types.
/// - [`NdfError::LengthMismatch`] if a buffer's length is not a whole
///   number of elements or holds fewer elements than `quality`.
pub fn mask_raw(
    quality: &[u8],
    badbits: u8,
    type_name: &str,
    targets: [Option<&mut [u8]>; MAX_TARGETS],
) -> Result<bool, NdfError> {
    let kind = NumericType::parse(type_name)?;
    with_numeric_type!(kind, T => mask_raw_typed::<T>(quality, badbits, targets))
}

fn mask_raw_typed<T: Element>(
    quality: &[u8],
    badbits: u8,
    targets: [Option<&mut [u8]>; MAX_TARGETS],
) -> Result<bool, NdfError> {
    let size = std::mem::size_of::<T>();
    let mut decoded: [Option<Vec<T>>; MAX_TARGETS] = [None, None, None, None];
    for (slot, bytes) in decoded.iter_mut().zip(targets.iter()) {
        if let Some(bytes) = bytes {
            if bytes.len() % size != 0 {
                return Err(NdfError::LengthMismatch {
                    expected: quality.len() * size,
                    actual: bytes.len(),
                });
            }
            *slot = Some(
                bytes
                    .chunks_exact(size)
                    .map(bytemuck::pod_read_unaligned::<T>)
                    .collect(),
            );
        }
    }

    let bad = {
        let mut slices: MaskTargets<'_, T> = decoded
            .each_mut()
            .map(|v| v.as_mut().map(|v| v.as_mut_slice()));
        mask_slices(quality, badbits, &mut slices)?
    };

    if bad {
        for (bytes, values) in targets.into_iter().zip(&decoded) {
            if let (Some(bytes), Some(values)) = (bytes, values) {
                bytes.copy_from_slice(bytemuck::cast_slice(values.as_slice()));
            }
        }
    }
    Ok(bad)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_bytes_by_type_name() {
        let mut data: Vec<u8> = [1.0f32, 2.0, 3.0]
            .iter()
            .flat_map(|v| v.to_ne_bytes())
            .collect();
        let bad = mask_raw(&[0, 1, 0], 1, "_real", [Some(&mut data[..]), None, None, None]).unwrap();
        assert!(bad);
        let middle = f32::from_ne_bytes([data[4], data[5], data[6], data[7]]);
        assert_eq!(middle, f32::BAD);
        assert_eq!(f32::from_ne_bytes([data[0], data[1], data[2], data[3]]), 1.0);
    }

    #[test]
    fn unaligned_buffers_are_fine() {
        let mut backing = vec![0u8; 17];
        let view = &mut backing[1..17];
        let bad = mask_raw(&[1, 0], 1, "_DOUBLE", [Some(view), None, None, None]).unwrap();
        assert!(bad);
        let first = f64::from_ne_bytes(backing[1..9].try_into().unwrap());
        assert_eq!(first, f64::BAD);
        assert!(backing[9..].iter().all(|&b| b == 0));
    }

    #[test]
    fn unknown_type_name_is_reported_verbatim() {
        let mut data = vec![0u8; 4];
        let err = mask_raw(&[1], 1, "_LOGICAL", [Some(&mut data[..]), None, None, None]).unwrap_err();
        assert_eq!(
            err,
            NdfError::UnsupportedType {
                name: "_LOGICAL".into()
            }
        );
    }

    #[test]
    fn ragged_byte_length_is_rejected() {
        let mut data = vec![0u8; 5];
        let err = mask_raw(&[1, 1], 1, "_WORD", [Some(&mut data[..]), None, None, None]).unwrap_err();
        assert!(matches!(err, NdfError::LengthMismatch { .. }));
    }

    #[test]
    fn int64_is_supported() {
        let mut data: Vec<u8> = [5i64, 6].iter().flat_map(|v| v.to_ne_bytes()).collect();
        assert!(mask_raw(&[0, 3], 2, "_INT64", [Some(&mut data[..]), None, None, None]).unwrap());
        assert_eq!(i64::from_ne_bytes(data[8..].try_into().unwrap()), i64::MIN);
    }
}
