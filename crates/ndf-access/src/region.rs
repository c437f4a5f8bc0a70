//! Copying pixel regions between stored arrays and mapped buffers.
//!
//! A handle's bounds need not match the stored array's: sections select
//! a sub-region, and a section whose base has since shrunk may extend
//! past it. Pixels outside the stored array are padded on the way out
//! and dropped on the way back.

use ndf_core::{ArrayBuffer, Bounds, Component, NdfError};

/// Value given to pixels that lie outside the stored array.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Pad {
    /// The element type's sentinel.
    Bad,
    /// Zero, i.e. no quality bits set.
    Zero,
}

impl Pad {
    pub(crate) fn for_component(component: Component) -> Self {
        match component {
            Component::Quality => Self::Zero,
            Component::Data | Component::Variance => Self::Bad,
        }
    }

    fn buffer(self, like: &ArrayBuffer, len: usize) -> ArrayBuffer {
        match self {
            Self::Bad => ArrayBuffer::filled_bad(like.kind(), len),
            Self::Zero => ArrayBuffer::zeroed(like.kind(), len),
        }
    }
}

/// The pixels of `region` taken from `stored`, an array with bounds
/// `stored_bounds`, in `region`'s storage order.
pub(crate) fn extract(
    stored: &ArrayBuffer,
    stored_bounds: &Bounds,
    region: &Bounds,
    pad: Pad,
) -> Result<ArrayBuffer, NdfError> {
    check_stored(stored, stored_bounds)?;
    if region == stored_bounds {
        return Ok(stored.clone());
    }
    let mut out = pad.buffer(stored, region.cell_count());
    if let Some(common) = stored_bounds.intersection(region) {
        let values = stored.gather(&stored_bounds.region_indices(&common));
        out.scatter(&region.region_indices(&common), &values)?;
    }
    Ok(out)
}

/// Write `values`, laid out over `region`, back into `stored`.
///
/// Values are converted to the stored type; pixels of `region` outside
/// `stored_bounds` are discarded.
pub(crate) fn insert(
    stored: &mut ArrayBuffer,
    stored_bounds: &Bounds,
    region: &Bounds,
    values: &ArrayBuffer,
) -> Result<(), NdfError> {
    check_stored(stored, stored_bounds)?;
    if values.len() != region.cell_count() {
        return Err(NdfError::LengthMismatch {
            expected: region.cell_count(),
            actual: values.len(),
        });
    }
    if region == stored_bounds {
        *stored = values.convert(stored.kind());
        return Ok(());
    }
    if let Some(common) = stored_bounds.intersection(region) {
        let picked = values.gather(&region.region_indices(&common));
        stored.scatter(&stored_bounds.region_indices(&common), &picked)?;
    }
    Ok(())
}

fn check_stored(stored: &ArrayBuffer, stored_bounds: &Bounds) -> Result<(), NdfError> {
    if stored.len() == stored_bounds.cell_count() {
        Ok(())
    } else {
        Err(NdfError::LengthMismatch {
            expected: stored_bounds.cell_count(),
            actual: stored.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndf_core::Element;

    fn base() -> (ArrayBuffer, Bounds) {
        // 4 x 3, value = linear index.
        let b = Bounds::new(&[1, 1], &[4, 3]).unwrap();
        (ArrayBuffer::from((0..12).map(|v| v as f32).collect::<Vec<_>>()), b)
    }

    #[test]
    fn extract_inner_section() {
        let (stored, b) = base();
        let section = Bounds::new(&[2, 2], &[3, 3]).unwrap();
        let out = extract(&stored, &b, &section, Pad::Bad).unwrap();
        assert_eq!(out.as_slice::<f32>(), Some(&[5.0, 6.0, 9.0, 10.0][..]));
    }

    #[test]
    fn extract_pads_outside_pixels() {
        let (stored, b) = base();
        let section = Bounds::new(&[4, 3], &[5, 3]).unwrap();
        let out = extract(&stored, &b, &section, Pad::Bad).unwrap();
        assert_eq!(out.as_slice::<f32>(), Some(&[11.0, f32::BAD][..]));

        let q = ArrayBuffer::from(vec![7u8; 12]);
        let out = extract(&q, &b, &section, Pad::Zero).unwrap();
        assert_eq!(out.as_slice::<u8>(), Some(&[7, 0][..]));
    }

    #[test]
    fn insert_writes_only_the_region() {
        let (mut stored, b) = base();
        let section = Bounds::new(&[1, 3], &[2, 3]).unwrap();
        insert(&mut stored, &b, &section, &ArrayBuffer::from(vec![-1.0f64, -2.0])).unwrap();
        let s = stored.as_slice::<f32>().unwrap();
        assert_eq!(&s[8..12], &[-1.0, -2.0, 10.0, 11.0]);
        assert_eq!(s[0], 0.0);
    }

    #[test]
    fn insert_rejects_wrong_length() {
        let (mut stored, b) = base();
        let err = insert(&mut stored, &b, &b, &ArrayBuffer::from(vec![0.0f32; 11])).unwrap_err();
        assert_eq!(
            err,
            NdfError::LengthMismatch {
                expected: 12,
                actual: 11
            }
        );
    }

    #[test]
    fn extra_section_axis_maps_onto_unit_axis() {
        let (stored, b) = base();
        let section = Bounds::new(&[2, 1, 1], &[2, 3, 1]).unwrap();
        let out = extract(&stored, &b, &section, Pad::Bad).unwrap();
        assert_eq!(out.as_slice::<f32>(), Some(&[1.0, 5.0, 9.0][..]));
    }

    #[test]
    fn stored_array_must_match_its_bounds() {
        let (stored, _) = base();
        let claimed = Bounds::new(&[1, 1], &[4, 4]).unwrap();
        let section = Bounds::new(&[3, 4], &[4, 4]).unwrap();
        let err = extract(&stored, &claimed, &section, Pad::Bad).unwrap_err();
        assert_eq!(err, NdfError::LengthMismatch { expected: 16, actual: 12 });

        let mut stored = stored;
        let values = ArrayBuffer::from(vec![0.0f32; 2]);
        assert!(insert(&mut stored, &claimed, &section, &values).is_err());
    }
}
