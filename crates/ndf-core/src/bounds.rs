//! Pixel-index bounds and region arithmetic.
//!
//! Bounds are inclusive `[lower, upper]` pixel indices per axis, with the
//! first axis varying fastest in linear storage order. An axis beyond
//! `ndim()` behaves as `[1, 1]`, so bounds of different dimensionality
//! can be compared and intersected directly.

use std::fmt;

use smallvec::SmallVec;

use crate::error::NdfError;

/// Maximum number of dimensions an array may have.
pub const MAX_DIMS: usize = 7;

/// Per-axis index storage; never spills for valid bounds.
pub type Extent = SmallVec<[i64; MAX_DIMS]>;

/// Validated pixel-index bounds of an array or section.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Bounds {
    lower: Extent,
    upper: Extent,
}

impl Bounds {
    /// Validate and build bounds with the default dimension limit.
    ///
    /// # Errors
    ///
    /// [`NdfError::InvalidBounds`] if the slices differ in length, the
    /// dimension count is outside `1..=MAX_DIMS`, any `lower[i] > upper[i]`,
    /// or the cell count overflows `usize`.
    pub fn new(lower: &[i64], upper: &[i64]) -> Result<Self, NdfError> {
        Self::with_max_dims(lower, upper, MAX_DIMS)
    }

    /// Validate and build bounds, accepting at most `max_dims` axes.
    ///
    /// # Errors
    ///
    /// As for [`Bounds::new`].
    pub fn with_max_dims(lower: &[i64], upper: &[i64], max_dims: usize) -> Result<Self, NdfError> {
        if lower.len() != upper.len() {
            return Err(NdfError::InvalidBounds {
                reason: format!(
                    "{} lower bounds but {} upper bounds",
                    lower.len(),
                    upper.len()
                ),
            });
        }
        let ndim = lower.len();
        if ndim == 0 || ndim > max_dims.min(MAX_DIMS) {
            return Err(NdfError::InvalidBounds {
                reason: format!(
                    "{ndim} dimensions is outside the range 1..={}",
                    max_dims.min(MAX_DIMS)
                ),
            });
        }
        let mut cells: usize = 1;
        for (axis, (&lo, &hi)) in lower.iter().zip(upper).enumerate() {
            if lo > hi {
                return Err(NdfError::InvalidBounds {
                    reason: format!(
                        "lower bound {lo} exceeds upper bound {hi} on axis {}",
                        axis + 1
                    ),
                });
            }
            cells = hi
                .checked_sub(lo)
                .and_then(|d| d.checked_add(1))
                .and_then(|extent| usize::try_from(extent).ok())
                .and_then(|extent| cells.checked_mul(extent))
                .ok_or_else(|| NdfError::InvalidBounds {
                    reason: "total number of pixels overflows".into(),
                })?;
        }
        Ok(Self {
            lower: lower.iter().copied().collect(),
            upper: upper.iter().copied().collect(),
        })
    }

    /// Bounds `[1, dims[i]]` on every axis.
    ///
    /// # Errors
    ///
    /// As for [`Bounds::new`].
    pub fn from_dims(dims: &[i64]) -> Result<Self, NdfError> {
        let lower = vec![1; dims.len()];
        Self::new(&lower, dims)
    }

    /// Number of axes.
    pub fn ndim(&self) -> usize {
        self.lower.len()
    }

    /// Lower bounds, one per axis.
    pub fn lower(&self) -> &[i64] {
        &self.lower
    }

    /// Upper bounds, one per axis.
    pub fn upper(&self) -> &[i64] {
        &self.upper
    }

    /// `(lower, upper)` of axis `i`, or `(1, 1)` beyond `ndim()`.
    pub fn axis(&self, i: usize) -> (i64, i64) {
        match (self.lower.get(i), self.upper.get(i)) {
            (Some(&lo), Some(&hi)) => (lo, hi),
            _ => (1, 1),
        }
    }

    /// Number of pixels along axis `i`.
    ///
    /// Construction guarantees the total pixel count fits in `usize`, so
    /// the saturation never takes effect on a valid value.
    pub fn extent(&self, i: usize) -> usize {
        let (lo, hi) = self.axis(i);
        usize::try_from(hi.abs_diff(lo))
            .unwrap_or(usize::MAX)
            .saturating_add(1)
    }

    /// Number of pixels along each axis.
    pub fn dims(&self) -> Extent {
        (0..self.ndim()).map(|i| self.extent(i) as i64).collect()
    }

    /// Total number of pixels.
    pub fn cell_count(&self) -> usize {
        (0..self.ndim()).map(|i| self.extent(i)).product()
    }

    /// Whether every pixel of `other` is also a pixel of `self`.
    pub fn contains(&self, other: &Bounds) -> bool {
        let n = self.ndim().max(other.ndim());
        (0..n).all(|i| {
            let (lo, hi) = self.axis(i);
            let (olo, ohi) = other.axis(i);
            lo <= olo && ohi <= hi
        })
    }

    /// The pixels common to both, or `None` if they are disjoint.
    pub fn intersection(&self, other: &Bounds) -> Option<Bounds> {
        let n = self.ndim().max(other.ndim());
        let mut lower = Extent::new();
        let mut upper = Extent::new();
        for i in 0..n {
            let (lo, hi) = self.axis(i);
            let (olo, ohi) = other.axis(i);
            let (l, u) = (lo.max(olo), hi.min(ohi));
            if l > u {
                return None;
            }
            lower.push(l);
            upper.push(u);
        }
        Some(Bounds { lower, upper })
    }

    /// Linear storage indices, within an array of these bounds, of every
    /// pixel of `region`, in the region's own storage order.
    ///
    /// `region` must satisfy `self.contains(region)`; callers validate
    /// sections before asking for their indices.
    pub fn region_indices(&self, region: &Bounds) -> Vec<usize> {
        debug_assert!(self.contains(region));
        let n = self.ndim().max(region.ndim());
        let mut strides = Vec::with_capacity(n);
        let mut stride = 1usize;
        for i in 0..n {
            strides.push(stride);
            stride *= self.extent(i);
        }

        let mut pixel: Vec<i64> = (0..n).map(|i| region.axis(i).0).collect();
        let mut indices = Vec::with_capacity(region.cell_count());
        loop {
            let linear = (0..n)
                .map(|i| pixel[i].abs_diff(self.axis(i).0) as usize * strides[i])
                .sum();
            indices.push(linear);

            let mut d = 0;
            loop {
                if d == n {
                    return indices;
                }
                let (lo, hi) = region.axis(d);
                if pixel[d] < hi {
                    pixel[d] += 1;
                    break;
                }
                pixel[d] = lo;
                d += 1;
            }
        }
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for i in 0..self.ndim() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}:{}", self.lower[i], self.upper[i])?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn validates_dimension_count() {
        assert!(Bounds::new(&[], &[]).is_err());
        assert!(Bounds::new(&[1; 8], &[2; 8]).is_err());
        assert!(Bounds::new(&[1; 7], &[2; 7]).is_ok());
        assert!(Bounds::with_max_dims(&[1, 1, 1], &[2, 2, 2], 2).is_err());
    }

    #[test]
    fn rejects_inverted_axis() {
        let err = Bounds::new(&[1, 5], &[10, 4]).unwrap_err();
        assert!(matches!(err, NdfError::InvalidBounds { reason } if reason.contains("axis 2")));
    }

    #[test]
    fn extreme_axes_are_rejected_not_overflowed() {
        for (lower, upper) in [
            ([i64::MIN], [0]),
            ([i64::MIN], [i64::MAX]),
            ([-1], [i64::MAX]),
            ([0], [i64::MAX]),
        ] {
            let err = Bounds::new(&lower, &upper).unwrap_err();
            assert!(
                matches!(err, NdfError::InvalidBounds { ref reason } if reason.contains("overflows")),
                "{lower:?}..{upper:?}: {err}"
            );
        }
        let wide = Bounds::new(&[i64::MAX - 3], &[i64::MAX]).unwrap();
        assert_eq!(wide.extent(0), 4);
        assert_eq!(wide.cell_count(), 4);
        assert_eq!(wide.region_indices(&wide), vec![0, 1, 2, 3]);
        let low = Bounds::new(&[i64::MIN], &[i64::MIN + 1]).unwrap();
        assert_eq!(low.dims().as_slice(), &[2]);
    }

    #[test]
    fn rejects_mismatched_lengths() {
        assert!(Bounds::new(&[1, 1], &[3]).is_err());
    }

    #[test]
    fn cell_count_and_display() {
        let b = Bounds::new(&[1, 1], &[40, 32]).unwrap();
        assert_eq!(b.cell_count(), 1280);
        assert_eq!(b.dims().as_slice(), &[40, 32]);
        assert_eq!(b.to_string(), "(1:40,1:32)");
    }

    #[test]
    fn trailing_axes_act_as_unit() {
        let b2 = Bounds::new(&[1, 1], &[4, 4]).unwrap();
        let b3 = Bounds::new(&[2, 2, 1], &[3, 3, 1]).unwrap();
        assert!(b2.contains(&b3));
        let b3_far = Bounds::new(&[2, 2, 2], &[3, 3, 2]).unwrap();
        assert!(!b2.contains(&b3_far));
    }

    #[test]
    fn region_indices_follow_first_axis_fastest() {
        let base = Bounds::new(&[1, 1], &[4, 3]).unwrap();
        let region = Bounds::new(&[2, 2], &[3, 3]).unwrap();
        assert_eq!(base.region_indices(&region), vec![5, 6, 9, 10]);
    }

    #[test]
    fn region_indices_with_negative_origin() {
        let base = Bounds::new(&[-1], &[3]).unwrap();
        let region = Bounds::new(&[0], &[1]).unwrap();
        assert_eq!(base.region_indices(&region), vec![1, 2]);
    }

    #[test]
    fn disjoint_bounds_have_no_intersection() {
        let a = Bounds::new(&[1], &[5]).unwrap();
        let b = Bounds::new(&[6], &[9]).unwrap();
        assert!(a.intersection(&b).is_none());
    }

    fn arb_bounds() -> impl Strategy<Value = Bounds> {
        prop::collection::vec((-5i64..5, 0i64..4), 1..4).prop_map(|axes| {
            let lower: Vec<i64> = axes.iter().map(|(lo, _)| *lo).collect();
            let upper: Vec<i64> = axes.iter().map(|(lo, len)| lo + len).collect();
            Bounds::new(&lower, &upper).unwrap()
        })
    }

    proptest! {
        #[test]
        fn whole_region_is_identity(b in arb_bounds()) {
            let idx = b.region_indices(&b);
            prop_assert_eq!(idx, (0..b.cell_count()).collect::<Vec<_>>());
        }

        #[test]
        fn intersection_is_contained_in_both(a in arb_bounds(), b in arb_bounds()) {
            if let Some(i) = a.intersection(&b) {
                prop_assert!(a.contains(&i));
                prop_assert!(b.contains(&i));
                prop_assert_eq!(a.region_indices(&i).len(), i.cell_count());
            }
        }

        #[test]
        fn region_indices_are_distinct_and_in_range(a in arb_bounds(), b in arb_bounds()) {
            if let Some(i) = a.intersection(&b) {
                let mut idx = a.region_indices(&i);
                prop_assert!(idx.iter().all(|&x| x < a.cell_count()));
                idx.sort_unstable();
                idx.dedup();
                prop_assert_eq!(idx.len(), i.cell_count());
            }
        }
    }
}
