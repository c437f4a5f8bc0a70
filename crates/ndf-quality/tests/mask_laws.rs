//! Property tests for the masking laws, instantiated for every element type.

use ndf_core::Element;
use ndf_quality::{flagged_count, mask_slices, MaskTargets};
use proptest::prelude::*;

fn bytes_of<T: Element>(v: &[T]) -> Vec<u8> {
    bytemuck::cast_slice(v).to_vec()
}

macro_rules! mask_laws {
    ($module:ident, $t:ty) => {
        mod $module {
            use super::*;

            fn cells() -> impl Strategy<Value = (Vec<u8>, Vec<$t>, Vec<$t>)> {
                (1usize..64).prop_flat_map(|n| {
                    (
                        proptest::collection::vec(any::<u8>(), n),
                        proptest::collection::vec(any::<$t>(), n),
                        proptest::collection::vec(any::<$t>(), n),
                    )
                })
            }

            proptest! {
                #[test]
                fn zero_quality_never_alters(
                    (_, a, b) in cells(),
                    badbits in any::<u8>(),
                ) {
                    let quality = vec![0u8; a.len()];
                    let (mut a2, mut b2) = (a.clone(), b.clone());
                    let mut targets: MaskTargets<'_, $t> =
                        [Some(&mut a2[..]), None, None, Some(&mut b2[..])];
                    prop_assert!(!mask_slices(&quality, badbits, &mut targets).unwrap());
                    prop_assert_eq!(bytes_of(&a2), bytes_of(&a));
                    prop_assert_eq!(bytes_of(&b2), bytes_of(&b));
                }

                #[test]
                fn flagged_cells_become_bad_others_untouched(
                    (quality, a, b) in cells(),
                    badbits in any::<u8>(),
                ) {
                    let (mut a2, mut b2) = (a.clone(), b.clone());
                    let bad = {
                        let mut targets: MaskTargets<'_, $t> =
                            [None, Some(&mut a2[..]), Some(&mut b2[..]), None];
                        mask_slices(&quality, badbits, &mut targets).unwrap()
                    };
                    prop_assert_eq!(bad, flagged_count(&quality, badbits) > 0);
                    for i in 0..quality.len() {
                        if quality[i] & badbits != 0 {
                            prop_assert!(a2[i].is_bad());
                            prop_assert!(b2[i].is_bad());
                        } else {
                            prop_assert_eq!(bytes_of(&a2[i..=i]), bytes_of(&a[i..=i]));
                            prop_assert_eq!(bytes_of(&b2[i..=i]), bytes_of(&b[i..=i]));
                        }
                    }
                }

                #[test]
                fn masking_twice_equals_masking_once(
                    (quality, a, _) in cells(),
                    badbits in any::<u8>(),
                ) {
                    let mut once = a.clone();
                    mask_slices(&quality, badbits, &mut [Some(&mut once[..]), None, None, None]).unwrap();
                    let mut twice = once.clone();
                    let again =
                        mask_slices(&quality, badbits, &mut [Some(&mut twice[..]), None, None, None]).unwrap();
                    prop_assert_eq!(again, flagged_count(&quality, badbits) > 0);
                    prop_assert_eq!(bytes_of(&twice), bytes_of(&once));
                }
            }
        }
    };
}

mask_laws!(byte, i8);
mask_laws!(ubyte, u8);
mask_laws!(word, i16);
mask_laws!(uword, u16);
mask_laws!(integer, i32);
mask_laws!(int64, i64);
mask_laws!(real, f32);
mask_laws!(double, f64);
