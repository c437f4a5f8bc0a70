//! Per-type "bad" values and the [`Element`] trait.
//!
//! Missing or invalid cells are marked in place with a reserved value of
//! the cell's own type instead of a nullable wrapper. The table is fixed:
//!
//! | Type | Sentinel |
//! |------|----------|
//! | `_BYTE` | `i8::MIN` |
//! | `_UBYTE` | `u8::MAX` |
//! | `_WORD` | `i16::MIN` |
//! | `_UWORD` | `u16::MAX` |
//! | `_INTEGER` | `i32::MIN` |
//! | `_INT64` | `i64::MIN` |
//! | `_REAL` | `-f32::MAX` |
//! | `_DOUBLE` | `-f64::MAX` |

use std::fmt;

use num_traits::NumCast;

use crate::buffer::ArrayBuffer;
use crate::types::NumericType;

/// A primitive element type that can live in an [`ArrayBuffer`].
///
/// Implemented for exactly the eight types of [`NumericType`]; the trait
/// is what lets the masking and conversion kernels be written once.
pub trait Element: Copy + PartialEq + PartialOrd + fmt::Debug + bytemuck::Pod + NumCast {
    /// The type tag for this element type.
    const KIND: NumericType;

    /// The reserved "bad" value.
    const BAD: Self;

    /// Whether this value is the sentinel.
    fn is_bad(self) -> bool {
        self == Self::BAD
    }

    /// Wrap a vector in the matching buffer variant.
    fn wrap(values: Vec<Self>) -> ArrayBuffer;

    /// Borrow the buffer's contents if it holds this element type.
    fn slice(buffer: &ArrayBuffer) -> Option<&[Self]>;

    /// Mutably borrow the buffer's contents if it holds this element type.
    fn slice_mut(buffer: &mut ArrayBuffer) -> Option<&mut [Self]>;
}

macro_rules! impl_element {
    ($t:ty, $kind:ident, $bad:expr) => {
        impl Element for $t {
            const KIND: NumericType = NumericType::$kind;
            const BAD: Self = $bad;

            fn wrap(values: Vec<Self>) -> ArrayBuffer {
                ArrayBuffer::$kind(values)
            }

            fn slice(buffer: &ArrayBuffer) -> Option<&[Self]> {
                match buffer {
                    ArrayBuffer::$kind(v) => Some(v.as_slice()),
                    _ => None,
                }
            }

            fn slice_mut(buffer: &mut ArrayBuffer) -> Option<&mut [Self]> {
                match buffer {
                    ArrayBuffer::$kind(v) => Some(v.as_mut_slice()),
                    _ => None,
                }
            }
        }
    };
}

impl_element!(i8, Byte, i8::MIN);
impl_element!(u8, UByte, u8::MAX);
impl_element!(i16, Word, i16::MIN);
impl_element!(u16, UWord, u16::MAX);
impl_element!(i32, Integer, i32::MIN);
impl_element!(i64, Int64, i64::MIN);
impl_element!(f32, Real, -f32::MAX);
impl_element!(f64, Double, -f64::MAX);

/// The sentinel of one type, tagged with that type.
///
/// Used where the element type is only known at run time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Sentinel {
    /// `_BYTE` sentinel.
    Byte(i8),
    /// `_UBYTE` sentinel.
    UByte(u8),
    /// `_WORD` sentinel.
    Word(i16),
    /// `_UWORD` sentinel.
    UWord(u16),
    /// `_INTEGER` sentinel.
    Integer(i32),
    /// `_INT64` sentinel.
    Int64(i64),
    /// `_REAL` sentinel.
    Real(f32),
    /// `_DOUBLE` sentinel.
    Double(f64),
}

impl Sentinel {
    /// Look up the sentinel for a type.
    pub fn for_type(kind: NumericType) -> Self {
        match kind {
            NumericType::Byte => Self::Byte(i8::BAD),
            NumericType::UByte => Self::UByte(u8::BAD),
            NumericType::Word => Self::Word(i16::BAD),
            NumericType::UWord => Self::UWord(u16::BAD),
            NumericType::Integer => Self::Integer(i32::BAD),
            NumericType::Int64 => Self::Int64(i64::BAD),
            NumericType::Real => Self::Real(f32::BAD),
            NumericType::Double => Self::Double(f64::BAD),
        }
    }

    /// The type this sentinel belongs to.
    pub fn kind(self) -> NumericType {
        match self {
            Self::Byte(_) => NumericType::Byte,
            Self::UByte(_) => NumericType::UByte,
            Self::Word(_) => NumericType::Word,
            Self::UWord(_) => NumericType::UWord,
            Self::Integer(_) => NumericType::Integer,
            Self::Int64(_) => NumericType::Int64,
            Self::Real(_) => NumericType::Real,
            Self::Double(_) => NumericType::Double,
        }
    }
}

/// Convert one value between element types, preserving badness.
///
/// A bad source value becomes the destination's sentinel, and so does a
/// value the destination type cannot represent (out of range or NaN).
pub fn convert_value<S: Element, D: Element>(value: S) -> D {
    if value.is_bad() {
        return D::BAD;
    }
    <D as NumCast>::from(value).unwrap_or(D::BAD)
}

/// Convert a slice between element types with [`convert_value`].
pub fn convert_slice<S: Element, D: Element>(src: &[S]) -> Vec<D> {
    src.iter().map(|&v| convert_value::<S, D>(v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_table_matches_type_tags() {
        for kind in NumericType::ALL {
            assert_eq!(Sentinel::for_type(kind).kind(), kind);
        }
        assert_eq!(Sentinel::for_type(NumericType::Real), Sentinel::Real(-f32::MAX));
        assert_eq!(Sentinel::for_type(NumericType::UByte), Sentinel::UByte(255));
        assert_eq!(Sentinel::for_type(NumericType::Int64), Sentinel::Int64(i64::MIN));
    }

    #[test]
    fn bad_stays_bad_across_conversion() {
        let d: f64 = convert_value(i16::BAD);
        assert!(d.is_bad());
        let b: u8 = convert_value(f32::BAD);
        assert!(b.is_bad());
    }

    #[test]
    fn unrepresentable_values_become_bad() {
        let b: i8 = convert_value(1000i32);
        assert_eq!(b, i8::BAD);
        let u: u16 = convert_value(-1.0f64);
        assert_eq!(u, u16::BAD);
        let n: i32 = convert_value(f32::NAN);
        assert_eq!(n, i32::BAD);
    }

    #[test]
    fn ordinary_values_convert() {
        let r: f32 = convert_value(42i64);
        assert_eq!(r, 42.0);
        let w: i16 = convert_value(-7.9f64);
        assert_eq!(w, -7);
        assert_eq!(convert_slice::<u8, i32>(&[1, 2, 255]), vec![1, 2, i32::BAD]);
    }

    #[test]
    fn slice_access_checks_variant() {
        let buf = f32::wrap(vec![1.0, 2.0]);
        assert_eq!(f32::slice(&buf), Some(&[1.0f32, 2.0][..]));
        assert!(f64::slice(&buf).is_none());
    }
}
