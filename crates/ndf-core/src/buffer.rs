//! Typed, owned array buffers.
//!
//! [`ArrayBuffer`] is a tagged union over the eight element types. Kernels
//! are written once against [`Element`] and instantiated per variant with
//! the [`with_buffer!`](crate::with_buffer) and
//! [`with_numeric_type!`](crate::with_numeric_type) dispatch macros.

use crate::error::NdfError;
use crate::sentinel::{convert_slice, Element};
use crate::types::NumericType;

/// Run `$body` with `$v` bound to the vector inside an [`ArrayBuffer`].
///
/// Works on `ArrayBuffer`, `&ArrayBuffer` and `&mut ArrayBuffer`; the
/// binding mode follows the scrutinee.
#[macro_export]
macro_rules! with_buffer {
    ($buffer:expr, $v:ident => $body:expr) => {
        match $buffer {
            $crate::ArrayBuffer::Byte($v) => $body,
            $crate::ArrayBuffer::UByte($v) => $body,
            $crate::ArrayBuffer::Word($v) => $body,
            $crate::ArrayBuffer::UWord($v) => $body,
            $crate::ArrayBuffer::Integer($v) => $body,
            $crate::ArrayBuffer::Int64($v) => $body,
            $crate::ArrayBuffer::Real($v) => $body,
            $crate::ArrayBuffer::Double($v) => $body,
        }
    };
}

/// Run `$body` with the type alias `$T` naming the Rust type of a
/// [`NumericType`](crate::NumericType) tag.
#[macro_export]
macro_rules! with_numeric_type {
    ($kind:expr, $T:ident => $body:expr) => {
        match $kind {
            $crate::NumericType::Byte => {
                type $T = i8;
                $body
            }
            $crate::NumericType::UByte => {
                type $T = u8;
                $body
            }
            $crate::NumericType::Word => {
                type $T = i16;
                $body
            }
            $crate::NumericType::UWord => {
                type $T = u16;
                $body
            }
            $crate::NumericType::Integer => {
                type $T = i32;
                $body
            }
            $crate::NumericType::Int64 => {
                type $T = i64;
                $body
            }
            $crate::NumericType::Real => {
                type $T = f32;
                $body
            }
            $crate::NumericType::Double => {
                type $T = f64;
                $body
            }
        }
    };
}

/// An owned vector of elements of one of the eight supported types.
#[derive(Clone, Debug, PartialEq)]
pub enum ArrayBuffer {
    /// `_BYTE` elements.
    Byte(Vec<i8>),
    /// `_UBYTE` elements.
    UByte(Vec<u8>),
    /// `_WORD` elements.
    Word(Vec<i16>),
    /// `_UWORD` elements.
    UWord(Vec<u16>),
    /// `_INTEGER` elements.
    Integer(Vec<i32>),
    /// `_INT64` elements.
    Int64(Vec<i64>),
    /// `_REAL` elements.
    Real(Vec<f32>),
    /// `_DOUBLE` elements.
    Double(Vec<f64>),
}

impl ArrayBuffer {
    /// A buffer of `len` zeros.
    pub fn zeroed(kind: NumericType, len: usize) -> Self {
        with_numeric_type!(kind, T => T::wrap(vec![<T as num_traits::Zero>::zero(); len]))
    }

    /// A buffer of `len` sentinel values.
    pub fn filled_bad(kind: NumericType, len: usize) -> Self {
        with_numeric_type!(kind, T => T::wrap(vec![T::BAD; len]))
    }

    /// Wrap a typed vector.
    pub fn from_vec<T: Element>(values: Vec<T>) -> Self {
        T::wrap(values)
    }

    /// The element type held.
    pub fn kind(&self) -> NumericType {
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

    /// Number of elements.
    pub fn len(&self) -> usize {
        with_buffer!(self, v => v.len())
    }

    /// Whether the buffer holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow as a typed slice, or `None` if `T` is not the held type.
    pub fn as_slice<T: Element>(&self) -> Option<&[T]> {
        T::slice(self)
    }

    /// Mutably borrow as a typed slice, or `None` if `T` is not the held type.
    pub fn as_mut_slice<T: Element>(&mut self) -> Option<&mut [T]> {
        T::slice_mut(self)
    }

    /// Number of elements equal to the sentinel.
    pub fn count_bad(&self) -> usize {
        with_buffer!(self, v => v.iter().filter(|x| x.is_bad()).count())
    }

    /// Copy into a buffer of another type, preserving badness.
    ///
    /// Values the target type cannot represent become bad.
    pub fn convert(&self, kind: NumericType) -> Self {
        if self.kind() == kind {
            return self.clone();
        }
        with_buffer!(self, src => {
            with_numeric_type!(kind, T => T::wrap(convert_slice::<_, T>(src.as_slice())))
        })
    }

    /// Collect the elements at `indices`, in order.
    ///
    /// Indices come from [`Bounds::region_indices`](crate::Bounds::region_indices)
    /// and are always in range for the buffer they were computed for.
    pub fn gather(&self, indices: &[usize]) -> Self {
        with_buffer!(self, v => Self::from(indices.iter().map(|&i| v[i]).collect::<Vec<_>>()))
    }

    /// Write `values` to the elements at `indices`.
    ///
    /// `values` is converted to this buffer's type first.
    ///
    /// # Errors
    ///
    /// [`NdfError::LengthMismatch`] if `values` and `indices` differ in length.
    pub fn scatter(&mut self, indices: &[usize], values: &ArrayBuffer) -> Result<(), NdfError> {
        if values.len() != indices.len() {
            return Err(NdfError::LengthMismatch {
                expected: indices.len(),
                actual: values.len(),
            });
        }
        let values = values.convert(self.kind());
        with_buffer!(self, dst => scatter_into(dst.as_mut_slice(), indices, &values));
        Ok(())
    }
}

fn scatter_into<T: Element>(dst: &mut [T], indices: &[usize], values: &ArrayBuffer) {
    if let Some(src) = values.as_slice::<T>() {
        for (&i, &x) in indices.iter().zip(src) {
            dst[i] = x;
        }
    }
}

impl<T: Element> From<Vec<T>> for ArrayBuffer {
    fn from(values: Vec<T>) -> Self {
        T::wrap(values)
    }
}
