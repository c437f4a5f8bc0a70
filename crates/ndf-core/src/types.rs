//! Element types, components, access modes and storage forms.

use std::fmt;
use std::str::FromStr;

use crate::error::NdfError;

/// The closed set of numeric element types an array may hold.
///
/// Names follow the container store's primitive type strings
/// (`_BYTE`, `_REAL`, ...). Parsing is case-insensitive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NumericType {
    /// Signed 8-bit integer (`_BYTE`).
    Byte,
    /// Unsigned 8-bit integer (`_UBYTE`).
    UByte,
    /// Signed 16-bit integer (`_WORD`).
    Word,
    /// Unsigned 16-bit integer (`_UWORD`).
    UWord,
    /// Signed 32-bit integer (`_INTEGER`).
    Integer,
    /// Signed 64-bit integer (`_INT64`).
    Int64,
    /// 32-bit float (`_REAL`).
    Real,
    /// 64-bit float (`_DOUBLE`).
    Double,
}

impl NumericType {
    /// Every supported type, in declaration order.
    pub const ALL: [NumericType; 8] = [
        Self::Byte,
        Self::UByte,
        Self::Word,
        Self::UWord,
        Self::Integer,
        Self::Int64,
        Self::Real,
        Self::Double,
    ];

    /// The canonical upper-case type name, e.g. `"_REAL"`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Byte => "_BYTE",
            Self::UByte => "_UBYTE",
            Self::Word => "_WORD",
            Self::UWord => "_UWORD",
            Self::Integer => "_INTEGER",
            Self::Int64 => "_INT64",
            Self::Real => "_REAL",
            Self::Double => "_DOUBLE",
        }
    }

    /// Size of one element in bytes.
    pub fn size_of(self) -> usize {
        match self {
            Self::Byte | Self::UByte => 1,
            Self::Word | Self::UWord => 2,
            Self::Integer | Self::Real => 4,
            Self::Int64 | Self::Double => 8,
        }
    }

    /// Returns `true` for `_REAL` and `_DOUBLE`.
    pub fn is_float(self) -> bool {
        matches!(self, Self::Real | Self::Double)
    }

    /// Parse a type name, ignoring case and surrounding whitespace.
    ///
    /// # Errors
    ///
    /// [`NdfError::UnsupportedType`] carrying the name exactly as supplied.
    pub fn parse(name: &str) -> Result<Self, NdfError> {
        let upper = name.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|t| t.name() == upper)
            .ok_or_else(|| NdfError::UnsupportedType {
                name: name.to_string(),
            })
    }
}

impl fmt::Display for NumericType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NumericType {
    type Err = NdfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A numeric type plus the "complex" flag used by Data and Variance.
///
/// Written `_REAL` for a real array and `COMPLEX_REAL` for a complex one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FullType {
    /// Element type of each part.
    pub numeric: NumericType,
    /// Whether an imaginary part is stored alongside the real part.
    pub complex: bool,
}

impl FullType {
    /// A non-complex type.
    pub fn real(numeric: NumericType) -> Self {
        Self {
            numeric,
            complex: false,
        }
    }

    /// A complex type.
    pub fn complex(numeric: NumericType) -> Self {
        Self {
            numeric,
            complex: true,
        }
    }

    /// Parse `_REAL`, `complex_real`, `COMPLEX_INT64`, ...
    ///
    /// # Errors
    ///
    /// [`NdfError::UnsupportedType`] carrying the name exactly as supplied.
    pub fn parse(name: &str) -> Result<Self, NdfError> {
        let upper = name.trim().to_ascii_uppercase();
        let unsupported = || NdfError::UnsupportedType {
            name: name.to_string(),
        };
        match upper.strip_prefix("COMPLEX_") {
            Some(rest) => NumericType::parse(&format!("_{rest}"))
                .map(Self::complex)
                .map_err(|_| unsupported()),
            None => NumericType::parse(&upper)
                .map(Self::real)
                .map_err(|_| unsupported()),
        }
    }
}

impl From<NumericType> for FullType {
    fn from(numeric: NumericType) -> Self {
        Self::real(numeric)
    }
}

impl fmt::Display for FullType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.complex {
            write!(f, "COMPLEX{}", self.numeric.name())
        } else {
            f.write_str(self.numeric.name())
        }
    }
}

impl FromStr for FullType {
    type Err = NdfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// An independently definable sub-array of an object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Component {
    /// The main data array.
    Data,
    /// Per-pixel variance estimates.
    Variance,
    /// Per-pixel quality bytes (always `_UBYTE`).
    Quality,
}

impl Component {
    /// All components in storage order.
    pub const ALL: [Component; 3] = [Self::Data, Self::Variance, Self::Quality];

    /// Position of this component in per-component arrays.
    pub fn index(self) -> usize {
        match self {
            Self::Data => 0,
            Self::Variance => 1,
            Self::Quality => 2,
        }
    }

    /// Name of the child array holding this component in the store.
    pub fn name(self) -> &'static str {
        match self {
            Self::Data => "DATA",
            Self::Variance => "VARIANCE",
            Self::Quality => "QUALITY",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a mapped component may be used.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessMode {
    /// Read existing values; nothing is written back.
    Read,
    /// Read existing values and write them back on unmap.
    Update,
    /// Write new values; the component is created if undefined.
    Write,
}

impl AccessMode {
    /// Whether unmapping writes the buffer back to the store.
    pub fn writes(self) -> bool {
        !matches!(self, Self::Read)
    }

    /// Whether the mapped buffer must start from stored values.
    pub fn reads(self) -> bool {
        !matches!(self, Self::Write)
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => f.write_str("READ"),
            Self::Update => f.write_str("UPDATE"),
            Self::Write => f.write_str("WRITE"),
        }
    }
}

/// Storage-form hint recorded for an array.
///
/// Captured when a component is reset so a later re-creation uses the
/// same form.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum StorageForm {
    /// A bare primitive array with implied lower bounds of 1.
    Primitive,
    /// A structure holding the array plus its origin.
    #[default]
    Simple,
}

impl fmt::Display for StorageForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive => f.write_str("PRIMITIVE"),
            Self::Simple => f.write_str("SIMPLE"),
        }
    }
}

/// Presence state of a component.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ComponentState {
    /// No stored array exists.
    #[default]
    Undefined,
    /// A stored array exists and holds values.
    Defined,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_names_parse_case_insensitively() {
        for t in NumericType::ALL {
            assert_eq!(NumericType::parse(t.name()).unwrap(), t);
            assert_eq!(NumericType::parse(&t.name().to_lowercase()).unwrap(), t);
        }
        assert_eq!(" _real ".parse::<NumericType>().unwrap(), NumericType::Real);
    }

    #[test]
    fn unknown_type_keeps_offending_name() {
        let err = NumericType::parse("_Quad").unwrap_err();
        assert_eq!(
            err,
            NdfError::UnsupportedType {
                name: "_Quad".into()
            }
        );
    }

    #[test]
    fn full_type_round_trips_through_display() {
        let t = FullType::parse("complex_double").unwrap();
        assert_eq!(t, FullType::complex(NumericType::Double));
        assert_eq!(t.to_string(), "COMPLEX_DOUBLE");
        assert_eq!(FullType::parse(&t.to_string()).unwrap(), t);
        assert_eq!(FullType::parse("_WORD").unwrap().to_string(), "_WORD");
    }

    #[test]
    fn bad_complex_name_is_unsupported() {
        let err = FullType::parse("COMPLEX_STRING").unwrap_err();
        assert!(matches!(err, NdfError::UnsupportedType { name } if name == "COMPLEX_STRING"));
    }

    #[test]
    fn element_sizes() {
        assert_eq!(NumericType::UByte.size_of(), 1);
        assert_eq!(NumericType::UWord.size_of(), 2);
        assert_eq!(NumericType::Real.size_of(), 4);
        assert_eq!(NumericType::Int64.size_of(), 8);
    }

    #[test]
    fn component_indices_are_dense() {
        for (i, c) in Component::ALL.into_iter().enumerate() {
            assert_eq!(c.index(), i);
        }
    }

    #[test]
    fn access_mode_read_write_flags() {
        assert!(!AccessMode::Read.writes());
        assert!(AccessMode::Update.writes() && AccessMode::Update.reads());
        assert!(!AccessMode::Write.reads());
    }
}
