//! Placeholder control blocks.

use ndf_core::Location;

/// A reserved location awaiting one creation attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Placeholder {
    /// Where the object will be created.
    pub location: Location,
    /// Whether annulling the placeholder erases what is at `location`.
    /// Cleared once a creation has succeeded.
    pub erase: bool,
}

impl Placeholder {
    pub(crate) fn new(location: Location) -> Self {
        Self {
            location,
            erase: true,
        }
    }
}
