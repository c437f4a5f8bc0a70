//! The container-store collaborator.
//!
//! The control-block layer never persists anything itself. Durable
//! create/open/delete of arrays and groups is delegated to an
//! [`ArrayStore`], whose calls are treated as atomic: a failure is
//! surfaced to the caller and never retried.

use crate::bounds::Bounds;
use crate::buffer::ArrayBuffer;
use crate::error::StoreError;
use crate::id::StoreId;
use crate::location::Location;
use crate::types::{FullType, StorageForm};

/// Shape, type and form of a stored array.
#[derive(Clone, Debug, PartialEq)]
pub struct ArrayInfo {
    /// Pixel-index bounds.
    pub bounds: Bounds,
    /// Element type and complex flag.
    pub ftype: FullType,
    /// Current storage form.
    pub form: StorageForm,
}

/// Borrowed contents of a stored array.
#[derive(Clone, Copy, Debug)]
pub struct ArrayParts<'a> {
    /// The real part (the whole array for non-complex types).
    pub real: &'a ArrayBuffer,
    /// The imaginary part, present only for complex types.
    pub imag: Option<&'a ArrayBuffer>,
}

/// Durable hierarchical storage of named groups and arrays.
///
/// Groups are containers; arrays are leaves. An array's [`StoreId`]
/// stays valid until the array is deleted (directly or by erasing an
/// enclosing group), after which every copy of the id is invalid.
pub trait ArrayStore {
    /// Create an empty group. The parent must exist.
    fn create_group(&mut self, location: &Location) -> Result<(), StoreError>;

    /// Whether a group exists at `location`. The root always exists.
    fn group_exists(&self, location: &Location) -> bool;

    /// Delete whatever is at `location`, recursively.
    fn erase(&mut self, location: &Location) -> Result<(), StoreError>;

    /// Create an array filled with zeros. The parent group must exist and
    /// the location must be free.
    fn create(
        &mut self,
        location: &Location,
        bounds: &Bounds,
        ftype: FullType,
        form: StorageForm,
    ) -> Result<StoreId, StoreError>;

    /// Open an existing array.
    fn open(&mut self, location: &Location) -> Result<StoreId, StoreError>;

    /// Delete an array, invalidating every copy of its id.
    fn delete(&mut self, id: StoreId) -> Result<(), StoreError>;

    /// Move an array to `to`, keeping its id and contents. The parent
    /// group must exist and `to` must be free.
    fn rename(&mut self, id: StoreId, to: &Location) -> Result<(), StoreError>;

    /// Whether `id` still refers to an existing array.
    fn valid(&self, id: StoreId) -> bool;

    /// The array's current storage form.
    fn get_form(&self, id: StoreId) -> Result<StorageForm, StoreError>;

    /// Shape, type and form of the array.
    fn describe(&self, id: StoreId) -> Result<ArrayInfo, StoreError>;

    /// Borrow the array's contents.
    fn read(&self, id: StoreId) -> Result<ArrayParts<'_>, StoreError>;

    /// Replace the array's contents. Element type, element count and
    /// presence of the imaginary part must match the array.
    fn write(
        &mut self,
        id: StoreId,
        real: ArrayBuffer,
        imag: Option<ArrayBuffer>,
    ) -> Result<(), StoreError>;

    /// Set an integer attribute on a group.
    fn set_attribute(&mut self, group: &Location, key: &str, value: i64) -> Result<(), StoreError>;

    /// Read an integer attribute from a group, `Ok(None)` if unset.
    fn attribute(&self, group: &Location, key: &str) -> Result<Option<i64>, StoreError>;
}
