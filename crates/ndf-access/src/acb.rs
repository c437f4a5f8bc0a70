//! Access control blocks: one entry per caller-visible handle.

use ndf_core::{AccessMode, ArrayBuffer, Bounds, Component, DcbId, HandleId, NumericType};

/// A component's values as mapped through one handle.
///
/// Holds the real part and, for complex access, the imaginary part, in
/// the element type requested at map time and covering exactly the
/// handle's bounds.
#[derive(Clone, Debug, PartialEq)]
pub struct MappedArray {
    /// Real part (the whole array for non-complex access).
    pub real: ArrayBuffer,
    /// Imaginary part, present only for complex access.
    pub imag: Option<ArrayBuffer>,
}

impl MappedArray {
    /// Element type of the mapped parts.
    pub fn kind(&self) -> NumericType {
        self.real.kind()
    }

    /// Mutable access to each part present.
    pub(crate) fn parts_mut(&mut self) -> [Option<&mut ArrayBuffer>; 2] {
        [Some(&mut self.real), self.imag.as_mut()]
    }
}

/// An outstanding map of one component through one handle.
#[derive(Clone, Debug)]
pub(crate) struct Mapping {
    pub mode: AccessMode,
    pub array: MappedArray,
}

/// An entry in the ACB table.
#[derive(Clone, Debug)]
pub struct AccessControlBlock {
    /// The object this handle refers to.
    pub dcb: DcbId,
    /// The handle this section was cut from, `None` for a base handle.
    pub parent: Option<HandleId>,
    /// Whether this is a base handle rather than a section.
    pub is_base: bool,
    /// Pixel bounds seen through this handle.
    pub bounds: Bounds,
    pub(crate) mappings: [Option<Mapping>; 3],
}

impl AccessControlBlock {
    pub(crate) fn base(dcb: DcbId, bounds: Bounds) -> Self {
        Self {
            dcb,
            parent: None,
            is_base: true,
            bounds,
            mappings: [None, None, None],
        }
    }

    pub(crate) fn section(dcb: DcbId, parent: HandleId, bounds: Bounds) -> Self {
        Self {
            dcb,
            parent: Some(parent),
            is_base: false,
            bounds,
            mappings: [None, None, None],
        }
    }

    /// A copy sharing object, kind and bounds, with nothing mapped.
    pub(crate) fn duplicate(&self) -> Self {
        Self {
            dcb: self.dcb,
            parent: self.parent,
            is_base: self.is_base,
            bounds: self.bounds.clone(),
            mappings: [None, None, None],
        }
    }

    /// Whether `component` is mapped through this handle.
    pub fn is_mapped(&self, component: Component) -> bool {
        self.mappings[component.index()].is_some()
    }

    /// Components currently mapped through this handle.
    pub fn mapped_components(&self) -> impl Iterator<Item = Component> + '_ {
        Component::ALL.into_iter().filter(|&c| self.is_mapped(c))
    }

    pub(crate) fn mapping(&self, component: Component) -> Option<&Mapping> {
        self.mappings[component.index()].as_ref()
    }

    pub(crate) fn mapping_mut(&mut self, component: Component) -> Option<&mut Mapping> {
        self.mappings[component.index()].as_mut()
    }
}
