//! Data control blocks: one entry per stored object currently open.
//!
//! A DCB caches what the layer knows about an object (its bounds, the
//! state and type of each component, the badbits mask) and counts how
//! many handles currently have each component mapped. Every handle on
//! the object, sections included, shares the one entry.

use ndf_core::{
    Bounds, Component, ComponentState, DcbId, FullType, Location, NdfError, NumericType,
    StorageForm, StoreId,
};

/// Store name of a component's array within its object's group.
pub(crate) fn component_location(object: &Location, component: Component) -> Result<Location, NdfError> {
    Ok(object.child(component.name())?)
}

/// Per-component state held in a DCB.
#[derive(Clone, Debug, PartialEq)]
pub struct ComponentSlot {
    /// Whether the component holds values.
    pub state: ComponentState,
    /// The stored array while the component is defined.
    pub store_id: Option<StoreId>,
    /// Element type, or the type to use when the component is created.
    pub ftype: FullType,
    /// Storage form to use if the component is re-created.
    pub form_hint: Option<StorageForm>,
    /// Number of handles with this component mapped.
    pub map_count: usize,
    /// Whether one of those maps permits writing.
    pub write_mapped: bool,
}

impl ComponentSlot {
    pub(crate) fn undefined(ftype: FullType) -> Self {
        Self {
            state: ComponentState::Undefined,
            store_id: None,
            ftype,
            form_hint: None,
            map_count: 0,
            write_mapped: false,
        }
    }

    pub(crate) fn defined(id: StoreId, ftype: FullType, form: StorageForm) -> Self {
        Self {
            state: ComponentState::Defined,
            store_id: Some(id),
            ftype,
            form_hint: Some(form),
            map_count: 0,
            write_mapped: false,
        }
    }

    /// Whether the component holds values.
    pub fn is_defined(&self) -> bool {
        self.state == ComponentState::Defined
    }

    /// Whether any handle has the component mapped.
    pub fn is_mapped(&self) -> bool {
        self.map_count > 0
    }
}

/// An entry in the DCB table.
#[derive(Clone, Debug)]
pub struct DataControlBlock {
    /// Location of the object's group in the store.
    pub location: Location,
    /// Current bounds of the object.
    pub bounds: Bounds,
    /// Data, Variance and Quality, indexed by [`Component::index`].
    pub components: [ComponentSlot; 3],
    /// Quality bits that mark a cell bad.
    pub badbits: u8,
    /// Whether `badbits` changed since the object was opened.
    pub badbits_dirty: bool,
    /// Number of handles and companion links referring to this entry.
    pub refcount: usize,
    /// The linked side-quality object, if any.
    pub side_quality: Option<DcbId>,
}

impl DataControlBlock {
    /// A freshly created object: Data defined, Variance and Quality not.
    pub(crate) fn new_object(
        location: Location,
        bounds: Bounds,
        data: StoreId,
        ftype: FullType,
        form: StorageForm,
    ) -> Self {
        Self {
            location,
            bounds,
            components: [
                ComponentSlot::defined(data, ftype, form),
                ComponentSlot::undefined(ftype),
                ComponentSlot::undefined(NumericType::UByte.into()),
            ],
            badbits: 0,
            badbits_dirty: false,
            refcount: 0,
            side_quality: None,
        }
    }

    /// The slot of one component.
    pub fn slot(&self, component: Component) -> &ComponentSlot {
        &self.components[component.index()]
    }

    pub(crate) fn slot_mut(&mut self, component: Component) -> &mut ComponentSlot {
        &mut self.components[component.index()]
    }

    /// Whether a component holds values.
    pub fn is_defined(&self, component: Component) -> bool {
        self.slot(component).is_defined()
    }

    /// The first component with an outstanding map, if any.
    pub fn first_mapped(&self) -> Option<Component> {
        Component::ALL.into_iter().find(|&c| self.slot(c).is_mapped())
    }

    /// Refuse a structural change to `component` while it is mapped.
    pub(crate) fn check_unmapped(&self, component: Component) -> Result<(), NdfError> {
        if self.slot(component).is_mapped() {
            return Err(NdfError::AlreadyMapped {
                component,
                reason: format!("mapped for access through another identifier on {}", self.location),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dcb() -> DataControlBlock {
        DataControlBlock::new_object(
            Location::parse("/obj").unwrap(),
            Bounds::from_dims(&[4, 4]).unwrap(),
            StoreId(1),
            NumericType::Real.into(),
            StorageForm::Simple,
        )
    }

    #[test]
    fn new_object_defines_only_data() {
        let d = dcb();
        assert!(d.is_defined(Component::Data));
        assert!(!d.is_defined(Component::Variance));
        assert!(!d.is_defined(Component::Quality));
        assert_eq!(d.slot(Component::Variance).ftype, NumericType::Real.into());
        assert_eq!(d.slot(Component::Quality).ftype, NumericType::UByte.into());
    }

    #[test]
    fn mapped_component_refuses_structural_change() {
        let mut d = dcb();
        d.slot_mut(Component::Data).map_count = 2;
        assert_eq!(d.first_mapped(), Some(Component::Data));
        let err = d.check_unmapped(Component::Data).unwrap_err();
        assert!(matches!(err, NdfError::AlreadyMapped { component: Component::Data, .. }));
        assert!(d.check_unmapped(Component::Quality).is_ok());
    }

    #[test]
    fn component_locations_nest_under_the_object() {
        let loc = component_location(&Location::parse("/a/b").unwrap(), Component::Quality).unwrap();
        assert_eq!(loc.to_string(), "/A/B/QUALITY");
    }
}
