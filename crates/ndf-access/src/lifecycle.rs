//! Component lifecycle: definition, reset, and structural change.
//!
//! A component is either undefined or defined. It becomes defined when
//! it is first mapped for writing, and undefined again when it is reset.
//! Any structural change (reset, retyping, new bounds) is refused while
//! the component is mapped through any handle on the object.
//!
//! Resetting Quality also resets the Quality of the object's side-quality
//! companion, if one is linked.

use ndf_core::{
    ArrayBuffer, ArrayInfo, ArrayStore, Bounds, Component, ComponentState, DcbId, FullType,
    HandleId, Location, NdfError, NumericType, Status, StoreId,
};
use smallvec::{smallvec, SmallVec};
use tracing::{debug, warn};

use crate::dcb::component_location;
use crate::library::Library;
use crate::region::{extract, Pad};

/// An object followed by its side-quality companions, in link order.
type QualityChain = SmallVec<[DcbId; 2]>;

/// A replacement component array written beside the one it replaces.
#[derive(Clone, Debug)]
struct Staged {
    component: Component,
    current: StoreId,
    replacement: StoreId,
    target: Location,
    staging: Location,
    backup: Location,
}

impl<S: ArrayStore> Library<S> {
    /// Create the stored array of an undefined component, zero filled.
    ///
    /// Data keeps its array while undefined, so for Data this only
    /// changes the state.
    pub(crate) fn define(&mut self, dcb_id: DcbId, component: Component) -> Status {
        let dcb = self.dcb_entry(dcb_id)?;
        let slot = dcb.slot(component);
        if slot.store_id.is_none() {
            let ftype = match component {
                Component::Quality => NumericType::UByte.into(),
                Component::Data | Component::Variance => slot.ftype,
            };
            let form = slot.form_hint.unwrap_or(self.config.default_form);
            let location = component_location(&dcb.location, component)?;
            let bounds = dcb.bounds.clone();
            let id = self.store.create(&location, &bounds, ftype, form)?;
            let form = self.store.get_form(id).unwrap_or(form);
            let slot = self.dcb_entry_mut(dcb_id)?.slot_mut(component);
            slot.store_id = Some(id);
            slot.ftype = ftype;
            slot.form_hint = Some(form);
        }
        self.dcb_entry_mut(dcb_id)?.slot_mut(component).state = ComponentState::Defined;
        debug!(dcb = %dcb_id, component = %component, "component defined");
        Ok(())
    }

    /// Reset a component through `handle`, making it undefined.
    ///
    /// Returns whether anything was reset. Through a section this is a
    /// no-op returning `false`.
    ///
    /// # Errors
    ///
    /// - [`NdfError::AlreadyInvalid`] if `handle` is stale.
    /// - [`NdfError::AlreadyMapped`] if the component is mapped through
    ///   `handle`, or (for a base handle) through any other handle.
    /// - Whatever [`reset_object`](Self::reset_object) reports.
    pub fn reset(&mut self, handle: HandleId, component: Component) -> Result<bool, NdfError> {
        let acb = self.acb(handle)?;
        if acb.is_mapped(component) {
            return Err(NdfError::AlreadyMapped {
                component,
                reason: "mapped for access through the specified identifier".into(),
            });
        }
        if !acb.is_base {
            debug!(handle = %handle, component = %component, "reset through a section ignored");
            return Ok(false);
        }
        let dcb_id = acb.dcb;
        self.reset_object(dcb_id, component)
    }

    /// Reset a component of an open object.
    ///
    /// An undefined component is left alone. A defined Variance or
    /// Quality has its stored array deleted, after its storage form is
    /// recorded for any later re-creation; Data keeps its array and only
    /// becomes undefined. For Quality the reset then repeats on each
    /// linked side-quality companion, and the result is `true` if any
    /// object in the chain was reset.
    ///
    /// Every object in the chain is checked before any is touched, so a
    /// mapped companion leaves all of them unchanged.
    ///
    /// # Errors
    ///
    /// - [`NdfError::NotFound`] if `dcb_id` is not an open object.
    /// - [`NdfError::AlreadyMapped`] if the component is mapped on the
    ///   object or on a companion.
    /// - [`NdfError::Store`] if a delete fails. Objects earlier in the
    ///   chain stay reset.
    pub fn reset_object(&mut self, dcb_id: DcbId, component: Component) -> Result<bool, NdfError> {
        let chain: QualityChain = if component == Component::Quality {
            self.quality_chain(dcb_id)?
        } else {
            smallvec![dcb_id]
        };
        for &id in &chain {
            self.dcb_entry(id)?.check_unmapped(component)?;
        }
        let mut did_work = false;
        for &id in &chain {
            did_work |= self.reset_component(id, component)?;
        }
        Ok(did_work)
    }

    fn reset_component(&mut self, dcb_id: DcbId, component: Component) -> Result<bool, NdfError> {
        let slot = self.dcb_entry(dcb_id)?.slot(component);
        if !slot.is_defined() {
            return Ok(false);
        }
        let mut form_hint = slot.form_hint;
        let mut store_id = slot.store_id;
        if component != Component::Data {
            if let Some(id) = store_id.filter(|&id| self.store.valid(id)) {
                form_hint = Some(self.store.get_form(id)?);
                self.store.delete(id)?;
            }
            store_id = None;
        }
        let slot = self.dcb_entry_mut(dcb_id)?.slot_mut(component);
        slot.state = ComponentState::Undefined;
        slot.store_id = store_id;
        slot.form_hint = form_hint;
        debug!(dcb = %dcb_id, component = %component, "component reset");
        Ok(true)
    }

    fn quality_chain(&self, dcb_id: DcbId) -> Result<QualityChain, NdfError> {
        let mut chain: QualityChain = smallvec![dcb_id];
        let mut next = self.dcb_entry(dcb_id)?.side_quality;
        while let Some(id) = next {
            if chain.contains(&id) {
                break;
            }
            chain.push(id);
            next = self.dcb_entry(id)?.side_quality;
        }
        Ok(chain)
    }

    /// Change the stored type of a component.
    ///
    /// Stored values are converted with bad values preserved; values the
    /// new type cannot represent become bad. Through a section nothing
    /// happens. The Quality type is fixed at `_UBYTE`.
    ///
    /// The converted array is written beside the current one and only
    /// swapped in once complete, so on failure the component keeps its
    /// type and values.
    ///
    /// # Errors
    ///
    /// - [`NdfError::AlreadyInvalid`] if `handle` is stale.
    /// - [`NdfError::UnsupportedType`] for any Quality type but `_UBYTE`.
    /// - [`NdfError::AlreadyMapped`] if the component is mapped anywhere.
    /// - [`NdfError::Store`] if writing the converted array fails.
    pub fn set_type(&mut self, handle: HandleId, component: Component, ftype: FullType) -> Status {
        let acb = self.acb(handle)?;
        if !acb.is_base {
            return Ok(());
        }
        let dcb_id = acb.dcb;
        if component == Component::Quality {
            return if ftype == FullType::real(NumericType::UByte) {
                Ok(())
            } else {
                Err(NdfError::UnsupportedType {
                    name: ftype.to_string(),
                })
            };
        }
        let dcb = self.dcb_entry(dcb_id)?;
        dcb.check_unmapped(component)?;
        let slot = dcb.slot(component).clone();
        let (object, bounds) = (dcb.location.clone(), dcb.bounds.clone());
        if slot.ftype == ftype {
            return Ok(());
        }

        if let Some(id) = slot.store_id {
            let parts = self.store.read(id)?;
            let real = parts.real.convert(ftype.numeric);
            let imag = ftype.complex.then(|| match parts.imag {
                Some(im) => im.convert(ftype.numeric),
                None => ArrayBuffer::zeroed(ftype.numeric, real.len()),
            });
            let form = self.store.get_form(id)?;
            let info = ArrayInfo { bounds, ftype, form };
            let staged = self.stage(&object, component, id, &info, real, imag)?;
            self.commit(std::slice::from_ref(&staged))?;
            self.dcb_entry_mut(dcb_id)?.slot_mut(component).store_id = Some(staged.replacement);
        }

        let dcb = self.dcb_entry_mut(dcb_id)?;
        dcb.slot_mut(component).ftype = ftype;
        if component == Component::Data && !dcb.is_defined(Component::Variance) {
            dcb.slot_mut(Component::Variance).ftype = ftype;
        }
        debug!(handle = %handle, component = %component, ftype = %ftype, "type changed");
        Ok(())
    }

    /// Change the bounds seen through `handle`.
    ///
    /// For a section only the view changes; pixels that fall outside the
    /// object read as bad and are discarded on write-back. For a base
    /// handle every stored component is re-created with the new bounds,
    /// keeping the values of pixels common to both and filling new
    /// pixels with the sentinel (zero for Quality); every base handle on
    /// the object sees the new bounds.
    ///
    /// All components change together: if any replacement cannot be
    /// written, the object keeps its old bounds and arrays.
    ///
    /// # Errors
    ///
    /// - [`NdfError::AlreadyInvalid`] if `handle` is stale.
    /// - [`NdfError::InvalidBounds`] if `bounds` has too many axes.
    /// - [`NdfError::AlreadyMapped`] if anything is mapped through the
    ///   section, or, for a base handle, anywhere on the object.
    /// - [`NdfError::Store`] if writing a replacement array fails.
    pub fn set_bounds(&mut self, handle: HandleId, bounds: &Bounds) -> Status {
        if bounds.ndim() > self.config.max_dims {
            return Err(NdfError::InvalidBounds {
                reason: format!(
                    "{} dimensions exceeds the limit of {}",
                    bounds.ndim(),
                    self.config.max_dims
                ),
            });
        }
        let acb = self.acb(handle)?;
        if !acb.is_base {
            if let Some(component) = acb.mapped_components().next() {
                return Err(NdfError::AlreadyMapped {
                    component,
                    reason: "mapped for access through the specified identifier".into(),
                });
            }
            self.acb_mut(handle)?.bounds = bounds.clone();
            return Ok(());
        }

        let dcb_id = acb.dcb;
        let dcb = self.dcb_entry(dcb_id)?;
        if let Some(component) = dcb.first_mapped() {
            return Err(NdfError::AlreadyMapped {
                component,
                reason: "cannot change bounds while mapped".into(),
            });
        }
        let old = dcb.bounds.clone();
        let object = dcb.location.clone();

        let mut resized = Vec::with_capacity(Component::ALL.len());
        for component in Component::ALL {
            let slot = self.dcb_entry(dcb_id)?.slot(component);
            let (Some(id), ftype) = (slot.store_id, slot.ftype) else {
                continue;
            };
            let pad = Pad::for_component(component);
            let parts = self.store.read(id)?;
            let real = extract(parts.real, &old, bounds, pad)?;
            let imag = parts
                .imag
                .map(|im| extract(im, &old, bounds, pad))
                .transpose()?;
            let info = ArrayInfo {
                bounds: bounds.clone(),
                ftype,
                form: self.store.get_form(id)?,
            };
            resized.push((component, id, info, real, imag));
        }

        let mut staged: SmallVec<[Staged; 3]> = SmallVec::new();
        for (component, id, info, real, imag) in resized {
            match self.stage(&object, component, id, &info, real, imag) {
                Ok(s) => staged.push(s),
                Err(e) => {
                    self.discard(&staged);
                    return Err(e);
                }
            }
        }
        self.commit(&staged)?;

        let dcb = self.dcb_entry_mut(dcb_id)?;
        for s in &staged {
            dcb.slot_mut(s.component).store_id = Some(s.replacement);
        }
        dcb.bounds = bounds.clone();
        let bases: Vec<u64> = self
            .acbs
            .iter()
            .filter(|(_, acb)| acb.dcb == dcb_id && acb.is_base)
            .map(|(key, _)| key)
            .collect();
        for key in bases {
            if let Some(acb) = self.acbs.get_mut(key) {
                acb.bounds = bounds.clone();
            }
        }
        debug!(handle = %handle, from = %old, to = %bounds, "bounds changed");
        Ok(())
    }

    // ── staged replacement ────────────────────────────────────────

    /// Create and fill a replacement for component array `current`
    /// beside it, leaving `current` untouched.
    fn stage(
        &mut self,
        object: &Location,
        component: Component,
        current: StoreId,
        info: &ArrayInfo,
        real: ArrayBuffer,
        imag: Option<ArrayBuffer>,
    ) -> Result<Staged, NdfError> {
        let name = component.name();
        let target = component_location(object, component)?;
        let staging = object.child(&format!("{name}_NEW"))?;
        let backup = object.child(&format!("{name}_OLD"))?;
        let replacement = self
            .store
            .create(&staging, &info.bounds, info.ftype, info.form)?;
        let staged = Staged {
            component,
            current,
            replacement,
            target,
            staging,
            backup,
        };
        if let Err(e) = self.store.write(replacement, real, imag) {
            self.discard(std::slice::from_ref(&staged));
            return Err(e.into());
        }
        Ok(staged)
    }

    /// Swap every staged replacement into place.
    ///
    /// Current arrays are moved aside first, then replacements moved in,
    /// then the old arrays deleted. A failed move undoes the moves made
    /// so far and discards the replacements.
    fn commit(&mut self, staged: &[Staged]) -> Status {
        for (done, s) in staged.iter().enumerate() {
            if let Err(e) = self.store.rename(s.current, &s.backup) {
                self.unwind(staged, done, 0);
                return Err(e.into());
            }
        }
        for (done, s) in staged.iter().enumerate() {
            if let Err(e) = self.store.rename(s.replacement, &s.target) {
                self.unwind(staged, staged.len(), done);
                return Err(e.into());
            }
        }
        for s in staged {
            if let Err(e) = self.store.delete(s.current) {
                warn!(location = %s.backup, error = %e, "replaced array left in store");
            }
        }
        Ok(())
    }

    /// Undo a partial [`commit`](Self::commit): move the first `placed`
    /// replacements back to staging, the first `moved_aside` current
    /// arrays back into place, and discard every replacement.
    fn unwind(&mut self, staged: &[Staged], moved_aside: usize, placed: usize) {
        for s in &staged[..placed] {
            if let Err(e) = self.store.rename(s.replacement, &s.staging) {
                warn!(location = %s.target, error = %e, "replacement could not be moved back");
            }
        }
        for s in &staged[..moved_aside] {
            if let Err(e) = self.store.rename(s.current, &s.target) {
                warn!(location = %s.backup, error = %e, "array could not be restored");
            }
        }
        self.discard(staged);
    }

    fn discard(&mut self, staged: &[Staged]) {
        for s in staged {
            if !self.store.valid(s.replacement) {
                continue;
            }
            if let Err(e) = self.store.delete(s.replacement) {
                warn!(location = %s.staging, error = %e, "replacement array left in store");
            }
        }
    }

    /// Link `companion`'s object to `handle`'s object as its side-quality
    /// companion, replacing any previous link.
    ///
    /// The link keeps the companion's object open until it is detached
    /// or the linking object is finalized.
    ///
    /// # Errors
    ///
    /// - [`NdfError::AlreadyInvalid`] if either handle is stale.
    /// - [`NdfError::InvalidLink`] if the link would make an object its
    ///   own companion, directly or through a chain.
    pub fn attach_side_quality(&mut self, handle: HandleId, companion: HandleId) -> Status {
        let dcb_id = self.acb(handle)?.dcb;
        let companion_id = self.acb(companion)?.dcb;
        if self.quality_chain(companion_id)?.contains(&dcb_id) {
            return Err(NdfError::InvalidLink {
                reason: format!(
                    "{} is already reached from {}",
                    self.dcb_entry(dcb_id)?.location,
                    self.dcb_entry(companion_id)?.location
                ),
            });
        }
        self.dcb_entry_mut(companion_id)?.refcount += 1;
        let previous = self.dcb_entry_mut(dcb_id)?.side_quality.replace(companion_id);
        debug!(handle = %handle, companion = %companion, "side quality attached");
        match previous {
            Some(old) => self.drop_ref(old),
            None => Ok(()),
        }
    }

    /// Drop the side-quality link of `handle`'s object.
    ///
    /// Returns whether there was a link.
    ///
    /// # Errors
    ///
    /// [`NdfError::AlreadyInvalid`] if `handle` is stale.
    pub fn detach_side_quality(&mut self, handle: HandleId) -> Result<bool, NdfError> {
        let dcb_id = self.acb(handle)?.dcb;
        match self.dcb_entry_mut(dcb_id)?.side_quality.take() {
            Some(old) => {
                self.drop_ref(old)?;
                debug!(handle = %handle, "side quality detached");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// The side-quality companion linked to `handle`'s object.
    ///
    /// # Errors
    ///
    /// [`NdfError::AlreadyInvalid`] if `handle` is stale.
    pub fn side_quality(&self, handle: HandleId) -> Result<Option<DcbId>, NdfError> {
        Ok(self.dcb(handle)?.side_quality)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndf_core::{AccessMode, Element, ErrorKind, Location, StorageForm};
    use ndf_store::MemStore;

    fn object(lib: &mut Library<MemStore>, path: &str, dims: &[i64]) -> HandleId {
        let p = lib.reserve(&Location::parse(path).unwrap()).unwrap();
        let lower = vec![1; dims.len()];
        lib.create(p, "_REAL", &lower, dims).unwrap()
    }

    fn define_quality(lib: &mut Library<MemStore>, h: HandleId) {
        lib.map(h, Component::Quality, NumericType::UByte, AccessMode::Write)
            .unwrap();
        lib.unmap(h, Component::Quality).unwrap();
    }

    #[test]
    fn reset_deletes_array_and_keeps_form() {
        let mut lib = Library::new(MemStore::new());
        let h = object(&mut lib, "/r", &[3]);
        define_quality(&mut lib, h);
        let id = lib.dcb(h).unwrap().slot(Component::Quality).store_id.unwrap();
        assert!(lib.reset(h, Component::Quality).unwrap());
        assert!(!lib.store().valid(id));
        let slot = lib.dcb(h).unwrap().slot(Component::Quality);
        assert_eq!(slot.state, ComponentState::Undefined);
        assert_eq!(slot.form_hint, Some(StorageForm::Simple));
        assert!(!lib.reset(h, Component::Quality).unwrap());
    }

    #[test]
    fn reset_through_section_is_a_no_op() {
        let mut lib = Library::new(MemStore::new());
        let h = object(&mut lib, "/r", &[3]);
        define_quality(&mut lib, h);
        let s = lib
            .create_section(h, &Bounds::new(&[1], &[2]).unwrap())
            .unwrap();
        assert!(!lib.reset(s, Component::Quality).unwrap());
        assert!(lib.is_defined(h, Component::Quality).unwrap());
    }

    #[test]
    fn reset_refused_while_mapped_elsewhere() {
        let mut lib = Library::new(MemStore::new());
        let h = object(&mut lib, "/r", &[3]);
        define_quality(&mut lib, h);
        let other = lib.clone_handle(h).unwrap();
        lib.map(other, Component::Quality, NumericType::UByte, AccessMode::Read)
            .unwrap();
        let err = lib.reset(h, Component::Quality).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyMapped);
        assert!(lib.is_defined(h, Component::Quality).unwrap());
    }

    #[test]
    fn data_reset_keeps_its_array() {
        let mut lib = Library::new(MemStore::new());
        let h = object(&mut lib, "/r", &[3]);
        let id = lib.dcb(h).unwrap().slot(Component::Data).store_id.unwrap();
        assert!(lib.reset(h, Component::Data).unwrap());
        assert!(!lib.is_defined(h, Component::Data).unwrap());
        assert!(lib.store().valid(id));
        assert!(lib
            .map(h, Component::Data, NumericType::Real, AccessMode::Read)
            .is_err());
        lib.map(h, Component::Data, NumericType::Real, AccessMode::Write)
            .unwrap();
        assert!(lib.is_defined(h, Component::Data).unwrap());
    }

    #[test]
    fn set_type_converts_bad_aware() {
        let mut lib = Library::new(MemStore::new());
        let h = object(&mut lib, "/t", &[3]);
        let m = lib
            .map(h, Component::Data, NumericType::Real, AccessMode::Write)
            .unwrap();
        m.real = ArrayBuffer::from(vec![1.5f32, f32::BAD, 1e10]);
        lib.unmap(h, Component::Data).unwrap();

        lib.set_type(h, Component::Data, NumericType::Word.into())
            .unwrap();
        assert_eq!(lib.ftype(h, Component::Data).unwrap(), NumericType::Word.into());
        assert_eq!(lib.ftype(h, Component::Variance).unwrap(), NumericType::Word.into());
        let m = lib
            .map(h, Component::Data, NumericType::Word, AccessMode::Read)
            .unwrap();
        assert_eq!(m.real.as_slice::<i16>(), Some(&[1, i16::BAD, i16::BAD][..]));
    }

    #[test]
    fn quality_type_is_fixed() {
        let mut lib = Library::new(MemStore::new());
        let h = object(&mut lib, "/t", &[3]);
        let err = lib
            .set_type(h, Component::Quality, NumericType::Real.into())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedType);
    }

    #[test]
    fn set_bounds_preserves_overlap() {
        let mut lib = Library::new(MemStore::new());
        let h = object(&mut lib, "/b", &[2, 2]);
        let m = lib
            .map(h, Component::Data, NumericType::Real, AccessMode::Write)
            .unwrap();
        m.real = ArrayBuffer::from(vec![1.0f32, 2.0, 3.0, 4.0]);
        lib.unmap(h, Component::Data).unwrap();
        define_quality(&mut lib, h);
        let twin = lib.clone_handle(h).unwrap();

        let grown = Bounds::new(&[0, 1], &[2, 2]).unwrap();
        lib.set_bounds(h, &grown).unwrap();
        assert_eq!(lib.bounds(twin).unwrap(), &grown);

        let m = lib
            .map(h, Component::Data, NumericType::Real, AccessMode::Read)
            .unwrap();
        assert_eq!(
            m.real.as_slice::<f32>(),
            Some(&[f32::BAD, 1.0, 2.0, f32::BAD, 3.0, 4.0][..])
        );
        let q = lib
            .map(h, Component::Quality, NumericType::UByte, AccessMode::Read)
            .unwrap();
        assert_eq!(q.real.as_slice::<u8>(), Some(&[0u8; 6][..]));
    }

    #[test]
    fn set_bounds_refused_while_mapped() {
        let mut lib = Library::new(MemStore::new());
        let h = object(&mut lib, "/b", &[2]);
        let s = lib
            .create_section(h, &Bounds::new(&[1], &[1]).unwrap())
            .unwrap();
        lib.map(s, Component::Data, NumericType::Real, AccessMode::Read)
            .unwrap();
        let err = lib
            .set_bounds(h, &Bounds::new(&[1], &[5]).unwrap())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyMapped);
    }

    #[test]
    fn section_bounds_may_extend_past_the_object() {
        let mut lib = Library::new(MemStore::new());
        let h = object(&mut lib, "/b", &[2]);
        let s = lib
            .create_section(h, &Bounds::new(&[2], &[2]).unwrap())
            .unwrap();
        lib.set_bounds(s, &Bounds::new(&[2], &[3]).unwrap())
            .unwrap();
        let m = lib
            .map(s, Component::Data, NumericType::Real, AccessMode::Read)
            .unwrap();
        assert_eq!(m.real.as_slice::<f32>(), Some(&[0.0, f32::BAD][..]));
    }

    #[test]
    fn cyclic_side_quality_links_are_refused() {
        let mut lib = Library::new(MemStore::new());
        let a = object(&mut lib, "/a", &[2]);
        let b = object(&mut lib, "/b", &[2]);
        assert_eq!(
            lib.attach_side_quality(a, a).unwrap_err().kind(),
            ErrorKind::InvalidLink
        );
        lib.attach_side_quality(a, b).unwrap();
        assert_eq!(
            lib.attach_side_quality(b, a).unwrap_err().kind(),
            ErrorKind::InvalidLink
        );
    }

    #[test]
    fn side_quality_link_keeps_companion_open() {
        let mut lib = Library::new(MemStore::new());
        let a = object(&mut lib, "/a", &[2]);
        let b = object(&mut lib, "/b", &[2]);
        let b_dcb = lib.dcb_of(b).unwrap();
        lib.attach_side_quality(a, b).unwrap();
        lib.release(b).unwrap();
        assert_eq!(lib.open_count(), 2);
        assert_eq!(lib.side_quality(a).unwrap(), Some(b_dcb));
        assert!(lib.detach_side_quality(a).unwrap());
        assert_eq!(lib.open_count(), 1);
        assert!(!lib.detach_side_quality(a).unwrap());
    }
}
