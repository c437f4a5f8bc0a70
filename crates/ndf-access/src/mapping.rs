//! Mapping components for access, and quality masking of mapped values.
//!
//! Mapping copies a component's values for the handle's bounds into a
//! [`MappedArray`] owned by the handle. Unmapping writes them back if the
//! access mode allows. The per-object map counters enforce the
//! exclusivity rules:
//!
//! - any number of handles may map a component for `Read`;
//! - a `Write` or `Update` map needs the component unmapped everywhere;
//! - a `Read` map is refused while a writing map is outstanding.

use ndf_core::{
    AccessMode, ArrayBuffer, ArrayStore, Bounds, Component, DcbId, FullType, HandleId, NdfError,
    NumericType, Status,
};
use ndf_quality::mask_buffers;
use tracing::debug;

use crate::acb::{MappedArray, Mapping};
use crate::library::Library;
use crate::region::{extract, insert, Pad};

impl<S: ArrayStore> Library<S> {
    /// Map a component of the object behind `handle` for access.
    ///
    /// Values are delivered as `ftype`, converted from the stored type
    /// with bad values preserved. A complex `ftype` yields an imaginary
    /// part too (zeros if the stored array is not complex).
    ///
    /// - `Read`/`Update` start from the stored values. Data and Variance
    ///   are masked against Quality when the object's badbits mask is
    ///   non-zero and automatic masking is configured.
    /// - `Write` starts from zeros. An undefined component is created
    ///   first (Variance with the Data type, Quality as `_UBYTE`).
    ///
    /// # Errors
    ///
    /// - [`NdfError::AlreadyInvalid`] if `handle` is stale.
    /// - [`NdfError::AlreadyMapped`] if the component is already mapped
    ///   through `handle`, if a writing map is requested while it is
    ///   mapped anywhere, or if a read map is requested while a writing
    ///   map is outstanding.
    /// - [`NdfError::UnsupportedType`] if Quality is requested as
    ///   anything but `_UBYTE`.
    /// - [`NdfError::Undefined`] for a `Read`/`Update` map of an
    ///   undefined component.
    pub fn map(
        &mut self,
        handle: HandleId,
        component: Component,
        ftype: impl Into<FullType>,
        mode: AccessMode,
    ) -> Result<&mut MappedArray, NdfError> {
        let ftype = ftype.into();
        let acb = self.acb(handle)?;
        if acb.is_mapped(component) {
            return Err(NdfError::AlreadyMapped {
                component,
                reason: "already mapped for access through this identifier".into(),
            });
        }
        let (dcb_id, region) = (acb.dcb, acb.bounds.clone());
        if component == Component::Quality && ftype != FullType::real(NumericType::UByte) {
            return Err(NdfError::UnsupportedType {
                name: ftype.to_string(),
            });
        }

        let dcb = self.dcb_entry(dcb_id)?;
        let slot = dcb.slot(component);
        if mode.writes() && slot.is_mapped() {
            return Err(NdfError::AlreadyMapped {
                component,
                reason: format!("{mode} access needs it unmapped, but it is mapped through another identifier"),
            });
        }
        if !mode.writes() && slot.write_mapped {
            return Err(NdfError::AlreadyMapped {
                component,
                reason: "mapped for writing through another identifier".into(),
            });
        }
        if !slot.is_defined() {
            if mode.reads() {
                return Err(NdfError::Undefined { component });
            }
            self.define(dcb_id, component)?;
        }

        let mut array = if mode.reads() {
            self.read_region(dcb_id, component, &region, ftype)?
        } else {
            let n = region.cell_count();
            MappedArray {
                real: ArrayBuffer::zeroed(ftype.numeric, n),
                imag: ftype
                    .complex
                    .then(|| ArrayBuffer::zeroed(ftype.numeric, n)),
            }
        };
        if mode.reads() && component != Component::Quality && self.config.auto_quality_masking {
            let dcb = self.dcb_entry(dcb_id)?;
            let badbits = dcb.badbits;
            if badbits != 0 && dcb.is_defined(Component::Quality) {
                let quality = self.quality_region(dcb_id, &region)?;
                let [real, imag] = array.parts_mut();
                let bad = mask_buffers(&quality, badbits, [real, imag, None, None])?;
                debug!(handle = %handle, component = %component, bad, "masked on map");
            }
        }

        let slot = self.dcb_entry_mut(dcb_id)?.slot_mut(component);
        slot.map_count += 1;
        slot.write_mapped |= mode.writes();
        debug!(handle = %handle, component = %component, mode = %mode, ftype = %ftype, "mapped");

        let acb = self.acb_mut(handle)?;
        let mapping = acb.mappings[component.index()].insert(Mapping { mode, array });
        Ok(&mut mapping.array)
    }

    /// Unmap a component, writing values back if the access mode allows.
    ///
    /// The map is released even if the write-back fails.
    ///
    /// # Errors
    ///
    /// - [`NdfError::AlreadyInvalid`] if `handle` is stale.
    /// - [`NdfError::NotFound`] if the component is not mapped through
    ///   `handle`.
    /// - [`NdfError::LengthMismatch`] if a mapped part no longer has one
    ///   element per pixel.
    /// - [`NdfError::Store`] if the write-back fails.
    pub fn unmap(&mut self, handle: HandleId, component: Component) -> Status {
        let acb = self.acb_mut(handle)?;
        let region = acb.bounds.clone();
        let dcb_id = acb.dcb;
        let mapping = acb.mappings[component.index()]
            .take()
            .ok_or_else(|| NdfError::NotFound {
                what: format!("mapping of {component} through identifier {handle}"),
            })?;

        let slot = self.dcb_entry_mut(dcb_id)?.slot_mut(component);
        slot.map_count = slot.map_count.saturating_sub(1);
        if mapping.mode.writes() {
            slot.write_mapped = false;
        }
        debug!(handle = %handle, component = %component, mode = %mapping.mode, "unmapped");

        if mapping.mode.writes() {
            self.write_region(dcb_id, component, &region, &mapping.array)?;
        }
        Ok(())
    }

    /// The values of a component mapped through `handle`.
    ///
    /// # Errors
    ///
    /// [`NdfError::AlreadyInvalid`] if `handle` is stale;
    /// [`NdfError::NotFound`] if the component is not mapped through it.
    pub fn mapped(&self, handle: HandleId, component: Component) -> Result<&MappedArray, NdfError> {
        self.acb(handle)?
            .mapping(component)
            .map(|m| &m.array)
            .ok_or_else(|| NdfError::NotFound {
                what: format!("mapping of {component} through identifier {handle}"),
            })
    }

    /// Mutable access to the values of a component mapped through `handle`.
    ///
    /// # Errors
    ///
    /// As for [`mapped`](Self::mapped).
    pub fn mapped_mut(&mut self, handle: HandleId, component: Component) -> Result<&mut MappedArray, NdfError> {
        self.acb_mut(handle)?
            .mapping_mut(component)
            .map(|m| &mut m.array)
            .ok_or_else(|| NdfError::NotFound {
                what: format!("mapping of {component} through identifier {handle}"),
            })
    }

    /// Mask every Data and Variance buffer mapped through `handle`
    /// against the object's Quality, using `badbits` rather than the
    /// object's own mask.
    ///
    /// Quality comes from the handle's own Quality mapping if there is
    /// one, otherwise from the store. Up to four buffers are masked in
    /// one pass: the real and imaginary parts of Data and of Variance.
    /// Returns whether any cell was flagged bad; an undefined Quality
    /// flags nothing.
    ///
    /// # Errors
    ///
    /// - [`NdfError::AlreadyInvalid`] if `handle` is stale.
    /// - [`NdfError::UnsupportedType`] if the mapped Quality buffer was
    ///   replaced by one that is not `_UBYTE`.
    /// - [`NdfError::LengthMismatch`] if it no longer has one byte per
    ///   pixel.
    pub fn apply_quality_mask(&mut self, handle: HandleId, badbits: u8) -> Result<bool, NdfError> {
        let acb = self.acb(handle)?;
        let (dcb_id, region) = (acb.dcb, acb.bounds.clone());
        let quality = match acb.mapping(Component::Quality) {
            Some(m) => match m.array.real.as_slice::<u8>() {
                Some(q) if q.len() == region.cell_count() => q.to_vec(),
                Some(q) => {
                    return Err(NdfError::LengthMismatch {
                        expected: region.cell_count(),
                        actual: q.len(),
                    })
                }
                None => {
                    return Err(NdfError::UnsupportedType {
                        name: m.array.real.kind().to_string(),
                    })
                }
            },
            None if self.dcb_entry(dcb_id)?.is_defined(Component::Quality) => {
                self.quality_region(dcb_id, &region)?
            }
            None => return Ok(false),
        };

        let acb = self.acb_mut(handle)?;
        let [data, variance, _] = &mut acb.mappings;
        let data = data.as_mut().map(|m| &mut m.array);
        let variance = variance.as_mut().map(|m| &mut m.array);
        let bad = match (data, variance) {
            (Some(d), Some(v)) if d.kind() != v.kind() => {
                let [dr, di] = d.parts_mut();
                let [vr, vi] = v.parts_mut();
                let in_data = mask_buffers(&quality, badbits, [dr, di, None, None])?;
                let in_variance = mask_buffers(&quality, badbits, [vr, vi, None, None])?;
                in_data || in_variance
            }
            (data, variance) => {
                let [dr, di] = data.map_or([None, None], MappedArray::parts_mut);
                let [vr, vi] = variance.map_or([None, None], MappedArray::parts_mut);
                mask_buffers(&quality, badbits, [dr, di, vr, vi])?
            }
        };
        debug!(handle = %handle, badbits, bad, "quality mask applied");
        Ok(bad)
    }

    fn read_region(
        &self,
        dcb_id: DcbId,
        component: Component,
        region: &Bounds,
        ftype: FullType,
    ) -> Result<MappedArray, NdfError> {
        let dcb = self.dcb_entry(dcb_id)?;
        let id = dcb
            .slot(component)
            .store_id
            .ok_or(NdfError::Undefined { component })?;
        let parts = self.store.read(id)?;
        let pad = Pad::for_component(component);
        let real = extract(parts.real, &dcb.bounds, region, pad)?.convert(ftype.numeric);
        let imag = if ftype.complex {
            Some(match parts.imag {
                Some(im) => extract(im, &dcb.bounds, region, pad)?.convert(ftype.numeric),
                None => ArrayBuffer::zeroed(ftype.numeric, region.cell_count()),
            })
        } else {
            None
        };
        Ok(MappedArray { real, imag })
    }

    pub(crate) fn quality_region(&self, dcb_id: DcbId, region: &Bounds) -> Result<Vec<u8>, NdfError> {
        let quality = self.read_region(dcb_id, Component::Quality, region, NumericType::UByte.into())?;
        match quality.real {
            ArrayBuffer::UByte(bytes) => Ok(bytes),
            other => Err(NdfError::UnsupportedType {
                name: other.kind().to_string(),
            }),
        }
    }

    fn write_region(
        &mut self,
        dcb_id: DcbId,
        component: Component,
        region: &Bounds,
        array: &MappedArray,
    ) -> Status {
        let dcb = self.dcb_entry(dcb_id)?;
        let stored_bounds = dcb.bounds.clone();
        let id = dcb
            .slot(component)
            .store_id
            .ok_or(NdfError::Undefined { component })?;
        let parts = self.store.read(id)?;
        let mut real = parts.real.clone();
        let mut imag = parts.imag.cloned();
        insert(&mut real, &stored_bounds, region, &array.real)?;
        if let (Some(stored), Some(mapped)) = (imag.as_mut(), array.imag.as_ref()) {
            insert(stored, &stored_bounds, region, mapped)?;
        }
        self.store.write(id, real, imag)?;
        Ok(())
    }
}
