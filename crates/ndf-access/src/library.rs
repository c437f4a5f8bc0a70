//! The [`Library`]: handle tables plus the store they manage.
//!
//! Object lifetime (open, create, clone, section, release, delete) and
//! the query surface live here. Mapping and component lifecycle are
//! further `impl` blocks in their own modules.

use indexmap::IndexMap;
use ndf_core::{
    inherit, ArrayStore, Bounds, Component, ComponentState, DcbId, FullType, HandleId, Location,
    NdfError, PlaceholderId, Status, StoreError,
};
use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::acb::AccessControlBlock;
use crate::config::{ConfigError, LibraryConfig};
use crate::dcb::{component_location, ComponentSlot, DataControlBlock};
use crate::pcb::Placeholder;
use crate::table::HandleTable;

/// Group attribute under which an object's badbits mask is persisted.
pub const BADBITS_ATTRIBUTE: &str = "BADBITS";

/// Handle-based access to the objects held in an [`ArrayStore`].
///
/// Three tables are kept:
///
/// - **DCB**: one [`DataControlBlock`] per open object, shared by every
///   handle on it and reference counted.
/// - **ACB**: one [`AccessControlBlock`] per handle, base or section.
/// - **PCB**: one [`Placeholder`] per reserved, not yet created object.
///
/// All keys are slot+generation values, so a released handle is
/// detected as stale ([`NdfError::AlreadyInvalid`]) rather than
/// resolving to whatever reused its slot.
#[derive(Debug)]
pub struct Library<S: ArrayStore> {
    pub(crate) store: S,
    pub(crate) config: LibraryConfig,
    pub(crate) acbs: HandleTable<AccessControlBlock>,
    pub(crate) dcbs: HandleTable<DataControlBlock>,
    pub(crate) pcbs: HandleTable<Placeholder>,
    pub(crate) by_location: IndexMap<Location, DcbId>,
}

impl<S: ArrayStore> Library<S> {
    /// A library over `store` with the default configuration.
    pub fn new(store: S) -> Self {
        Self {
            store,
            config: LibraryConfig::default(),
            acbs: HandleTable::new(),
            dcbs: HandleTable::new(),
            pcbs: HandleTable::new(),
            by_location: IndexMap::new(),
        }
    }

    /// A library over `store` with a validated configuration.
    ///
    /// # Errors
    ///
    /// Whatever [`LibraryConfig::validate`] reports.
    pub fn with_config(store: S, config: LibraryConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new(store)
        })
    }

    /// The active configuration.
    pub fn config(&self) -> &LibraryConfig {
        &self.config
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Give up the library and return its store. Open handles are
    /// dropped without writing back mapped values.
    pub fn into_store(self) -> S {
        self.store
    }

    // ── table access ──────────────────────────────────────────────

    pub(crate) fn acb(&self, handle: HandleId) -> Result<&AccessControlBlock, NdfError> {
        self.acbs
            .get(handle.0)
            .ok_or(NdfError::AlreadyInvalid { handle })
    }

    pub(crate) fn acb_mut(&mut self, handle: HandleId) -> Result<&mut AccessControlBlock, NdfError> {
        self.acbs
            .get_mut(handle.0)
            .ok_or(NdfError::AlreadyInvalid { handle })
    }

    pub(crate) fn dcb_entry(&self, id: DcbId) -> Result<&DataControlBlock, NdfError> {
        self.dcbs.get(id.0).ok_or_else(|| NdfError::NotFound {
            what: format!("object entry {id}"),
        })
    }

    pub(crate) fn dcb_entry_mut(&mut self, id: DcbId) -> Result<&mut DataControlBlock, NdfError> {
        self.dcbs.get_mut(id.0).ok_or_else(|| NdfError::NotFound {
            what: format!("object entry {id}"),
        })
    }

    fn insert_handle(&mut self, acb: AccessControlBlock) -> Result<HandleId, NdfError> {
        self.dcb_entry_mut(acb.dcb)?.refcount += 1;
        Ok(HandleId(self.acbs.insert(acb)))
    }

    // ── placeholders and creation ─────────────────────────────────

    /// Reserve `location` for a new object.
    ///
    /// An empty group is created there at once. It is erased again if
    /// the placeholder is annulled without a successful creation.
    ///
    /// # Errors
    ///
    /// [`NdfError::Store`] if the parent group is missing or the
    /// location is occupied.
    pub fn reserve(&mut self, location: &Location) -> Result<PlaceholderId, NdfError> {
        self.store.create_group(location)?;
        let id = PlaceholderId(self.pcbs.insert(Placeholder::new(location.clone())));
        debug!(placeholder = %id, location = %location, "placeholder reserved");
        Ok(id)
    }

    /// Create an object of type `type_name` with the given pixel bounds
    /// at a reserved location, returning a base handle to it.
    ///
    /// The steps run in order, stopping at the first failure:
    ///
    /// 1. the placeholder must be live;
    /// 2. the type name and bounds are validated;
    /// 3. the Data array is created in the store, and the object is
    ///    entered with Data defined and Variance and Quality undefined;
    /// 4. a base handle is issued.
    ///
    /// Whatever happens, a live placeholder is then annulled: discarded
    /// after success, erased (with everything created under it) after
    /// failure. A placeholder can therefore be used only once.
    ///
    /// # Errors
    ///
    /// - [`NdfError::NotFound`] if the placeholder is not live.
    /// - [`NdfError::UnsupportedType`] for an unknown type name.
    /// - [`NdfError::InvalidBounds`] for malformed bounds.
    /// - [`NdfError::Store`] if the store refuses the array.
    pub fn create(
        &mut self,
        placeholder: PlaceholderId,
        type_name: &str,
        lower: &[i64],
        upper: &[i64],
    ) -> Result<HandleId, NdfError> {
        let location = self
            .pcbs
            .get(placeholder.0)
            .map(|pcb| pcb.location.clone())
            .ok_or_else(|| NdfError::NotFound {
                what: format!("placeholder {placeholder}"),
            })?;

        let result = self.materialise(&location, type_name, lower, upper);
        if result.is_ok() {
            if let Some(pcb) = self.pcbs.get_mut(placeholder.0) {
                pcb.erase = false;
            }
        }
        let annulled = self.annul(placeholder);
        let handle = result?;
        annulled.map(|()| handle)
    }

    /// [`create`](Self::create) as a step in a chain that may already
    /// have failed.
    ///
    /// If `prior` is an error, no object is created: the placeholder is
    /// annulled (erasing its location) and `prior` is returned verbatim.
    ///
    /// # Errors
    ///
    /// `prior` if it is an error, otherwise as for [`create`](Self::create).
    pub fn create_with_status(
        &mut self,
        prior: &Status,
        placeholder: PlaceholderId,
        type_name: &str,
        lower: &[i64],
        upper: &[i64],
    ) -> Result<HandleId, NdfError> {
        if prior.is_err() {
            if let Err(e) = self.annul(placeholder) {
                warn!(placeholder = %placeholder, error = %e, "annulling after prior failure");
            }
        }
        inherit(prior, || self.create(placeholder, type_name, lower, upper))
    }

    /// Give up a placeholder, erasing its location unless an object was
    /// successfully created there.
    ///
    /// # Errors
    ///
    /// [`NdfError::NotFound`] if the placeholder is not live;
    /// [`NdfError::Store`] if the erase fails.
    pub fn annul(&mut self, placeholder: PlaceholderId) -> Status {
        let pcb = self
            .pcbs
            .remove(placeholder.0)
            .ok_or_else(|| NdfError::NotFound {
                what: format!("placeholder {placeholder}"),
            })?;
        if !pcb.erase {
            debug!(placeholder = %placeholder, "placeholder discarded");
            return Ok(());
        }
        warn!(placeholder = %placeholder, location = %pcb.location, "erasing placeholder");
        match self.store.erase(&pcb.location) {
            Ok(()) | Err(StoreError::NotFound { .. }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn materialise(
        &mut self,
        location: &Location,
        type_name: &str,
        lower: &[i64],
        upper: &[i64],
    ) -> Result<HandleId, NdfError> {
        let ftype = FullType::parse(type_name)?;
        let bounds = Bounds::with_max_dims(lower, upper, self.config.max_dims)?;

        let data_location = component_location(location, Component::Data)?;
        let data = self
            .store
            .create(&data_location, &bounds, ftype, self.config.default_form)?;
        let form = self.store.get_form(data)?;
        let dcb = DataControlBlock::new_object(location.clone(), bounds.clone(), data, ftype, form);
        let dcb_id = DcbId(self.dcbs.insert(dcb));
        self.by_location.insert(location.clone(), dcb_id);

        let handle = self.insert_handle(AccessControlBlock::base(dcb_id, bounds))?;
        debug!(handle = %handle, location = %location, ftype = %ftype, "object created");
        Ok(handle)
    }

    // ── open, clone, section ──────────────────────────────────────

    /// Open the object at `location`, returning a new base handle.
    ///
    /// A second open of the same location shares the existing entry.
    ///
    /// # Errors
    ///
    /// [`NdfError::NotFound`] if there is no object group at `location`;
    /// [`NdfError::Store`] if it has no Data array or the store fails.
    pub fn open(&mut self, location: &Location) -> Result<HandleId, NdfError> {
        let dcb_id = match self.by_location.get(location) {
            Some(&id) => id,
            None => self.import(location)?,
        };
        let bounds = self.dcb_entry(dcb_id)?.bounds.clone();
        let handle = self.insert_handle(AccessControlBlock::base(dcb_id, bounds))?;
        debug!(handle = %handle, location = %location, "object opened");
        Ok(handle)
    }

    fn import(&mut self, location: &Location) -> Result<DcbId, NdfError> {
        if location.is_root() || !self.store.group_exists(location) {
            return Err(NdfError::NotFound {
                what: format!("object {location}"),
            });
        }
        let data = self.store.open(&component_location(location, Component::Data)?)?;
        let info = self.store.describe(data)?;
        let mut dcb =
            DataControlBlock::new_object(location.clone(), info.bounds, data, info.ftype, info.form);
        for component in [Component::Variance, Component::Quality] {
            match self.store.open(&component_location(location, component)?) {
                Ok(id) => {
                    let info = self.store.describe(id)?;
                    *dcb.slot_mut(component) = ComponentSlot::defined(id, info.ftype, info.form);
                }
                Err(StoreError::NotFound { .. }) => {}
                Err(e) => return Err(e.into()),
            }
        }
        if let Some(bits) = self.store.attribute(location, BADBITS_ATTRIBUTE)? {
            dcb.badbits = u8::try_from(bits).unwrap_or_else(|_| {
                warn!(location = %location, value = bits, "persisted badbits out of range, ignored");
                0
            });
        }
        let id = DcbId(self.dcbs.insert(dcb));
        self.by_location.insert(location.clone(), id);
        debug!(dcb = %id, location = %location, "object entry imported");
        Ok(id)
    }

    /// A new handle to the same object, of the same kind and bounds.
    ///
    /// # Errors
    ///
    /// [`NdfError::AlreadyInvalid`] if `handle` is stale.
    pub fn clone_handle(&mut self, handle: HandleId) -> Result<HandleId, NdfError> {
        let acb = self.acb(handle)?.duplicate();
        let clone = self.insert_handle(acb)?;
        debug!(handle = %handle, clone = %clone, "handle cloned");
        Ok(clone)
    }

    /// A section handle viewing `bounds` of the object behind `handle`.
    ///
    /// The section shares the object entry. Its bounds must lie inside
    /// the parent's, axes beyond either's dimensionality counting as
    /// `[1, 1]`.
    ///
    /// # Errors
    ///
    /// - [`NdfError::AlreadyInvalid`] if `handle` is stale.
    /// - [`NdfError::InvalidBounds`] if `bounds` has too many axes or
    ///   is not inside the parent's bounds.
    pub fn create_section(&mut self, handle: HandleId, bounds: &Bounds) -> Result<HandleId, NdfError> {
        let parent = self.acb(handle)?;
        if bounds.ndim() > self.config.max_dims {
            return Err(NdfError::InvalidBounds {
                reason: format!(
                    "{} dimensions exceeds the limit of {}",
                    bounds.ndim(),
                    self.config.max_dims
                ),
            });
        }
        if !parent.bounds.contains(bounds) {
            return Err(NdfError::InvalidBounds {
                reason: format!("section {bounds} is not inside {}", parent.bounds),
            });
        }
        let acb = AccessControlBlock::section(parent.dcb, handle, bounds.clone());
        let section = self.insert_handle(acb)?;
        debug!(parent = %handle, handle = %section, bounds = %bounds, "section created");
        Ok(section)
    }

    // ── release and delete ────────────────────────────────────────

    /// Release a handle.
    ///
    /// Anything still mapped through it is unmapped first, with values
    /// written back where the access mode allows. When the last handle
    /// on an object goes, its entry is finalized: a changed badbits mask
    /// is persisted and any side-quality link is dropped.
    ///
    /// The handle is released even if a write-back fails; the first
    /// such failure is reported.
    ///
    /// # Errors
    ///
    /// [`NdfError::AlreadyInvalid`] if `handle` is stale, otherwise the
    /// first write-back or finalization failure.
    pub fn release(&mut self, handle: HandleId) -> Status {
        let mapped: SmallVec<[Component; 3]> = self.acb(handle)?.mapped_components().collect();
        let mut first_error = None;
        for component in mapped {
            if let Err(e) = self.unmap(handle, component) {
                first_error.get_or_insert(e);
            }
        }
        let acb = self.acbs.remove(handle.0).ok_or(NdfError::AlreadyInvalid { handle })?;
        debug!(handle = %handle, "handle released");
        if let Err(e) = self.drop_ref(acb.dcb) {
            first_error.get_or_insert(e);
        }
        first_error.map_or(Ok(()), Err)
    }

    pub(crate) fn drop_ref(&mut self, id: DcbId) -> Status {
        let dcb = self.dcb_entry_mut(id)?;
        dcb.refcount = dcb.refcount.saturating_sub(1);
        if dcb.refcount > 0 {
            return Ok(());
        }
        self.finalize(id)
    }

    fn finalize(&mut self, id: DcbId) -> Status {
        let Some(dcb) = self.dcbs.remove(id.0) else {
            return Ok(());
        };
        self.by_location.shift_remove(&dcb.location);
        let mut status = Ok(());
        if dcb.badbits_dirty && self.store.group_exists(&dcb.location) {
            status = self
                .store
                .set_attribute(&dcb.location, BADBITS_ATTRIBUTE, i64::from(dcb.badbits))
                .map_err(NdfError::from);
        }
        debug!(dcb = %id, location = %dcb.location, "object entry finalized");
        if let Some(companion) = dcb.side_quality {
            let released = self.drop_ref(companion);
            if status.is_ok() {
                status = released;
            }
        }
        status
    }

    /// Erase the object behind `handle` from the store.
    ///
    /// Every handle on the object, sections included, becomes stale.
    /// Side-quality links to the object are dropped.
    ///
    /// # Errors
    ///
    /// - [`NdfError::AlreadyInvalid`] if `handle` is stale.
    /// - [`NdfError::AlreadyMapped`] if any component of the object is
    ///   mapped through any handle.
    /// - [`NdfError::Store`] if the erase fails; nothing is invalidated.
    pub fn delete_object(&mut self, handle: HandleId) -> Status {
        let dcb_id = self.acb(handle)?.dcb;
        let dcb = self.dcb_entry(dcb_id)?;
        if let Some(component) = dcb.first_mapped() {
            return Err(NdfError::AlreadyMapped {
                component,
                reason: format!("cannot delete {} while it is mapped", dcb.location),
            });
        }
        let location = dcb.location.clone();
        self.store.erase(&location)?;

        let stale: Vec<u64> = self
            .acbs
            .iter()
            .filter(|(_, acb)| acb.dcb == dcb_id)
            .map(|(key, _)| key)
            .collect();
        for key in &stale {
            self.acbs.remove(*key);
        }
        let linked: Vec<u64> = self
            .dcbs
            .iter()
            .filter(|(_, d)| d.side_quality == Some(dcb_id))
            .map(|(key, _)| key)
            .collect();
        for key in linked {
            if let Some(d) = self.dcbs.get_mut(key) {
                d.side_quality = None;
            }
        }
        self.by_location.shift_remove(&location);
        let removed = self.dcbs.remove(dcb_id.0);
        warn!(location = %location, handles = stale.len(), "object deleted");
        match removed.and_then(|d| d.side_quality) {
            Some(companion) => self.drop_ref(companion),
            None => Ok(()),
        }
    }

    // ── queries ───────────────────────────────────────────────────

    /// Whether `handle` is live.
    pub fn valid(&self, handle: HandleId) -> bool {
        self.acbs.contains(handle.0)
    }

    /// Number of objects currently open.
    pub fn open_count(&self) -> usize {
        self.dcbs.len()
    }

    /// Number of live handles.
    pub fn handle_count(&self) -> usize {
        self.acbs.len()
    }

    /// Number of placeholders awaiting creation.
    pub fn placeholder_count(&self) -> usize {
        self.pcbs.len()
    }

    /// The object entry behind `handle`.
    ///
    /// # Errors
    ///
    /// [`NdfError::AlreadyInvalid`] if `handle` is stale.
    pub fn dcb(&self, handle: HandleId) -> Result<&DataControlBlock, NdfError> {
        let id = self.acb(handle)?.dcb;
        self.dcb_entry(id)
    }

    /// The id of the object entry behind `handle`.
    ///
    /// # Errors
    ///
    /// [`NdfError::AlreadyInvalid`] if `handle` is stale.
    pub fn dcb_of(&self, handle: HandleId) -> Result<DcbId, NdfError> {
        Ok(self.acb(handle)?.dcb)
    }

    /// Whether `handle` is a base handle rather than a section.
    ///
    /// # Errors
    ///
    /// [`NdfError::AlreadyInvalid`] if `handle` is stale.
    pub fn is_base(&self, handle: HandleId) -> Result<bool, NdfError> {
        Ok(self.acb(handle)?.is_base)
    }

    /// The pixel bounds seen through `handle`.
    ///
    /// # Errors
    ///
    /// [`NdfError::AlreadyInvalid`] if `handle` is stale.
    pub fn bounds(&self, handle: HandleId) -> Result<&Bounds, NdfError> {
        Ok(&self.acb(handle)?.bounds)
    }

    /// Store location of the object behind `handle`.
    ///
    /// # Errors
    ///
    /// [`NdfError::AlreadyInvalid`] if `handle` is stale.
    pub fn location(&self, handle: HandleId) -> Result<&Location, NdfError> {
        Ok(&self.dcb(handle)?.location)
    }

    /// Element type of a component.
    ///
    /// For an undefined component this is the type it will be created
    /// with.
    ///
    /// # Errors
    ///
    /// [`NdfError::AlreadyInvalid`] if `handle` is stale.
    pub fn ftype(&self, handle: HandleId, component: Component) -> Result<FullType, NdfError> {
        Ok(self.dcb(handle)?.slot(component).ftype)
    }

    /// Lifecycle state of a component.
    ///
    /// # Errors
    ///
    /// [`NdfError::AlreadyInvalid`] if `handle` is stale.
    pub fn state(&self, handle: HandleId, component: Component) -> Result<ComponentState, NdfError> {
        Ok(self.dcb(handle)?.slot(component).state)
    }

    /// Whether a component holds values.
    ///
    /// # Errors
    ///
    /// [`NdfError::AlreadyInvalid`] if `handle` is stale.
    pub fn is_defined(&self, handle: HandleId, component: Component) -> Result<bool, NdfError> {
        Ok(self.state(handle, component)? == ComponentState::Defined)
    }

    /// Whether `component` is mapped through `handle` itself.
    ///
    /// # Errors
    ///
    /// [`NdfError::AlreadyInvalid`] if `handle` is stale.
    pub fn is_mapped(&self, handle: HandleId, component: Component) -> Result<bool, NdfError> {
        Ok(self.acb(handle)?.is_mapped(component))
    }

    /// Set the quality bits that mark a cell bad.
    ///
    /// The mask is shared by every handle on the object and persisted
    /// when the object's last handle is released.
    ///
    /// # Errors
    ///
    /// [`NdfError::AlreadyInvalid`] if `handle` is stale.
    pub fn set_badbits(&mut self, handle: HandleId, badbits: u8) -> Status {
        let id = self.acb(handle)?.dcb;
        let dcb = self.dcb_entry_mut(id)?;
        if dcb.badbits != badbits {
            dcb.badbits = badbits;
            dcb.badbits_dirty = true;
        }
        debug!(handle = %handle, badbits, "badbits set");
        Ok(())
    }

    /// The object's badbits mask.
    ///
    /// # Errors
    ///
    /// [`NdfError::AlreadyInvalid`] if `handle` is stale.
    pub fn badbits(&self, handle: HandleId) -> Result<u8, NdfError> {
        Ok(self.dcb(handle)?.badbits)
    }
}
