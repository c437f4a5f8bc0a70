//! The in-memory store.

use indexmap::IndexMap;
use ndf_core::{
    ArrayBuffer, ArrayInfo, ArrayParts, ArrayStore, Bounds, FullType, Location, StorageForm,
    StoreError, StoreId,
};

/// A stored array and its metadata.
#[derive(Clone, Debug)]
struct ArrayNode {
    id: StoreId,
    bounds: Bounds,
    ftype: FullType,
    form: StorageForm,
    real: ArrayBuffer,
    imag: Option<ArrayBuffer>,
}

#[derive(Clone, Debug)]
enum Node {
    Group { attributes: IndexMap<String, i64> },
    Array(ArrayNode),
}

/// A tree of groups and arrays held entirely in memory.
///
/// The root group is implicit. Ids are issued from a monotonic serial
/// counter and never reused.
#[derive(Debug)]
pub struct MemStore {
    nodes: IndexMap<Location, Node>,
    by_id: IndexMap<StoreId, Location>,
    root_attributes: IndexMap<String, i64>,
    next_serial: u64,
}

impl MemStore {
    /// An empty store.
    pub fn new() -> Self {
        Self {
            nodes: IndexMap::new(),
            by_id: IndexMap::new(),
            root_attributes: IndexMap::new(),
            next_serial: 1,
        }
    }

    /// Whether anything (group or array) exists at `location`.
    pub fn contains(&self, location: &Location) -> bool {
        location.is_root() || self.nodes.contains_key(location)
    }

    /// Number of live arrays.
    pub fn array_count(&self) -> usize {
        self.by_id.len()
    }

    /// Number of groups, excluding the root.
    pub fn group_count(&self) -> usize {
        self.nodes.len() - self.by_id.len()
    }

    /// Every non-root location, in creation order.
    pub fn locations(&self) -> impl Iterator<Item = &Location> {
        self.nodes.keys()
    }

    fn check_parent(&self, location: &Location) -> Result<(), StoreError> {
        if location.is_root() {
            return Err(StoreError::AlreadyExists {
                location: location.to_string(),
            });
        }
        match location.parent() {
            Some(parent) if self.group_exists(&parent) => Ok(()),
            _ => Err(StoreError::ParentMissing {
                location: location.to_string(),
            }),
        }
    }

    fn array(&self, id: StoreId) -> Result<&ArrayNode, StoreError> {
        let location = self.by_id.get(&id).ok_or(StoreError::InvalidId { id })?;
        match self.nodes.get(location) {
            Some(Node::Array(node)) => Ok(node),
            _ => Err(StoreError::InvalidId { id }),
        }
    }

    fn array_mut(&mut self, id: StoreId) -> Result<&mut ArrayNode, StoreError> {
        let location = self.by_id.get(&id).ok_or(StoreError::InvalidId { id })?;
        match self.nodes.get_mut(location) {
            Some(Node::Array(node)) => Ok(node),
            _ => Err(StoreError::InvalidId { id }),
        }
    }

    fn group_attributes(&self, group: &Location) -> Result<&IndexMap<String, i64>, StoreError> {
        if group.is_root() {
            return Ok(&self.root_attributes);
        }
        match self.nodes.get(group) {
            Some(Node::Group { attributes }) => Ok(attributes),
            _ => Err(StoreError::NotFound {
                location: group.to_string(),
            }),
        }
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ArrayStore for MemStore {
    fn create_group(&mut self, location: &Location) -> Result<(), StoreError> {
        self.check_parent(location)?;
        if self.nodes.contains_key(location) {
            return Err(StoreError::AlreadyExists {
                location: location.to_string(),
            });
        }
        self.nodes.insert(
            location.clone(),
            Node::Group {
                attributes: IndexMap::new(),
            },
        );
        Ok(())
    }

    fn group_exists(&self, location: &Location) -> bool {
        location.is_root() || matches!(self.nodes.get(location), Some(Node::Group { .. }))
    }

    fn erase(&mut self, location: &Location) -> Result<(), StoreError> {
        if location.is_root() || !self.nodes.contains_key(location) {
            return Err(StoreError::NotFound {
                location: location.to_string(),
            });
        }
        self.nodes.retain(|loc, _| !loc.starts_with(location));
        self.by_id.retain(|_, loc| !loc.starts_with(location));
        Ok(())
    }

    fn create(
        &mut self,
        location: &Location,
        bounds: &Bounds,
        ftype: FullType,
        form: StorageForm,
    ) -> Result<StoreId, StoreError> {
        self.check_parent(location)?;
        if self.nodes.contains_key(location) {
            return Err(StoreError::AlreadyExists {
                location: location.to_string(),
            });
        }
        // A primitive array cannot record an origin other than 1.
        let form = if form == StorageForm::Primitive && bounds.lower().iter().any(|&lo| lo != 1) {
            StorageForm::Simple
        } else {
            form
        };
        let id = StoreId(self.next_serial);
        self.next_serial += 1;
        let len = bounds.cell_count();
        let node = ArrayNode {
            id,
            bounds: bounds.clone(),
            ftype,
            form,
            real: ArrayBuffer::zeroed(ftype.numeric, len),
            imag: ftype
                .complex
                .then(|| ArrayBuffer::zeroed(ftype.numeric, len)),
        };
        self.nodes.insert(location.clone(), Node::Array(node));
        self.by_id.insert(id, location.clone());
        Ok(id)
    }

    fn open(&mut self, location: &Location) -> Result<StoreId, StoreError> {
        match self.nodes.get(location) {
            Some(Node::Array(node)) => Ok(node.id),
            _ => Err(StoreError::NotFound {
                location: location.to_string(),
            }),
        }
    }

    fn delete(&mut self, id: StoreId) -> Result<(), StoreError> {
        let location = self
            .by_id
            .shift_remove(&id)
            .ok_or(StoreError::InvalidId { id })?;
        self.nodes.shift_remove(&location);
        Ok(())
    }

    fn rename(&mut self, id: StoreId, to: &Location) -> Result<(), StoreError> {
        let from = self.by_id.get(&id).ok_or(StoreError::InvalidId { id })?.clone();
        if from == *to {
            return Ok(());
        }
        self.check_parent(to)?;
        if self.nodes.contains_key(to) {
            return Err(StoreError::AlreadyExists {
                location: to.to_string(),
            });
        }
        let node = self
            .nodes
            .shift_remove(&from)
            .ok_or(StoreError::InvalidId { id })?;
        self.nodes.insert(to.clone(), node);
        self.by_id.insert(id, to.clone());
        Ok(())
    }

    fn valid(&self, id: StoreId) -> bool {
        self.by_id.contains_key(&id)
    }

    fn get_form(&self, id: StoreId) -> Result<StorageForm, StoreError> {
        Ok(self.array(id)?.form)
    }

    fn describe(&self, id: StoreId) -> Result<ArrayInfo, StoreError> {
        let node = self.array(id)?;
        Ok(ArrayInfo {
            bounds: node.bounds.clone(),
            ftype: node.ftype,
            form: node.form,
        })
    }

    fn read(&self, id: StoreId) -> Result<ArrayParts<'_>, StoreError> {
        let node = self.array(id)?;
        Ok(ArrayParts {
            real: &node.real,
            imag: node.imag.as_ref(),
        })
    }

    fn write(
        &mut self,
        id: StoreId,
        real: ArrayBuffer,
        imag: Option<ArrayBuffer>,
    ) -> Result<(), StoreError> {
        let node = self.array_mut(id)?;
        let len = node.bounds.cell_count();
        for part in std::iter::once(&real).chain(imag.as_ref()) {
            if part.kind() != node.ftype.numeric {
                return Err(StoreError::TypeMismatch {
                    expected: node.ftype.numeric,
                    actual: part.kind(),
                });
            }
            if part.len() != len {
                return Err(StoreError::ShapeMismatch {
                    reason: format!("{} elements supplied for {len} pixels", part.len()),
                });
            }
        }
        if imag.is_some() != node.ftype.complex {
            return Err(StoreError::ShapeMismatch {
                reason: format!("imaginary part does not match type {}", node.ftype),
            });
        }
        node.real = real;
        node.imag = imag;
        Ok(())
    }

    fn set_attribute(&mut self, group: &Location, key: &str, value: i64) -> Result<(), StoreError> {
        let attributes = if group.is_root() {
            &mut self.root_attributes
        } else {
            match self.nodes.get_mut(group) {
                Some(Node::Group { attributes }) => attributes,
                _ => {
                    return Err(StoreError::NotFound {
                        location: group.to_string(),
                    })
                }
            }
        };
        attributes.insert(key.to_ascii_uppercase(), value);
        Ok(())
    }

    fn attribute(&self, group: &Location, key: &str) -> Result<Option<i64>, StoreError> {
        Ok(self
            .group_attributes(group)?
            .get(&key.to_ascii_uppercase())
            .copied())
    }
}
