//! A store wrapper that fails on demand.

use std::cell::Cell;

use ndf_core::{
    ArrayBuffer, ArrayInfo, ArrayParts, ArrayStore, Bounds, FullType, Location, StorageForm,
    StoreError, StoreId,
};
use ndf_store::MemStore;

/// A store operation that can be made to fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StoreOp {
    CreateGroup,
    Erase,
    Create,
    Open,
    Delete,
    Rename,
    GetForm,
    Describe,
    Read,
    Write,
    SetAttribute,
    Attribute,
}

impl StoreOp {
    pub fn name(self) -> &'static str {
        match self {
            Self::CreateGroup => "create_group",
            Self::Erase => "erase",
            Self::Create => "create",
            Self::Open => "open",
            Self::Delete => "delete",
            Self::Rename => "rename",
            Self::GetForm => "get_form",
            Self::Describe => "describe",
            Self::Read => "read",
            Self::Write => "write",
            Self::SetAttribute => "set_attribute",
            Self::Attribute => "attribute",
        }
    }
}

/// Wraps a store; the armed operation succeeds `succeed_count` times,
/// fails once with [`StoreError::Injected`], and then succeeds again.
///
/// A single failure lets tests check that whatever a caller does to
/// recover from it reaches the store. Every other operation passes
/// straight through.
#[derive(Debug)]
pub struct FaultyStore<S = MemStore> {
    inner: S,
    armed: Option<StoreOp>,
    succeed_count: usize,
    calls: Cell<usize>,
}

impl FaultyStore<MemStore> {
    /// An empty in-memory store that never fails until armed.
    pub fn mem() -> Self {
        Self::new(MemStore::new())
    }
}

impl<S> FaultyStore<S> {
    /// Wrap `inner` without arming any failure.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            armed: None,
            succeed_count: 0,
            calls: Cell::new(0),
        }
    }

    /// Wrap `inner`, failing the call of `op` that follows
    /// `succeed_count` successes.
    pub fn failing(inner: S, op: StoreOp, succeed_count: usize) -> Self {
        let mut store = Self::new(inner);
        store.arm(op, succeed_count);
        store
    }

    /// Fail the call of `op` that follows `succeed_count` further
    /// successes.
    pub fn arm(&mut self, op: StoreOp, succeed_count: usize) {
        self.armed = Some(op);
        self.succeed_count = succeed_count;
        self.calls.set(0);
    }

    /// Stop injecting failures.
    pub fn disarm(&mut self) {
        self.armed = None;
    }

    /// How many times the armed operation has been called since arming.
    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    fn check(&self, op: StoreOp) -> Result<(), StoreError> {
        if self.armed != Some(op) {
            return Ok(());
        }
        let n = self.calls.get();
        self.calls.set(n + 1);
        if n == self.succeed_count {
            return Err(StoreError::Injected { op: op.name() });
        }
        Ok(())
    }
}

impl<S: ArrayStore> ArrayStore for FaultyStore<S> {
    fn create_group(&mut self, location: &Location) -> Result<(), StoreError> {
        self.check(StoreOp::CreateGroup)?;
        self.inner.create_group(location)
    }

    fn group_exists(&self, location: &Location) -> bool {
        self.inner.group_exists(location)
    }

    fn erase(&mut self, location: &Location) -> Result<(), StoreError> {
        self.check(StoreOp::Erase)?;
        self.inner.erase(location)
    }

    fn create(
        &mut self,
        location: &Location,
        bounds: &Bounds,
        ftype: FullType,
        form: StorageForm,
    ) -> Result<StoreId, StoreError> {
        self.check(StoreOp::Create)?;
        self.inner.create(location, bounds, ftype, form)
    }

    fn open(&mut self, location: &Location) -> Result<StoreId, StoreError> {
        self.check(StoreOp::Open)?;
        self.inner.open(location)
    }

    fn delete(&mut self, id: StoreId) -> Result<(), StoreError> {
        self.check(StoreOp::Delete)?;
        self.inner.delete(id)
    }

    fn rename(&mut self, id: StoreId, to: &Location) -> Result<(), StoreError> {
        self.check(StoreOp::Rename)?;
        self.inner.rename(id, to)
    }

    fn valid(&self, id: StoreId) -> bool {
        self.inner.valid(id)
    }

    fn get_form(&self, id: StoreId) -> Result<StorageForm, StoreError> {
        self.check(StoreOp::GetForm)?;
        self.inner.get_form(id)
    }

    fn describe(&self, id: StoreId) -> Result<ArrayInfo, StoreError> {
        self.check(StoreOp::Describe)?;
        self.inner.describe(id)
    }

    fn read(&self, id: StoreId) -> Result<ArrayParts<'_>, StoreError> {
        self.check(StoreOp::Read)?;
        self.inner.read(id)
    }

    fn write(
        &mut self,
        id: StoreId,
        real: ArrayBuffer,
        imag: Option<ArrayBuffer>,
    ) -> Result<(), StoreError> {
        self.check(StoreOp::Write)?;
        self.inner.write(id, real, imag)
    }

    fn set_attribute(&mut self, group: &Location, key: &str, value: i64) -> Result<(), StoreError> {
        self.check(StoreOp::SetAttribute)?;
        self.inner.set_attribute(group, key, value)
    }

    fn attribute(&self, group: &Location, key: &str) -> Result<Option<i64>, StoreError> {
        self.check(StoreOp::Attribute)?;
        self.inner.attribute(group, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::loc;

    #[test]
    fn fails_once_after_the_allowed_successes() {
        let mut store = FaultyStore::failing(MemStore::new(), StoreOp::CreateGroup, 1);
        store.create_group(&loc("/a")).unwrap();
        let err = store.create_group(&loc("/b")).unwrap_err();
        assert_eq!(err, StoreError::Injected { op: "create_group" });
        assert_eq!(store.calls(), 2);
        assert!(!store.inner().contains(&loc("/b")));
        store.create_group(&loc("/b")).unwrap();
        assert!(store.inner().contains(&loc("/b")));
    }

    #[test]
    fn unarmed_operations_pass_through() {
        let mut store = FaultyStore::failing(MemStore::new(), StoreOp::Delete, 0);
        store.create_group(&loc("/a")).unwrap();
        store.disarm();
        assert!(store.group_exists(&loc("/a")));
        assert_eq!(store.calls(), 0);
    }
}
