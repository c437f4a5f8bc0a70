//! Integration test: map counters shared between a base handle and its
//! sections.
//!
//! Any number of handles may read a component at once. A write, update
//! or reset through one handle is refused while another handle on the
//! same object has the component mapped.

use ndf_access::Library;
use ndf_core::{AccessMode, Bounds, Component, ErrorKind, HandleId, NumericType};
use ndf_store::MemStore;
use ndf_test_utils::fixtures::{loc, ramp};
use ndf_test_utils::init_tracing;
use proptest::prelude::*;

const NX: i64 = 8;
const NY: i64 = 6;

/// A `NX x NY` `_REAL` object holding `0, 1, 2, ...` in storage order.
fn ramped_object() -> (Library<MemStore>, HandleId) {
    let mut lib = Library::new(MemStore::new());
    let p = lib.reserve(&loc("/ramp")).unwrap();
    let h = lib.create(p, "_REAL", &[1, 1], &[NX, NY]).unwrap();
    let n = (NX * NY) as usize;
    lib.map(h, Component::Data, NumericType::Real, AccessMode::Write)
        .unwrap()
        .real
        .as_mut_slice::<f32>()
        .unwrap()
        .copy_from_slice(&ramp(n));
    lib.unmap(h, Component::Data).unwrap();
    (lib, h)
}

fn read_all(lib: &mut Library<MemStore>, h: HandleId) -> Vec<f32> {
    let values = lib
        .map(h, Component::Data, NumericType::Real, AccessMode::Read)
        .unwrap()
        .real
        .as_slice::<f32>()
        .unwrap()
        .to_vec();
    lib.unmap(h, Component::Data).unwrap();
    values
}

#[test]
fn write_through_base_refused_while_section_reads() {
    init_tracing();
    let (mut lib, base) = ramped_object();
    let section = lib
        .create_section(base, &Bounds::new(&[2, 2], &[4, 3]).unwrap())
        .unwrap();
    lib.map(section, Component::Data, NumericType::Real, AccessMode::Read)
        .unwrap();

    for mode in [AccessMode::Write, AccessMode::Update] {
        let err = lib
            .map(base, Component::Data, NumericType::Real, mode)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyMapped, "{mode}");
    }
    let err = lib.reset(base, Component::Data).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyMapped);

    lib.unmap(section, Component::Data).unwrap();
    lib.map(base, Component::Data, NumericType::Real, AccessMode::Update)
        .unwrap();
}

#[test]
fn concurrent_reads_are_allowed() {
    let (mut lib, base) = ramped_object();
    let section = lib
        .create_section(base, &Bounds::new(&[1, 1], &[2, 2]).unwrap())
        .unwrap();
    let clone = lib.clone_handle(base).unwrap();

    lib.map(base, Component::Data, NumericType::Double, AccessMode::Read)
        .unwrap();
    lib.map(section, Component::Data, NumericType::Real, AccessMode::Read)
        .unwrap();
    lib.map(clone, Component::Data, NumericType::Integer, AccessMode::Read)
        .unwrap();

    let section_values = lib
        .mapped(section, Component::Data)
        .unwrap()
        .real
        .as_slice::<f32>()
        .unwrap()
        .to_vec();
    assert_eq!(section_values, vec![0.0, 1.0, NX as f32, NX as f32 + 1.0]);
    assert_eq!(lib.dcb(base).unwrap().slot(Component::Data).map_count, 3);
}

#[test]
fn read_refused_while_write_outstanding() {
    let (mut lib, base) = ramped_object();
    let other = lib.clone_handle(base).unwrap();
    lib.map(base, Component::Data, NumericType::Real, AccessMode::Write)
        .unwrap();
    let err = lib
        .map(other, Component::Data, NumericType::Real, AccessMode::Read)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyMapped);
}

#[test]
fn release_unmaps_and_frees_the_component() {
    let (mut lib, base) = ramped_object();
    let section = lib
        .create_section(base, &Bounds::new(&[1, 1], &[NX, 1]).unwrap())
        .unwrap();
    lib.map(section, Component::Data, NumericType::Real, AccessMode::Update)
        .unwrap()
        .real
        .as_mut_slice::<f32>()
        .unwrap()
        .fill(-1.0);
    lib.release(section).unwrap();

    let values = read_all(&mut lib, base);
    assert!(values[..NX as usize].iter().all(|&v| v == -1.0));
    assert_eq!(values[NX as usize], NX as f32);
}

#[test]
fn delete_refused_while_mapped() {
    let (mut lib, base) = ramped_object();
    let section = lib
        .create_section(base, &Bounds::new(&[1, 1], &[1, 1]).unwrap())
        .unwrap();
    lib.map(section, Component::Data, NumericType::Real, AccessMode::Read)
        .unwrap();
    let err = lib.delete_object(base).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyMapped);

    lib.unmap(section, Component::Data).unwrap();
    lib.delete_object(base).unwrap();
    assert!(!lib.valid(base));
    assert!(!lib.valid(section));
    assert!(!lib.store().contains(&loc("/ramp")));
}

fn section_bounds() -> impl Strategy<Value = (i64, i64, i64, i64)> {
    (1..=NX, 1..=NY).prop_flat_map(|(x0, y0)| (Just(x0), Just(y0), x0..=NX, y0..=NY))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn section_writes_touch_only_their_pixels(
        (x0, y0, x1, y1) in section_bounds(),
        fill in -100.0f32..100.0,
    ) {
        let (mut lib, base) = ramped_object();
        let region = Bounds::new(&[x0, y0], &[x1, y1]).unwrap();
        let section = lib.create_section(base, &region).unwrap();
        let mapped = lib
            .map(section, Component::Data, NumericType::Real, AccessMode::Write)
            .unwrap();
        prop_assert_eq!(mapped.real.len(), region.cell_count());
        mapped.real.as_mut_slice::<f32>().unwrap().fill(fill);
        lib.unmap(section, Component::Data).unwrap();

        let values = read_all(&mut lib, base);
        for y in 1..=NY {
            for x in 1..=NX {
                let i = ((x - 1) + (y - 1) * NX) as usize;
                let inside = (x0..=x1).contains(&x) && (y0..=y1).contains(&y);
                let expected = if inside { fill } else { i as f32 };
                prop_assert_eq!(values[i], expected, "pixel ({}, {})", x, y);
            }
        }
    }
}
