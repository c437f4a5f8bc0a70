//! Criterion micro-benchmarks for handle-level operations.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use ndf_access::Library;
use ndf_bench::image_profile;
use ndf_core::{AccessMode, Bounds, Component, Location, NumericType};
use ndf_store::MemStore;

/// Benchmark: map Data for reading on a 10K-pixel object, then unmap.
fn bench_map_read_10k(c: &mut Criterion) {
    let (mut lib, h) = image_profile(100, 100).unwrap();
    c.bench_function("map_read_10k", |b| {
        b.iter(|| {
            let mapped = lib
                .map(h, Component::Data, NumericType::Real, AccessMode::Read)
                .unwrap();
            black_box(mapped.real.len());
            lib.unmap(h, Component::Data).unwrap();
        });
    });
}

/// Benchmark: the same read with automatic quality masking enabled.
fn bench_map_read_masked_10k(c: &mut Criterion) {
    let (mut lib, h) = image_profile(100, 100).unwrap();
    lib.set_badbits(h, 1).unwrap();
    c.bench_function("map_read_masked_10k", |b| {
        b.iter(|| {
            let mapped = lib
                .map(h, Component::Data, NumericType::Real, AccessMode::Read)
                .unwrap();
            black_box(mapped.real.count_bad());
            lib.unmap(h, Component::Data).unwrap();
        });
    });
}

/// Benchmark: update a 10x10 section and write it back.
fn bench_section_update(c: &mut Criterion) {
    let (mut lib, h) = image_profile(100, 100).unwrap();
    let section = lib
        .create_section(h, &Bounds::new(&[41, 41], &[50, 50]).unwrap())
        .unwrap();
    c.bench_function("section_update_100", |b| {
        b.iter(|| {
            let mapped = lib
                .map(section, Component::Data, NumericType::Real, AccessMode::Update)
                .unwrap();
            if let Some(values) = mapped.real.as_mut_slice::<f32>() {
                values.iter_mut().for_each(|v| *v += 1.0);
            }
            lib.unmap(section, Component::Data).unwrap();
        });
    });
}

/// Benchmark: reserve, create and release a small object.
fn bench_create_release(c: &mut Criterion) {
    let mut lib = Library::new(MemStore::new());
    let location = Location::parse("/scratch").unwrap();
    c.bench_function("create_delete_object", |b| {
        b.iter(|| {
            let p = lib.reserve(&location).unwrap();
            let h = lib.create(p, "_REAL", &[1, 1], &[16, 16]).unwrap();
            lib.delete_object(black_box(h)).unwrap();
        });
    });
}

/// Benchmark: define Quality by a write map, then reset it.
fn bench_quality_reset(c: &mut Criterion) {
    let (mut lib, h) = image_profile(100, 100).unwrap();
    c.bench_function("quality_define_reset_10k", |b| {
        b.iter(|| {
            lib.map(h, Component::Quality, NumericType::UByte, AccessMode::Write)
                .unwrap();
            lib.unmap(h, Component::Quality).unwrap();
            black_box(lib.reset(h, Component::Quality).unwrap());
        });
    });
}

criterion_group!(
    benches,
    bench_map_read_10k,
    bench_map_read_masked_10k,
    bench_section_update,
    bench_create_release,
    bench_quality_reset
);
criterion_main!(benches);
