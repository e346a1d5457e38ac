//! Benchmarks for the Standard Library's [`BTreeMap`], the balanced-tree
//! reference the vector skip list is measured against.

use std::collections::BTreeMap;

use criterion::{black_box, AxisScale, BenchmarkId, Criterion, PlotConfiguration};
use rand::prelude::*;

/// Benchmarking sizes
const SIZES: [u64; 6] = [1, 10, 100, 1000, 10_000, 100_000];

/// Keys are spread out by this stride, matching the sparse container
/// benchmarks.
const SPARSE_STRIDE: u64 = 4096;

/// Benchmarking insertion
pub fn insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("BTreeMap Insert");
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for size in SIZES {
        group.bench_function(BenchmarkId::from_parameter(size), |b| {
            let mut rng = StdRng::seed_from_u64(0x1234_abcd);
            let mut map: BTreeMap<u64, u64> = (0..size).map(|i| (i * SPARSE_STRIDE, i)).collect();

            b.iter(|| {
                map.insert(rng.gen_range(0..size) * SPARSE_STRIDE, rng.gen());
            });
        });
    }
}

/// Benchmarking random access
pub fn get(c: &mut Criterion) {
    let mut group = c.benchmark_group("BTreeMap Get");
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for size in SIZES {
        group.bench_function(BenchmarkId::from_parameter(size), |b| {
            let mut rng = StdRng::seed_from_u64(0x1234_abcd);
            let map: BTreeMap<u64, u64> = (0..size).map(|i| (i * SPARSE_STRIDE, i)).collect();
            let keys: Vec<u64> = std::iter::repeat_with(|| rng.gen_range(0..size * SPARSE_STRIDE))
                .take(10)
                .collect();

            b.iter(|| {
                for key in &keys {
                    black_box(map.get(key));
                }
            });
        });
    }
}

/// Benchmarking removal and reinsertion
pub fn remove(c: &mut Criterion) {
    let mut group = c.benchmark_group("BTreeMap Remove");
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for size in SIZES {
        group.bench_function(BenchmarkId::from_parameter(size), |b| {
            let mut rng = StdRng::seed_from_u64(0x1234_abcd);
            let mut map: BTreeMap<u64, u64> = (0..size).map(|i| (i * SPARSE_STRIDE, i)).collect();

            b.iter(|| {
                let key = rng.gen_range(0..size) * SPARSE_STRIDE;
                map.remove(&key);
                map.insert(key, key);
            });
        });
    }
}
