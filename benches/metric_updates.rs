//! Hot-path benchmarks: index insertion, distribution collection, meter
//! updates.

use criterion::{criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use vitals::{Distribution, Meter, OrderedIndex};

fn bench_index_insert(c: &mut Criterion) {
    c.bench_function("index_insert", |b| {
        let mut rng = StdRng::seed_from_u64(1234);
        let mut index = OrderedIndex::new();
        b.iter(|| {
            index.insert(rng.gen::<i64>(), ());
            if index.len() >= 1_000_000 {
                index = OrderedIndex::new();
            }
        });
    });
}

fn bench_distribution_add(c: &mut Criterion) {
    c.bench_function("distribution_add", |b| {
        let mut rng = StdRng::seed_from_u64(1234);
        let distribution = Distribution::new();
        let mut i = 0u64;
        b.iter(|| {
            distribution.add(rng.gen::<i64>());
            i += 1;
            if i % 10_000 == 0 {
                distribution.reset();
            }
        });
    });
}

fn bench_meter_update(c: &mut Criterion) {
    c.bench_function("meter_update", |b| {
        let meter = Meter::new();
        let mut i = 0i64;
        b.iter(|| {
            meter.inc(i);
            i += 1;
        });
    });
}

criterion_group!(
    benches,
    bench_index_insert,
    bench_distribution_add,
    bench_meter_update
);
criterion_main!(benches);
