//! Performance benchmarks for rounding
//!
//! Networks are grown by addition (ranks double) and rounded back down.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use tensornet_core::{RankSpec, TensorNetwork};
use tensornet_decomp::{round, round_tt, RoundingTarget};
use tensornet_kernels::add;

fn bench_round_tt(c: &mut Criterion) {
    let mut group = c.benchmark_group("round_tt");

    for &(n_dims, size, rank) in &[(4, 32, 5), (6, 16, 8), (8, 8, 10)] {
        let shape = vec![size; n_dims];
        let t = TensorNetwork::random(&shape, &RankSpec::train(n_dims, rank), 0).unwrap();
        let grown = add(&t, &t).unwrap();

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}d_{}_r{}", n_dims, size, rank)),
            &grown,
            |b, grown| b.iter(|| black_box(round_tt(black_box(grown), &RoundingTarget::new(1e-8)))),
        );
    }

    group.finish();
}

fn bench_round_tucker_train(c: &mut Criterion) {
    let mut group = c.benchmark_group("round_tucker_train");
    group.sample_size(20);

    for &(size, rank, features) in &[(64, 4, 8), (128, 6, 12)] {
        let spec = RankSpec::train(4, rank).with_tucker(features);
        let t = TensorNetwork::random(&[size; 4], &spec, 1).unwrap();
        let grown = add(&t, &t).unwrap();

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_r{}_s{}", size, rank, features)),
            &grown,
            |b, grown| b.iter(|| black_box(round(black_box(grown), 1e-6))),
        );
    }

    group.finish();
}

criterion_group!(rounding_benches, bench_round_tt, bench_round_tucker_train);
criterion_main!(rounding_benches);
