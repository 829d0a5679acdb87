//! Run with: cargo bench --bench mxm_benchmark

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use matrix::{any_pair, build, method, Descriptor, Sauna};

fn random_path_matrix(n: usize, edges_per_node: usize) -> matrix::Matrix<bool> {
    let mut i = Vec::new();
    let mut j = Vec::new();
    for src in 0..n {
        for step in 1..=edges_per_node {
            let dst = (src + step * 7 + 1) % n;
            i.push(dst);
            j.push(src);
        }
    }
    let x = vec![true; i.len()];
    build(n, n, &i, &j, &x, |a, b| *a || *b)
}

fn benchmark_mxm(c: &mut Criterion) {
    let mut group = c.benchmark_group("mxm");

    for size in [100usize, 1_000, 5_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let a = random_path_matrix(size, 4);
            let bm = a.clone();
            b.iter(|| {
                let mut sauna = Sauna::new(size);
                let c = method::mxm(&a, &bm, &any_pair(), None, &Descriptor::none(), &mut sauna).unwrap();
                black_box(c)
            });
        });
    }

    group.finish();
}

fn benchmark_transpose(c: &mut Criterion) {
    let mut group = c.benchmark_group("transpose");

    for size in [100usize, 1_000, 10_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let a = random_path_matrix(size, 4);
            b.iter(|| black_box(method::transpose(&a)));
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_mxm, benchmark_transpose);
criterion_main!(benches);
