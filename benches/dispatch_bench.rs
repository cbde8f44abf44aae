//! Dispatch overhead benchmarks for strided-blas
//!
//! Compares a validated `Blas` call against calling the registered kernel
//! directly with the same raw operands. The gap is the cost of scalar
//! unboxing, shape and aliasing checks, and the table lookup.
//!
//! Run with: cargo bench --bench dispatch_bench
//! CBLAS engine: cargo bench --features blas --bench dispatch_bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::StandardNormal;
use std::time::Duration;
use strided_blas::{
    backend, Blas, Layout, MatrixBlock, MatrixDesc, StructureClass, VectorBlock, VectorBlockMut,
};

fn random_vec(rng: &mut StdRng, n: usize) -> Vec<f64> {
    (0..n).map(|_| rng.sample(StandardNormal)).collect()
}

/// Dispatched vs direct dot product
fn bench_dot(c: &mut Criterion) {
    let mut group = c.benchmark_group("dot");
    group.sample_size(20);
    group.warm_up_time(Duration::from_secs(1));
    group.measurement_time(Duration::from_secs(3));

    let blas = Blas::new(backend::active());
    let kernel = blas.engine().kernels::<f64>().level1.dot.unwrap();

    for size in [4, 64, 1024, 65536] {
        group.throughput(Throughput::Elements(size as u64));

        let mut rng = StdRng::seed_from_u64(42);
        let x_data = random_vec(&mut rng, size);
        let y_data = random_vec(&mut rng, size);
        let x = VectorBlock::from_slice(&x_data);
        let y = VectorBlock::from_slice(&y_data);

        group.bench_with_input(BenchmarkId::new("dispatched", size), &size, |bench, _| {
            bench.iter(|| blas.dot(black_box(&x), black_box(&y)).unwrap())
        });

        group.bench_with_input(BenchmarkId::new("direct", size), &size, |bench, _| {
            bench.iter(|| unsafe { (kernel.run)(black_box(x.raw()), black_box(y.raw())) })
        });
    }
    group.finish();
}

/// Dispatched vs direct axpy, contiguous and strided
fn bench_axpy(c: &mut Criterion) {
    let mut group = c.benchmark_group("axpy");
    group.sample_size(20);
    group.warm_up_time(Duration::from_secs(1));
    group.measurement_time(Duration::from_secs(3));

    let blas = Blas::new(backend::active());
    let kernel = blas.engine().kernels::<f64>().level1.axpy.unwrap();

    for (inc, size) in [(1, 64), (1, 65536), (3, 65536)] {
        group.throughput(Throughput::Elements(size as u64));

        let mut rng = StdRng::seed_from_u64(7);
        let x_data = random_vec(&mut rng, size * inc);
        let mut y_data = random_vec(&mut rng, size * inc);
        let x = VectorBlock::new(&x_data, size, 0, inc as isize).unwrap();
        let mut y = VectorBlockMut::new(&mut y_data, size, 0, inc as isize).unwrap();
        let label = format!("{size}/inc{inc}");

        group.bench_function(BenchmarkId::new("dispatched", &label), |bench| {
            bench.iter(|| blas.axpy(black_box(1e-3), &x, &mut y).unwrap())
        });

        let (xr, yr) = (x.raw(), y.raw_mut());
        group.bench_function(BenchmarkId::new("direct", &label), |bench| {
            bench.iter(|| unsafe { (kernel.run)(black_box(1e-3), xr, yr) })
        });
    }
    group.finish();
}

/// Dispatched vs direct general matrix-vector product
fn bench_mv(c: &mut Criterion) {
    let mut group = c.benchmark_group("mv");
    group.sample_size(20);
    group.warm_up_time(Duration::from_secs(1));
    group.measurement_time(Duration::from_secs(3));

    let blas = Blas::new(backend::active());
    let kernel = blas
        .engine()
        .kernels::<f64>()
        .mv(StructureClass::General)
        .unwrap();

    for n in [8, 128, 512] {
        group.throughput(Throughput::Elements((n * n) as u64));

        let mut rng = StdRng::seed_from_u64(3);
        let a_data = random_vec(&mut rng, n * n);
        let x_data = random_vec(&mut rng, n);
        let mut y_data = vec![0.0; n];
        let a = MatrixBlock::new(&a_data, MatrixDesc::general(n, n, Layout::ColMajor)).unwrap();
        let x = VectorBlock::from_slice(&x_data);
        let mut y = VectorBlockMut::from_slice(&mut y_data);

        group.bench_with_input(BenchmarkId::new("dispatched", n), &n, |bench, _| {
            bench.iter(|| blas.mv(1.0, &a, &x, 0.0, &mut y).unwrap())
        });

        let (ar, xr, yr) = (a.raw(), x.raw(), y.raw_mut());
        group.bench_with_input(BenchmarkId::new("direct", n), &n, |bench, _| {
            bench.iter(|| unsafe { (kernel.run)(1.0, ar, xr, 0.0, yr) })
        });
    }
    group.finish();
}

/// Dispatched general matrix product across layouts
fn bench_mm(c: &mut Criterion) {
    let mut group = c.benchmark_group("mm");
    group.sample_size(10);
    group.warm_up_time(Duration::from_secs(1));
    group.measurement_time(Duration::from_secs(3));

    let blas = Blas::new(backend::active());

    for n in [16, 64, 128] {
        group.throughput(Throughput::Elements((n * n * n) as u64));

        let mut rng = StdRng::seed_from_u64(5);
        let a_data = random_vec(&mut rng, n * n);
        let b_data = random_vec(&mut rng, n * n);
        let mut c_data = vec![0.0; n * n];
        let a = MatrixBlock::new(&a_data, MatrixDesc::general(n, n, Layout::RowMajor)).unwrap();
        let b = MatrixBlock::new(&b_data, MatrixDesc::general(n, n, Layout::ColMajor)).unwrap();
        let mut cm = strided_blas::MatrixBlockMut::new(
            &mut c_data,
            MatrixDesc::general(n, n, Layout::RowMajor),
        )
        .unwrap();

        group.bench_with_input(BenchmarkId::new("mixed_layout", n), &n, |bench, _| {
            bench.iter(|| blas.mm(1.0, &a, &b, 0.0, &mut cm).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_dot, bench_axpy, bench_mv, bench_mm);
criterion_main!(benches);
