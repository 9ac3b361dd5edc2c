//! Benchmarks for building and querying the spatial hash.
//!
//! Run with: `cargo bench`

use boids_grid::{QueryBuffer, SpatialConfig, SpatialHash};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const BOUNDS: f32 = 20.0;
const NEIGHBORS_PER_CELL: u32 = 8;

fn cloud(count: usize) -> Vec<Vec3> {
    let mut rng = StdRng::seed_from_u64(7);
    (0..count)
        .map(|_| {
            Vec3::new(
                rng.gen_range(-BOUNDS..BOUNDS),
                rng.gen_range(-BOUNDS..BOUNDS),
                rng.gen_range(-BOUNDS..BOUNDS),
            )
        })
        .collect()
}

fn config_for(count: usize) -> SpatialConfig {
    SpatialConfig::from_bounds(Vec3::splat(2.0 * BOUNDS), NEIGHBORS_PER_CELL, count).unwrap()
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");

    for count in [1_000, 10_000, 100_000] {
        let points = cloud(count);
        let config = config_for(count);

        group.bench_with_input(BenchmarkId::new("fresh", count), &points, |b, points| {
            b.iter(|| black_box(SpatialHash::build(config, points).unwrap()))
        });

        let mut hash = SpatialHash::new(config).unwrap();
        group.bench_with_input(BenchmarkId::new("rebuild", count), &points, |b, points| {
            b.iter(|| hash.rebuild(black_box(points)).unwrap())
        });
    }

    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("query");

    for count in [1_000, 10_000, 100_000] {
        let points = cloud(count);
        let config = config_for(count);
        let hash = SpatialHash::build(config, &points).unwrap();
        let radius = config.cell_size * 1.5;

        group.bench_with_input(BenchmarkId::new("candidates", count), &points, |b, points| {
            let mut buffer = QueryBuffer::with_capacity(count);
            b.iter(|| {
                let mut total = 0;
                for p in points.iter().take(1_000) {
                    total += hash.query(*p, radius, &mut buffer).unwrap().len();
                }
                black_box(total)
            })
        });

        group.bench_with_input(BenchmarkId::new("within", count), &points, |b, points| {
            let mut buffer = QueryBuffer::with_capacity(count);
            b.iter(|| {
                let mut total = 0;
                for p in points.iter().take(1_000) {
                    total += hash.query_within(*p, radius, points, &mut buffer).unwrap().len();
                }
                black_box(total)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_build, bench_query);
criterion_main!(benches);
