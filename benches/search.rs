//! Criterion benchmarks for spatial memory and frontier search.
//!
//! Run with:
//!   cargo bench
//!
//! Results are saved to target/criterion/

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use waymark::prelude::*;

/// A fully known `size x size` floor with a wall ring.
fn open_grid(size: i32) -> SpatialMemory {
    let mut mem = SpatialMemory::new();
    for y in -1..=size {
        for x in -1..=size {
            let border = x < 0 || y < 0 || x == size || y == size;
            let code = if border { TypeCode::WALL } else { TypeCode::EMPTY };
            mem.insert(Cell::new(Position::new(x, y, 0), code), false);
        }
    }
    mem
}

/// Search across the grid to the far corner with both priorities.
fn bench_search_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("search_size");

    for size in [16, 32, 64, 128].iter() {
        let mem = open_grid(*size);
        let target = Position::new(size - 1, size - 1, 0);
        group.throughput(Throughput::Elements((*size as u64) * (*size as u64)));

        group.bench_with_input(BenchmarkId::new("random", size), size, |b, _| {
            let mut rng = Prng::new(42);
            b.iter(|| {
                let route = mem.search(
                    Position::new(0, 0, 0),
                    |c: &Cell| c.position() == target,
                    &mut RandomPriority,
                    &mut rng,
                );
                black_box(route.len())
            });
        });

        group.bench_with_input(BenchmarkId::new("exploration", size), size, |b, _| {
            let mut rng = Prng::new(42);
            let mut priority = ExplorationPriority::default().with_anchor(Position::new(0, 0, 0));
            b.iter(|| {
                let route = mem.search(
                    Position::new(0, 0, 0),
                    |c: &Cell| c.position() == target,
                    &mut priority,
                    &mut rng,
                );
                black_box(route.len())
            });
        });
    }

    group.finish();
}

/// Insert a fresh grid cell by cell, growing the window as it goes.
fn bench_ingest(c: &mut Criterion) {
    let mut group = c.benchmark_group("ingest");

    for size in [16, 64].iter() {
        group.throughput(Throughput::Elements((*size as u64) * (*size as u64)));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| black_box(open_grid(size).len()));
        });
    }

    group.finish();
}

/// Two layers holding the same exit, folded into one.
fn bench_merge(c: &mut Criterion) {
    c.bench_function("merge_64", |b| {
        b.iter(|| {
            let mut mem = open_grid(64);
            mem.insert(Cell::new(Position::new(10, 10, 0), TypeCode::EXIT), true);
            // A transporter creates a second layer around its placeholder partner.
            let pad = TypeCode::try_from('b').unwrap_or(TypeCode::EXIT);
            mem.insert(Cell::new(Position::new(5, 5, 0), pad), true);
            for x in 1..32 {
                mem.insert(Cell::new(Position::new(x, 0, 1), TypeCode::EMPTY), false);
            }
            mem.insert(Cell::new(Position::new(32, 0, 1), TypeCode::EXIT), false);
            black_box(mem.layer_count())
        });
    });
}

criterion_group!(benches, bench_search_sizes, bench_ingest, bench_merge);
criterion_main!(benches);
