//! Registry resolution benchmarks
//!
//! The resolve hot path runs once per collective; the hit path must
//! stay a hash lookup and the miss path is expected to be rare after
//! warm-up. Both are measured here, plus the full bracketing overhead
//! of an instrumented put over the loopback runtime.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rmascope_core::Topology;
use rmascope_shmem::{ActiveSet, Instrumented, SimWorld, WindowRegistry};

fn bench_resolve_hit(c: &mut Criterion) {
    let registry = WindowRegistry::new(Topology::new(0, 1024));
    let set = ActiveSet::new(0, 1, 64);
    registry.resolve(set);

    c.bench_function("resolve_hit", |b| {
        b.iter(|| registry.resolve(black_box(set)))
    });
}

fn bench_resolve_world_shortcut(c: &mut Criterion) {
    let registry = WindowRegistry::new(Topology::new(0, 1024));
    let world = ActiveSet::world(1024);

    c.bench_function("resolve_world_shortcut", |b| {
        b.iter(|| registry.resolve(black_box(world)))
    });
}

fn bench_resolve_miss(c: &mut Criterion) {
    c.bench_function("resolve_miss", |b| {
        b.iter_batched(
            || WindowRegistry::new(Topology::new(0, 1024)),
            |registry| registry.resolve(black_box(ActiveSet::new(1, 0, 2))),
            BatchSize::SmallInput,
        )
    });
}

fn bench_instrumented_put(c: &mut Criterion) {
    let world = SimWorld::new(2, 4096);
    let payload = [7u8; 64];

    c.bench_function("instrumented_putmem_64b", |b| {
        b.iter_batched(
            || Instrumented::new(world.pe(0)),
            |shmem| shmem.putmem(black_box(0), black_box(&payload), black_box(1)),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    benches,
    bench_resolve_hit,
    bench_resolve_world_shortcut,
    bench_resolve_miss,
    bench_instrumented_put
);
criterion_main!(benches);
