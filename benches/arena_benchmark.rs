use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use strata::{FixedArena, MemArena};

fn bench_alloc_single(c: &mut Criterion) {
    let mut group = c.benchmark_group("Single Allocation");

    group.bench_function("Box::new(u64)", |b| {
        b.iter(|| {
            black_box(Box::new(42u64));
        })
    });

    group.bench_function("MemArena::make(u64)", |b| {
        let arena = MemArena::with_capacity(1 << 16);
        b.iter(|| {
            black_box(arena.make(42u64));
        })
    });

    group.finish();
}

fn bench_alloc_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("Batch Allocation 1000");
    const BATCH_SIZE: usize = 1000;

    group.bench_function("Box::new", |b| {
        b.iter(|| {
            let mut v = Vec::with_capacity(BATCH_SIZE);
            for i in 0..BATCH_SIZE {
                v.push(Box::new(i));
            }
            black_box(v);
        })
    });

    group.bench_function("MemArena", |b| {
        b.iter_batched(
            MemArena::new,
            |arena| {
                for i in 0..BATCH_SIZE {
                    black_box(arena.make(i));
                }
                arena
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

fn bench_freeze_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("Generation Cycle");
    const WAVE: usize = 256;

    group.bench_function("freeze/alloc/thaw", |b| {
        b.iter_batched(
            || {
                let arena = MemArena::new();
                for _ in 0..WAVE {
                    arena.alloc(64);
                }
                arena
            },
            |mut arena| {
                arena.freeze(0);
                for _ in 0..WAVE {
                    black_box(arena.alloc(64));
                }
                arena.thaw();
                arena
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

fn bench_fixed_reuse(c: &mut Criterion) {
    let mut group = c.benchmark_group("FixedArena Churn");

    group.bench_function("make/destroy", |b| {
        let arena = MemArena::with_capacity(1 << 16);
        let cells: FixedArena<'_, [u64; 4]> = FixedArena::new(&arena);
        b.iter(|| {
            let p = cells.make([1, 2, 3, 4]);
            black_box(p);
            unsafe { cells.destroy(p) };
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_alloc_single,
    bench_alloc_batch,
    bench_freeze_cycle,
    bench_fixed_reuse
);
criterion_main!(benches);
