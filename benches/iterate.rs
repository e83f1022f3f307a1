use criterion::*;
use std::hint::black_box;

use drift_ecs::engine::query::Query;

mod common;
use common::*;

fn iterate_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("iterate");

    group.bench_function("for_each_mut_position_100k", |b| {
        let (mut store, _) = populate(ENTITIES_MED);
        let q = Query::of::<Position>();
        b.iter(|| {
            store.for_each_mut::<Position, _>(&q, |_, p| p.x += 1.0);
        });
        black_box(store);
    });

    group.bench_function("par_for_each_mut_position_100k", |b| {
        let (mut store, _) = populate(ENTITIES_MED);
        let q = Query::of::<Position>();
        b.iter(|| {
            store.par_for_each_mut::<Position, _>(&q, |_, p| p.x += 1.0);
        });
        black_box(store);
    });

    // Driven by the small `Rare` column rather than the full entity table.
    group.bench_function("count_rare_100k", |b| {
        let (store, _) = populate(ENTITIES_MED);
        let q = Query::builder().with::<Position>().with::<Rare>().build();
        b.iter(|| black_box(store.count(&q)));
    });

    group.bench_function("count_without_rare_100k", |b| {
        let (store, _) = populate(ENTITIES_MED);
        let q = Query::builder().without::<Rare>().build();
        b.iter(|| black_box(store.count(&q)));
    });

    group.finish();
}

criterion_group!(benches, iterate_benchmark);
criterion_main!(benches);
