use criterion::*;
use std::hint::black_box;

use drift_ecs::engine::commands::CommandBuffer;
use drift_ecs::engine::template::Template;

mod common;
use common::*;

fn playback_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("playback");

    group.bench_function("instantiate_and_set_10k", |b| {
        b.iter_batched(
            || {
                let (mut store, _) = populate(0);
                let template = store.register_template(
                    Template::new("mover")
                        .with(Position { x: 0.0, y: 0.0 })
                        .with(Speed { dx: 0.0, dy: 0.0 }),
                );
                let mut commands = CommandBuffer::new();
                let pending = commands.instantiate(template, ENTITIES_SMALL);
                for (i, p) in pending.iter().enumerate() {
                    commands.set(p, Position { x: i as f32, y: 1.0 });
                }
                (store, commands)
            },
            |(mut store, commands)| {
                let report = commands.playback(&mut store);
                black_box((store, report));
            },
            BatchSize::LargeInput,
        );
    });

    group.bench_function("destroy_half_with_stale_repeats_10k", |b| {
        b.iter_batched(
            || {
                let (store, entities) = populate(ENTITIES_SMALL);
                let mut commands = CommandBuffer::new();
                for &e in entities.iter().step_by(2) {
                    commands.destroy(e);
                    commands.destroy(e);
                }
                (store, commands)
            },
            |(mut store, commands)| {
                let report = commands.playback(&mut store);
                black_box((store, report));
            },
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

criterion_group!(benches, playback_benchmark);
criterion_main!(benches);
