use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use drift_ecs::engine::commands::{CommandBuffer, PlaybackReport};
use drift_ecs::engine::component::Bundle;
use drift_ecs::engine::entity::Entity;
use drift_ecs::engine::query::Query;
use drift_ecs::engine::store::Store;
use drift_ecs::engine::template::Template;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Score(i32);

#[derive(Clone, Copy, Debug, PartialEq)]
struct Marker;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Label(u8);

#[test]
fn recording_does_not_touch_the_store() {
    let mut store = Store::new();
    let e = store.create_with(Bundle::new().with(Score(1)));

    let mut commands = CommandBuffer::new();
    commands.set(e, Score(2));
    commands.add(e, Marker);
    commands.destroy(e);
    assert_eq!(commands.len(), 3);

    assert_eq!(store.get::<Score>(e), Some(&Score(1)));
    assert!(!store.has::<Marker>(e));
    assert!(store.is_alive(e));
}

#[test]
fn playback_applies_in_recorded_order() {
    let mut store = Store::new();
    let e = store.create_with(Bundle::new().with(Score(0)));

    let mut commands = CommandBuffer::new();
    commands.set(e, Score(1));
    commands.set(e, Score(2));
    commands.remove::<Score>(e);
    commands.add(e, Score(3));

    // Removing the only component frees `e`, so the final add is a no-op.
    let report = commands.playback(&mut store);
    assert_eq!(report, PlaybackReport { applied: 3, skipped: 1 });
    assert!(!store.is_alive(e));
}

#[test]
fn stale_targets_are_skipped_individually() {
    let mut store = Store::new();
    let a = store.create_with(Bundle::new().with(Score(1)));
    let b = store.create_with(Bundle::new().with(Score(1)));

    let mut commands = CommandBuffer::new();
    commands.destroy(a);
    commands.set(a, Score(5));
    commands.destroy(a);
    commands.set(b, Score(7));

    let report = commands.playback(&mut store);
    assert_eq!(report.applied, 2);
    assert_eq!(report.skipped, 2);
    assert!(!store.is_alive(a));
    assert_eq!(store.get::<Score>(b), Some(&Score(7)));
}

#[test]
fn set_on_missing_component_is_a_no_op() {
    let mut store = Store::new();
    let e = store.create_with(Bundle::new().with(Marker));

    let mut commands = CommandBuffer::new();
    commands.set(e, Score(4));
    let report = commands.playback(&mut store);

    assert_eq!(report.skipped, 1);
    assert!(!store.has::<Score>(e));
}

#[test]
fn instantiate_placeholders_resolve_during_playback() {
    let mut store = Store::new();
    let rock = store.register_template(Template::new("rock").with(Score(0)).with(Marker));

    let mut commands = CommandBuffer::new();
    let pending = commands.instantiate(rock, 3);
    assert_eq!(pending.len(), 3);
    for (i, p) in pending.iter().enumerate() {
        commands.set(p, Score(i as i32 * 10));
    }
    let extra = commands.spawn(Bundle::new().with(Label(1)));
    commands.add(extra, Marker);

    assert_eq!(store.count(&Query::of::<Marker>()), 0);
    let report = commands.playback(&mut store);
    assert_eq!(report, PlaybackReport { applied: 6, skipped: 0 });

    let mut scores: Vec<i32> = Vec::new();
    store.for_each(&Query::builder().with::<Score>().with::<Marker>().build(), |e| {
        scores.push(store.get::<Score>(e).map_or(-1, |s| s.0));
    });
    scores.sort();
    assert_eq!(scores, vec![0, 10, 20]);
    assert_eq!(store.count(&Query::builder().with::<Label>().with::<Marker>().build()), 1);
}

#[test]
fn failed_instantiate_skips_dependent_commands() {
    let mut foreign = Store::new();
    let missing = foreign.register_template(Template::new("elsewhere").with(Marker));

    let mut store = Store::new();
    let survivor = store.create_with(Bundle::new().with(Score(1)));

    let mut commands = CommandBuffer::new();
    let pending = commands.instantiate(missing, 2);
    for p in pending.iter() {
        commands.set(p, Score(9));
    }
    commands.set(survivor, Score(2));

    let report = commands.playback(&mut store);
    assert_eq!(report, PlaybackReport { applied: 1, skipped: 3 });
    assert_eq!(store.len(), 1);
    assert_eq!(store.get::<Score>(survivor), Some(&Score(2)));
}

#[test]
fn destroying_a_placeholder_in_the_same_batch() {
    let mut store = Store::new();
    let rock = store.register_template(Template::new("rock").with(Marker));

    let mut commands = CommandBuffer::new();
    let pending = commands.instantiate(rock, 1);
    let p = pending.get(0).unwrap();
    commands.destroy(p);
    commands.add(p, Score(1));

    let report = commands.playback(&mut store);
    assert_eq!(report, PlaybackReport { applied: 2, skipped: 1 });
    assert!(store.is_empty());
}

#[test]
fn appended_buffers_keep_placeholders_distinct() {
    let mut store = Store::new();
    let rock = store.register_template(Template::new("rock").with(Label(0)));

    let mut first = CommandBuffer::new();
    let p1 = first.instantiate(rock, 1).get(0).unwrap();
    first.set(p1, Label(1));

    let mut second = CommandBuffer::new();
    let p2 = second.instantiate(rock, 1).get(0).unwrap();
    second.set(p2, Label(2));
    assert_eq!(p1, p2);

    first.append(second);
    assert_eq!(first.len(), 4);
    first.playback(&mut store);

    let mut labels = Vec::new();
    store.for_each(&Query::of::<Label>(), |e| labels.push(store.get::<Label>(e).map(|l| l.0)));
    labels.sort();
    assert_eq!(labels, vec![Some(1), Some(2)]);
}

/// Random command streams against a shadow model of live scores.
#[test]
fn random_streams_match_a_shadow_model() {
    for seed in 0..32u64 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut store = Store::new();
        let mut handles: Vec<Entity> = (0..8).map(|i| store.create_with(Bundle::new().with(Score(i)))).collect();
        let mut model: Vec<Option<i32>> = (0..8).map(Some).collect();

        for _round in 0..10 {
            let mut commands = CommandBuffer::new();
            let mut spawned: Vec<i32> = Vec::new();
            let mut expected_skipped = 0;

            for _ in 0..20 {
                let i = rng.gen_range(0..handles.len());
                match rng.gen_range(0..3) {
                    0 => {
                        let v = rng.gen_range(-100..100);
                        commands.set(handles[i], Score(v));
                        match &mut model[i] {
                            Some(slot) => *slot = v,
                            None => expected_skipped += 1,
                        }
                    }
                    1 => {
                        commands.destroy(handles[i]);
                        if model[i].take().is_none() {
                            expected_skipped += 1;
                        }
                    }
                    _ => {
                        let v = rng.gen_range(-100..100);
                        commands.spawn(Bundle::new().with(Score(v)));
                        spawned.push(v);
                    }
                }
            }

            let report = commands.playback(&mut store);
            assert_eq!(report.skipped, expected_skipped, "seed {seed}");

            let mut live: Vec<(Entity, i32)> = Vec::new();
            store.for_each(&Query::of::<Score>(), |e| {
                live.push((e, store.get::<Score>(e).map_or(i32::MIN, |s| s.0)));
            });

            let mut from_store: Vec<i32> = live.iter().map(|&(_, v)| v).collect();
            let mut from_model: Vec<i32> = model.iter().flatten().copied().chain(spawned).collect();
            from_store.sort();
            from_model.sort();
            assert_eq!(from_store, from_model, "seed {seed}");

            if live.is_empty() {
                break;
            }
            handles = live.iter().map(|&(e, _)| e).collect();
            model = live.iter().map(|&(_, v)| Some(v)).collect();
        }
    }
}
