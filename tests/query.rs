use std::sync::atomic::{AtomicUsize, Ordering};

use drift_ecs::engine::component::{Bundle, Disabled};
use drift_ecs::engine::entity::Entity;
use drift_ecs::engine::query::Query;
use drift_ecs::engine::store::Store;

#[derive(Clone, Copy, Debug, PartialEq)]
struct A(u32);

#[derive(Clone, Copy, Debug, PartialEq)]
struct B;

#[derive(Clone, Copy, Debug, PartialEq)]
struct C;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Unused;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Config(u32);

fn sorted(mut v: Vec<Entity>) -> Vec<Entity> {
    v.sort();
    v
}

fn world() -> (Store, [Entity; 4]) {
    let mut store = Store::new();
    let a = store.create_with(Bundle::new().with(A(1)));
    let ab = store.create_with(Bundle::new().with(A(2)).with(B));
    let ac = store.create_with(Bundle::new().with(A(3)).with(C));
    let bc = store.create_with(Bundle::new().with(B).with(C));
    (store, [a, ab, ac, bc])
}

#[test]
fn all_none_any_filters_combine() {
    let (store, [a, ab, ac, bc]) = world();

    let q = Query::of::<A>();
    assert_eq!(sorted(store.matching(&q).collect()), vec![a, ab, ac]);

    let q = Query::builder().with::<A>().without::<B>().build();
    assert_eq!(sorted(store.matching(&q).collect()), vec![a, ac]);

    let q = Query::builder().any::<B>().any::<C>().build();
    assert_eq!(sorted(store.matching(&q).collect()), vec![ab, ac, bc]);

    let q = Query::builder().with::<A>().any::<B>().any::<C>().without::<C>().build();
    assert_eq!(store.matching(&q).collect::<Vec<_>>(), vec![ab]);
}

#[test]
fn unknown_component_matches_nothing() {
    let (store, _) = world();
    assert_eq!(store.count(&Query::of::<Unused>()), 0);

    let none_unused = Query::builder().without::<Unused>().build();
    assert_eq!(store.count(&none_unused), 4);
}

#[test]
fn disabled_entities_are_hidden_unless_asked_for() {
    let (mut store, [a, ab, ..]) = world();
    store.add(ab, Disabled);

    let q = Query::of::<A>();
    assert_eq!(store.count(&q), 2);
    assert!(!store.matching(&q).any(|e| e == ab));

    let q = Query::builder().with::<A>().include_disabled().build();
    assert_eq!(store.count(&q), 3);

    let q = Query::builder().with::<A>().with::<Disabled>().build();
    assert_eq!(store.matching(&q).collect::<Vec<_>>(), vec![ab]);

    store.remove::<Disabled>(ab);
    assert_eq!(store.count(&Query::of::<A>()), 3);
    assert!(store.is_alive(a));
}

#[test]
fn queries_observe_the_current_store() {
    let (mut store, [a, ..]) = world();
    let q = Query::of::<A>();
    assert_eq!(store.count(&q), 3);

    store.destroy(a);
    assert_eq!(store.count(&q), 2);

    let e = store.create();
    store.add(e, A(9));
    assert_eq!(store.count(&q), 3);
}

#[test]
fn singleton_requires_exactly_one_match() {
    let mut store = Store::new();
    let err = store.singleton::<Config>().unwrap_err();
    assert_eq!(err.matched, 0);

    let first = store.create_with(Bundle::new().with(Config(1)));
    assert_eq!(store.singleton::<Config>(), Ok(&Config(1)));

    store.create_with(Bundle::new().with(Config(2)));
    let err = store.singleton::<Config>().unwrap_err();
    assert_eq!(err.matched, 2);
    assert!(err.to_string().contains("Config"));

    store.add(first, Disabled);
    assert_eq!(store.singleton::<Config>(), Ok(&Config(2)));
}

#[test]
fn for_each_mut_updates_matching_values_only() {
    let (mut store, [a, ab, ac, _]) = world();
    let q = Query::builder().with::<A>().without::<B>().build();

    store.for_each_mut::<A, _>(&q, |_, v| v.0 *= 10);

    assert_eq!(store.get::<A>(a), Some(&A(10)));
    assert_eq!(store.get::<A>(ab), Some(&A(2)));
    assert_eq!(store.get::<A>(ac), Some(&A(30)));
}

#[test]
fn par_for_each_mut_visits_every_match_once() {
    let mut store = Store::new();
    for i in 0..1_000 {
        let e = store.create_with(Bundle::new().with(A(i)));
        if i % 4 == 0 {
            store.add(e, Disabled);
        }
    }

    let visited = AtomicUsize::new(0);
    store.par_for_each_mut::<A, _>(&Query::of::<A>(), |_, v| {
        v.0 += 1;
        visited.fetch_add(1, Ordering::Relaxed);
    });
    assert_eq!(visited.load(Ordering::Relaxed), 750);

    let mut total = 0u64;
    store.for_each(&Query::builder().with::<A>().include_disabled().build(), |e| {
        total += store.get::<A>(e).map_or(0, |v| v.0 as u64);
    });
    // 0..1000 summed, plus one for each enabled entity.
    assert_eq!(total, 499_500 + 750);
}
