use drift_ecs::engine::component::{Bundle, register_state_component};
use drift_ecs::engine::error::{ECSError, UnknownTemplateError};
use drift_ecs::engine::query::Query;
use drift_ecs::engine::store::Store;
use drift_ecs::engine::template::Template;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Position(f32, f32);

#[derive(Clone, Copy, Debug, PartialEq)]
struct Health(u32);

#[derive(Clone, Copy, Debug, PartialEq)]
struct Tag;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Lingering(u32);

#[test]
fn freed_slot_is_reused_with_new_generation() {
    let mut store = Store::new();
    let a = store.create();
    store.add(a, Health(3));

    assert!(store.destroy(a));
    assert!(!store.is_alive(a));

    let b = store.create();
    assert_eq!(a.index(), b.index());
    assert!(b.generation() > a.generation());
    assert!(store.is_alive(b));
    assert!(store.get::<Health>(b).is_none());
}

#[test]
fn stale_handle_reads_and_writes_nothing() {
    let mut store = Store::new();
    let a = store.create();
    store.add(a, Health(3));
    store.destroy(a);
    let b = store.create();
    store.add(b, Health(9));

    assert!(store.get::<Health>(a).is_none());
    assert!(!store.set(a, Health(1)));
    assert!(!store.add(a, Position(0.0, 0.0)));
    assert!(!store.remove::<Health>(a));
    assert!(!store.destroy(a));

    assert_eq!(store.get::<Health>(b), Some(&Health(9)));
}

#[test]
fn set_only_overwrites_existing_components() {
    let mut store = Store::new();
    let e = store.create();
    store.add(e, Health(1));

    assert!(!store.set(e, Position(1.0, 2.0)));
    assert!(!store.has::<Position>(e));

    assert!(store.set(e, Health(2)));
    assert_eq!(store.get::<Health>(e), Some(&Health(2)));

    assert!(store.add(e, Health(5)));
    assert_eq!(store.get::<Health>(e), Some(&Health(5)));
}

#[test]
fn removing_last_component_frees_the_entity() {
    let mut store = Store::new();
    let e = store.create();
    store.add(e, Health(1));
    store.add(e, Tag);

    assert!(store.remove::<Tag>(e));
    assert!(store.is_alive(e));
    assert!(!store.remove::<Tag>(e));

    assert!(store.remove::<Health>(e));
    assert!(!store.is_alive(e));
    assert_eq!(store.len(), 0);
}

#[test]
fn swap_remove_keeps_other_rows_intact() {
    let mut store = Store::new();
    let entities: Vec<_> = (0..5)
        .map(|i| store.create_with(Bundle::new().with(Health(i))))
        .collect();

    store.destroy(entities[1]);
    store.destroy(entities[3]);

    for (i, &e) in entities.iter().enumerate() {
        if i == 1 || i == 3 {
            assert!(store.get::<Health>(e).is_none());
        } else {
            assert_eq!(store.get::<Health>(e), Some(&Health(i as u32)));
        }
    }
    assert_eq!(store.count(&Query::of::<Health>()), 3);
}

#[test]
fn destroy_moves_state_components_to_a_husk() {
    register_state_component::<Lingering>();

    let mut store = Store::new();
    let e = store.create_with(Bundle::new().with(Health(1)).with(Lingering(7)));

    assert!(store.destroy(e));
    assert!(!store.is_alive(e));
    assert!(store.get::<Lingering>(e).is_none());

    let husks = Query::builder().with::<Lingering>().build();
    assert_eq!(store.count(&husks), 1);
    let husk = store.singleton_entity(&husks).unwrap();
    assert_ne!(husk, e);
    assert_eq!(store.get::<Lingering>(husk), Some(&Lingering(7)));
    assert!(!store.has::<Health>(husk));
    assert_eq!(store.count(&Query::of::<Health>()), 0);

    // The husk goes away with its last state component.
    assert!(store.remove::<Lingering>(husk));
    assert!(!store.is_alive(husk));
    assert!(store.is_empty());
}

#[test]
fn entity_with_only_state_is_freed_outright() {
    register_state_component::<Lingering>();

    let mut store = Store::new();
    let e = store.create_with(Bundle::new().with(Lingering(1)));
    assert!(store.destroy(e));
    assert!(store.is_empty());
}

#[test]
fn templates_instantiate_independent_copies() {
    let mut store = Store::new();
    let id = store.register_template(Template::new("rock").with(Health(10)).with(Position(1.0, 1.0)));
    assert_eq!(store.templates().find("rock"), Some(id));

    let made = store.instantiate(id, 3).unwrap();
    assert_eq!(made.len(), 3);

    store.set(made[0], Health(1));
    assert_eq!(store.get::<Health>(made[0]), Some(&Health(1)));
    assert_eq!(store.get::<Health>(made[1]), Some(&Health(10)));
    assert_eq!(store.get::<Position>(made[2]), Some(&Position(1.0, 1.0)));
}

#[test]
fn unknown_template_creates_nothing() {
    let mut other = Store::new();
    let id = other.register_template(Template::new("only-here").with(Tag));

    let mut store = Store::new();
    let err = store.create_from(id).unwrap_err();
    assert_eq!(err, ECSError::UnknownTemplate(UnknownTemplateError(id)));
    assert!(store.instantiate(id, 4).is_err());
    assert!(store.is_empty());
}
