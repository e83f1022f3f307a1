use std::sync::{Arc, Mutex};

use drift_ecs::engine::collision::NoContacts;
use drift_ecs::engine::component::{Bundle, Disabled};
use drift_ecs::engine::entity::Entity;
use drift_ecs::engine::lifecycle::{Lifecycle, LifecycleSystem};
use drift_ecs::engine::query::Query;
use drift_ecs::engine::scheduler::{Scheduler, StageKind};
use drift_ecs::engine::store::Store;
use drift_ecs::engine::systems::{Frame, SystemContext};

#[derive(Clone, Copy, Debug, PartialEq)]
struct Emitter {
    ready: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct EmitterState {
    steady_runs: u32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Other;

#[derive(Clone, Debug, PartialEq)]
enum Event {
    Appear(Entity),
    Steady(Entity, u32),
    Disappear(u32),
}

#[derive(Default)]
struct Recorder {
    events: Arc<Mutex<Vec<Event>>>,
}

impl Lifecycle for Recorder {
    type Source = Emitter;
    type State = EmitterState;

    fn appear(&mut self, _: &mut SystemContext<'_>, entity: Entity, source: &Emitter) -> Option<EmitterState> {
        if !source.ready {
            return None;
        }
        self.events.lock().unwrap().push(Event::Appear(entity));
        Some(EmitterState { steady_runs: 0 })
    }

    fn steady(&mut self, _: &mut SystemContext<'_>, entity: Entity, _: &Emitter, state: &mut EmitterState) {
        state.steady_runs += 1;
        self.events.lock().unwrap().push(Event::Steady(entity, state.steady_runs));
    }

    fn disappear(&mut self, _: &mut SystemContext<'_>, _: Entity, state: &EmitterState) {
        self.events.lock().unwrap().push(Event::Disappear(state.steady_runs));
    }
}

struct Harness {
    store: Store,
    scheduler: Scheduler,
    events: Arc<Mutex<Vec<Event>>>,
}

impl Harness {
    fn new() -> Self {
        let recorder = Recorder::default();
        let events = Arc::clone(&recorder.events);
        let scheduler = Scheduler::builder()
            .add_system(LifecycleSystem::new("emitter", StageKind::Variable, recorder))
            .build()
            .unwrap();
        Self { store: Store::new(), scheduler, events }
    }

    fn tick(&mut self) -> Vec<Event> {
        self.scheduler.tick(&mut self.store, &Frame::idle(0.01), &mut NoContacts);
        std::mem::take(&mut *self.events.lock().unwrap())
    }
}

#[test]
fn appear_then_steady_on_following_ticks() {
    let mut h = Harness::new();
    let e = h.store.create_with(Bundle::new().with(Emitter { ready: true }).with(Other));

    assert_eq!(h.tick(), vec![Event::Appear(e)]);
    assert_eq!(h.store.get::<EmitterState>(e), Some(&EmitterState { steady_runs: 0 }));
    assert_eq!(h.tick(), vec![Event::Steady(e, 1)]);
    assert_eq!(h.tick(), vec![Event::Steady(e, 2)]);
    assert_eq!(h.store.get::<EmitterState>(e), Some(&EmitterState { steady_runs: 2 }));
}

#[test]
fn declined_appear_is_offered_again() {
    let mut h = Harness::new();
    let e = h.store.create_with(Bundle::new().with(Emitter { ready: false }));

    assert_eq!(h.tick(), vec![]);
    assert!(!h.store.has::<EmitterState>(e));

    h.store.set(e, Emitter { ready: true });
    assert_eq!(h.tick(), vec![Event::Appear(e)]);
}

#[test]
fn removing_the_source_disappears_exactly_once() {
    let mut h = Harness::new();
    let e = h.store.create_with(Bundle::new().with(Emitter { ready: true }).with(Other));
    h.tick();
    h.tick();

    h.store.remove::<Emitter>(e);
    assert_eq!(h.tick(), vec![Event::Disappear(1)]);
    assert!(!h.store.has::<EmitterState>(e));
    assert!(h.store.is_alive(e));

    assert_eq!(h.tick(), vec![]);
}

#[test]
fn destroyed_owner_disappears_with_latest_state() {
    let mut h = Harness::new();
    let e = h.store.create_with(Bundle::new().with(Emitter { ready: true }).with(Other));
    h.tick();
    h.tick();
    h.tick();

    h.store.destroy(e);
    assert!(!h.store.is_alive(e));
    assert_eq!(h.tick(), vec![Event::Disappear(2)]);

    // The husk that carried the state is gone with it.
    assert!(h.store.is_empty());
    assert_eq!(h.tick(), vec![]);
}

#[test]
fn disabling_the_owner_counts_as_disappearing() {
    let mut h = Harness::new();
    let e = h.store.create_with(Bundle::new().with(Emitter { ready: true }).with(Other));
    h.tick();

    h.store.add(e, Disabled);
    assert_eq!(h.tick(), vec![Event::Disappear(0)]);
    assert!(h.store.has::<Emitter>(e));
    assert!(!h.store.has::<EmitterState>(e));

    // Still disabled: nothing matches any phase.
    assert_eq!(h.tick(), vec![]);

    h.store.remove::<Disabled>(e);
    assert_eq!(h.tick(), vec![Event::Appear(e)]);
}

#[test]
fn disappear_runs_for_every_exiting_entity_in_one_pass() {
    let mut h = Harness::new();
    let entities: Vec<Entity> = (0..3)
        .map(|_| h.store.create_with(Bundle::new().with(Emitter { ready: true }).with(Other)))
        .collect();
    h.tick();

    for &e in &entities {
        h.store.destroy(e);
    }
    let events = h.tick();
    assert_eq!(events, vec![Event::Disappear(0); 3]);
    assert_eq!(h.store.count(&Query::of::<EmitterState>()), 0);
    assert!(h.store.is_empty());
}
