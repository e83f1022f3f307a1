#![allow(dead_code)]

use drift_ecs::engine::component::{Bundle, Disabled};
use drift_ecs::engine::entity::Entity;
use drift_ecs::engine::store::Store;

pub const ENTITIES_SMALL: usize = 10_000;
pub const ENTITIES_MED: usize = 100_000;

#[derive(Clone, Copy)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy)]
pub struct Speed {
    pub dx: f32,
    pub dy: f32,
}

#[derive(Clone, Copy)]
pub struct Rare;

/// Store with `count` moving entities; every tenth one also carries `Rare`
/// and every hundredth is disabled.
pub fn populate(count: usize) -> (Store, Vec<Entity>) {
    let mut store = Store::new();
    let mut entities = Vec::with_capacity(count);
    for i in 0..count {
        let mut bundle = Bundle::new()
            .with(Position { x: i as f32, y: 0.0 })
            .with(Speed { dx: 1.0, dy: 0.5 });
        if i % 10 == 0 {
            bundle.insert(Rare);
        }
        if i % 100 == 0 {
            bundle.insert(Disabled);
        }
        entities.push(store.create_with(bundle));
    }
    (store, entities)
}
