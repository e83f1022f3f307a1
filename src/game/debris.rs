//! Debris on destruction, and timed self-destruction.

use glam::Vec3;

use crate::engine::entity::Entity;
use crate::engine::lifecycle::Lifecycle;
use crate::engine::random::RandomStream;
use crate::engine::systems::SystemContext;
use crate::game::components::{
    DebrisSpawner, DebrisSpawnerState, TemporaryLife, TemporaryLifeState, Translation, Velocity,
};


pub const DEBRIS: &str = "debris";
pub const TEMPORARY_LIFE: &str = "temporary_life";

/// Tracks the owner's position and bursts into debris when it goes away.
#[derive(Clone, Copy, Debug, Default)]
pub struct Debris;

impl Lifecycle for Debris {
    type Source = DebrisSpawner;
    type State = DebrisSpawnerState;

    fn appear(&mut self, ctx: &mut SystemContext<'_>, entity: Entity, source: &DebrisSpawner) -> Option<DebrisSpawnerState> {
        let position = ctx.world.get::<Translation>(entity).map_or(Vec3::ZERO, |t| t.0);
        Some(DebrisSpawnerState {
            spawner: *source,
            position,
            // Fresh pattern each time the owner reappears.
            random: RandomStream::for_instance(entity.to_bits() ^ ctx.time.tick.rotate_left(32)),
        })
    }

    fn steady(&mut self, ctx: &mut SystemContext<'_>, entity: Entity, _: &DebrisSpawner, state: &mut DebrisSpawnerState) {
        if let Some(t) = ctx.world.get::<Translation>(entity) {
            state.position = t.0;
        }
    }

    fn disappear(&mut self, ctx: &mut SystemContext<'_>, _: Entity, state: &DebrisSpawnerState) {
        let spawner = state.spawner;
        let mut random = state.random.clone();
        let pieces = ctx.commands.instantiate(spawner.template, spawner.amount as usize);
        for piece in pieces.iter() {
            let direction = random.planar_direction();
            let magnitude = random.range(spawner.speed.x, spawner.speed.y);
            let spin = random.range(spawner.spin.x, spawner.spin.y);
            ctx.commands.set(piece, Velocity {
                linear: direction * magnitude,
                angular: Vec3::new(0.0, 0.0, spin),
            });
            ctx.commands.set(piece, Translation(state.position));
        }
    }
}

/// Destroys entities once their lifetime has elapsed on the variable clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct TemporaryLifetime;

impl Lifecycle for TemporaryLifetime {
    type Source = TemporaryLife;
    type State = TemporaryLifeState;

    fn appear(&mut self, ctx: &mut SystemContext<'_>, _: Entity, _: &TemporaryLife) -> Option<TemporaryLifeState> {
        Some(TemporaryLifeState { started_at: ctx.time.elapsed })
    }

    fn steady(&mut self, ctx: &mut SystemContext<'_>, entity: Entity, life: &TemporaryLife, state: &mut TemporaryLifeState) {
        if ctx.time.elapsed > state.started_at + life.lifetime as f64 {
            ctx.commands.destroy(entity);
        }
    }
}
