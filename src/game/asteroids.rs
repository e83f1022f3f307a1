//! Asteroid waves and the two asteroid collision pairs.

use glam::{Vec2, Vec3};

use crate::engine::collision::{CollisionEffect, CollisionSystem};
use crate::engine::query::Query;
use crate::engine::scheduler::StageKind;
use crate::engine::systems::{FnSystem, System, SystemContext};
use crate::game::components::{Asteroid, AsteroidSpawner, Boundary, Bullet, ShipSettings, Translation, Velocity};


pub const ASTEROID_SPAWNER: &str = "asteroid_spawner";
pub const ASTEROID_BULLET: &str = "asteroid_bullet";
pub const ASTEROID_SHIP: &str = "asteroid_ship";

/// Position and velocity of one asteroid in a wave.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub position: Vec3,
    pub velocity: Vec3,
}

/// Draws a wave around `player`.
///
/// Positions are sampled over the boundary shrunk by the safe area, then
/// shifted past the safe rectangle on each axis they would land beyond its
/// lower corner, so no asteroid starts inside it.
pub fn plan_wave(spawner: &mut AsteroidSpawner, boundary: &Boundary, player: Vec3) -> Vec<Placement> {
    let safe = spawner.safe_area;
    let safe_min = Vec2::new(player.x, player.y) - safe / 2.0;
    let free = Vec2::new(boundary.width() - safe.x, boundary.height() - safe.y);

    (0..spawner.count)
        .map(|_| {
            let direction = spawner.random.planar_direction();
            let magnitude = spawner.random.range(spawner.speed.x, spawner.speed.y);

            let mut x = spawner.random.range(boundary.min.x, boundary.min.x + free.x);
            let mut y = spawner.random.range(boundary.min.y, boundary.min.y + free.y);
            if x > safe_min.x {
                x += safe.x;
            }
            if y > safe_min.y {
                y += safe.y;
            }

            Placement { position: Vec3::new(x, y, 0.0), velocity: direction * magnitude }
        })
        .collect()
}

/// Counts spawners down while the field is empty and the player is alive,
/// then instantiates a wave.
pub fn asteroid_spawner() -> impl System {
    let asteroids = Query::of::<Asteroid>();
    let players = Query::builder().with::<ShipSettings>().with::<Translation>().build();
    let boundaries = Query::of::<Boundary>();
    let spawners = Query::of::<AsteroidSpawner>();

    FnSystem::new(ASTEROID_SPAWNER, StageKind::Variable, move |ctx: &mut SystemContext<'_>| {
        if ctx.world.count(&asteroids) != 0 || ctx.world.count(&players) != 1 {
            return;
        }
        if ctx.world.count(&boundaries) != 1 {
            return;
        }
        let Ok(boundary) = ctx.world.singleton::<Boundary>().copied() else { return };
        let Some(player) = ctx
            .world
            .singleton_entity(&players)
            .ok()
            .and_then(|p| ctx.world.get::<Translation>(p).copied())
        else {
            return;
        };

        let dt = ctx.time.delta;
        let mut batch = ctx.scratch.take();
        ctx.world.collect_into(&spawners, &mut batch);

        for &entity in &batch {
            let Some(mut spawner) = ctx.world.get::<AsteroidSpawner>(entity).cloned() else { continue };
            spawner.time_until_next -= dt;
            if spawner.time_until_next <= 0.0 {
                let wave = plan_wave(&mut spawner, &boundary, player.0);
                let pending = ctx.commands.instantiate(spawner.template, wave.len());
                for (asteroid, placement) in pending.iter().zip(wave) {
                    ctx.commands.set(asteroid, Translation(placement.position));
                    ctx.commands.set(asteroid, Velocity { linear: placement.velocity, angular: Vec3::ZERO });
                }
                log::debug!("spawner {entity}: wave of {}", pending.len());
                spawner.time_until_next = spawner.cooldown;
            }
            ctx.world.set(entity, spawner);
        }
        ctx.scratch.give_back(batch);
    })
}

/// Bullets destroy asteroids, and themselves.
pub fn asteroid_bullet() -> CollisionSystem<Asteroid, Bullet> {
    CollisionSystem::new(ASTEROID_BULLET, CollisionEffect::DestroyBoth)
}

/// Asteroids disable the ship.
pub fn asteroid_ship() -> CollisionSystem<Asteroid, ShipSettings> {
    CollisionSystem::new(ASTEROID_SHIP, CollisionEffect::DisableTarget)
}
