//! Player ship: input capture, movement, shooting and respawn.

use glam::{Quat, Vec3};

use crate::engine::component::Disabled;
use crate::engine::entity::Entity;
use crate::engine::lifecycle::Lifecycle;
use crate::engine::query::{Query, QueryBuilder};
use crate::engine::scheduler::StageKind;
use crate::engine::systems::{FnSystem, System, SystemContext};
use crate::game::components::{
    EnableOnShipAdvance, PlayerInput, Rotation, RespawningState, ShipSettings, ShootTimer,
    Translation, Velocity,
};


pub const SHIP_CONTROLLER: &str = "ship_controller";
pub const ENABLE_ON_ADVANCE: &str = "enable_on_advance";
pub const SHIP_MOVEMENT: &str = "ship_movement";
pub const SHIP_RESPAWN: &str = "ship_respawn";

/// Copies the frame's input snapshot into every `PlayerInput`.
pub fn ship_controller() -> impl System {
    let players = Query::of::<PlayerInput>();
    FnSystem::new(SHIP_CONTROLLER, StageKind::Variable, move |ctx: &mut SystemContext<'_>| {
        let input = *ctx.input;
        ctx.world.for_each_mut::<PlayerInput, _>(&players, |_, player| player.apply(&input));
    })
}

/// Enables `EnableOnShipAdvance` entities while the single player advances
/// and disables them otherwise.
pub fn enable_on_advance() -> impl System {
    let players = Query::of::<PlayerInput>();
    let enabled = Query::of::<EnableOnShipAdvance>();
    let disabled = Query::builder().with::<EnableOnShipAdvance>().with::<Disabled>().build();

    FnSystem::new(ENABLE_ON_ADVANCE, StageKind::Variable, move |ctx: &mut SystemContext<'_>| {
        let advancing = ctx.world.count(&players) == 1
            && ctx.world.singleton::<PlayerInput>().is_ok_and(|p| p.advance);

        if advancing {
            ctx.world.for_each(&disabled, |e| ctx.commands.remove::<Disabled>(e));
        } else {
            ctx.world.for_each(&enabled, |e| ctx.commands.add(e, Disabled));
        }
    })
    .after(SHIP_CONTROLLER)
}

/// Velocity after one fixed step of thrust, turning and drag.
pub fn steer(settings: &ShipSettings, input: &PlayerInput, rotation: Quat, mut velocity: Velocity, dt: f32) -> Velocity {
    if input.advance {
        velocity.linear += rotation * Vec3::new(settings.acceleration, 0.0, 0.0) * dt;
        if velocity.linear.length() > settings.max_speed {
            velocity.linear = velocity.linear.normalize() * settings.max_speed;
        }
    } else if velocity.linear.x != 0.0 || velocity.linear.y != 0.0 {
        velocity.linear -= velocity.linear * settings.drag * dt;
    }

    if input.rotation_dir != 0 {
        velocity.angular += Vec3::new(0.0, 0.0, input.rotation_dir as f32 * settings.angular_acceleration) * dt;
        if velocity.angular.length() > settings.max_angular_speed {
            velocity.angular = velocity.angular.normalize() * settings.max_angular_speed;
        }
    } else {
        velocity.angular -= velocity.angular * settings.angular_drag * dt;
    }
    velocity
}

/// Applies `steer` to every ship and fires bullets through the command buffer.
pub fn ship_movement() -> impl System {
    let ships = Query::builder()
        .with::<ShipSettings>()
        .with::<PlayerInput>()
        .with::<Velocity>()
        .with::<ShootTimer>()
        .with::<Rotation>()
        .with::<Translation>()
        .build();

    FnSystem::new(SHIP_MOVEMENT, StageKind::Fixed, move |ctx: &mut SystemContext<'_>| {
        let dt = ctx.time.delta;
        let now = ctx.time.elapsed;
        let mut batch = ctx.scratch.take();
        ctx.world.collect_into(&ships, &mut batch);

        for &ship in &batch {
            let world = &ctx.world;
            let (Some(settings), Some(input), Some(velocity), Some(timer), Some(rotation), Some(position)) = (
                world.get::<ShipSettings>(ship).copied(),
                world.get::<PlayerInput>(ship).copied(),
                world.get::<Velocity>(ship).copied(),
                world.get::<ShootTimer>(ship).copied(),
                world.get::<Rotation>(ship).copied(),
                world.get::<Translation>(ship).copied(),
            ) else {
                continue;
            };

            let velocity = steer(&settings, &input, rotation.0, velocity, dt);
            ctx.world.set(ship, velocity);

            if input.shoot && now > timer.last_shot + settings.shoot_cooldown as f64 {
                let shot = ctx.commands.instantiate(settings.bullet, 1);
                for bullet in shot.iter() {
                    ctx.commands.set(bullet, position);
                    ctx.commands.set(bullet, rotation);
                    ctx.commands.set(bullet, Velocity {
                        linear: rotation.0 * Vec3::new(settings.bullet_speed, 0.0, 0.0) + velocity.linear,
                        angular: Vec3::ZERO,
                    });
                }
                ctx.world.set(ship, ShootTimer { last_shot: now });
            }
        }
        ctx.scratch.give_back(batch);
    })
}

/// Resets a disabled ship and re-enables it after its respawn time.
#[derive(Clone, Copy, Debug, Default)]
pub struct ShipRespawn;

impl Lifecycle for ShipRespawn {
    type Source = Disabled;
    type State = RespawningState;

    const EXIT_ON_DISABLED: bool = false;
    const RETAIN_ON_DESTROY: bool = false;

    fn refine(&self, query: QueryBuilder) -> QueryBuilder {
        query.with::<ShipSettings>()
    }

    fn appear(&mut self, ctx: &mut SystemContext<'_>, ship: Entity, _: &Disabled) -> Option<RespawningState> {
        let settings = ctx.world.get::<ShipSettings>(ship).copied()?;
        ctx.world.set(ship, Velocity::default());
        ctx.world.set(ship, Translation(Vec3::ZERO));
        ctx.world.set(ship, Rotation(Quat::IDENTITY));
        log::debug!("ship {ship} down; respawning in {}s", settings.respawn_time);
        Some(RespawningState { remaining: settings.respawn_time })
    }

    fn steady(&mut self, ctx: &mut SystemContext<'_>, ship: Entity, _: &Disabled, state: &mut RespawningState) {
        state.remaining -= ctx.time.delta;
        if state.remaining <= 0.0 {
            ctx.commands.remove::<Disabled>(ship);
        }
    }
}
