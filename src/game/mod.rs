//! Asteroids gameplay built on the public runtime API.
//!
//! [`Game`] owns a [`Store`], a [`Scheduler`] and the contact feed. Building
//! one registers the bullet, asteroid and debris templates and spawns the
//! boundary, the player ship, its thruster and the asteroid spawner.
//!
//! ## Schedule
//!
//! ```text
//! Variable: ship_controller -> enable_on_advance, asteroid_spawner,
//!           temporary_life, debris
//! Fixed:    ship_movement -> integrate_motion -> asteroid_bullet
//!           -> asteroid_ship -> ship_respawn -> boundary_wrap
//! ```

pub mod components;
pub mod ship;
pub mod asteroids;
pub mod debris;
pub mod motion;

use glam::{Vec2, Vec3};

use crate::config::GameConfig;
use crate::engine::collision::ContactFeed;
use crate::engine::entity::Entity;
use crate::engine::error::ECSResult;
use crate::engine::lifecycle::LifecycleSystem;
use crate::engine::random::RandomStream;
use crate::engine::scheduler::{Scheduler, StageKind, TickReport};
use crate::engine::store::Store;
use crate::engine::systems::Frame;
use crate::engine::template::{Template, TemplateId};

use components::{
    Asteroid, AsteroidSpawner, Boundary, Bullet, DebrisSpawner, EnableOnShipAdvance, PlayerInput,
    Rotation, ShipSettings, ShootTimer, TemporaryLife, Translation, Velocity,
};


/// Template ids registered by [`Game::new`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GameTemplates {
    pub bullet: TemplateId,
    pub asteroid: TemplateId,
    pub debris: TemplateId,
}

/// Store, schedule and contact feed of one running game.
pub struct Game {
    store: Store,
    scheduler: Scheduler,
    contacts: Box<dyn ContactFeed>,
    templates: GameTemplates,
    ship: Entity,
    spawner: Entity,
}

impl Game {
    /// Builds the world and schedule from `config`.
    ///
    /// `config` is expected to have passed [`GameConfig::validate`].
    pub fn new(config: &GameConfig, contacts: Box<dyn ContactFeed>) -> ECSResult<Self> {
        let mut store = Store::new();
        let templates = register_templates(&mut store, config);
        let ship = spawn_ship(&mut store, config, &templates);
        let spawner = spawn_world(&mut store, config, templates.asteroid);
        let scheduler = build_schedule(config)?;

        log::debug!("game ready: ship {ship}, spawner {spawner}, {} entities", store.len());
        Ok(Self { store, scheduler, contacts, templates, ship, spawner })
    }

    /// Runs one external tick.
    pub fn tick(&mut self, frame: &Frame) -> TickReport {
        self.scheduler.tick(&mut self.store, frame, self.contacts.as_mut())
    }

    #[inline]
    pub fn store(&self) -> &Store { &self.store }

    #[inline]
    pub fn store_mut(&mut self) -> &mut Store { &mut self.store }

    #[inline]
    pub fn scheduler(&self) -> &Scheduler { &self.scheduler }

    #[inline]
    pub fn templates(&self) -> GameTemplates { self.templates }

    /// The player ship.
    #[inline]
    pub fn ship(&self) -> Entity { self.ship }

    /// The asteroid spawner.
    #[inline]
    pub fn spawner(&self) -> Entity { self.spawner }
}

fn register_templates(store: &mut Store, config: &GameConfig) -> GameTemplates {
    let debris = store.register_template(
        Template::new("debris")
            .with(Translation::default())
            .with(Rotation::default())
            .with(Velocity::default())
            .with(TemporaryLife { lifetime: config.debris.lifetime }),
    );

    let bullet = store.register_template(
        Template::new("bullet")
            .with(Bullet)
            .with(Translation::default())
            .with(Rotation::default())
            .with(Velocity::default())
            .with(TemporaryLife { lifetime: config.bullet.lifetime }),
    );

    let asteroid = store.register_template(
        Template::new("asteroid")
            .with(Asteroid)
            .with(Translation::default())
            .with(Rotation::default())
            .with(Velocity::default())
            .with(debris_spawner(config, debris)),
    );

    GameTemplates { bullet, asteroid, debris }
}

fn debris_spawner(config: &GameConfig, template: TemplateId) -> DebrisSpawner {
    DebrisSpawner {
        template,
        amount: config.debris.amount,
        speed: Vec2::from(config.debris.speed),
        spin: Vec2::from(config.debris.spin),
    }
}

fn spawn_ship(store: &mut Store, config: &GameConfig, templates: &GameTemplates) -> Entity {
    let ship = &config.ship;
    let entity = store.create();
    store.add(entity, Translation(Vec3::ZERO));
    store.add(entity, Rotation::default());
    store.add(entity, Velocity::default());
    store.add(entity, PlayerInput::default());
    store.add(entity, ShootTimer::default());
    store.add(entity, ShipSettings {
        max_speed: ship.max_speed,
        acceleration: ship.acceleration,
        drag: ship.drag,
        max_angular_speed: ship.max_angular_speed,
        angular_acceleration: ship.angular_acceleration,
        angular_drag: ship.angular_drag,
        bullet: templates.bullet,
        bullet_speed: ship.bullet_speed,
        shoot_cooldown: ship.shoot_cooldown,
        respawn_time: ship.respawn_time,
    });
    store.add(entity, debris_spawner(config, templates.debris));
    entity
}

/// Spawns the boundary, the thruster marker and the asteroid spawner.
fn spawn_world(store: &mut Store, config: &GameConfig, asteroid: TemplateId) -> Entity {
    let boundary = store.create();
    store.add(boundary, Boundary::new(
        Vec2::from(config.boundary.min),
        Vec2::from(config.boundary.max),
    ));

    let thruster = store.create();
    store.add(thruster, EnableOnShipAdvance);

    let spawner_cfg = &config.asteroid_spawner;
    let spawner = store.create();
    store.add(spawner, AsteroidSpawner {
        template: asteroid,
        cooldown: spawner_cfg.cooldown,
        time_until_next: spawner_cfg.cooldown,
        count: spawner_cfg.count,
        safe_area: Vec2::from(spawner_cfg.safe_area),
        speed: Vec2::from(spawner_cfg.speed),
        random: RandomStream::for_instance(spawner.index() as u64),
    });
    spawner
}

fn build_schedule(config: &GameConfig) -> ECSResult<Scheduler> {
    let scheduler = Scheduler::builder()
        .fixed_step(config.runtime.fixed_step)
        .max_fixed_steps(config.runtime.max_fixed_steps)
        .add_system(ship::ship_controller())
        .add_system(ship::enable_on_advance())
        .add_system(asteroids::asteroid_spawner())
        .add_system(LifecycleSystem::new(debris::TEMPORARY_LIFE, StageKind::Variable, debris::TemporaryLifetime))
        .add_system(LifecycleSystem::new(debris::DEBRIS, StageKind::Variable, debris::Debris))
        .add_system(ship::ship_movement())
        .add_system(motion::integrate_motion())
        .add_system(asteroids::asteroid_bullet().after(motion::INTEGRATE_MOTION))
        .add_system(asteroids::asteroid_ship().after(asteroids::ASTEROID_BULLET))
        .add_system(
            LifecycleSystem::new(ship::SHIP_RESPAWN, StageKind::Fixed, ship::ShipRespawn)
                .after(asteroids::ASTEROID_SHIP),
        )
        .add_system(motion::boundary_wrap())
        .build()?;
    Ok(scheduler)
}
