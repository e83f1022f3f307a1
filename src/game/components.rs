//! Gameplay component types.

use glam::{Quat, Vec2, Vec3};

use crate::engine::random::RandomStream;
use crate::engine::systems::InputSnapshot;
use crate::engine::template::TemplateId;


/// World-space position.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Translation(pub Vec3);

/// Orientation; ships face +X in local space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rotation(pub Quat);

impl Default for Rotation {
    fn default() -> Self { Rotation(Quat::IDENTITY) }
}

/// Linear and angular velocity. Angular velocity is in radians per second.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Velocity {
    pub linear: Vec3,
    pub angular: Vec3,
}

/// Category tag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Asteroid;

/// Category tag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Bullet;

/// Marks an entity that is only enabled while the player is thrusting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EnableOnShipAdvance;

/// Read-only ship tuning. Also the player category tag.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShipSettings {
    pub max_speed: f32,
    pub acceleration: f32,
    pub drag: f32,
    pub max_angular_speed: f32,
    pub angular_acceleration: f32,
    pub angular_drag: f32,
    pub bullet: TemplateId,
    pub bullet_speed: f32,
    pub shoot_cooldown: f32,
    pub respawn_time: f32,
}

/// Input captured in the variable stage for use in the fixed stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlayerInput {
    pub advance: bool,
    /// -1 clockwise, 1 counter-clockwise, 0 none.
    pub rotation_dir: i8,
    pub shoot: bool,
}

impl PlayerInput {
    /// Folds a sampled snapshot into the stored input.
    ///
    /// While turning counter-clockwise the direction sticks until both keys
    /// are released; otherwise right wins over left.
    pub fn apply(&mut self, input: &InputSnapshot) {
        self.advance = input.advance;
        if self.rotation_dir != 1 {
            if input.rotate_right {
                self.rotation_dir = -1;
            } else if input.rotate_left {
                self.rotation_dir = 1;
            }
        }
        if !input.rotate_right && !input.rotate_left {
            self.rotation_dir = 0;
        }
        self.shoot = input.fire;
    }
}

/// Rate-of-fire bookkeeping.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShootTimer {
    /// Fixed-clock time of the last shot.
    pub last_shot: f64,
}

impl Default for ShootTimer {
    fn default() -> Self { Self { last_shot: f64::NEG_INFINITY } }
}

/// Play field rectangle; positions wrap around its edges.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Boundary {
    pub min: Vec2,
    pub max: Vec2,
}

impl Boundary {
    pub fn new(min: Vec2, max: Vec2) -> Self { Self { min, max } }

    #[inline]
    pub fn width(&self) -> f32 { self.max.x - self.min.x }

    #[inline]
    pub fn height(&self) -> f32 { self.max.y - self.min.y }

    /// Wraps `p` into the rectangle on X and Y; Z is untouched.
    pub fn wrap(&self, p: Vec3) -> Vec3 {
        Vec3::new(
            wrap_axis(p.x, self.min.x, self.max.x),
            wrap_axis(p.y, self.min.y, self.max.y),
            p.z,
        )
    }
}

fn wrap_axis(v: f32, min: f32, max: f32) -> f32 {
    if v < min || v > max {
        min + (v - min).rem_euclid(max - min)
    } else {
        v
    }
}

/// Spawns a wave of asteroids whenever the field is empty.
#[derive(Clone, Debug)]
pub struct AsteroidSpawner {
    pub template: TemplateId,
    pub cooldown: f32,
    pub time_until_next: f32,
    pub count: u32,
    /// Width and height of the no-spawn rectangle around the player.
    pub safe_area: Vec2,
    /// Speed range of spawned asteroids.
    pub speed: Vec2,
    pub random: RandomStream,
}

/// Requests debris when the owner is destroyed or disabled.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DebrisSpawner {
    pub template: TemplateId,
    pub amount: u32,
    pub speed: Vec2,
    pub spin: Vec2,
}

/// Tracks the last known position of a debris spawner.
#[derive(Clone, Debug)]
pub struct DebrisSpawnerState {
    pub spawner: DebrisSpawner,
    pub position: Vec3,
    pub random: RandomStream,
}

/// Destroys the owner after `lifetime` seconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TemporaryLife {
    pub lifetime: f32,
}

/// When the temporary life started, on the variable-stage clock.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TemporaryLifeState {
    pub started_at: f64,
}

/// Countdown while the ship is disabled.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RespawningState {
    pub remaining: f32,
}
