//! # Drift ECS
//!
//! Small real-time entity/component runtime with deferred structural
//! mutation, plus an asteroids game built on top of it.
//!
//! ## Design Goals
//! - Sparse-set component storage with generational entity handles
//! - Structural changes only through command buffers, applied at stage barriers
//! - Deterministic scheduling: variable stage once per tick, fixed stage from
//!   an accumulator
//! - Gameplay expressed as ordinary systems, lifecycles and collision pairs
//!
//! ## Layout
//! - [`engine`]: store, queries, commands, scheduler, lifecycle, collision
//! - [`game`]: components and systems of the asteroids game
//! - [`config`]: TOML-backed tuning values

#![forbid(unsafe_code)]
#![allow(clippy::module_inception)]

pub mod engine;
pub mod config;
pub mod game;

// ─────────────────────────────────────────────────────────────────────────────
// Re-exports (Public API)
// ─────────────────────────────────────────────────────────────────────────────

pub use engine::store::{Store, StoreRef};

pub use engine::entity::Entity;

pub use engine::component::{
    Bundle,
    Component,
    Disabled,
    component_id_of,
    register_state_component,
};

pub use engine::template::{Template, TemplateId};

pub use engine::query::{Query, QueryBuilder};

pub use engine::commands::{
    CommandBuffer,
    Pending,
    PendingRange,
    PlaybackReport,
    Target,
};

pub use engine::systems::{
    FnSystem,
    Frame,
    InputSnapshot,
    System,
    SystemContext,
    Time,
};

pub use engine::scheduler::{
    Scheduler,
    SchedulerBuilder,
    StageKind,
    TickReport,
};

pub use engine::lifecycle::{Lifecycle, LifecycleReport, LifecycleSystem};

pub use engine::collision::{
    CollisionEffect,
    CollisionSystem,
    ContactEvent,
    ContactFeed,
    NoContacts,
    ScriptedContacts,
    dispatch,
};

pub use engine::random::RandomStream;

pub use engine::error::{
    CardinalityError,
    ECSError,
    ECSResult,
    ResourceLifetimeError,
    ScheduleError,
    UnknownTemplateError,
};

pub use engine::types::{ComponentID, EntityID};

pub use config::{ConfigError, GameConfig};

pub use game::Game;

// ─────────────────────────────────────────────────────────────────────────────
// Prelude
// ─────────────────────────────────────────────────────────────────────────────

/// Commonly used runtime types.
///
/// Import with:
/// ```rust
/// use drift_ecs::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Bundle,
        CommandBuffer,
        Disabled,
        Entity,
        FnSystem,
        Frame,
        Lifecycle,
        LifecycleSystem,
        Query,
        QueryBuilder,
        Scheduler,
        StageKind,
        Store,
        System,
        SystemContext,
        Template,
    };
}

/// Installs the `env_logger` backend, filtered by `RUST_LOG`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp_millis()
        .try_init();
}
