//! Pairwise collision dispatch.
//!
//! Contact detection is not part of the runtime. A [`ContactFeed`] supplies,
//! once per fixed step, the list of entity pairs that touched. The dispatcher
//! classifies each pair against two category tags and records the configured
//! effect on the command buffer.
//!
//! ## Semantics
//! * Fewer than two live entities carrying `T1` or `T2`: nothing happens,
//!   whatever the event list holds.
//! * An event whose sides carry `T1` and `T2` (in either order) produces
//!   exactly one effect application. Same-tag and untagged pairs produce none.
//! * Events are not deduplicated. Repeats are harmless because destroying or
//!   disabling an already affected entity is a no-op at playback.
//! * [`CollisionEffect::DisableTarget`] disables the side carrying `T2`. When
//!   one entity carries both tags, every `T2` side whose opposite side carries
//!   `T1` is disabled.

use std::collections::VecDeque;
use std::marker::PhantomData;

use crate::engine::commands::CommandBuffer;
use crate::engine::component::{Component, Disabled};
use crate::engine::entity::Entity;
use crate::engine::query::Query;
use crate::engine::scheduler::StageKind;
use crate::engine::store::Store;
use crate::engine::systems::{System, SystemContext};


/// Two entities reported as touching during one fixed step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContactEvent {
    pub a: Entity,
    pub b: Entity,
}

impl ContactEvent {
    pub fn new(a: Entity, b: Entity) -> Self { Self { a, b } }
}

/// Supplier of contact events, consulted once per fixed step.
pub trait ContactFeed {
    /// Appends this step's contacts to `out`. `step` counts fixed steps
    /// since start, beginning at 1.
    fn collect(&mut self, store: &Store, step: u64, out: &mut Vec<ContactEvent>);
}

/// Feed that never reports contacts.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoContacts;

impl ContactFeed for NoContacts {
    fn collect(&mut self, _store: &Store, _step: u64, _out: &mut Vec<ContactEvent>) {}
}

/// Feed replaying queued per-step event lists; empty once exhausted.
#[derive(Clone, Debug, Default)]
pub struct ScriptedContacts {
    frames: VecDeque<Vec<ContactEvent>>,
}

impl ScriptedContacts {
    pub fn new() -> Self { Self::default() }

    /// Queues the events of the next fixed step.
    pub fn push_step(&mut self, events: Vec<ContactEvent>) {
        self.frames.push_back(events);
    }

    /// Steps still queued.
    pub fn remaining(&self) -> usize { self.frames.len() }
}

impl ContactFeed for ScriptedContacts {
    fn collect(&mut self, _store: &Store, _step: u64, out: &mut Vec<ContactEvent>) {
        if let Some(events) = self.frames.pop_front() {
            out.extend(events);
        }
    }
}

/// What a qualifying contact does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollisionEffect {
    /// Destroy both sides.
    DestroyBoth,
    /// Attach `Disabled` to the side(s) carrying the second tag.
    DisableTarget,
}

/// Classifies `events` and records `effect` for each qualifying pair.
///
/// Returns the number of effect applications recorded.
pub fn dispatch<T1: Component, T2: Component>(
    world: &Store,
    events: &[ContactEvent],
    effect: CollisionEffect,
    commands: &mut CommandBuffer,
) -> usize {
    let tagged = Query::builder().any::<T1>().any::<T2>().build();
    let mut live = world.matching(&tagged);
    if live.next().is_none() || live.next().is_none() {
        return 0;
    }

    let mut applied = 0;
    for event in events {
        let (a1, a2) = (world.has::<T1>(event.a), world.has::<T2>(event.a));
        let (b1, b2) = (world.has::<T1>(event.b), world.has::<T2>(event.b));
        if !((a1 && b2) || (b1 && a2)) {
            continue;
        }

        match effect {
            CollisionEffect::DestroyBoth => {
                commands.destroy(event.a);
                commands.destroy(event.b);
            }
            CollisionEffect::DisableTarget => {
                if a2 && b1 {
                    commands.add(event.a, Disabled);
                }
                if b2 && a1 {
                    commands.add(event.b, Disabled);
                }
            }
        }
        applied += 1;
    }
    applied
}

/// Fixed-stage system running [`dispatch`] for one tag pair.
pub struct CollisionSystem<T1: Component, T2: Component> {
    name: String,
    effect: CollisionEffect,
    before: Vec<String>,
    after: Vec<String>,
    last: usize,
    _tags: PhantomData<fn() -> (T1, T2)>,
}

impl<T1: Component, T2: Component> CollisionSystem<T1, T2> {
    pub fn new(name: impl Into<String>, effect: CollisionEffect) -> Self {
        Self {
            name: name.into(),
            effect,
            before: Vec::new(),
            after: Vec::new(),
            last: 0,
            _tags: PhantomData,
        }
    }

    pub fn before(mut self, other: impl Into<String>) -> Self {
        self.before.push(other.into());
        self
    }

    pub fn after(mut self, other: impl Into<String>) -> Self {
        self.after.push(other.into());
        self
    }

    /// Effect applications recorded by the most recent run.
    pub fn last_applied(&self) -> usize { self.last }
}

impl<T1: Component, T2: Component> System for CollisionSystem<T1, T2> {
    fn name(&self) -> &str { &self.name }

    fn stage(&self) -> StageKind { StageKind::Fixed }

    fn before(&self) -> &[String] { &self.before }

    fn after(&self) -> &[String] { &self.after }

    fn run(&mut self, ctx: &mut SystemContext<'_>) {
        self.last = dispatch::<T1, T2>(&ctx.world, ctx.contacts, self.effect, ctx.commands);
        if self.last > 0 {
            log::trace!("{}: {} contact(s) applied", self.name, self.last);
        }
    }
}
