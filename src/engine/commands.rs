//! # Commands
//!
//! Deferred structural mutation.
//!
//! ## Purpose
//! Systems may not change the entity set of the store while they iterate it.
//! Instead they record [`Command`] values into a [`CommandBuffer`], which the
//! scheduler plays back against the [`Store`] at the end of the stage.
//!
//! ## Design
//! - Commands are plain data describing *what* should change.
//! - `instantiate` and `spawn` hand out [`Pending`] placeholders at record
//!   time. Later commands in the same buffer may target them; they resolve
//!   to real entities during playback, in recorded order.
//! - Playback consumes the buffer. A buffer is never replayed.
//!
//! ## Invariants
//! - Playback applies commands strictly in append order.
//! - A command whose target is stale (destroyed earlier in this buffer or
//!   before it) is skipped on its own; the rest of the batch still applies.
//! - A command that targets a placeholder whose creation failed is skipped.

use std::fmt;

use crate::engine::component::{Bundle, Component, ComponentValue, component_id_of};
use crate::engine::entity::Entity;
use crate::engine::store::Store;
use crate::engine::template::TemplateId;
use crate::engine::types::ComponentID;


/// Placeholder for an entity that will exist after playback.
///
/// Only meaningful for the buffer that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Pending(u32);

impl Pending {
    #[inline]
    pub fn index(self) -> u32 { self.0 }
}

/// Contiguous placeholders returned by [`CommandBuffer::instantiate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingRange {
    first: u32,
    count: u32,
}

impl PendingRange {
    #[inline]
    pub fn len(&self) -> usize { self.count as usize }

    #[inline]
    pub fn is_empty(&self) -> bool { self.count == 0 }

    /// The `i`-th placeholder of the range.
    pub fn get(&self, i: usize) -> Option<Pending> {
        (i < self.count as usize).then(|| Pending(self.first + i as u32))
    }

    pub fn iter(&self) -> impl Iterator<Item = Pending> {
        (self.first..self.first + self.count).map(Pending)
    }
}

/// Target of a recorded operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Target {
    /// An entity that existed at record time.
    Live(Entity),
    /// An entity created earlier in the same buffer.
    Pending(Pending),
}

impl From<Entity> for Target {
    fn from(entity: Entity) -> Self { Target::Live(entity) }
}

impl From<Pending> for Target {
    fn from(pending: Pending) -> Self { Target::Pending(pending) }
}

impl Target {
    fn rebase(&mut self, offset: u32) {
        if let Target::Pending(p) = self {
            p.0 += offset;
        }
    }
}

/// A single deferred mutation.
pub enum Command {
    /// Creates `count` entities from `template`, bound to placeholders
    /// `first..first + count`.
    Instantiate {
        template: TemplateId,
        first: u32,
        count: u32,
    },

    /// Creates one entity from an ad-hoc bundle, bound to placeholder `slot`.
    Spawn {
        bundle: Bundle,
        slot: u32,
    },

    /// Overwrites a component the target already carries.
    Set {
        target: Target,
        value: Box<dyn ComponentValue>,
    },

    /// Attaches (or overwrites) a component.
    Add {
        target: Target,
        value: Box<dyn ComponentValue>,
    },

    /// Detaches a component.
    Remove {
        target: Target,
        component_id: ComponentID,
    },

    /// Destroys the target.
    Destroy {
        target: Target,
    },
}

impl Command {
    fn rebase(&mut self, offset: u32) {
        match self {
            Command::Instantiate { first, .. } => *first += offset,
            Command::Spawn { slot, .. } => *slot += offset,
            Command::Set { target, .. }
            | Command::Add { target, .. }
            | Command::Remove { target, .. }
            | Command::Destroy { target } => target.rebase(offset),
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Instantiate { template, first, count } => {
                write!(f, "Instantiate({template} x{count} -> #{first})")
            }
            Command::Spawn { bundle, slot } => write!(f, "Spawn({:?} -> #{slot})", bundle.type_names()),
            Command::Set { target, value } => write!(f, "Set({target:?}, {})", value.as_ref().type_name()),
            Command::Add { target, value } => write!(f, "Add({target:?}, {})", value.as_ref().type_name()),
            Command::Remove { target, component_id } => write!(f, "Remove({target:?}, #{component_id})"),
            Command::Destroy { target } => write!(f, "Destroy({target:?})"),
        }
    }
}

/// Outcome of one playback pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlaybackReport {
    /// Commands that changed the store.
    pub applied: usize,
    /// Commands skipped as no-ops.
    pub skipped: usize,
}

impl std::ops::AddAssign for PlaybackReport {
    fn add_assign(&mut self, rhs: Self) {
        self.applied += rhs.applied;
        self.skipped += rhs.skipped;
    }
}

/// Ordered, single-use list of deferred mutations.
#[derive(Default, Debug)]
pub struct CommandBuffer {
    commands: Vec<Command>,
    next_pending: u32,
}

impl CommandBuffer {
    pub fn new() -> Self { Self::default() }

    #[inline]
    pub fn len(&self) -> usize { self.commands.len() }

    #[inline]
    pub fn is_empty(&self) -> bool { self.commands.is_empty() }

    /// Recorded commands, in playback order.
    pub fn commands(&self) -> &[Command] { &self.commands }

    /// Records creation of `count` entities from `template`.
    pub fn instantiate(&mut self, template: TemplateId, count: usize) -> PendingRange {
        let range = PendingRange { first: self.next_pending, count: count as u32 };
        self.next_pending += range.count;
        self.commands.push(Command::Instantiate { template, first: range.first, count: range.count });
        range
    }

    /// Records creation of one entity carrying `bundle`.
    pub fn spawn(&mut self, bundle: Bundle) -> Target {
        let slot = self.next_pending;
        self.next_pending += 1;
        self.commands.push(Command::Spawn { bundle, slot });
        Target::Pending(Pending(slot))
    }

    /// Records an overwrite of an existing component.
    pub fn set<T: Component>(&mut self, target: impl Into<Target>, value: T) {
        self.commands.push(Command::Set { target: target.into(), value: Box::new(value) });
    }

    /// Records attaching a component.
    pub fn add<T: Component>(&mut self, target: impl Into<Target>, value: T) {
        self.commands.push(Command::Add { target: target.into(), value: Box::new(value) });
    }

    /// Records detaching component `T`.
    pub fn remove<T: Component>(&mut self, target: impl Into<Target>) {
        self.commands.push(Command::Remove { target: target.into(), component_id: component_id_of::<T>() });
    }

    /// Records destruction of the target.
    pub fn destroy(&mut self, target: impl Into<Target>) {
        self.commands.push(Command::Destroy { target: target.into() });
    }

    /// Moves every command of `other` to the end of this buffer, re-basing
    /// its placeholders so they stay distinct from ours.
    pub fn append(&mut self, other: CommandBuffer) {
        let offset = self.next_pending;
        self.commands.extend(other.commands.into_iter().map(|mut c| {
            c.rebase(offset);
            c
        }));
        self.next_pending += other.next_pending;
    }

    /// Applies every command to `store` in recorded order, consuming the buffer.
    pub fn playback(self, store: &mut Store) -> PlaybackReport {
        let mut report = PlaybackReport::default();
        let mut resolved: Vec<Option<Entity>> = vec![None; self.next_pending as usize];

        for command in self.commands {
            let applied = match command {
                Command::Instantiate { template, first, count } => {
                    match store.instantiate(template, count as usize) {
                        Ok(created) => {
                            let start = first as usize;
                            for (slot, entity) in resolved[start..start + created.len()].iter_mut().zip(created) {
                                *slot = Some(entity);
                            }
                            true
                        }
                        Err(e) => {
                            log::warn!("instantiate skipped: {e}");
                            false
                        }
                    }
                }
                Command::Spawn { bundle, slot } => {
                    resolved[slot as usize] = Some(store.create_with(bundle));
                    true
                }
                Command::Set { target, value } => match resolve(&resolved, target) {
                    Some(entity) => value.set_on(store, entity),
                    None => false,
                },
                Command::Add { target, value } => match resolve(&resolved, target) {
                    Some(entity) => value.add_to(store, entity),
                    None => false,
                },
                Command::Remove { target, component_id } => match resolve(&resolved, target) {
                    Some(entity) => store.remove_component(entity, component_id),
                    None => false,
                },
                Command::Destroy { target } => match resolve(&resolved, target) {
                    Some(entity) => store.destroy(entity),
                    None => false,
                },
            };

            if applied {
                report.applied += 1;
            } else {
                report.skipped += 1;
            }
        }

        if report.skipped > 0 {
            log::trace!("playback: {} applied, {} skipped as no-ops", report.applied, report.skipped);
        }
        report
    }
}

fn resolve(resolved: &[Option<Entity>], target: Target) -> Option<Entity> {
    match target {
        Target::Live(entity) => Some(entity),
        Target::Pending(p) => {
            let entity = resolved.get(p.0 as usize).copied().flatten();
            if entity.is_none() {
                log::trace!("placeholder #{} never resolved", p.0);
            }
            entity
        }
    }
}
