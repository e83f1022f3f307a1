//! System abstractions.
//!
//! A **system** is a unit of logic that runs once per invocation of its
//! stage. Systems:
//! - read the store through [`StoreRef`] and may write components in place,
//! - record structural changes on the stage's shared [`CommandBuffer`],
//! - declare their stage and optional `before`/`after` ordering constraints
//!   by name.
//!
//! Time and input are not ambient. Everything a system may consult is passed
//! explicitly in its [`SystemContext`].
//!
//! ## Function-backed systems
//! [`FnSystem`] wraps a closure and is the preferred way to define gameplay
//! logic that carries no state of its own.

use crate::engine::collision::ContactEvent;
use crate::engine::commands::CommandBuffer;
use crate::engine::scheduler::StageKind;
use crate::engine::scratch::ScratchPool;
use crate::engine::store::StoreRef;
use crate::engine::types::Tick;


/// Discrete control signals sampled once per variable-rate tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    pub advance: bool,
    pub rotate_left: bool,
    pub rotate_right: bool,
    pub fire: bool,
}

/// One external tick: wall-clock delta plus the sampled input.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Frame {
    /// Seconds since the previous frame.
    pub delta: f32,
    pub input: InputSnapshot,
}

impl Frame {
    pub fn new(delta: f32, input: InputSnapshot) -> Self { Self { delta, input } }

    /// A frame with no input.
    pub fn idle(delta: f32) -> Self { Self { delta, input: InputSnapshot::default() } }
}

/// Timing of the running stage invocation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Time {
    /// Seconds advanced by this invocation: the frame delta in the variable
    /// stage, the fixed step in the fixed stage.
    pub delta: f32,

    /// Simulated seconds elapsed on this stage's clock, including `delta`.
    pub elapsed: f64,

    /// External tick counter, starting at 1 on the first tick.
    pub tick: Tick,

    pub stage: StageKind,
}

/// Everything a system may touch during one run.
pub struct SystemContext<'a> {
    /// Store view limited to reads and in-place writes.
    pub world: StoreRef<'a>,

    /// The stage's shared command buffer, played back at the stage barrier.
    pub commands: &'a mut CommandBuffer,

    pub time: Time,

    pub input: &'a InputSnapshot,

    /// Contact events of the current fixed step; empty in the variable stage.
    pub contacts: &'a [ContactEvent],

    /// Stage-scoped temporary entity lists.
    pub scratch: &'a mut ScratchPool,
}

/// A unit of executable logic scheduled by name.
pub trait System: Send {
    /// Unique name, used for ordering constraints and logs.
    fn name(&self) -> &str;

    /// Stage this system belongs to.
    fn stage(&self) -> StageKind;

    /// Systems of the same stage this one must run before.
    fn before(&self) -> &[String] { &[] }

    /// Systems of the same stage this one must run after.
    fn after(&self) -> &[String] { &[] }

    /// Executes the system once.
    fn run(&mut self, ctx: &mut SystemContext<'_>);
}

/// A concrete [`System`] backed by a closure.
pub struct FnSystem<F>
where
    F: FnMut(&mut SystemContext<'_>) + Send + 'static,
{
    name: String,
    stage: StageKind,
    before: Vec<String>,
    after: Vec<String>,
    f: F,
}

impl<F> FnSystem<F>
where
    F: FnMut(&mut SystemContext<'_>) + Send + 'static,
{
    /// Creates a new function-backed system.
    pub fn new(name: impl Into<String>, stage: StageKind, f: F) -> Self {
        Self { name: name.into(), stage, before: Vec::new(), after: Vec::new(), f }
    }

    /// Adds a `before` constraint.
    pub fn before(mut self, other: impl Into<String>) -> Self {
        self.before.push(other.into());
        self
    }

    /// Adds an `after` constraint.
    pub fn after(mut self, other: impl Into<String>) -> Self {
        self.after.push(other.into());
        self
    }
}

impl<F> System for FnSystem<F>
where
    F: FnMut(&mut SystemContext<'_>) + Send + 'static,
{
    fn name(&self) -> &str { &self.name }

    fn stage(&self) -> StageKind { self.stage }

    fn before(&self) -> &[String] { &self.before }

    fn after(&self) -> &[String] { &self.after }

    fn run(&mut self, ctx: &mut SystemContext<'_>) { (self.f)(ctx) }
}
