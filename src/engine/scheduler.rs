//! System scheduling and stage execution.
//!
//! This module is responsible for:
//! * ordering the systems of each stage from their `before`/`after`
//!   constraints, once, at build time,
//! * running the variable-rate stage once per external tick,
//! * running the fixed-rate stage zero or more times per tick from an
//!   accumulator of leftover time,
//! * enforcing a structural barrier after every stage invocation.
//!
//! ## Stages
//!
//! ```text
//! tick(frame):
//!   Variable stage  -> playback barrier
//!   while accumulator >= step (at most max_fixed_steps times):
//!     collect contacts
//!     Fixed stage   -> playback barrier
//! ```
//!
//! ## Structural synchronization
//!
//! All systems of one stage invocation share a single [`CommandBuffer`]. It is
//! played back after the last system of the stage returns and before anything
//! else observes the store, so structural changes become visible to the next
//! stage only, never mid-stage.
//!
//! ## Determinism
//! Topological ties are broken by insertion order, so a given set of
//! `add_system` calls always produces the same order.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use crate::engine::collision::{ContactEvent, ContactFeed};
use crate::engine::commands::{CommandBuffer, PlaybackReport};
use crate::engine::error::ScheduleError;
use crate::engine::scratch::ScratchPool;
use crate::engine::store::{Store, StoreRef};
use crate::engine::systems::{Frame, InputSnapshot, System, SystemContext, Time};
use crate::engine::types::Tick;


/// Scheduling phase a system belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageKind {
    /// Runs once per external tick.
    Variable,
    /// Runs in constant increments of simulated time.
    Fixed,
}

/// Default fixed step in seconds.
pub const DEFAULT_FIXED_STEP: f32 = 0.02;
/// Default cap on fixed steps per external tick.
pub const DEFAULT_MAX_FIXED_STEPS: u32 = 8;

/// Collects systems and timing parameters for a [`Scheduler`].
pub struct SchedulerBuilder {
    systems: Vec<Box<dyn System>>,
    fixed_step: f32,
    max_fixed_steps: u32,
}

impl Default for SchedulerBuilder {
    fn default() -> Self {
        Self {
            systems: Vec::new(),
            fixed_step: DEFAULT_FIXED_STEP,
            max_fixed_steps: DEFAULT_MAX_FIXED_STEPS,
        }
    }
}

impl SchedulerBuilder {
    pub fn new() -> Self { Self::default() }

    /// Adds a system. Its stage comes from [`System::stage`].
    pub fn add_system(mut self, system: impl System + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    /// Adds an already boxed system.
    pub fn add_boxed(mut self, system: Box<dyn System>) -> Self {
        self.systems.push(system);
        self
    }

    /// Sets the fixed-stage step in seconds.
    ///
    /// ## Panics
    /// Panics if `seconds` is not a positive finite number.
    pub fn fixed_step(mut self, seconds: f32) -> Self {
        assert!(seconds.is_finite() && seconds > 0.0, "fixed step must be positive, got {seconds}");
        self.fixed_step = seconds;
        self
    }

    /// Caps the number of fixed steps a single tick may run.
    pub fn max_fixed_steps(mut self, steps: u32) -> Self {
        self.max_fixed_steps = steps.max(1);
        self
    }

    /// Validates constraints and computes one order per stage.
    ///
    /// ## Errors
    /// * `DuplicateSystem` if two systems share a name.
    /// * `UnknownSystem` if a constraint names a system never added.
    /// * `Cycle` if the constraints of a stage cannot be satisfied.
    ///
    /// Constraints that cross stages have no meaning and are dropped with a
    /// warning.
    pub fn build(self) -> Result<Scheduler, ScheduleError> {
        let mut index_of: HashMap<String, usize> = HashMap::new();
        for (i, system) in self.systems.iter().enumerate() {
            if index_of.insert(system.name().to_owned(), i).is_some() {
                return Err(ScheduleError::DuplicateSystem(system.name().to_owned()));
            }
        }

        // Validate every reference before ordering anything.
        for system in &self.systems {
            for other in system.before().iter().chain(system.after()) {
                if !index_of.contains_key(other) {
                    return Err(ScheduleError::UnknownSystem {
                        system: system.name().to_owned(),
                        missing: other.clone(),
                    });
                }
            }
        }

        let variable = order_stage(&self.systems, &index_of, StageKind::Variable)?;
        let fixed = order_stage(&self.systems, &index_of, StageKind::Fixed)?;

        let mut slots: Vec<Option<Box<dyn System>>> = self.systems.into_iter().map(Some).collect();
        let mut take = |order: Vec<usize>| -> Vec<Box<dyn System>> {
            order.into_iter().filter_map(|i| slots[i].take()).collect()
        };
        let variable = take(variable);
        let fixed = take(fixed);

        log::debug!(
            "schedule built: variable [{}], fixed [{}] at {}s",
            names(&variable).join(", "),
            names(&fixed).join(", "),
            self.fixed_step,
        );

        Ok(Scheduler {
            variable,
            fixed,
            fixed_step: self.fixed_step as f64,
            max_fixed_steps: self.max_fixed_steps,
            accumulator: 0.0,
            elapsed: 0.0,
            fixed_elapsed: 0.0,
            tick: 0,
            fixed_steps: 0,
            scratch: ScratchPool::new(),
            contacts: Vec::new(),
        })
    }
}

fn names(systems: &[Box<dyn System>]) -> Vec<&str> {
    systems.iter().map(|s| s.name()).collect()
}

/// Kahn's algorithm over one stage, ties broken by insertion order.
fn order_stage(
    systems: &[Box<dyn System>],
    index_of: &HashMap<String, usize>,
    stage: StageKind,
) -> Result<Vec<usize>, ScheduleError> {
    let members: Vec<usize> = (0..systems.len())
        .filter(|&i| systems[i].stage() == stage)
        .collect();

    let mut successors: HashMap<usize, Vec<usize>> = HashMap::new();
    let mut in_degree: HashMap<usize, usize> = members.iter().map(|&i| (i, 0)).collect();

    let mut edge = |from: usize, to: usize| {
        successors.entry(from).or_default().push(to);
        if let Some(d) = in_degree.get_mut(&to) {
            *d += 1;
        }
    };

    for &i in &members {
        let system = &systems[i];
        let constraints = system
            .before()
            .iter()
            .map(|n| (n, true))
            .chain(system.after().iter().map(|n| (n, false)));
        for (name, is_before) in constraints {
            let Some(&j) = index_of.get(name) else { continue };
            if systems[j].stage() != stage {
                log::warn!(
                    "ignoring ordering between `{}` ({:?}) and `{}` ({:?}): different stages",
                    system.name(), stage, name, systems[j].stage(),
                );
                continue;
            }
            if is_before { edge(i, j) } else { edge(j, i) }
        }
    }

    let mut ready: BinaryHeap<Reverse<usize>> = in_degree
        .iter()
        .filter(|(_, &d)| d == 0)
        .map(|(&i, _)| Reverse(i))
        .collect();
    let mut order = Vec::with_capacity(members.len());

    while let Some(Reverse(i)) = ready.pop() {
        order.push(i);
        for &next in successors.get(&i).map(Vec::as_slice).unwrap_or(&[]) {
            if let Some(d) = in_degree.get_mut(&next) {
                *d -= 1;
                if *d == 0 {
                    ready.push(Reverse(next));
                }
            }
        }
    }

    if order.len() < members.len() {
        let stuck = members
            .iter()
            .filter(|&&i| !order.contains(&i))
            .map(|&i| systems[i].name().to_owned())
            .collect();
        return Err(ScheduleError::Cycle { stage, systems: stuck });
    }
    Ok(order)
}

/// Summary of one external tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Fixed-stage invocations run this tick.
    pub fixed_steps: u32,
    /// Whole fixed steps discarded by the per-tick cap.
    pub dropped_steps: u32,
    /// Playback of the variable stage.
    pub variable: PlaybackReport,
    /// Combined playback of every fixed-stage invocation.
    pub fixed: PlaybackReport,
}

/// Ordered systems of both stages plus the fixed-step clock.
pub struct Scheduler {
    variable: Vec<Box<dyn System>>,
    fixed: Vec<Box<dyn System>>,
    fixed_step: f64,
    max_fixed_steps: u32,
    accumulator: f64,
    elapsed: f64,
    fixed_elapsed: f64,
    tick: Tick,
    fixed_steps: u64,
    scratch: ScratchPool,
    contacts: Vec<ContactEvent>,
}

impl Scheduler {
    pub fn builder() -> SchedulerBuilder { SchedulerBuilder::new() }

    /// System names of `stage` in execution order.
    pub fn order(&self, stage: StageKind) -> Vec<&str> {
        match stage {
            StageKind::Variable => names(&self.variable),
            StageKind::Fixed => names(&self.fixed),
        }
    }

    #[inline]
    pub fn fixed_step(&self) -> f32 { self.fixed_step as f32 }

    /// Leftover time not yet consumed by a fixed step.
    #[inline]
    pub fn accumulator(&self) -> f64 { self.accumulator }

    /// External ticks run so far.
    #[inline]
    pub fn ticks(&self) -> Tick { self.tick }

    /// Fixed steps run so far.
    #[inline]
    pub fn total_fixed_steps(&self) -> u64 { self.fixed_steps }

    /// Runs one external tick.
    pub fn tick(&mut self, store: &mut Store, frame: &Frame, feed: &mut dyn ContactFeed) -> TickReport {
        let mut report = TickReport::default();
        self.tick += 1;
        let delta = if frame.delta.is_finite() {
            frame.delta.max(0.0)
        } else {
            log::warn!("tick {}: non-finite frame delta {}, treating it as 0", self.tick, frame.delta);
            0.0
        };
        self.elapsed += delta as f64;

        let time = Time { delta, elapsed: self.elapsed, tick: self.tick, stage: StageKind::Variable };
        report.variable = run_stage(&mut self.variable, &mut self.scratch, store, time, &frame.input, &[]);

        self.accumulator += delta as f64;
        while self.accumulator >= self.fixed_step && report.fixed_steps < self.max_fixed_steps {
            self.accumulator -= self.fixed_step;
            self.fixed_elapsed += self.fixed_step;
            self.fixed_steps += 1;
            report.fixed_steps += 1;

            self.contacts.clear();
            feed.collect(store, self.fixed_steps, &mut self.contacts);

            let time = Time {
                delta: self.fixed_step as f32,
                elapsed: self.fixed_elapsed,
                tick: self.tick,
                stage: StageKind::Fixed,
            };
            report.fixed += run_stage(&mut self.fixed, &mut self.scratch, store, time, &frame.input, &self.contacts);
        }
        self.contacts.clear();

        if self.accumulator >= self.fixed_step {
            let dropped = (self.accumulator / self.fixed_step).floor();
            self.accumulator -= dropped * self.fixed_step;
            report.dropped_steps = dropped as u32;
            log::warn!(
                "tick {}: fixed stage fell behind, dropping {} step(s) of {}s",
                self.tick, report.dropped_steps, self.fixed_step,
            );
        }

        report
    }
}

/// Runs every system of one stage invocation, then the barrier.
fn run_stage(
    systems: &mut [Box<dyn System>],
    scratch: &mut ScratchPool,
    store: &mut Store,
    time: Time,
    input: &InputSnapshot,
    contacts: &[ContactEvent],
) -> PlaybackReport {
    let mut commands = CommandBuffer::new();
    for system in systems.iter_mut() {
        let mut ctx = SystemContext {
            world: StoreRef::new(store),
            commands: &mut commands,
            time,
            input,
            contacts,
            scratch,
        };
        system.run(&mut ctx);
    }

    let recorded = commands.len();
    let report = commands.playback(store);
    log::trace!(
        "{:?} barrier (tick {}): {} recorded, {} applied, {} skipped",
        time.stage, time.tick, recorded, report.applied, report.skipped,
    );

    if let Err(leak) = scratch.end_stage(time.stage) {
        if cfg!(debug_assertions) {
            panic!("{leak}");
        }
        log::warn!("{leak}; released at barrier");
    }
    report
}
