//! Generic appear / steady / disappear lifecycle.
//!
//! A lifecycle pairs a *source* component `S`, which declares intent (for
//! example "spawn debris when destroyed"), with a *state* component `K`,
//! which tracks the work in progress. Three queries run every time the owning
//! system runs, always in this order:
//!
//! | phase     | query                                          | action                          |
//! |-----------|------------------------------------------------|---------------------------------|
//! | appear    | `All{S} None{K}`                               | attach `K` derived from `S`     |
//! | steady    | `All{S,K}`                                     | update `K` from the world       |
//! | disappear | `All{K} None{S}` or `All{K,S,Disabled}`        | exit action, then remove `K`    |
//!
//! ## Semantics
//! * `K` attached during appear is deferred, so an entity is never torn down
//!   in the tick its state was attached. On the next run it matches steady.
//! * The state passed to disappear is the one written by the latest steady
//!   pass.
//! * Disappear removes `K` through the command buffer, so each entity exits
//!   exactly once. Husks left behind by `Store::destroy` are freed when `K`
//!   goes.
//! * The second disappear query only applies when
//!   [`Lifecycle::EXIT_ON_DISABLED`] is set.

use std::marker::PhantomData;

use crate::engine::component::{Component, Disabled, register_state_component};
use crate::engine::entity::Entity;
use crate::engine::query::{Query, QueryBuilder};
use crate::engine::scheduler::StageKind;
use crate::engine::systems::{System, SystemContext};


/// Hooks of one appear / steady / disappear protocol.
pub trait Lifecycle: Send + 'static {
    /// Component declaring intent.
    type Source: Component;

    /// Component tracking in-progress work.
    type State: Component;

    /// Treat a disabled entity that still has its source as disappearing.
    const EXIT_ON_DISABLED: bool = true;

    /// Keep the state on a husk when the entity is destroyed, so disappear
    /// still observes it.
    const RETAIN_ON_DESTROY: bool = true;

    /// Extra filters applied to all three queries.
    fn refine(&self, query: QueryBuilder) -> QueryBuilder { query }

    /// Builds the state for a newly matched entity. `None` skips the entity
    /// for this run; it will be offered again next time.
    fn appear(
        &mut self,
        ctx: &mut SystemContext<'_>,
        entity: Entity,
        source: &Self::Source,
    ) -> Option<Self::State>;

    /// Updates the state of an entity that has both components. The state is
    /// written back after the call.
    fn steady(
        &mut self,
        _ctx: &mut SystemContext<'_>,
        _entity: Entity,
        _source: &Self::Source,
        _state: &mut Self::State,
    ) {
    }

    /// Exit action. The state is removed afterwards.
    fn disappear(&mut self, _ctx: &mut SystemContext<'_>, _entity: Entity, _state: &Self::State) {}
}

/// Per-run phase counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LifecycleReport {
    pub appeared: usize,
    pub steady: usize,
    pub disappeared: usize,
}

/// Runs a [`Lifecycle`] as a scheduled system.
pub struct LifecycleSystem<L: Lifecycle> {
    name: String,
    stage: StageKind,
    before: Vec<String>,
    after: Vec<String>,
    lifecycle: L,
    appear: Query,
    steady: Query,
    disappear: Vec<Query>,
    last: LifecycleReport,
    _marker: PhantomData<fn() -> L>,
}

impl<L: Lifecycle> LifecycleSystem<L> {
    pub fn new(name: impl Into<String>, stage: StageKind, lifecycle: L) -> Self {
        if L::RETAIN_ON_DESTROY {
            register_state_component::<L::State>();
        }

        let appear = lifecycle
            .refine(Query::builder().with::<L::Source>().without::<L::State>())
            .build();
        let steady = lifecycle
            .refine(Query::builder().with::<L::Source>().with::<L::State>())
            .build();
        let mut disappear = vec![lifecycle
            .refine(Query::builder().with::<L::State>().without::<L::Source>())
            .build()];
        if L::EXIT_ON_DISABLED {
            disappear.push(
                lifecycle
                    .refine(Query::builder().with::<L::State>().with::<L::Source>().with::<Disabled>())
                    .build(),
            );
        }

        Self {
            name: name.into(),
            stage,
            before: Vec::new(),
            after: Vec::new(),
            lifecycle,
            appear,
            steady,
            disappear,
            last: LifecycleReport::default(),
            _marker: PhantomData,
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

    /// Counts from the most recent run.
    #[inline]
    pub fn last_report(&self) -> LifecycleReport { self.last }

    #[inline]
    pub fn lifecycle(&self) -> &L { &self.lifecycle }

    /// Runs all three phases once.
    pub fn run_phases(&mut self, ctx: &mut SystemContext<'_>) -> LifecycleReport {
        let mut report = LifecycleReport::default();
        let mut batch = ctx.scratch.take();

        ctx.world.collect_into(&self.appear, &mut batch);
        for &entity in &batch {
            let Some(source) = ctx.world.get::<L::Source>(entity).cloned() else { continue };
            if let Some(state) = self.lifecycle.appear(ctx, entity, &source) {
                ctx.commands.add(entity, state);
                report.appeared += 1;
            }
        }

        batch.clear();
        ctx.world.collect_into(&self.steady, &mut batch);
        for &entity in &batch {
            let source = ctx.world.get::<L::Source>(entity).cloned();
            let state = ctx.world.get::<L::State>(entity).cloned();
            let (Some(source), Some(mut state)) = (source, state) else { continue };
            self.lifecycle.steady(ctx, entity, &source, &mut state);
            ctx.world.set(entity, state);
            report.steady += 1;
        }

        batch.clear();
        for query in &self.disappear {
            ctx.world.collect_into(query, &mut batch);
        }
        for &entity in &batch {
            let Some(state) = ctx.world.get::<L::State>(entity).cloned() else { continue };
            self.lifecycle.disappear(ctx, entity, &state);
            ctx.commands.remove::<L::State>(entity);
            report.disappeared += 1;
        }

        ctx.scratch.give_back(batch);
        if report != LifecycleReport::default() {
            log::trace!("{}: {:?}", self.name, report);
        }
        self.last = report;
        report
    }
}

impl<L: Lifecycle> System for LifecycleSystem<L> {
    fn name(&self) -> &str { &self.name }

    fn stage(&self) -> StageKind { self.stage }

    fn before(&self) -> &[String] { &self.before }

    fn after(&self) -> &[String] { &self.after }

    fn run(&mut self, ctx: &mut SystemContext<'_>) {
        self.run_phases(ctx);
    }
}
