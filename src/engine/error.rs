//! Error types for the runtime.
//!
//! This module declares focused, composable error types. Each one models a
//! single failure mode and carries enough context to be actionable in a log
//! line; all of them convert into the aggregate [`ECSError`] so callers can use
//! `?` across module boundaries.
//!
//! ## Failure taxonomy
//! * [`CardinalityError`]: a singleton query matched zero or several
//!   entities. This is a contract violation: callers are expected to guard
//!   with `count()` first.
//! * [`UnknownTemplateError`]: a template id that no registry entry backs.
//! * [`ScheduleError`]: system ordering constraints that cannot be satisfied.
//! * [`ResourceLifetimeError`]: a stage-scoped temporary was still held at
//!   the stage barrier.
//!
//! Stale entity handles are deliberately *not* an error: command playback
//! skips the affected operation and counts it in
//! [`PlaybackReport`](crate::engine::commands::PlaybackReport).
//!
//! ## Display vs. Debug
//! * `Display` is short and meant for operator logs.
//! * `Debug` (derived) retains full structure for diagnostics.

use thiserror::Error;

use crate::engine::scheduler::StageKind;
use crate::engine::template::TemplateId;


/// Returned when a singleton lookup does not match exactly one entity.
///
/// ### Fields
/// * `component`: Type name of the component the singleton was keyed on.
/// * `matched`: Number of entities the query actually matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("singleton query on {component} matched {matched} entities (expected exactly 1)")]
pub struct CardinalityError {
    /// Component type name.
    pub component: &'static str,

    /// Observed match count.
    pub matched: usize,
}

/// Returned when a template id does not resolve in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no template registered under {0}")]
pub struct UnknownTemplateError(pub TemplateId);

/// Failures detected while building a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    /// Two systems share a name.
    #[error("system `{0}` registered twice")]
    DuplicateSystem(String),

    /// A `before`/`after` constraint names a system that was never added.
    #[error("system `{system}` references unknown system `{missing}`")]
    UnknownSystem {
        /// Declaring system.
        system: String,
        /// Referenced name.
        missing: String,
    },

    /// The ordering constraints of a stage contain a cycle.
    #[error("ordering cycle in {stage:?} stage between: {}", systems.join(", "))]
    Cycle {
        /// Stage whose constraints are cyclic.
        stage: StageKind,
        /// Systems that could not be ordered.
        systems: Vec<String>,
    },
}

/// Returned when stage-scoped temporaries are still outstanding at a barrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{outstanding} scratch list(s) not returned before the {stage:?} stage barrier")]
pub struct ResourceLifetimeError {
    /// Stage whose barrier detected the leak.
    pub stage: StageKind,

    /// Number of lists still checked out.
    pub outstanding: usize,
}

/// Aggregate runtime error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ECSError {
    #[error(transparent)]
    Cardinality(#[from] CardinalityError),

    #[error(transparent)]
    UnknownTemplate(#[from] UnknownTemplateError),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    ResourceLifetime(#[from] ResourceLifetimeError),
}

/// Convenience result alias for runtime operations.
pub type ECSResult<T> = Result<T, ECSError>;
