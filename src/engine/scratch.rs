//! Stage-scoped temporary entity lists.
//!
//! Systems that need to collect entities before acting on them borrow a list
//! from the [`ScratchPool`] and hand it back before they return. Lists are
//! recycled, so steady-state ticks do not allocate.
//!
//! At every stage barrier the scheduler calls [`ScratchPool::end_stage`]. A
//! list that is still checked out at that point is a leak: debug builds panic,
//! release builds log a warning and forget the outstanding count.

use crate::engine::entity::Entity;
use crate::engine::error::ResourceLifetimeError;
use crate::engine::scheduler::StageKind;


#[derive(Default, Debug)]
pub struct ScratchPool {
    free: Vec<Vec<Entity>>,
    outstanding: usize,
}

impl ScratchPool {
    pub fn new() -> Self { Self::default() }

    /// Borrows an empty list.
    pub fn take(&mut self) -> Vec<Entity> {
        self.outstanding += 1;
        self.free.pop().unwrap_or_default()
    }

    /// Returns a list obtained from [`ScratchPool::take`].
    pub fn give_back(&mut self, mut list: Vec<Entity>) {
        list.clear();
        self.outstanding = self.outstanding.saturating_sub(1);
        self.free.push(list);
    }

    /// Lists currently checked out.
    #[inline]
    pub fn outstanding(&self) -> usize { self.outstanding }

    /// Checks that every list came back, then resets the count.
    pub fn end_stage(&mut self, stage: StageKind) -> Result<(), ResourceLifetimeError> {
        let outstanding = std::mem::take(&mut self.outstanding);
        if outstanding == 0 {
            Ok(())
        } else {
            Err(ResourceLifetimeError { stage, outstanding })
        }
    }
}
