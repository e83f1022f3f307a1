//! Per-component column storage and type-erased access.
//!
//! Each component type is stored in its own [`Column<T>`], a sparse set keyed
//! by entity slot index:
//!
//! ```text
//! sparse: [slot] -> dense row (or VACANT)
//! dense:  [row]  -> T
//! owners: [row]  -> slot
//! ```
//!
//! Insert, lookup and remove are `O(1)`. Removal swap-removes the dense row and
//! patches the sparse entry of the element that moved, so rows stay packed and
//! iteration touches only present values. Row order is not stable.
//!
//! [`TypeErasedColumn`] lets the store hold heterogeneous columns behind
//! `Box<dyn TypeErasedColumn>` and perform the structural operations that do
//! not need the element type: removal, moving a row between slots, and
//! listing occupied slots.

use std::any::Any;

use rayon::prelude::*;

use crate::engine::types::IndexID;


const VACANT: u32 = u32::MAX;

/// Dense sparse-set column for component type `T`.
pub struct Column<T> {
    sparse: Vec<u32>,
    dense: Vec<T>,
    owners: Vec<IndexID>,
}

impl<T> Default for Column<T> {
    fn default() -> Self {
        Self { sparse: Vec::new(), dense: Vec::new(), owners: Vec::new() }
    }
}

impl<T: 'static + Send + Sync> Column<T> {
    #[inline]
    fn row_of(&self, slot: IndexID) -> Option<usize> {
        match self.sparse.get(slot as usize) {
            Some(&row) if row != VACANT => Some(row as usize),
            _ => None,
        }
    }

    /// Inserts or overwrites the value for `slot`, returning the previous value.
    pub fn insert(&mut self, slot: IndexID, value: T) -> Option<T> {
        if let Some(row) = self.row_of(slot) {
            return Some(std::mem::replace(&mut self.dense[row], value));
        }
        let s = slot as usize;
        if s >= self.sparse.len() {
            self.sparse.resize(s + 1, VACANT);
        }
        self.sparse[s] = self.dense.len() as u32;
        self.dense.push(value);
        self.owners.push(slot);
        None
    }

    /// Removes and returns the value stored for `slot`.
    pub fn remove(&mut self, slot: IndexID) -> Option<T> {
        let row = self.row_of(slot)?;
        let last = self.dense.len() - 1;
        if row != last {
            let moved_owner = self.owners[last];
            self.sparse[moved_owner as usize] = row as u32;
        }
        self.sparse[slot as usize] = VACANT;
        self.owners.swap_remove(row);
        Some(self.dense.swap_remove(row))
    }

    #[inline]
    pub fn get(&self, slot: IndexID) -> Option<&T> {
        self.row_of(slot).map(|row| &self.dense[row])
    }

    #[inline]
    pub fn get_mut(&mut self, slot: IndexID) -> Option<&mut T> {
        self.row_of(slot).map(move |row| &mut self.dense[row])
    }

    /// Iterates `(slot, value)` pairs in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (IndexID, &T)> + '_ {
        self.owners.iter().copied().zip(self.dense.iter())
    }

    /// Iterates `(slot, &mut value)` pairs in dense order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (IndexID, &mut T)> + '_ {
        self.owners.iter().copied().zip(self.dense.iter_mut())
    }

    /// Parallel variant of [`Column::iter_mut`].
    pub fn par_iter_mut(&mut self) -> impl ParallelIterator<Item = (IndexID, &mut T)> + '_ {
        self.owners.par_iter().copied().zip(self.dense.par_iter_mut())
    }
}

/// Structural operations available without knowing the element type.
pub trait TypeErasedColumn: Any + Send + Sync {
    /// Drops the value for `slot`. Returns `false` if there was none.
    fn remove_dyn(&mut self, slot: IndexID) -> bool;

    /// Moves the value of `from` to `to`, overwriting any value at `to`.
    fn move_row(&mut self, from: IndexID, to: IndexID) -> bool;

    /// Slots that currently hold a value, in dense order.
    fn slots(&self) -> &[IndexID];

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: 'static + Send + Sync> TypeErasedColumn for Column<T> {
    fn remove_dyn(&mut self, slot: IndexID) -> bool { self.remove(slot).is_some() }

    fn move_row(&mut self, from: IndexID, to: IndexID) -> bool {
        match self.remove(from) {
            Some(value) => {
                self.insert(to, value);
                true
            }
            None => false,
        }
    }

    fn slots(&self) -> &[IndexID] { &self.owners }

    fn as_any(&self) -> &dyn Any { self }
    fn as_any_mut(&mut self) -> &mut dyn Any { self }
}
