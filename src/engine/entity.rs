//! Generational entity handles and slot allocation.
//!
//! An [`Entity`] is an opaque `(index, generation)` pair. [`Entities`] owns
//! the slot table: which indices are live, their current generation, and the
//! component [`Signature`] of every live slot. Component data itself lives in
//! the store's columns.
//!
//! ## Invariants
//! * A freed slot's generation is bumped once before reuse, so a retained
//!   handle to a freed entity can never match the slot's next occupant. The
//!   bump never wraps.
//! * Freed indices are reused LIFO. A slot whose generation is exhausted is
//!   retired instead of reused.
//! * `signatures[i]` is meaningful only while `alive[i]` is set; it is reset
//!   to empty on free.

use std::fmt;

use crate::engine::types::{
    EntityID, IndexID, GenerationID, Signature,
    INDEX_BITS, INDEX_MASK,
};


/// Opaque handle to an entity.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity(EntityID);

#[inline]
const fn make_id(index: IndexID, generation: GenerationID) -> EntityID {
    ((generation as EntityID) << INDEX_BITS) | (index as EntityID)
}

#[inline]
const fn split_entity(entity: Entity) -> (IndexID, GenerationID) {
    let id = entity.0;
    let index = (id & INDEX_MASK) as IndexID;
    let generation = (id >> INDEX_BITS) as GenerationID;
    (index, generation)
}

impl Entity {
    /// Builds a handle from its parts.
    #[inline]
    pub const fn from_parts(index: IndexID, generation: GenerationID) -> Self {
        Entity(make_id(index, generation))
    }

    #[inline] pub fn index(self) -> IndexID { split_entity(self).0 }
    #[inline] pub fn generation(self) -> GenerationID { split_entity(self).1 }

    /// Raw packed representation.
    #[inline] pub fn to_bits(self) -> EntityID { self.0 }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}v{})", self.index(), self.generation())
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index(), self.generation())
    }
}

/// Slot table for all entities of one store.
#[derive(Default)]
pub struct Entities {
    generations: Vec<GenerationID>,
    free_store: Vec<IndexID>,
    alive: Vec<bool>,
    signatures: Vec<Signature>,
    live: usize,
}

impl Entities {
    pub fn new() -> Self { Self::default() }

    /// Allocates a slot, reusing the most recently freed index first.
    pub fn spawn(&mut self) -> Entity {
        let index = match self.free_store.pop() {
            Some(i) => i,
            None => {
                let i = self.generations.len() as IndexID;
                self.generations.push(0);
                self.alive.push(false);
                self.signatures.push(Signature::default());
                i
            }
        };

        let slot = index as usize;
        self.alive[slot] = true;
        self.signatures[slot] = Signature::default();
        self.live += 1;

        Entity::from_parts(index, self.generations[slot])
    }

    /// Frees the slot behind `entity`. Returns `false` for stale handles.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        let i = entity.index();
        let slot = i as usize;
        self.alive[slot] = false;
        self.signatures[slot] = Signature::default();
        self.live -= 1;
        match self.generations[slot].checked_add(1) {
            Some(next) => {
                self.generations[slot] = next;
                self.free_store.push(i);
            }
            None => log::debug!("slot {i} exhausted its generations; retiring it"),
        }
        true
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        let (i, g) = split_entity(entity);
        let slot = i as usize;
        slot < self.generations.len()
            && self.alive[slot]
            && self.generations[slot] == g
    }

    /// Signature of a live entity.
    pub fn signature(&self, entity: Entity) -> Option<&Signature> {
        if self.is_alive(entity) {
            Some(&self.signatures[entity.index() as usize])
        } else {
            None
        }
    }

    pub fn signature_mut(&mut self, entity: Entity) -> Option<&mut Signature> {
        if self.is_alive(entity) {
            Some(&mut self.signatures[entity.index() as usize])
        } else {
            None
        }
    }

    /// Number of live entities.
    #[inline]
    pub fn len(&self) -> usize { self.live }

    #[inline]
    pub fn is_empty(&self) -> bool { self.live == 0 }

    /// Number of allocated slots, live or free.
    #[inline]
    pub fn capacity(&self) -> usize { self.generations.len() }

    /// Handle and signature of the live entity at `slot`, if any.
    #[inline]
    pub fn slot(&self, slot: usize) -> Option<(Entity, &Signature)> {
        if *self.alive.get(slot)? {
            Some((
                Entity::from_parts(slot as IndexID, self.generations[slot]),
                &self.signatures[slot],
            ))
        } else {
            None
        }
    }

    /// Iterates live entities in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &Signature)> + '_ {
        (0..self.generations.len()).filter_map(move |slot| self.slot(slot))
    }
}
