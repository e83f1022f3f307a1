//! Query construction and the query engine.
//!
//! This module provides a *builder-style* API for component filters and the
//! evaluation operations that run them against a [`Store`].
//!
//! ## Filter semantics
//! * `with::<T>()`: `T` must be present (`All`, intersection).
//! * `without::<T>()`: `T` must be absent (`None`, exclusion).
//! * `any::<T>()`: at least one of the `any` types must be present.
//!
//! All three combine on one query. Entities carrying the built-in
//! [`Disabled`] marker never match unless the query names `Disabled` in one of
//! its sets or opts in with [`QueryBuilder::include_disabled`].
//!
//! ## Execution model
//! A [`Query`] owns no data and caches nothing. Every evaluation reads the
//! store as it is at that moment; [`Store::matching`] returns a fresh lazy
//! iterator per call.
//!
//! Evaluation is driven by the smallest column named in `All` when there is
//! one, and by a scan of the entity table otherwise; each candidate is then
//! tested against the full signature.

use rayon::prelude::*;

use crate::engine::component::{Component, Disabled, component_description, component_id_of};
use crate::engine::entity::Entity;
use crate::engine::error::CardinalityError;
use crate::engine::store::Store;
use crate::engine::types::{ComponentID, IndexID, QuerySignature};


/// Builder for [`Query`] values.
///
/// ## Example
/// ```ignore
/// let live_rocks = Query::builder()
///     .with::<Asteroid>()
///     .without::<Bullet>()
///     .build();
/// let n = store.count(&live_rocks);
/// ```
#[derive(Clone, Debug, Default)]
pub struct QueryBuilder {
    signature: QuerySignature,
}

impl QueryBuilder {
    pub fn new() -> Self { Self::default() }

    /// Requires `T` to be present.
    pub fn with<T: Component>(self) -> Self {
        self.with_id(component_id_of::<T>())
    }

    /// Requires `T` to be absent.
    pub fn without<T: Component>(self) -> Self {
        self.without_id(component_id_of::<T>())
    }

    /// Adds `T` to the at-least-one-of set.
    pub fn any<T: Component>(self) -> Self {
        self.any_id(component_id_of::<T>())
    }

    pub fn with_id(mut self, component_id: ComponentID) -> Self {
        self.signature.all.set(component_id);
        self
    }

    pub fn without_id(mut self, component_id: ComponentID) -> Self {
        self.signature.none.set(component_id);
        self
    }

    pub fn any_id(mut self, component_id: ComponentID) -> Self {
        self.signature.any.set(component_id);
        self
    }

    /// Makes disabled entities visible to the query.
    pub fn include_disabled(mut self) -> Self {
        self.signature.include_disabled = true;
        self
    }

    /// Finalizes the filter.
    pub fn build(mut self) -> Query {
        if self.signature.mentions(component_id_of::<Disabled>()) {
            self.signature.include_disabled = true;
        }
        Query { signature: self.signature }
    }
}

/// Immutable All/None/Any component filter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Query {
    signature: QuerySignature,
}

impl Query {
    /// Starts a new builder.
    #[inline]
    pub fn builder() -> QueryBuilder { QueryBuilder::new() }

    /// Shorthand for `All = {T}`.
    pub fn of<T: Component>() -> Self {
        Self::builder().with::<T>().build()
    }

    #[inline]
    pub fn signature(&self) -> &QuerySignature { &self.signature }
}

impl Store {
    /// Candidate slots for `query`: the owners of its smallest `All` column,
    /// or `None` to request a full scan.
    fn driving_slots(&self, query: &Query) -> Option<&[IndexID]> {
        let mut best: Option<&[IndexID]> = None;
        for component_id in query.signature.all.iterate_over_components() {
            // A missing column means no entity can match.
            let slots = match self.column_dyn(component_id) {
                Some(column) => column.slots(),
                None => return Some(&[]),
            };
            if best.map_or(true, |b| slots.len() < b.len()) {
                best = Some(slots);
            }
        }
        best
    }

    /// Lazily yields every live entity matching `query`.
    ///
    /// Each call starts a new evaluation against the current store.
    pub fn matching<'s>(&'s self, query: &'s Query) -> impl Iterator<Item = Entity> + 's {
        let entities = self.entities();
        let disabled = self.disabled_id();
        let candidates: Box<dyn Iterator<Item = usize> + 's> = match self.driving_slots(query) {
            Some(slots) => Box::new(slots.iter().map(|&s| s as usize)),
            None => Box::new(0..entities.capacity()),
        };
        candidates.filter_map(move |slot| {
            let (entity, signature) = entities.slot(slot)?;
            query.signature.matches(signature, disabled).then_some(entity)
        })
    }

    /// Number of entities matching `query`.
    pub fn count(&self, query: &Query) -> usize {
        self.matching(query).count()
    }

    /// Calls `f` once per matching entity.
    pub fn for_each<F: FnMut(Entity)>(&self, query: &Query, f: F) {
        self.matching(query).for_each(f)
    }

    /// Appends every matching entity to `out`.
    pub fn collect_into(&self, query: &Query, out: &mut Vec<Entity>) {
        out.extend(self.matching(query));
    }

    /// Calls `f` with a mutable `T` for every matching entity that carries `T`.
    ///
    /// ## Semantics
    /// Only component values change; the entity set cannot, so the iteration
    /// is never invalidated.
    pub fn for_each_mut<T, F>(&mut self, query: &Query, mut f: F)
    where
        T: Component,
        F: FnMut(Entity, &mut T),
    {
        let disabled = self.disabled_id();
        let (entities, column) = self.split_column_mut::<T>();
        let Some(column) = column else { return };
        for (slot, value) in column.iter_mut() {
            if let Some((entity, signature)) = entities.slot(slot as usize) {
                if query.signature.matches(signature, disabled) {
                    f(entity, value);
                }
            }
        }
    }

    /// Parallel variant of [`Store::for_each_mut`] over the `T` column.
    pub fn par_for_each_mut<T, F>(&mut self, query: &Query, f: F)
    where
        T: Component,
        F: Fn(Entity, &mut T) + Send + Sync,
    {
        let disabled = self.disabled_id();
        let (entities, column) = self.split_column_mut::<T>();
        let Some(column) = column else { return };
        column.par_iter_mut().for_each(|(slot, value)| {
            if let Some((entity, signature)) = entities.slot(slot as usize) {
                if query.signature.matches(signature, disabled) {
                    f(entity, value);
                }
            }
        });
    }

    /// Returns the single `T` in the store.
    ///
    /// ## Errors
    /// `CardinalityError` when `All = {T}` matches zero or several entities.
    /// Guard with `count(&Query::of::<T>()) == 1` in ticks where presence is
    /// not guaranteed.
    pub fn singleton<T: Component>(&self) -> Result<&T, CardinalityError> {
        let entity = self.singleton_entity(&Query::of::<T>())?;
        self.get::<T>(entity).ok_or(CardinalityError {
            component: std::any::type_name::<T>(),
            matched: 0,
        })
    }

    /// Returns the single entity matching `query`.
    pub fn singleton_entity(&self, query: &Query) -> Result<Entity, CardinalityError> {
        let mut it = self.matching(query);
        match (it.next(), it.next()) {
            (Some(entity), None) => Ok(entity),
            (first, _) => {
                let matched = first.map_or(0, |_| 2 + it.count());
                let component = query
                    .signature
                    .all
                    .iterate_over_components()
                    .next()
                    .and_then(component_description)
                    .map_or("<query>", |d| d.name);
                Err(CardinalityError { component, matched })
            }
        }
    }
}
