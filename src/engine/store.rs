//! Entity and component store.
//!
//! [`Store`] owns every entity and all component data. It is the single place
//! where structural changes happen: command playback and setup code call into
//! it directly, while systems only ever see it through [`StoreRef`], which
//! exposes reads and in-place writes to components that are already present.
//!
//! ## Layout
//! * [`Entities`] tracks slot liveness, generations and per-entity signatures.
//! * One [`Column<T>`] per component type, indexed by [`ComponentID`], holds
//!   the values. Columns are created lazily on first insert.
//! * A [`TemplateRegistry`] resolves template ids for `create_from` and
//!   `instantiate`.
//!
//! ## Invariants
//! * `signature(e).has(c)` iff column `c` holds a value for `e.index()`.
//! * Removing the last component of an entity frees the entity.
//! * After `destroy(e)` every lookup through `e` reports absence, whether or
//!   not state components were carried over to a husk.
//!
//! ## State components and husks
//! Components registered with
//! [`register_state_component`](crate::engine::component::register_state_component)
//! outlive `destroy`: the handle is freed immediately, and the state values
//! are moved onto a fresh *husk* entity that carries nothing else. Lifecycle
//! teardown observes the husk, removes the state, and the husk is freed with
//! its last component.

use std::ops::Deref;

use crate::engine::component::{Bundle, Component, Disabled, component_id_of, state_components};
use crate::engine::entity::{Entities, Entity};
use crate::engine::error::ECSResult;
use crate::engine::storage::{Column, TypeErasedColumn};
use crate::engine::template::{Template, TemplateId, TemplateRegistry};
use crate::engine::types::{ComponentID, Signature};


/// Owner of all entities and component data.
pub struct Store {
    entities: Entities,
    columns: Vec<Option<Box<dyn TypeErasedColumn>>>,
    templates: TemplateRegistry,
    disabled: ComponentID,
}

impl Default for Store {
    fn default() -> Self { Self::new() }
}

impl Store {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            entities: Entities::new(),
            columns: Vec::new(),
            templates: TemplateRegistry::new(),
            disabled: component_id_of::<Disabled>(),
        }
    }

    // ---------------------------------------------------------------------
    // Templates
    // ---------------------------------------------------------------------

    /// Registers a template and returns its id.
    pub fn register_template(&mut self, template: Template) -> TemplateId {
        self.templates.register(template)
    }

    #[inline]
    pub fn templates(&self) -> &TemplateRegistry { &self.templates }

    // ---------------------------------------------------------------------
    // Entity lifetime
    // ---------------------------------------------------------------------

    /// Creates an entity with no components.
    pub fn create(&mut self) -> Entity {
        self.entities.spawn()
    }

    /// Creates an entity carrying a copy of every component in `bundle`.
    pub fn create_with(&mut self, bundle: Bundle) -> Entity {
        let entity = self.entities.spawn();
        bundle.add_to(self, entity);
        entity
    }

    /// Creates one entity from a registered template.
    ///
    /// ## Errors
    /// Returns `UnknownTemplate` if `template` is not registered; nothing is
    /// created in that case.
    pub fn create_from(&mut self, template: TemplateId) -> ECSResult<Entity> {
        let bundle = self.templates.get(template)?.bundle().clone();
        Ok(self.create_with(bundle))
    }

    /// Creates `count` entities from one template.
    pub fn instantiate(&mut self, template: TemplateId, count: usize) -> ECSResult<Vec<Entity>> {
        let bundle = self.templates.get(template)?.bundle().clone();
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            out.push(self.create_with(bundle.clone()));
        }
        Ok(out)
    }

    /// Destroys `entity`.
    ///
    /// ## Semantics
    /// * The handle is invalidated immediately; returns `false` if it already was.
    /// * If the entity carries state components alongside other data, the
    ///   state components move to a new husk entity.
    /// * An entity that carries nothing but state components is freed outright.
    pub fn destroy(&mut self, entity: Entity) -> bool {
        let Some(signature) = self.entities.signature(entity).copied() else {
            return false;
        };

        let state = intersection(&signature, &state_components());
        let husk_needed = !state.is_empty() && state != signature;

        if husk_needed {
            let husk = self.entities.spawn();
            for component_id in state.iterate_over_components() {
                let moved = match self.column_dyn_mut(component_id) {
                    Some(column) => column.move_row(entity.index(), husk.index()),
                    None => false,
                };
                debug_assert!(moved, "signature and column disagree on state component #{component_id}");
                if moved {
                    if let Some(sig) = self.entities.signature_mut(husk) {
                        sig.set(component_id);
                    }
                }
            }
            if cfg!(not(debug_assertions)) && self.entities.signature(husk).is_some_and(|s| s.is_empty()) {
                self.entities.despawn(husk);
            }
            log::trace!("destroy {entity}: state carried to husk {husk}");
        }

        for component_id in signature.iterate_over_components() {
            if husk_needed && state.has(component_id) {
                continue;
            }
            if let Some(column) = self.column_dyn_mut(component_id) {
                column.remove_dyn(entity.index());
            }
        }
        self.entities.despawn(entity)
    }

    #[inline]
    pub fn is_alive(&self, entity: Entity) -> bool { self.entities.is_alive(entity) }

    /// Number of live entities, husks included.
    #[inline]
    pub fn len(&self) -> usize { self.entities.len() }

    #[inline]
    pub fn is_empty(&self) -> bool { self.entities.is_empty() }

    // ---------------------------------------------------------------------
    // Component access
    // ---------------------------------------------------------------------

    /// Returns the `T` attached to `entity`, if any.
    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        if !self.entities.is_alive(entity) {
            return None;
        }
        self.column::<T>()?.get(entity.index())
    }

    /// Mutable access to an existing `T`.
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        if !self.entities.is_alive(entity) {
            return None;
        }
        self.column_mut::<T>()?.get_mut(entity.index())
    }

    /// Overwrites an existing `T`. Returns `false` (and changes nothing) if
    /// the entity is stale or does not carry `T`.
    pub fn set<T: Component>(&mut self, entity: Entity, value: T) -> bool {
        match self.get_mut::<T>(entity) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Attaches `value`, overwriting a previous `T`. Returns `false` for
    /// stale handles.
    pub fn add<T: Component>(&mut self, entity: Entity, value: T) -> bool {
        if !self.entities.is_alive(entity) {
            return false;
        }
        let component_id = component_id_of::<T>();
        self.column_or_insert::<T>(component_id).insert(entity.index(), value);
        if let Some(signature) = self.entities.signature_mut(entity) {
            signature.set(component_id);
        }
        true
    }

    /// Detaches `T`. Returns `false` if it was not present.
    pub fn remove<T: Component>(&mut self, entity: Entity) -> bool {
        self.remove_component(entity, component_id_of::<T>())
    }

    /// Detaches the component with `component_id`.
    ///
    /// ## Semantics
    /// Removing the last component of an entity destroys the entity.
    pub fn remove_component(&mut self, entity: Entity, component_id: ComponentID) -> bool {
        let Some(signature) = self.entities.signature_mut(entity) else {
            return false;
        };
        if !signature.has(component_id) {
            return false;
        }
        signature.clear(component_id);
        let now_empty = signature.is_empty();

        if let Some(column) = self.column_dyn_mut(component_id) {
            column.remove_dyn(entity.index());
        }
        if now_empty {
            log::trace!("{entity} lost its last component; freeing");
            self.entities.despawn(entity);
        }
        true
    }

    /// Returns `true` if `entity` is live and carries `T`.
    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.has_component(entity, component_id_of::<T>())
    }

    pub fn has_component(&self, entity: Entity, component_id: ComponentID) -> bool {
        self.entities
            .signature(entity)
            .is_some_and(|s| s.has(component_id))
    }

    /// Component signature of a live entity.
    #[inline]
    pub fn signature(&self, entity: Entity) -> Option<&Signature> {
        self.entities.signature(entity)
    }

    // ---------------------------------------------------------------------
    // Internals shared with the query engine
    // ---------------------------------------------------------------------

    #[inline]
    pub(crate) fn entities(&self) -> &Entities { &self.entities }

    /// Id of the built-in `Disabled` marker.
    #[inline]
    pub(crate) fn disabled_id(&self) -> ComponentID { self.disabled }

    pub(crate) fn column_dyn(&self, component_id: ComponentID) -> Option<&dyn TypeErasedColumn> {
        self.columns.get(component_id as usize)?.as_deref()
    }

    fn column_dyn_mut(&mut self, component_id: ComponentID) -> Option<&mut (dyn TypeErasedColumn + 'static)> {
        self.columns.get_mut(component_id as usize)?.as_deref_mut()
    }

    pub(crate) fn column<T: Component>(&self) -> Option<&Column<T>> {
        self.column_dyn(component_id_of::<T>())?
            .as_any()
            .downcast_ref::<Column<T>>()
    }

    fn column_mut<T: Component>(&mut self) -> Option<&mut Column<T>> {
        self.column_dyn_mut(component_id_of::<T>())?
            .as_any_mut()
            .downcast_mut::<Column<T>>()
    }

    /// Splits the store into the entity table and one mutable column.
    pub(crate) fn split_column_mut<T: Component>(&mut self) -> (&Entities, Option<&mut Column<T>>) {
        let component_id = component_id_of::<T>();
        let column = self
            .columns
            .get_mut(component_id as usize)
            .and_then(|c| c.as_deref_mut())
            .and_then(|c| c.as_any_mut().downcast_mut::<Column<T>>());
        (&self.entities, column)
    }

    fn column_or_insert<T: Component>(&mut self, component_id: ComponentID) -> &mut Column<T> {
        let index = component_id as usize;
        if index >= self.columns.len() {
            self.columns.resize_with(index + 1, || None);
        }
        let slot = &mut self.columns[index];
        let column = slot.get_or_insert_with(|| Box::new(Column::<T>::default()) as Box<dyn TypeErasedColumn>);
        match column.as_any_mut().downcast_mut::<Column<T>>() {
            Some(column) => column,
            None => unreachable!("component id #{component_id} bound to two different types"),
        }
    }
}

fn intersection(a: &Signature, b: &Signature) -> Signature {
    let mut out = *a;
    for (word, other) in out.components.iter_mut().zip(b.components.iter()) {
        *word &= other;
    }
    out
}

/// Non-structural view of a [`Store`] handed to systems.
///
/// Dereferences to `&Store` for reads. Mutation is limited to components that
/// are already present; anything that would change an entity's component set
/// must be recorded on the stage's command buffer instead.
pub struct StoreRef<'a> {
    store: &'a mut Store,
}

impl<'a> StoreRef<'a> {
    pub fn new(store: &'a mut Store) -> Self { Self { store } }

    /// Mutable access to an existing `T`.
    #[inline]
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.store.get_mut(entity)
    }

    /// Overwrites an existing `T`; see [`Store::set`].
    #[inline]
    pub fn set<T: Component>(&mut self, entity: Entity, value: T) -> bool {
        self.store.set(entity, value)
    }

    /// See [`Store::for_each_mut`].
    pub fn for_each_mut<T, F>(&mut self, query: &crate::engine::query::Query, f: F)
    where
        T: Component,
        F: FnMut(Entity, &mut T),
    {
        self.store.for_each_mut(query, f)
    }

    /// See [`Store::par_for_each_mut`].
    pub fn par_for_each_mut<T, F>(&mut self, query: &crate::engine::query::Query, f: F)
    where
        T: Component,
        F: Fn(Entity, &mut T) + Send + Sync,
    {
        self.store.par_for_each_mut(query, f)
    }
}

impl Deref for StoreRef<'_> {
    type Target = Store;

    fn deref(&self) -> &Store { self.store }
}
