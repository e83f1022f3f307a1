//! # Component Registry
//!
//! This module assigns stable [`ComponentID`] values to Rust component types
//! and provides the type-erased value wrappers used by templates and deferred
//! commands.
//!
//! ## Design
//! - Any `'static + Send + Sync + Clone` type is a [`Component`]; there is
//!   nothing to derive.
//! - Ids are assigned on first use by [`component_id_of`] and are stable for the
//!   lifetime of the process. The registry is global so that ids agree across
//!   every store, buffer and query.
//! - A component may be flagged as a *state component* with
//!   [`register_state_component`]. State components survive `Store::destroy`
//!   on a husk entity so lifecycle teardown can still observe them.
//!
//! ## Concurrency
//! The registry sits behind an `RwLock`; lookups of already-registered types
//! only take the read lock.

use std::{
    any::{TypeId, type_name},
    collections::HashMap,
    sync::{OnceLock, RwLock},
};

use crate::engine::entity::Entity;
use crate::engine::store::Store;
use crate::engine::types::{ComponentID, Signature, COMPONENT_CAP};


/// Marker trait for component data.
pub trait Component: 'static + Send + Sync + Clone {}

impl<T: 'static + Send + Sync + Clone> Component for T {}

/// Built-in marker that hides an entity from queries that do not ask for it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Disabled;

/// Describes a registered component type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ComponentDesc {
    /// Runtime identifier assigned to this component type.
    pub component_id: ComponentID,

    /// Rust type name for diagnostics.
    pub name: &'static str,

    /// Whether the component outlives `destroy` on a husk entity.
    pub state: bool,
}

impl std::fmt::Display for ComponentDesc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (#{})", self.name, self.component_id)
    }
}

struct ComponentRegistry {
    by_type: HashMap<TypeId, ComponentID>,
    by_id: Vec<ComponentDesc>,
    state: Signature,
}

static REGISTRY: OnceLock<RwLock<ComponentRegistry>> = OnceLock::new();

fn component_registry() -> &'static RwLock<ComponentRegistry> {
    REGISTRY.get_or_init(|| {
        RwLock::new(ComponentRegistry {
            by_type: HashMap::new(),
            by_id: Vec::new(),
            state: Signature::default(),
        })
    })
}

impl ComponentRegistry {
    /// Registers `T` if needed and returns its id.
    ///
    /// ## Panics
    /// Panics if `COMPONENT_CAP` is exceeded.
    fn register<T: 'static>(&mut self) -> ComponentID {
        let type_id = TypeId::of::<T>();
        if let Some(&existing) = self.by_type.get(&type_id) {
            return existing;
        }
        let id = self.by_id.len();
        assert!(id < COMPONENT_CAP, "Exceeded configured component capacity.");
        let id = id as ComponentID;
        self.by_type.insert(type_id, id);
        self.by_id.push(ComponentDesc { component_id: id, name: type_name::<T>(), state: false });
        log::trace!("registered component {} as #{}", type_name::<T>(), id);
        id
    }
}

// A poisoned registry still holds consistent data: every write is a single
// insert that cannot panic halfway.
fn read_registry() -> std::sync::RwLockReadGuard<'static, ComponentRegistry> {
    component_registry().read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_registry() -> std::sync::RwLockWriteGuard<'static, ComponentRegistry> {
    component_registry().write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Returns the `ComponentID` for `T`, registering it on first use.
pub fn component_id_of<T: 'static>() -> ComponentID {
    if let Some(&id) = read_registry().by_type.get(&TypeId::of::<T>()) {
        return id;
    }
    write_registry().register::<T>()
}

/// Registers `T` as a state component and returns its id.
///
/// State components are moved onto a husk entity when their owner is
/// destroyed instead of being dropped with it.
pub fn register_state_component<T: 'static>() -> ComponentID {
    let mut registry = write_registry();
    let id = registry.register::<T>();
    registry.state.set(id);
    registry.by_id[id as usize].state = true;
    id
}

/// Signature of every component registered as a state component.
pub fn state_components() -> Signature {
    read_registry().state
}

/// Returns a copy of the descriptor for `component_id`, if registered.
pub fn component_description(component_id: ComponentID) -> Option<ComponentDesc> {
    read_registry().by_id.get(component_id as usize).copied()
}

/// Type-erased component value, used wherever a component must be carried
/// without its static type: templates, bundles and deferred commands.
pub trait ComponentValue: Send + Sync {
    /// Registered id of the value's type.
    fn component_id(&self) -> ComponentID;

    /// Rust type name of the value.
    fn type_name(&self) -> &'static str;

    /// Boxes a copy of this value.
    fn clone_value(&self) -> Box<dyn ComponentValue>;

    /// Adds the value to `entity`, overwriting an existing one.
    fn add_to(self: Box<Self>, store: &mut Store, entity: Entity) -> bool;

    /// Overwrites an existing value on `entity`; does nothing if absent.
    fn set_on(self: Box<Self>, store: &mut Store, entity: Entity) -> bool;
}

impl<T: Component> ComponentValue for T {
    fn component_id(&self) -> ComponentID { component_id_of::<T>() }

    fn type_name(&self) -> &'static str { type_name::<T>() }

    fn clone_value(&self) -> Box<dyn ComponentValue> { Box::new(self.clone()) }

    fn add_to(self: Box<Self>, store: &mut Store, entity: Entity) -> bool {
        store.add(entity, *self)
    }

    fn set_on(self: Box<Self>, store: &mut Store, entity: Entity) -> bool {
        store.set(entity, *self)
    }
}

/// Heterogeneous set of component values, at most one per type.
#[derive(Default)]
pub struct Bundle {
    signature: Signature,
    values: Vec<Box<dyn ComponentValue>>,
}

impl Bundle {
    #[inline]
    pub fn new() -> Self { Self::default() }

    /// Adds `value`, replacing a previous value of the same type.
    pub fn with<T: Component>(mut self, value: T) -> Self {
        self.insert(value);
        self
    }

    /// Inserts `value`, replacing a previous value of the same type.
    pub fn insert<T: Component>(&mut self, value: T) {
        let component_id = component_id_of::<T>();
        if self.signature.has(component_id) {
            self.values.retain(|v| v.as_ref().component_id() != component_id);
        }
        self.signature.set(component_id);
        self.values.push(Box::new(value));
    }

    /// Component presence signature.
    #[inline]
    pub fn signature(&self) -> Signature { self.signature }

    #[inline]
    pub fn len(&self) -> usize { self.values.len() }

    #[inline]
    pub fn is_empty(&self) -> bool { self.values.is_empty() }

    /// Names of the carried component types.
    pub fn type_names(&self) -> Vec<&'static str> {
        self.values.iter().map(|v| v.as_ref().type_name()).collect()
    }

    /// Adds every value of the bundle to `entity`.
    pub fn add_to(self, store: &mut Store, entity: Entity) {
        for value in self.values {
            value.add_to(store, entity);
        }
    }
}

impl Clone for Bundle {
    fn clone(&self) -> Self {
        Self {
            signature: self.signature,
            values: self.values.iter().map(|v| v.as_ref().clone_value()).collect(),
        }
    }
}
