//! Template (prefab) registry.
//!
//! A [`Template`] is a named, pre-built component set. `Instantiate` clones it
//! onto freshly created entities. The registry only resolves ids; populating
//! it is the caller's business.

use std::fmt;

use crate::engine::component::{Bundle, Component};
use crate::engine::error::UnknownTemplateError;


/// Opaque handle to a registered template.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TemplateId(pub(crate) u32);

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "template#{}", self.0)
    }
}

/// Pre-built component set used by `Instantiate`.
#[derive(Clone)]
pub struct Template {
    name: String,
    bundle: Bundle,
}

impl Template {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), bundle: Bundle::new() }
    }

    /// Adds a component value to the template.
    pub fn with<T: Component>(mut self, value: T) -> Self {
        self.bundle.insert(value);
        self
    }

    #[inline]
    pub fn name(&self) -> &str { &self.name }

    #[inline]
    pub fn bundle(&self) -> &Bundle { &self.bundle }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("name", &self.name)
            .field("components", &self.bundle.type_names())
            .finish()
    }
}

/// Append-only id to template map.
#[derive(Default, Debug)]
pub struct TemplateRegistry {
    templates: Vec<Template>,
}

impl TemplateRegistry {
    pub fn new() -> Self { Self::default() }

    /// Registers `template` and returns its id. Ids are never reused.
    pub fn register(&mut self, template: Template) -> TemplateId {
        let id = TemplateId(self.templates.len() as u32);
        log::debug!("registered {} as {}", template.name(), id);
        self.templates.push(template);
        id
    }

    /// Resolves `id`.
    pub fn get(&self, id: TemplateId) -> Result<&Template, UnknownTemplateError> {
        self.templates.get(id.0 as usize).ok_or(UnknownTemplateError(id))
    }

    /// Finds a template by name.
    pub fn find(&self, name: &str) -> Option<TemplateId> {
        self.templates
            .iter()
            .position(|t| t.name() == name)
            .map(|i| TemplateId(i as u32))
    }

    #[inline]
    pub fn len(&self) -> usize { self.templates.len() }

    #[inline]
    pub fn is_empty(&self) -> bool { self.templates.is_empty() }
}
