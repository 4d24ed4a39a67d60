//! The resolved module list and its installation into a binder.

use std::any::Any;
use std::sync::Arc;

use crate::class::ModuleInstance;
use crate::contracts::{Binder, Module};
use crate::error::ResolveError;
use crate::identity::ModuleId;

/// How a module ended up in the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Named by the caller.
    Explicit,
    /// Discovered as a direct dependency of `of`.
    Dependency { of: ModuleId },
}

impl Origin {
    /// The module that requested this one, if it was discovered as a dependency.
    pub fn dependent(&self) -> Option<ModuleId> {
        match self {
            Origin::Explicit => None,
            Origin::Dependency { of } => Some(*of),
        }
    }
}

/// One entry of a [`ModuleList`].
#[derive(Debug, Clone)]
pub struct ResolvedModule {
    instance: ModuleInstance,
    name: &'static str,
    origin: Origin,
    replaced: Option<ModuleId>,
}

impl ResolvedModule {
    pub(crate) fn new(
        instance: ModuleInstance,
        name: &'static str,
        origin: Origin,
        replaced: Option<ModuleId>,
    ) -> Self {
        Self {
            instance,
            name,
            origin,
            replaced,
        }
    }

    pub fn id(&self) -> ModuleId {
        self.instance.id()
    }

    /// Catalog name, or the short type name for unregistered instances.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// The identity this module stands in for, if it was reached through a replacement.
    pub fn replaced(&self) -> Option<ModuleId> {
        self.replaced
    }

    pub fn instance(&self) -> &ModuleInstance {
        &self.instance
    }

    pub fn module(&self) -> &Arc<dyn Module> {
        self.instance.module()
    }

    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.instance.downcast::<T>()
    }
}

/// Ordered, duplicate-free list of modules: dependencies before dependents.
#[derive(Debug, Clone, Default)]
pub struct ModuleList {
    modules: Vec<ResolvedModule>,
}

impl ModuleList {
    pub(crate) fn new(modules: Vec<ResolvedModule>) -> Self {
        Self { modules }
    }

    pub fn ids(&self) -> Vec<ModuleId> {
        self.modules.iter().map(ResolvedModule::id).collect()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.modules.iter().map(ResolvedModule::name).collect()
    }

    pub fn position(&self, id: ModuleId) -> Option<usize> {
        self.modules.iter().position(|m| m.id() == id)
    }

    pub fn contains(&self, id: ModuleId) -> bool {
        self.position(id).is_some()
    }

    pub fn get(&self, id: ModuleId) -> Option<&ResolvedModule> {
        self.modules.iter().find(|m| m.id() == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResolvedModule> {
        self.modules.iter()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn into_modules(self) -> Vec<ResolvedModule> {
        self.modules
    }

    /// Configure every module into `binder`, in list order. Stops at the first failure.
    pub fn install(&self, binder: &mut dyn Binder) -> Result<(), ResolveError> {
        for m in &self.modules {
            tracing::debug!(module = m.name(), "Installing module");
            m.module()
                .configure(binder)
                .map_err(|source| ResolveError::Configure {
                    module: m.name(),
                    source,
                })?;
        }
        tracing::info!(count = self.modules.len(), "Modules installed");
        Ok(())
    }
}

impl IntoIterator for ModuleList {
    type Item = ResolvedModule;
    type IntoIter = std::vec::IntoIter<ResolvedModule>;

    fn into_iter(self) -> Self::IntoIter {
        self.modules.into_iter()
    }
}

impl<'a> IntoIterator for &'a ModuleList {
    type Item = &'a ResolvedModule;
    type IntoIter = std::slice::Iter<'a, ResolvedModule>;

    fn into_iter(self) -> Self::IntoIter {
        self.modules.iter()
    }
}
