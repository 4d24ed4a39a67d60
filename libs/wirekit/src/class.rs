//! Module classes, live module instances and the construction context.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use anyhow::{anyhow, bail};

use crate::contracts::{Injectable, Module, ServiceProvider};
use crate::identity::{ModuleId, ParamType};
use crate::registry::ModuleCatalog;

/// Where the direct dependencies of a module class come from.
///
/// Fixed once per class at registration time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencySource {
    /// Explicit list attached to the class (`#[module(include = [...])]`).
    /// When present, the constructor is not inspected.
    Static(Vec<ModuleId>),
    /// Parameter types of the designated constructor; only those that are module
    /// types become dependencies.
    Constructor(Vec<ParamType>),
}

impl DependencySource {
    pub fn is_constructor(&self) -> bool {
        matches!(self, DependencySource::Constructor(_))
    }
}

/// Builds a fresh instance of a module class.
pub type Factory =
    Arc<dyn Fn(&ConstructCtx<'_>) -> anyhow::Result<ModuleInstance> + Send + Sync>;

/// Registered metadata of a module type: identity, name, dependency source and factory.
#[derive(Clone)]
pub struct ModuleClass {
    id: ModuleId,
    name: &'static str,
    dependencies: DependencySource,
    factory: Factory,
}

impl fmt::Debug for ModuleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleClass")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("dependencies", &self.dependencies)
            .finish()
    }
}

impl ModuleClass {
    /// Class with a zero-parameter constructor.
    pub fn new<M, F>(name: &'static str, factory: F) -> Self
    where
        M: Module,
        F: Fn(&ConstructCtx<'_>) -> anyhow::Result<M> + Send + Sync + 'static,
    {
        Self {
            id: ModuleId::of::<M>(),
            name,
            dependencies: DependencySource::Constructor(Vec::new()),
            factory: Arc::new(move |ctx| factory(ctx).map(ModuleInstance::new)),
        }
    }

    pub fn of_default<M: Module + Default>(name: &'static str) -> Self {
        Self::new::<M, _>(name, |_| Ok(M::default()))
    }

    /// Class built through its designated injectable constructor.
    pub fn injectable<M: Module + Injectable>(name: &'static str) -> Self {
        let mut class = Self::new::<M, _>(name, M::construct);
        class.dependencies = DependencySource::Constructor(M::constructor_params());
        class
    }

    /// Attach a static dependency list; it takes precedence over constructor inspection.
    pub fn with_static_dependencies(mut self, deps: impl IntoIterator<Item = ModuleId>) -> Self {
        self.dependencies = DependencySource::Static(deps.into_iter().collect());
        self
    }

    pub fn id(&self) -> ModuleId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn dependencies(&self) -> &DependencySource {
        &self.dependencies
    }

    pub(crate) fn instantiate(&self, ctx: &ConstructCtx<'_>) -> anyhow::Result<ModuleInstance> {
        let instance = (self.factory)(ctx)?;
        if instance.id() != self.id {
            bail!(
                "factory of '{}' produced an instance of '{}'",
                self.id,
                instance.id()
            );
        }
        Ok(instance)
    }
}

/// A live module value.
///
/// Holds the module both as a trait object and as `Any` over the same
/// allocation, so callers can get the concrete `Arc<T>` back.
#[derive(Clone)]
pub struct ModuleInstance {
    id: ModuleId,
    module: Arc<dyn Module>,
    any: Arc<dyn Any + Send + Sync>,
}

impl fmt::Debug for ModuleInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ModuleInstance").field(&self.id).finish()
    }
}

impl ModuleInstance {
    pub fn new<M: Module>(module: M) -> Self {
        Self::from_arc(Arc::new(module))
    }

    pub fn from_arc<M: Module>(module: Arc<M>) -> Self {
        Self {
            id: ModuleId::of::<M>(),
            module: module.clone(),
            any: module,
        }
    }

    pub fn id(&self) -> ModuleId {
        self.id
    }

    pub fn module(&self) -> &Arc<dyn Module> {
        &self.module
    }

    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.any.clone().downcast::<T>().ok()
    }
}

/// A module given either by class or as a live instance.
#[derive(Debug, Clone)]
pub enum ModuleRef {
    Class(ModuleId),
    Instance(ModuleInstance),
}

impl ModuleRef {
    pub fn id(&self) -> ModuleId {
        match self {
            ModuleRef::Class(id) => *id,
            ModuleRef::Instance(instance) => instance.id(),
        }
    }
}

/// What a factory can see while building one module.
///
/// Module parameters are served from the instances already resolved in the current
/// call, following replacements; everything else goes to the service provider.
pub struct ConstructCtx<'a> {
    module: ModuleId,
    instances: &'a HashMap<ModuleId, ModuleInstance>,
    slots: &'a HashMap<ModuleId, ModuleId>,
    catalog: &'a ModuleCatalog,
    services: Option<&'a dyn ServiceProvider>,
}

impl<'a> ConstructCtx<'a> {
    pub(crate) fn new(
        module: ModuleId,
        instances: &'a HashMap<ModuleId, ModuleInstance>,
        slots: &'a HashMap<ModuleId, ModuleId>,
        catalog: &'a ModuleCatalog,
        services: Option<&'a dyn ServiceProvider>,
    ) -> Self {
        Self {
            module,
            instances,
            slots,
            catalog,
            services,
        }
    }

    /// Identity of the module being constructed.
    pub fn module_id(&self) -> ModuleId {
        self.module
    }

    /// Resolved instance standing in for `requested`, if any.
    pub fn module(&self, requested: ModuleId) -> Option<&ModuleInstance> {
        self.slots
            .get(&requested)
            .and_then(|effective| self.instances.get(effective))
    }

    /// Fetch a constructor argument of type `T`.
    pub fn get<T: Any + Send + Sync>(&self) -> anyhow::Result<Arc<T>> {
        let wanted = ModuleId::of::<T>();

        if let Some(effective) = self.slots.get(&wanted) {
            let instance = self.instances.get(effective).ok_or_else(|| {
                anyhow!(
                    "module parameter '{wanted}' of '{}' is not constructed yet",
                    self.module
                )
            })?;
            return instance.downcast::<T>().ok_or_else(|| {
                anyhow!(
                    "module parameter '{wanted}' of '{}' was replaced by '{effective}', which cannot be passed as '{wanted}'",
                    self.module
                )
            });
        }

        if self.catalog.contains(wanted) {
            bail!(
                "module parameter '{wanted}' of '{}' was not resolved as one of its dependencies",
                self.module
            );
        }

        let value = self
            .services
            .and_then(|services| services.provide(TypeId::of::<T>()))
            .ok_or_else(|| {
                anyhow!(
                    "no provider for parameter '{}' of '{}'",
                    std::any::type_name::<T>(),
                    self.module
                )
            })?;
        value.downcast::<T>().map_err(|_| {
            anyhow!(
                "provider returned a value of the wrong type for '{}'",
                std::any::type_name::<T>()
            )
        })
    }

    /// Like [`get`](Self::get), but `None` where `get` would fail.
    ///
    /// Lets a constructor keep depending on a module that may be replaced by one of
    /// a different type.
    pub fn get_optional<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.get::<T>().ok()
    }
}
