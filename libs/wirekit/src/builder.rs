//! Fluent front door over [`Resolver`].

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::class::{ModuleInstance, ModuleRef};
use crate::contracts::{Module, ServiceProvider};
use crate::error::ResolveError;
use crate::identity::ModuleId;
use crate::list::ModuleList;
use crate::registry::ModuleCatalog;
use crate::resolver::Resolver;

/// Include / exclude / replace directives given by registered module name.
///
/// ```yaml
/// bootstrap:
///   include: [http]
///   exclude: [metrics]
///   replace:
///     storage: in_memory_storage
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BootstrapDirectives {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    /// original name -> replacement name
    pub replace: BTreeMap<String, String>,
}

impl BootstrapDirectives {
    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty() && self.replace.is_empty()
    }
}

/// Collects includes, exclusions and replacements, then resolves them in one go.
///
/// Only the include order is significant; exclusions and replacements apply to
/// the whole traversal regardless of when they were added.
#[derive(Default)]
pub struct ModuleListBuilder {
    includes: Vec<ModuleRef>,
    excludes: HashSet<ModuleId>,
    replacements: HashMap<ModuleId, ModuleRef>,
    services: Option<Arc<dyn ServiceProvider>>,
}

impl ModuleListBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include<M: Module>(self) -> Self {
        self.include_id(ModuleId::of::<M>())
    }

    pub fn include_id(mut self, id: ModuleId) -> Self {
        self.includes.push(ModuleRef::Class(id));
        self
    }

    pub fn include_all(mut self, ids: impl IntoIterator<Item = ModuleId>) -> Self {
        self.includes.extend(ids.into_iter().map(ModuleRef::Class));
        self
    }

    /// Include an already constructed module. It is used as is: no dependency discovery.
    pub fn include_instance<M: Module>(self, module: M) -> Self {
        self.include_arc(Arc::new(module))
    }

    pub fn include_arc<M: Module>(mut self, module: Arc<M>) -> Self {
        self.includes.push(ModuleRef::Instance(ModuleInstance::from_arc(module)));
        self
    }

    pub fn exclude<M: Module>(self) -> Self {
        self.exclude_id(ModuleId::of::<M>())
    }

    pub fn exclude_id(mut self, id: ModuleId) -> Self {
        self.excludes.insert(id);
        self
    }

    pub fn exclude_all(mut self, ids: impl IntoIterator<Item = ModuleId>) -> Self {
        self.excludes.extend(ids);
        self
    }

    /// Use `B` wherever `A` is requested, explicitly or as a dependency.
    pub fn replace<A: Module, B: Module>(self) -> Self {
        self.replace_id(ModuleId::of::<A>(), ModuleId::of::<B>())
    }

    pub fn replace_id(mut self, original: ModuleId, replacement: ModuleId) -> Self {
        self.insert_replacement(original, ModuleRef::Class(replacement));
        self
    }

    /// Use the given live module wherever `A` is requested.
    pub fn replace_with_instance<A: Module, M: Module>(mut self, module: M) -> Self {
        self.insert_replacement(
            ModuleId::of::<A>(),
            ModuleRef::Instance(ModuleInstance::new(module)),
        );
        self
    }

    /// Provider for non-module constructor parameters.
    pub fn with_services(mut self, services: Arc<dyn ServiceProvider>) -> Self {
        self.services = Some(services);
        self
    }

    /// Apply name-based directives, looking each name up in `catalog`.
    pub fn with_directives(
        mut self,
        catalog: &ModuleCatalog,
        directives: &BootstrapDirectives,
    ) -> Result<Self, ResolveError> {
        let lookup = |name: &str| {
            catalog
                .by_name(name)
                .map(|class| class.id())
                .ok_or_else(|| ResolveError::UnknownModuleName(name.to_owned()))
        };

        for name in &directives.include {
            self.includes.push(ModuleRef::Class(lookup(name)?));
        }
        for name in &directives.exclude {
            self.excludes.insert(lookup(name)?);
        }
        for (original, replacement) in &directives.replace {
            let (original, replacement) = (lookup(original)?, lookup(replacement)?);
            self.insert_replacement(original, ModuleRef::Class(replacement));
        }
        Ok(self)
    }

    pub fn build(&self, catalog: &ModuleCatalog) -> Result<ModuleList, ResolveError> {
        tracing::debug!(
            includes = self.includes.len(),
            excludes = self.excludes.len(),
            replacements = self.replacements.len(),
            "Building module list"
        );

        let mut resolver = Resolver::new(catalog)
            .with_excludes(&self.excludes)
            .with_replacements(&self.replacements);
        if let Some(services) = &self.services {
            resolver = resolver.with_services(services.as_ref());
        }
        resolver.resolve(&self.includes)
    }

    fn insert_replacement(&mut self, original: ModuleId, replacement: ModuleRef) {
        if let Some(previous) = self.replacements.insert(original, replacement) {
            tracing::debug!(
                module = %original,
                previous = %previous.id(),
                "Replacement overridden"
            );
        }
    }
}
