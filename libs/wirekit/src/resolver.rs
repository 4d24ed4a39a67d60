//! Module dependency resolver.
//!
//! Expands the requested modules depth-first, post-order: every module is appended
//! after all of its transitive dependencies. Replacements are applied as each
//! identity is discovered, so a replaced module is never materialised and its own
//! dependencies are never expanded. Exclusions are applied to the output only, after
//! the traversal is complete.

use std::collections::{HashMap, HashSet};

use crate::class::{ConstructCtx, ModuleInstance, ModuleRef};
use crate::contracts::ServiceProvider;
use crate::error::ResolveError;
use crate::extractor;
use crate::identity::ModuleId;
use crate::list::{ModuleList, Origin, ResolvedModule};
use crate::registry::ModuleCatalog;

/// One resolution request over a catalog.
///
/// Holds only borrowed, read-only inputs; all mutable state lives in a [`Traversal`]
/// created by each [`Resolver::resolve`] call.
pub struct Resolver<'a> {
    catalog: &'a ModuleCatalog,
    excludes: Option<&'a HashSet<ModuleId>>,
    replacements: Option<&'a HashMap<ModuleId, ModuleRef>>,
    services: Option<&'a dyn ServiceProvider>,
}

/// Mutable state of a single `resolve` call.
#[derive(Default)]
struct Traversal {
    visited: HashSet<ModuleId>,
    output: Vec<ResolvedModule>,
    /// effective identity -> live instance
    instances: HashMap<ModuleId, ModuleInstance>,
    /// requested identity -> effective identity
    slots: HashMap<ModuleId, ModuleId>,
    /// classes whose dependencies are being expanded
    stack: Vec<ModuleId>,
    /// unregistered module types the caller supplied as live instances
    provided: HashMap<ModuleId, ModuleInstance>,
}

impl<'a> Resolver<'a> {
    pub fn new(catalog: &'a ModuleCatalog) -> Self {
        Self {
            catalog,
            excludes: None,
            replacements: None,
            services: None,
        }
    }

    pub fn with_excludes(mut self, excludes: &'a HashSet<ModuleId>) -> Self {
        self.excludes = Some(excludes);
        self
    }

    pub fn with_replacements(mut self, replacements: &'a HashMap<ModuleId, ModuleRef>) -> Self {
        self.replacements = Some(replacements);
        self
    }

    pub fn with_services(mut self, services: &'a dyn ServiceProvider) -> Self {
        self.services = Some(services);
        self
    }

    /// Resolve `includes` (in caller order) into the final module list.
    ///
    /// Any error aborts the whole call; no partial list is returned.
    pub fn resolve(&self, includes: &[ModuleRef]) -> Result<ModuleList, ResolveError> {
        let mut t = Traversal {
            provided: self.provided_instances(includes),
            ..Traversal::default()
        };

        for include in includes {
            self.visit(&mut t, include.clone(), Origin::Explicit, false)?;
        }

        let mut modules = t.output;
        if let Some(excludes) = self.excludes {
            modules.retain(|m| {
                let keep = !excludes.contains(&m.id());
                if !keep {
                    tracing::debug!(module = m.name(), "Module excluded");
                }
                keep
            });
        }

        let list = ModuleList::new(modules);
        tracing::info!(modules = ?list.names(), "Module list resolved");
        Ok(list)
    }

    fn visit(
        &self,
        t: &mut Traversal,
        requested: ModuleRef,
        origin: Origin,
        needs_instance: bool,
    ) -> Result<(), ResolveError> {
        let requested_id = requested.id();
        let target = match self.follow_replacements(requested)? {
            // A dependency on an unregistered type is served by the caller's instance.
            ModuleRef::Class(id) if !self.catalog.contains(id) => match t.provided.get(&id) {
                Some(instance) => ModuleRef::Instance(instance.clone()),
                None => ModuleRef::Class(id),
            },
            other => other,
        };
        let effective = target.id();
        let replaced = (effective != requested_id).then_some(requested_id);
        if replaced.is_some() {
            tracing::debug!(
                module = %requested_id,
                replacement = %effective,
                "Module replaced"
            );
        }
        t.slots.insert(requested_id, effective);

        if t.visited.contains(&effective) {
            // A constructor cannot receive a module that is still being expanded.
            if needs_instance {
                if let Some(pos) = t.stack.iter().position(|id| *id == effective) {
                    let mut path: Vec<&'static str> =
                        t.stack[pos..].iter().map(|id| id.type_name()).collect();
                    path.push(effective.type_name());
                    return Err(ResolveError::DependencyCycle { path });
                }
            }
            tracing::debug!(module = %effective, "Module already visited");
            return Ok(());
        }
        t.visited.insert(effective);

        let (instance, name) = match target {
            ModuleRef::Instance(instance) => {
                let name = self
                    .catalog
                    .get(effective)
                    .map_or_else(|| effective.short_name(), |class| class.name());
                (instance, name)
            }
            ModuleRef::Class(id) => {
                let requested_by = origin.dependent().map(|of| of.type_name());
                let class = self
                    .catalog
                    .get(id)
                    .ok_or(ResolveError::UnknownModule {
                        module: id.type_name(),
                        requested_by,
                    })?;

                let deps = extractor::extract(class, |dep| self.is_module_type(t, dep));
                let constructor_deps = class.dependencies().is_constructor();
                tracing::debug!(module = class.name(), deps = ?deps, "Expanding module");

                t.stack.push(id);
                for dep in deps {
                    self.visit(
                        t,
                        ModuleRef::Class(dep),
                        Origin::Dependency { of: id },
                        constructor_deps,
                    )?;
                }
                t.stack.pop();

                let ctx = ConstructCtx::new(id, &t.instances, &t.slots, self.catalog, self.services);
                let instance = class.instantiate(&ctx).map_err(|source| {
                    ResolveError::Instantiation {
                        module: id.type_name(),
                        requested_by,
                        source,
                    }
                })?;
                (instance, class.name())
            }
        };

        t.instances.insert(effective, instance.clone());
        t.output.push(ResolvedModule::new(instance, name, origin, replaced));
        Ok(())
    }

    /// Follow the replacement chain from `requested` to a non-replaced module.
    fn follow_replacements(&self, requested: ModuleRef) -> Result<ModuleRef, ResolveError> {
        let Some(replacements) = self.replacements else {
            return Ok(requested);
        };

        let mut current = requested;
        let mut chain = vec![current.id()];
        while let Some(next) = replacements.get(&current.id()) {
            let next_id = next.id();
            if let Some(start) = chain.iter().position(|id| *id == next_id) {
                let mut path: Vec<&'static str> =
                    chain[start..].iter().map(|id| id.type_name()).collect();
                path.push(next_id.type_name());
                return Err(ResolveError::ReplacementCycle { path });
            }
            chain.push(next_id);
            current = next.clone();
        }
        Ok(current)
    }

    /// Instances among the includes and replacement targets whose type is not in
    /// the catalog. The first instance given for a type wins.
    fn provided_instances(&self, includes: &[ModuleRef]) -> HashMap<ModuleId, ModuleInstance> {
        let targets = self.replacements.into_iter().flat_map(|r| r.values());
        let mut provided = HashMap::new();
        for module in includes.iter().chain(targets) {
            if let ModuleRef::Instance(instance) = module {
                if !self.catalog.contains(instance.id()) {
                    provided
                        .entry(instance.id())
                        .or_insert_with(|| instance.clone());
                }
            }
        }
        provided
    }

    fn is_module_type(&self, t: &Traversal, id: ModuleId) -> bool {
        self.catalog.contains(id)
            || t.provided.contains_key(&id)
            || self
                .replacements
                .is_some_and(|replacements| replacements.contains_key(&id))
    }
}
