// wirekit/src/registry.rs
use std::collections::HashMap;

use crate::class::ModuleClass;
use crate::contracts::ModuleType;
use crate::error::ResolveError;
use crate::identity::ModuleId;

/// The function type submitted by the macro via `inventory::submit!`.
/// It feeds a *builder*, not the final catalog.
pub struct Registrator(pub fn(&mut CatalogBuilder));

inventory::collect!(Registrator);

/// Immutable set of known module classes, keyed by identity and by name.
pub struct ModuleCatalog {
    classes: HashMap<ModuleId, ModuleClass>,
    names: HashMap<&'static str, ModuleId>,
}

impl std::fmt::Debug for ModuleCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&'static str> = self.names.keys().copied().collect();
        names.sort_unstable();
        f.debug_struct("ModuleCatalog")
            .field("modules", &names)
            .finish()
    }
}

impl ModuleCatalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    /// Discover via inventory, have registrators fill the builder, then build.
    pub fn discover() -> Result<Self, ResolveError> {
        let mut b = CatalogBuilder::default();
        b.extend_discovered();
        b.build()
    }

    pub fn get(&self, id: ModuleId) -> Option<&ModuleClass> {
        self.classes.get(&id)
    }

    pub fn contains(&self, id: ModuleId) -> bool {
        self.classes.contains_key(&id)
    }

    pub fn by_name(&self, name: &str) -> Option<&ModuleClass> {
        self.names.get(name).and_then(|id| self.classes.get(id))
    }

    /// Classes sorted by name.
    pub fn classes(&self) -> Vec<&ModuleClass> {
        let mut classes: Vec<&ModuleClass> = self.classes.values().collect();
        classes.sort_by_key(|c| c.name());
        classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Builder that macro registrators and manual registrations feed.
/// Identities and names must be unique; violations are reported at build time.
#[derive(Default)]
pub struct CatalogBuilder {
    classes: HashMap<ModuleId, ModuleClass>,
    names: HashMap<&'static str, ModuleId>,
    errors: Vec<String>,
}

impl CatalogBuilder {
    pub fn register(&mut self, class: ModuleClass) {
        if let Some(existing) = self.classes.get(&class.id()) {
            self.errors.push(format!(
                "Module type '{}' is already registered as '{}'",
                class.id(),
                existing.name()
            ));
            return;
        }
        if let Some(existing) = self.names.get(class.name()) {
            self.errors.push(format!(
                "Module name '{}' is used by both '{}' and '{}'",
                class.name(),
                existing,
                class.id()
            ));
            return;
        }
        self.names.insert(class.name(), class.id());
        self.classes.insert(class.id(), class);
    }

    pub fn register_type<M: ModuleType>(&mut self) {
        self.register(M::module_class());
    }

    pub fn with_type<M: ModuleType>(mut self) -> Self {
        self.register_type::<M>();
        self
    }

    pub fn with_class(mut self, class: ModuleClass) -> Self {
        self.register(class);
        self
    }

    /// Run every inventory registrator against this builder.
    pub fn extend_discovered(&mut self) {
        for r in ::inventory::iter::<Registrator> {
            r.0(self);
        }
    }

    pub fn build(self) -> Result<ModuleCatalog, ResolveError> {
        if !self.errors.is_empty() {
            return Err(ResolveError::InvalidCatalog {
                errors: self.errors,
            });
        }

        tracing::debug!(count = self.classes.len(), "Module catalog built");

        Ok(ModuleCatalog {
            classes: self.classes,
            names: self.names,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::{Binder, Module};
    use std::any::Any;

    /* --------------------------- Test helpers ------------------------- */
    #[derive(Default)]
    struct DummyCore;
    impl Module for DummyCore {
        fn configure(&self, _binder: &mut dyn Binder) -> anyhow::Result<()> {
            Ok(())
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[derive(Default)]
    struct OtherCore;
    impl Module for OtherCore {
        fn configure(&self, _binder: &mut dyn Binder) -> anyhow::Result<()> {
            Ok(())
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    impl ModuleType for OtherCore {
        fn module_class() -> ModuleClass {
            ModuleClass::of_default::<Self>("other")
                .with_static_dependencies([ModuleId::of::<DummyCore>()])
        }
    }

    /* ------------------------------- Tests ---------------------------- */

    #[test]
    fn lookup_by_identity_and_name() {
        let catalog = ModuleCatalog::builder()
            .with_class(ModuleClass::of_default::<DummyCore>("dummy"))
            .with_type::<OtherCore>()
            .build()
            .unwrap();

        assert_eq!(catalog.len(), 2);
        assert!(catalog.contains(ModuleId::of::<DummyCore>()));
        assert_eq!(
            catalog.by_name("other").map(|c| c.id()),
            Some(ModuleId::of::<OtherCore>())
        );
        assert!(catalog.by_name("missing").is_none());

        let names: Vec<_> = catalog.classes().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["dummy", "other"]);
    }

    #[test]
    fn duplicate_type_reported_in_configuration_errors() {
        let mut b = CatalogBuilder::default();
        b.register(ModuleClass::of_default::<DummyCore>("a"));
        // duplicate
        b.register(ModuleClass::of_default::<DummyCore>("b"));

        let err = b.build().unwrap_err();
        match err {
            ResolveError::InvalidCatalog { errors } => {
                assert!(
                    errors.iter().any(|e| e.contains("already registered")),
                    "expected duplicate registration error, got {errors:?}"
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn duplicate_name_reported_in_configuration_errors() {
        let mut b = CatalogBuilder::default();
        b.register(ModuleClass::of_default::<DummyCore>("core"));
        b.register(ModuleClass::of_default::<OtherCore>("core"));

        let err = b.build().unwrap_err();
        match err {
            ResolveError::InvalidCatalog { errors } => {
                assert_eq!(errors.len(), 1);
                assert!(errors[0].contains("is used by both"), "{errors:?}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
