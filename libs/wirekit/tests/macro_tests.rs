//! Tests for the #[module] and #[injectable] macros against the catalog and builder

use std::any::Any;
use std::sync::Arc;

use anyhow::{bail, Result};
use wirekit::{
    injectable, module, Binder, BinderExt, BindingKey, DependencySource, Injectable, Module,
    ModuleCatalog, ModuleId, ModuleListBuilder, ModuleType, ParamType, ResolveError, ServiceMap,
};

// ---------- Test modules (must be at module scope for `inventory`) ----------

#[derive(Default)]
#[module(name = "basic")]
struct BasicModule;

impl Module for BasicModule {
    fn configure(&self, binder: &mut dyn Binder) -> Result<()> {
        binder.bind_named("basic.greeting", String::from("hello"))
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[module(name = "custom_ctor", ctor = CustomCtorModule::new(42))]
struct CustomCtorModule {
    value: u32,
}

impl CustomCtorModule {
    fn new(value: u32) -> Self {
        Self { value }
    }
}

impl Module for CustomCtorModule {
    fn configure(&self, binder: &mut dyn Binder) -> Result<()> {
        binder.bind(self.value)
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct DbUrl(pub String);

#[module(name = "repo", inject)]
struct RepoModule {
    basic: Arc<BasicModule>,
    url: Arc<DbUrl>,
}

#[injectable]
impl RepoModule {
    #[inject]
    fn connect(basic: Arc<BasicModule>, url: Arc<DbUrl>) -> Result<Self> {
        if url.0.is_empty() {
            bail!("empty database url");
        }
        Ok(Self { basic, url })
    }
}

impl Module for RepoModule {
    fn configure(&self, binder: &mut dyn Binder) -> Result<()> {
        binder.bind_named("repo.url", self.url.0.clone())
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Static list wins over the constructor: `BasicModule` is not discovered.
#[module(name = "pinned", inject, include = [])]
struct PinnedModule;

#[injectable]
impl PinnedModule {
    #[inject]
    fn new(_basic: Arc<BasicModule>) -> Self {
        Self
    }
}

impl Module for PinnedModule {
    fn configure(&self, _binder: &mut dyn Binder) -> Result<()> {
        Ok(())
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/* --------------------------- Test helpers ------------------------- */

#[derive(Default)]
struct RecordingBinder {
    keys: Vec<BindingKey>,
}

impl Binder for RecordingBinder {
    fn bind_instance(&mut self, key: BindingKey, _value: Arc<dyn Any + Send + Sync>) -> Result<()> {
        self.keys.push(key);
        Ok(())
    }
}

fn services(url: &str) -> Arc<ServiceMap> {
    let services = ServiceMap::new();
    services.insert(DbUrl(url.to_owned()));
    Arc::new(services)
}

/* ------------------------------- Tests ---------------------------- */

#[test]
fn test_module_registration_metadata() {
    let catalog = ModuleCatalog::discover().unwrap();
    assert_eq!(catalog.len(), 4);
    let names: Vec<_> = catalog.classes().iter().map(|c| c.name()).collect();
    assert_eq!(names, vec!["basic", "custom_ctor", "pinned", "repo"]);

    let repo = catalog.by_name("repo").unwrap();
    assert_eq!(
        repo.dependencies(),
        &DependencySource::Constructor(vec![
            ParamType::of::<BasicModule>(),
            ParamType::of::<DbUrl>()
        ])
    );
    assert_eq!(
        <PinnedModule as ModuleType>::module_class().dependencies(),
        &DependencySource::Static(vec![])
    );
    assert_eq!(RepoModule::constructor_params().len(), 2);
    assert_eq!(CustomCtorModule::MODULE_NAME, "custom_ctor");
}

#[test]
fn test_custom_ctor_expression_is_used() {
    let catalog = ModuleCatalog::discover().unwrap();
    let modules = ModuleListBuilder::new()
        .include::<CustomCtorModule>()
        .build(&catalog)
        .unwrap();
    let module = modules.iter().next().unwrap().downcast::<CustomCtorModule>().unwrap();
    assert_eq!(module.value, 42);

    let mut binder = RecordingBinder::default();
    modules.install(&mut binder).unwrap();
    assert_eq!(binder.keys, vec![BindingKey::of::<u32>()]);
}

#[test]
fn test_injected_module_gets_modules_and_services() {
    let catalog = ModuleCatalog::discover().unwrap();
    let modules = ModuleListBuilder::new()
        .include::<RepoModule>()
        .with_services(services("postgres://localhost/app"))
        .build(&catalog)
        .unwrap();
    assert_eq!(modules.names(), vec!["basic", "repo"]);

    let basic = modules.get(ModuleId::of::<BasicModule>()).unwrap();
    let repo = modules.get(ModuleId::of::<RepoModule>()).unwrap();
    let (basic, repo) = (
        basic.downcast::<BasicModule>().unwrap(),
        repo.downcast::<RepoModule>().unwrap(),
    );
    assert!(Arc::ptr_eq(&basic, &repo.basic));

    let mut binder = RecordingBinder::default();
    modules.install(&mut binder).unwrap();
    assert_eq!(
        binder.keys,
        vec![
            BindingKey::named::<String>("basic.greeting"),
            BindingKey::named::<String>("repo.url"),
        ]
    );
}

#[test]
fn test_fallible_constructor_error_is_reported() {
    let catalog = ModuleCatalog::discover().unwrap();
    let err = ModuleListBuilder::new()
        .include::<RepoModule>()
        .with_services(services(""))
        .build(&catalog)
        .unwrap_err();
    match err {
        ResolveError::Instantiation { module, source, .. } => {
            assert!(module.ends_with("RepoModule"));
            assert_eq!(source.to_string(), "empty database url");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_static_include_overrides_constructor_inspection() {
    let catalog = ModuleCatalog::discover().unwrap();
    let err = ModuleListBuilder::new()
        .include::<PinnedModule>()
        .build(&catalog)
        .unwrap_err();
    // BasicModule was never resolved, so the constructor cannot get it
    assert!(
        format!("{:#}", anyhow::Error::from(err)).contains("not resolved"),
        "constructor should fail on an unresolved module parameter"
    );

    let modules = ModuleListBuilder::new()
        .include::<BasicModule>()
        .include::<PinnedModule>()
        .build(&catalog)
        .unwrap();
    assert_eq!(modules.names(), vec!["basic", "pinned"]);
}
