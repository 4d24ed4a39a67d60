use std::sync::Arc;

use anyhow::{Context, Result};
use wirekit::{ModuleCatalog, ModuleList, ModuleListBuilder, ServiceMap};

use crate::config::AppConfig;
use crate::config_provider::AppConfigProvider;

/// Resolve the module list described by `config.bootstrap`.
///
/// With no `include` directive every registered module is included, in name order.
/// An [`AppConfigProvider`] is added to `services` unless one is already there.
pub fn resolve_modules(
    config: &AppConfig,
    catalog: &ModuleCatalog,
    services: Arc<ServiceMap>,
) -> Result<ModuleList> {
    if !services.contains::<AppConfigProvider>() {
        services.insert(AppConfigProvider::new(config.clone()));
    }

    let mut builder = ModuleListBuilder::new().with_services(services);
    if config.bootstrap.include.is_empty() {
        tracing::debug!("No explicit includes, using the whole catalog");
        builder = builder.include_all(catalog.classes().iter().map(|c| c.id()));
    }

    let modules = builder
        .with_directives(catalog, &config.bootstrap)
        .context("Invalid bootstrap directives")?
        .build(catalog)
        .context("Module resolution failed")?;

    tracing::info!(count = modules.len(), "Bootstrap module list ready");
    Ok(modules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::any::Any;
    use wirekit::{
        Binder, ConstructCtx, Injectable, Module, ModuleClass, ModuleId, ParamType,
    };

    #[derive(Default)]
    struct Core;
    impl Module for Core {
        fn configure(&self, _binder: &mut dyn Binder) -> anyhow::Result<()> {
            Ok(())
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[derive(Default, serde::Deserialize)]
    struct ApiSettings {
        port: u16,
    }

    struct Api {
        port: u16,
    }
    impl Module for Api {
        fn configure(&self, _binder: &mut dyn Binder) -> anyhow::Result<()> {
            Ok(())
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }
    impl Injectable for Api {
        fn constructor_params() -> Vec<ParamType> {
            vec![ParamType::of::<Core>(), ParamType::of::<AppConfigProvider>()]
        }
        fn construct(ctx: &ConstructCtx<'_>) -> anyhow::Result<Self> {
            ctx.get::<Core>()?;
            let cfg = ctx.get::<AppConfigProvider>()?;
            let settings: ApiSettings = cfg.module_config_typed("api")?;
            Ok(Api {
                port: settings.port,
            })
        }
    }

    fn catalog() -> ModuleCatalog {
        ModuleCatalog::builder()
            .with_class(ModuleClass::of_default::<Core>("core"))
            .with_class(ModuleClass::injectable::<Api>("api"))
            .build()
            .unwrap()
    }

    #[test]
    fn config_provider_is_injected() {
        let mut config = AppConfig::default();
        config.bootstrap.include = vec!["api".into()];
        config
            .modules
            .insert("api".into(), serde_json::json!({ "port": 8088 }));

        let modules = resolve_modules(&config, &catalog(), Arc::new(ServiceMap::new())).unwrap();
        assert_eq!(modules.names(), vec!["core", "api"]);
        let api = modules.get(ModuleId::of::<Api>()).unwrap();
        assert_eq!(api.downcast::<Api>().unwrap().port, 8088);
    }

    #[test]
    fn empty_include_uses_whole_catalog() {
        let mut config = AppConfig::default();
        config.bootstrap.exclude = vec!["core".into()];

        let modules = resolve_modules(&config, &catalog(), Arc::new(ServiceMap::new())).unwrap();
        assert_eq!(modules.names(), vec!["api"]);
    }

    #[test]
    fn unknown_name_fails_with_context() {
        let mut config = AppConfig::default();
        config.bootstrap.include = vec!["nope".into()];

        let err = resolve_modules(&config, &catalog(), Arc::new(ServiceMap::new())).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("Invalid bootstrap directives"), "{msg}");
        assert!(msg.contains("nope"), "{msg}");
    }
}
