use crate::config::AppConfig;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Configuration provider trait for modules
pub trait ConfigProvider: Send + Sync {
    /// Get the configuration for a specific module
    fn get_module_config(&self, module_name: &str) -> Option<&serde_json::Value>;
}

/// [`ConfigProvider`] over an [`AppConfig`].
///
/// Registered as a service during bootstrap, so injectable modules can take an
/// `Arc<AppConfigProvider>` constructor parameter.
#[derive(Debug, Clone)]
pub struct AppConfigProvider(Arc<AppConfig>);

impl AppConfigProvider {
    pub fn new(config: AppConfig) -> Self {
        Self(Arc::new(config))
    }

    pub fn from_arc(config: Arc<AppConfig>) -> Self {
        Self(config)
    }

    pub fn inner(&self) -> &AppConfig {
        &self.0
    }

    pub fn module_config(&self, module_name: &str) -> Option<&serde_json::Value> {
        self.0.modules.get(module_name)
    }

    /// Deserialize the module's section into `T`; a missing section yields `T::default()`.
    pub fn module_config_typed<T: DeserializeOwned + Default>(&self, module_name: &str) -> Result<T> {
        match self.module_config(module_name) {
            Some(value) => serde_json::from_value(value.clone())
                .with_context(|| format!("Invalid configuration for module '{module_name}'")),
            None => Ok(T::default()),
        }
    }
}

impl ConfigProvider for AppConfigProvider {
    fn get_module_config(&self, module_name: &str) -> Option<&serde_json::Value> {
        self.module_config(module_name)
    }
}
