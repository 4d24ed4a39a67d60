//! Demo modules linked into the binary and registered via inventory.

use std::any::Any;
use std::sync::Arc;

use anyhow::Result;
use serde::Deserialize;
use wirekit::{injectable, module, Binder, BinderExt, Module};
use wirekit_bootstrap::AppConfigProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Disk,
    Memory,
}

#[derive(Default)]
#[module(name = "core")]
pub struct CoreModule;

impl Module for CoreModule {
    fn configure(&self, binder: &mut dyn Binder) -> Result<()> {
        binder.bind_named("app.name", String::from("wirekit-demo"))
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Default)]
#[module(name = "storage", include = [CoreModule])]
pub struct StorageModule;

impl Module for StorageModule {
    fn configure(&self, binder: &mut dyn Binder) -> Result<()> {
        binder.bind(StorageBackend::Disk)
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Default)]
#[module(name = "in_memory_storage", include = [CoreModule])]
pub struct InMemoryStorageModule;

impl Module for InMemoryStorageModule {
    fn configure(&self, binder: &mut dyn Binder) -> Result<()> {
        binder.bind(StorageBackend::Memory)
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub bind: String,
    pub port: u16,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8087,
        }
    }
}

#[module(name = "http", inject)]
pub struct HttpModule {
    settings: HttpSettings,
    storage: Option<Arc<StorageModule>>,
}

#[injectable]
impl HttpModule {
    /// `storage` is absent when the storage module was replaced.
    #[inject]
    fn new(storage: Option<Arc<StorageModule>>, config: Arc<AppConfigProvider>) -> Result<Self> {
        let settings: HttpSettings = config.module_config_typed(Self::MODULE_NAME)?;
        Ok(Self { settings, storage })
    }
}

impl Module for HttpModule {
    fn configure(&self, binder: &mut dyn Binder) -> Result<()> {
        if self.storage.is_none() {
            tracing::debug!("http running against a replaced storage module");
        }
        tracing::info!(bind = %self.settings.bind, port = self.settings.port, "http endpoint configured");
        binder.bind(self.settings.clone())
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[module(name = "telemetry", ctor = TelemetryModule::new())]
pub struct TelemetryModule {
    started: std::time::SystemTime,
}

impl TelemetryModule {
    fn new() -> Self {
        Self {
            started: std::time::SystemTime::now(),
        }
    }
}

impl Module for TelemetryModule {
    fn configure(&self, binder: &mut dyn Binder) -> Result<()> {
        binder.bind_named("telemetry.started", self.started)
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}
