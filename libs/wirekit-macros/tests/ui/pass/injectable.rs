use std::any::Any;
use std::sync::Arc;

use wirekit::{injectable, module, Binder, Injectable, Module};

#[derive(Default)]
#[module(name = "storage")]
pub struct StorageModule;

impl Module for StorageModule {
    fn configure(&self, _binder: &mut dyn Binder) -> anyhow::Result<()> {
        Ok(())
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct Settings {
    pub port: u16,
}

#[module(name = "http", inject)]
pub struct HttpModule {
    storage: Arc<StorageModule>,
    settings: Option<Arc<Settings>>,
}

#[injectable]
impl HttpModule {
    #[inject]
    fn new(storage: Arc<StorageModule>, settings: Option<Arc<Settings>>) -> anyhow::Result<Self> {
        Ok(Self { storage, settings })
    }
}

impl Module for HttpModule {
    fn configure(&self, _binder: &mut dyn Binder) -> anyhow::Result<()> {
        let _ = (&self.storage, self.settings.as_ref().map(|s| s.port));
        Ok(())
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn main() {
    assert_eq!(HttpModule::constructor_params().len(), 2);
}
