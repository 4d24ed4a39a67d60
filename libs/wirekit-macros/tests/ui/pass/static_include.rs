use std::any::Any;

use wirekit::{module, Binder, Module, ModuleType};

#[derive(Default)]
#[module]
pub struct CoreModule;

impl Module for CoreModule {
    fn configure(&self, _binder: &mut dyn Binder) -> anyhow::Result<()> {
        Ok(())
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[module(name = "cache", include = [CoreModule], ctor = CacheModule::with_capacity(16))]
pub struct CacheModule {
    capacity: usize,
}

impl CacheModule {
    fn with_capacity(capacity: usize) -> Self {
        Self { capacity }
    }
}

impl Module for CacheModule {
    fn configure(&self, _binder: &mut dyn Binder) -> anyhow::Result<()> {
        let _ = self.capacity;
        Ok(())
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn main() {
    assert_eq!(CoreModule::MODULE_NAME, "core_module");
    assert_eq!(CacheModule::MODULE_NAME, "cache");
    let _ = <CacheModule as ModuleType>::module_class();
}
