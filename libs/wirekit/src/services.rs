use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::contracts::ServiceProvider;

/// Type-keyed map of shared values, usable as a [`ServiceProvider`].
///
/// Serves the non-module parameters of injectable constructors.
#[derive(Default)]
pub struct ServiceMap {
    map: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl ServiceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value`, replacing any previous value of the same type.
    pub fn insert<T: Any + Send + Sync>(&self, value: T) {
        self.insert_arc(Arc::new(value));
    }

    pub fn insert_arc<T: Any + Send + Sync>(&self, value: Arc<T>) {
        self.map.write().insert(TypeId::of::<T>(), value);
    }

    pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        let value = self.map.read().get(&TypeId::of::<T>()).cloned()?;
        value.downcast::<T>().ok()
    }

    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        self.map.read().contains_key(&TypeId::of::<T>())
    }
}

impl ServiceProvider for ServiceMap {
    fn provide(&self, type_id: TypeId) -> Option<Arc<dyn Any + Send + Sync>> {
        self.map.read().get(&type_id).cloned()
    }
}

impl std::fmt::Debug for ServiceMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceMap")
            .field("len", &self.map.read().len())
            .finish()
    }
}
