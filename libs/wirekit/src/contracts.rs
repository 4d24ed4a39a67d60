use std::any::{Any, TypeId};
use std::sync::Arc;

use crate::class::{ConstructCtx, ModuleClass};
use crate::identity::ParamType;

/// Configuration module: contributes bindings to an object graph.
///
/// What "configuring" means is entirely up to the [`Binder`] implementation;
/// the resolver only decides which modules are installed and in which order.
pub trait Module: Send + Sync + 'static {
    fn configure(&self, binder: &mut dyn Binder) -> anyhow::Result<()>;
    fn as_any(&self) -> &dyn Any;
}

/// Registration-time metadata of a module type.
///
/// Generated by `#[module(...)]`; implement by hand for types that cannot carry
/// the attribute.
pub trait ModuleType: Module + Sized {
    fn module_class() -> ModuleClass;
}

/// Designated injectable constructor of a type.
///
/// Generated by `#[injectable]` from the single `#[inject]` function of an impl block.
pub trait Injectable: Sized {
    /// Parameter types in declaration order.
    fn constructor_params() -> Vec<ParamType>;

    fn construct(ctx: &ConstructCtx<'_>) -> anyhow::Result<Self>;
}

/// Key under which a binder stores a value: a type plus an optional qualifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BindingKey {
    pub type_id: TypeId,
    pub type_name: &'static str,
    pub qualifier: Option<String>,
}

impl BindingKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            qualifier: None,
        }
    }

    pub fn named<T: ?Sized + 'static>(name: impl Into<String>) -> Self {
        Self {
            qualifier: Some(name.into()),
            ..Self::of::<T>()
        }
    }
}

/// Object-graph builder that installed modules write their bindings into.
pub trait Binder {
    fn bind_instance(
        &mut self,
        key: BindingKey,
        value: Arc<dyn Any + Send + Sync>,
    ) -> anyhow::Result<()>;
}

/// Typed helpers over [`Binder`].
pub trait BinderExt {
    fn bind<T: Any + Send + Sync>(&mut self, value: T) -> anyhow::Result<()>;
    fn bind_named<T: Any + Send + Sync>(
        &mut self,
        name: impl Into<String>,
        value: T,
    ) -> anyhow::Result<()>;
}

impl<B: Binder + ?Sized> BinderExt for B {
    fn bind<T: Any + Send + Sync>(&mut self, value: T) -> anyhow::Result<()> {
        self.bind_instance(BindingKey::of::<T>(), Arc::new(value))
    }

    fn bind_named<T: Any + Send + Sync>(
        &mut self,
        name: impl Into<String>,
        value: T,
    ) -> anyhow::Result<()> {
        self.bind_instance(BindingKey::named::<T>(name), Arc::new(value))
    }
}

/// Source of non-module constructor parameters (the object-graph container's side).
pub trait ServiceProvider: Send + Sync {
    fn provide(&self, type_id: TypeId) -> Option<Arc<dyn Any + Send + Sync>>;
}
