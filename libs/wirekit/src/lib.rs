//! # WireKit - Module List Bootstrapper
//!
//! Assembles independently authored configuration modules into a single ordered,
//! deduplicated list ready to be installed into an object graph.
//!
//! ## Features
//!
//! - **Declarative**: use `#[module(...)]` to attach metadata to a module type
//! - **Auto-discovery**: module types are registered via inventory
//! - **Two dependency sources**: static `include = [...]` lists, or the module types
//!   required by an `#[injectable]` constructor
//! - **Directives**: include, exclude and replace modules by type or by name
//! - **Deterministic**: dependencies always precede dependents, first-discovery order otherwise
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::{any::Any, sync::Arc};
//! use wirekit::{injectable, module, Binder, Module, ModuleCatalog, ModuleListBuilder};
//!
//! #[derive(Default)]
//! #[module(name = "storage")]
//! pub struct StorageModule;
//!
//! #[module(name = "http", inject)]
//! pub struct HttpModule {
//!     storage: Arc<StorageModule>,
//! }
//!
//! #[injectable]
//! impl HttpModule {
//!     #[inject]
//!     fn new(storage: Arc<StorageModule>) -> Self {
//!         Self { storage }
//!     }
//! }
//!
//! // plus `impl Module for ...` on both types
//!
//! let catalog = ModuleCatalog::discover()?;
//! let modules = ModuleListBuilder::new()
//!     .include::<HttpModule>()
//!     .build(&catalog)?;
//! assert_eq!(modules.names(), vec!["storage", "http"]);
//! ```

pub use anyhow::Result;

// Re-export inventory for the macro-generated registrators
pub use inventory;

pub mod builder;
pub mod class;
pub mod contracts;
pub mod error;
pub mod extractor;
pub mod identity;
pub mod list;
pub mod registry;
pub mod resolver;
pub mod services;

pub use builder::{BootstrapDirectives, ModuleListBuilder};
pub use class::{ConstructCtx, DependencySource, Factory, ModuleClass, ModuleInstance, ModuleRef};
pub use contracts::{
    Binder, BinderExt, BindingKey, Injectable, Module, ModuleType, ServiceProvider,
};
pub use error::ResolveError;
pub use identity::{ModuleId, ParamType};
pub use list::{ModuleList, Origin, ResolvedModule};
pub use registry::{CatalogBuilder, ModuleCatalog, Registrator};
pub use resolver::Resolver;
pub use services::ServiceMap;

// Re-export the macros from the proc-macro crate
pub use wirekit_macros::{injectable, module};
