//! Type-based identities.
//!
//! A module is identified by its type, never by its instance: two values of the
//! same module type are the same module for dedup, exclude and replace purposes.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identity of a module type.
///
/// Equality and hashing only look at the [`TypeId`]; the type name is carried
/// for diagnostics.
#[derive(Clone, Copy)]
pub struct ModuleId {
    type_id: TypeId,
    type_name: &'static str,
}

impl ModuleId {
    pub fn of<M: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<M>(),
            type_name: std::any::type_name::<M>(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Fully qualified type name, e.g. `my_app::modules::StorageModule`.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Last path segment of the type name, e.g. `StorageModule`.
    pub fn short_name(&self) -> &'static str {
        short_type_name(self.type_name)
    }
}

impl PartialEq for ModuleId {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ModuleId {}

impl Hash for ModuleId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}

/// Type of a designated constructor parameter.
///
/// A parameter may or may not be a module type; the resolver decides by looking
/// the type up in the catalog.
#[derive(Clone, Copy)]
pub struct ParamType {
    type_id: TypeId,
    type_name: &'static str,
}

impl ParamType {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The identity this parameter would have if its type is a module type.
    pub fn module_id(&self) -> ModuleId {
        ModuleId {
            type_id: self.type_id,
            type_name: self.type_name,
        }
    }
}

impl PartialEq for ParamType {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ParamType {}

impl fmt::Debug for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(short_type_name(self.type_name))
    }
}

fn short_type_name(full: &'static str) -> &'static str {
    // Generic arguments may contain paths themselves; only strip the outer one.
    let head_len = full.find('<').unwrap_or(full.len());
    match full[..head_len].rfind("::") {
        Some(pos) => &full[pos + 2..],
        None => full,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct Alpha;
    struct Beta;
    struct Wrapper<T>(std::marker::PhantomData<T>);

    #[test]
    fn identity_is_by_type() {
        assert_eq!(ModuleId::of::<Alpha>(), ModuleId::of::<Alpha>());
        assert_ne!(ModuleId::of::<Alpha>(), ModuleId::of::<Beta>());

        let set: HashSet<ModuleId> = [ModuleId::of::<Alpha>(), ModuleId::of::<Alpha>()]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn short_name_strips_module_path() {
        assert_eq!(ModuleId::of::<Alpha>().short_name(), "Alpha");
        assert!(ModuleId::of::<Alpha>().type_name().ends_with("::Alpha"));
        assert_eq!(
            ModuleId::of::<Wrapper<Beta>>().short_name(),
            format!("Wrapper<{}>", std::any::type_name::<Beta>())
        );
    }

    #[test]
    fn param_type_maps_to_module_identity() {
        assert_eq!(ParamType::of::<Alpha>().module_id(), ModuleId::of::<Alpha>());
        assert_ne!(ParamType::of::<Alpha>(), ParamType::of::<Beta>());
    }
}
