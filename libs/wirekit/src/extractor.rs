//! Direct dependency extraction.

use crate::class::{DependencySource, ModuleClass};
use crate::identity::ModuleId;

/// Direct dependencies of `class`, in declaration order.
///
/// A static list is returned as is. For a constructor, only the parameters whose
/// type satisfies `is_module` are dependencies; the rest are the container's business.
pub fn extract(class: &ModuleClass, is_module: impl Fn(ModuleId) -> bool) -> Vec<ModuleId> {
    match class.dependencies() {
        DependencySource::Static(deps) => deps.clone(),
        DependencySource::Constructor(params) => params
            .iter()
            .map(|p| p.module_id())
            .filter(|id| is_module(*id))
            .collect(),
    }
}
