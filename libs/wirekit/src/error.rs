use thiserror::Error;

/// Structured errors for catalog building, module resolution and installation.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("module '{module}' is not registered (requested by {})", .requested_by.unwrap_or("caller"))]
    UnknownModule {
        module: &'static str,
        requested_by: Option<&'static str>,
    },
    #[error("failed to instantiate module '{module}' (requested by {})", .requested_by.unwrap_or("caller"))]
    Instantiation {
        module: &'static str,
        requested_by: Option<&'static str>,
        #[source]
        source: anyhow::Error,
    },
    #[error("replacement cycle detected: {}", .path.join(" -> "))]
    ReplacementCycle { path: Vec<&'static str> },
    #[error("constructor dependency cycle detected: {}", .path.join(" -> "))]
    DependencyCycle { path: Vec<&'static str> },
    #[error("unknown module name '{0}'")]
    UnknownModuleName(String),
    #[error("invalid module catalog:\n{errors:#?}")]
    InvalidCatalog { errors: Vec<String> },
    #[error("configure failed for module '{module}'")]
    Configure {
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },
}
