pub mod config;
pub mod config_provider;
pub mod logging;
pub mod modules;
pub mod paths;

pub use config::*;
pub use config_provider::*;
pub use logging::*;
pub use modules::*;
