use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use wirekit::BootstrapDirectives;

use crate::paths::resolve_home_dir;

/// Application configuration: global sections plus a per-module configuration bag.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Working directory for logs and module state; normalized to an absolute path.
    #[serde(default)]
    pub home_dir: String,
    /// Logging configuration (optional, uses defaults if None).
    pub logging: Option<LoggingConfig>,
    /// Which modules to include, exclude and replace, by registered name.
    #[serde(default)]
    pub bootstrap: BootstrapDirectives,
    /// Directory containing per-module YAML files (optional).
    #[serde(default)]
    pub modules_dir: Option<String>,
    /// Per-module configuration bag: module_name → arbitrary JSON/YAML value.
    #[serde(default)]
    pub modules: HashMap<String, serde_json::Value>,
}

/// Logging configuration - maps subsystem (target prefix) names to their settings.
/// Key "default" is the catch-all for logs that don't match explicit subsystems.
pub type LoggingConfig = HashMap<String, Section>;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Section {
    pub console_level: String, // "info", "debug", "error", "off"
    #[serde(default)]
    pub file: String, // "logs/wirekit.log"; empty = no file sink
    #[serde(default)]
    pub file_level: String,
    #[serde(default)]
    pub max_age_days: Option<u32>,
    #[serde(default)]
    pub max_backups: Option<usize>,
    #[serde(default)]
    pub max_size_mb: Option<u64>,
}

/// Create a default logging configuration.
pub fn default_logging_config() -> LoggingConfig {
    HashMap::from([(
        "default".to_string(),
        Section {
            console_level: "info".to_string(),
            file: "logs/wirekit.log".to_string(),
            file_level: "debug".to_string(),
            max_age_days: Some(7),
            max_backups: Some(3),
            max_size_mb: Some(100),
        },
    )])
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            // Empty => $HOME/.wirekit (or %APPDATA%/.wirekit)
            home_dir: String::new(),
            logging: Some(default_logging_config()),
            bootstrap: BootstrapDirectives::default(),
            modules_dir: None,
            modules: HashMap::new(),
        }
    }
}

impl AppConfig {
    /// Layered loading: defaults → YAML file → environment (`WIREKIT__*`).
    /// Also normalizes `home_dir` into an absolute path and creates the directory.
    pub fn load_layered<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        use figment::{
            providers::{Env, Format, Serialized, Yaml},
            Figment,
        };

        // Optional sections stay None unless YAML/ENV provide them.
        let base = AppConfig {
            logging: None,
            ..AppConfig::default()
        };

        let figment = Figment::new()
            .merge(Serialized::defaults(base))
            .merge(Yaml::file(config_path.as_ref()))
            // Example: WIREKIT__HOME_DIR=/srv/app maps to home_dir
            .merge(Env::prefixed("WIREKIT__").split("__"));

        let mut config: AppConfig = figment.extract().with_context(|| {
            format!(
                "Failed to load config from '{}'",
                config_path.as_ref().display()
            )
        })?;

        normalize_home_dir_inplace(&mut config).context("Failed to resolve home_dir")?;

        if let Some(dir) = config.modules_dir.clone() {
            merge_module_files(&mut config.modules, &dir)
                .with_context(|| format!("Failed to read module configs from '{dir}'"))?;
        }

        Ok(config)
    }

    /// Load configuration from file or fall back to defaults.
    pub fn load_or_default<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_layered(path),
            None => {
                let mut c = Self::default();
                normalize_home_dir_inplace(&mut c)
                    .context("Failed to resolve home_dir (defaults)")?;
                Ok(c)
            }
        }
    }

    /// Serialize configuration to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config to YAML")
    }

    /// Apply overrides from command line arguments.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        self.bootstrap.include.extend(args.include.iter().cloned());
        self.bootstrap.exclude.extend(args.exclude.iter().cloned());

        // Verbosity raises the console level of the "default" section.
        let logging = self.logging.get_or_insert_with(default_logging_config);
        if let Some(default_section) = logging.get_mut("default") {
            match args.verbose {
                0 => {}
                1 => default_section.console_level = "debug".to_string(),
                _ => default_section.console_level = "trace".to_string(),
            }
        }
    }

    /// Absolute `home_dir` as a path.
    pub fn home_path(&self) -> PathBuf {
        PathBuf::from(&self.home_dir)
    }
}

/// Command line arguments relevant to configuration.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config: Option<String>,
    pub print_config: bool,
    pub verbose: u8,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

const DEFAULT_SUBDIR: &str = ".wirekit";

fn normalize_home_dir_inplace(config: &mut AppConfig) -> Result<()> {
    // Empty string means "not provided".
    let opt = if config.home_dir.trim().is_empty() {
        None
    } else {
        Some(config.home_dir.clone())
    };

    let resolved: PathBuf = resolve_home_dir(opt, DEFAULT_SUBDIR, /*create*/ true)
        .context("home_dir normalization failed")?;

    config.home_dir = resolved.to_string_lossy().to_string();
    Ok(())
}

/// Each `<name>.yaml` / `<name>.yml` in `dir` becomes `modules[<name>]`.
fn merge_module_files(bag: &mut HashMap<String, serde_json::Value>, dir: &str) -> Result<()> {
    use std::fs;
    let dir = Path::new(dir);
    if !dir.exists() {
        tracing::debug!(dir = %dir.display(), "modules_dir does not exist, skipping");
        return Ok(());
    }
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        if ext != "yml" && ext != "yaml" {
            continue;
        }
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let raw = fs::read_to_string(&path)?;
        let val: serde_yaml::Value = serde_yaml::from_str(&raw)
            .with_context(|| format!("Invalid YAML in '{}'", path.display()))?;
        bag.insert(name.to_string(), serde_json::to_value(val)?);
    }
    Ok(())
}
