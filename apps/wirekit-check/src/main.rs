use anyhow::Result;
use clap::{Parser, Subcommand};
use wirekit::{DependencySource, ModuleCatalog, ModuleId, ModuleList, Origin, ServiceMap};
use wirekit_bootstrap::{resolve_modules, AppConfig, CliArgs};

use std::path::PathBuf;
use std::sync::Arc;

mod binder;
mod demo;

use binder::RecordingBinder;

/// WireKit Check - resolve and inspect module lists
#[derive(Parser)]
#[command(name = "wirekit-check")]
#[command(about = "WireKit Check - resolve and inspect module lists")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print effective configuration (YAML) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Additionally include a module by name (repeatable)
    #[arg(long, value_name = "NAME")]
    include: Vec<String>,

    /// Additionally exclude a module by name (repeatable)
    #[arg(long, value_name = "NAME")]
    exclude: Vec<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Resolve the module list, print it and install it into a recording binder
    Resolve,
    /// List registered modules and where their dependencies come from
    Catalog,
    /// Resolve and install quietly; fails on any error
    Check,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let logging_config = config.logging.clone().unwrap_or_default();
    wirekit_bootstrap::init_logging(&logging_config, &config.home_path());

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    let catalog = ModuleCatalog::discover()?;
    tracing::info!(modules = catalog.len(), "Module catalog discovered");

    match cli.command.unwrap_or(Commands::Resolve) {
        Commands::Resolve => {
            let (modules, binder) = resolve_and_install(&config, &catalog)?;
            print!("{}", render_list(&modules, &catalog));
            println!(
                "{} modules installed, {} bindings",
                modules.len(),
                binder.len()
            );
            for key in binder.keys() {
                match &key.qualifier {
                    Some(q) => println!("  {} @ {}", key.type_name, q),
                    None => println!("  {}", key.type_name),
                }
            }
            Ok(())
        }
        Commands::Catalog => {
            print!("{}", render_catalog(&catalog));
            Ok(())
        }
        Commands::Check => {
            let (modules, _) = resolve_and_install(&config, &catalog)?;
            println!("Module list is valid ({} modules)", modules.len());
            Ok(())
        }
    }
}

/// Layered config:
/// 1) defaults -> 2) YAML (if provided) -> 3) env (WIREKIT__*) -> 4) CLI overrides
fn load_config(cli: &Cli) -> Result<AppConfig> {
    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        print_config: cli.print_config,
        verbose: cli.verbose,
        include: cli.include.clone(),
        exclude: cli.exclude.clone(),
    };

    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);
    Ok(config)
}

fn resolve_and_install(
    config: &AppConfig,
    catalog: &ModuleCatalog,
) -> Result<(ModuleList, RecordingBinder)> {
    let modules = resolve_modules(config, catalog, Arc::new(ServiceMap::new()))?;
    let mut binder = RecordingBinder::default();
    modules.install(&mut binder)?;
    Ok((modules, binder))
}

fn display_name(catalog: &ModuleCatalog, id: ModuleId) -> &'static str {
    catalog.get(id).map_or_else(|| id.short_name(), |c| c.name())
}

fn render_list(modules: &ModuleList, catalog: &ModuleCatalog) -> String {
    let mut out = String::new();
    for (i, m) in modules.iter().enumerate() {
        let origin = match m.origin() {
            Origin::Explicit => "explicit".to_string(),
            Origin::Dependency { of } => format!("dependency of {}", display_name(catalog, *of)),
        };
        let replaced = m
            .replaced()
            .map(|r| format!(" (replaces {})", display_name(catalog, r)))
            .unwrap_or_default();
        out.push_str(&format!("{:>3}. {:<20} {}{}\n", i + 1, m.name(), origin, replaced));
    }
    out
}

fn render_catalog(catalog: &ModuleCatalog) -> String {
    let mut out = String::new();
    for class in catalog.classes() {
        let deps = match class.dependencies() {
            DependencySource::Static(ids) => format!(
                "include [{}]",
                ids.iter()
                    .map(|id| display_name(catalog, *id))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            DependencySource::Constructor(params) => format!(
                "constructor ({})",
                params
                    .iter()
                    .map(|p| {
                        let id = p.module_id();
                        if catalog.contains(id) {
                            display_name(catalog, id)
                        } else {
                            id.short_name()
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        };
        out.push_str(&format!("{:<20} {}\n", class.name(), deps));
    }
    out
}
