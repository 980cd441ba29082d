//! Command-line interface: argument parsing and command dispatch.

pub mod args;
pub mod commands;

pub use args::{Cli, Commands};

use std::sync::Arc;

use anyhow::Context;

use crate::bundle::{BundleRegistry, BundlesHandler};
use crate::config::Settings;
use crate::resource::{FsResourceReader, PrefixGeneratorRegistry};

/// Load settings from `--config` or the workspace.
pub fn load_settings(cli: &Cli) -> anyhow::Result<Settings> {
    let settings = match &cli.config {
        Some(path) => Settings::load_from(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => Settings::load()?,
    };
    Ok(settings)
}

/// Build a handler over the configured bundles, resources and generators.
pub fn bundles_handler(settings: &Settings) -> anyhow::Result<BundlesHandler> {
    let registry = BundleRegistry::from_settings(&settings.bundles)?;
    let generators = PrefixGeneratorRegistry::from_settings(&settings.generators)?;

    let root = &settings.resources.root;
    anyhow::ensure!(
        root.is_dir(),
        "resource root {} is not a directory",
        root.display()
    );

    Ok(BundlesHandler::new(
        Arc::new(registry),
        Arc::new(FsResourceReader::new(root)),
        Arc::new(generators),
    ))
}

/// Run the parsed command.
pub fn run(cli: Cli) -> anyhow::Result<()> {
    if let Commands::Init { force } = &cli.command {
        crate::logging::init();
        return commands::init::run_init(*force);
    }

    let settings = load_settings(&cli)?;
    crate::logging::init_with_config(&settings.logging);

    match cli.command {
        Commands::Init { .. } => Ok(()),
        Commands::Config => commands::init::run_config(&settings),
        Commands::Resolve { bundle, json } => {
            commands::resolve::run(&settings, bundle.as_deref(), json)
        }
        Commands::Variants { bundle, fix } => commands::variants::run(&settings, &bundle, &fix),
        Commands::Watch { idle_timeout } => commands::watch::run(&settings, idle_timeout),
    }
}
