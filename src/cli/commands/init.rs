//! Init and Config commands.

use crate::config::Settings;

/// Run init command - create configuration file.
pub fn run_init(force: bool) -> anyhow::Result<()> {
    let dir = std::env::current_dir()?;
    let path = Settings::init_config_file(&dir, force)?;

    println!("Created configuration file at: {}", path.display());
    println!("Declare your bundles under [[bundles]] in this file.");
    Ok(())
}

/// Run config command - display current configuration.
pub fn run_config(settings: &Settings) -> anyhow::Result<()> {
    println!("Current Configuration:");
    println!("{}", "=".repeat(50));
    println!("{}", toml::to_string_pretty(settings)?);
    Ok(())
}
