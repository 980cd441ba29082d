//! CLI argument parsing using clap.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

#[derive(Parser)]
#[command(
    name = "bundlemap",
    version = env!("CARGO_PKG_VERSION"),
    about = "Resolve web asset bundles and keep them current as sources change",
    styles = clap_cargo_style(),
    after_help = "Examples:\n  \
        $ bundlemap init\n  \
        $ bundlemap resolve --bundle /bundles/app.js\n  \
        $ bundlemap variants /bundles/app.js --fix locale=fr\n  \
        $ bundlemap watch"
)]
pub struct Cli {
    /// Path to a settings file (defaults to .bundlemap/settings.toml)
    #[arg(short, long, global = true, env = "BUNDLEMAP_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create .bundlemap/settings.toml with an example bundle
    Init {
        /// Overwrite an existing settings file
        #[arg(short, long)]
        force: bool,
    },

    /// Display active settings
    Config,

    /// Resolve bundles and print their items
    Resolve {
        /// Only this bundle
        #[arg(short, long)]
        bundle: Option<String>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// List the variant keys a bundle expands to
    Variants {
        /// Bundle name
        bundle: String,

        /// Pin a dimension to one value (e.g. locale=fr)
        #[arg(long, value_name = "DIM=VALUE")]
        fix: Vec<String>,
    },

    /// Resolve bundles, then rebuild them as their sources change
    Watch {
        /// Seconds to wait for the watcher to go quiet before rebuilding anyway
        #[arg(long, default_value_t = 10)]
        idle_timeout: u64,
    },
}
