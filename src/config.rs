//! Configuration module for the bundle resolver.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file (`.bundlemap/settings.toml`)
//! - Environment variable overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `BM_` and use double underscores
//! to separate nested levels:
//! - `BM_WATCHER__QUIESCENCE_DELAY_MS=250` sets `watcher.quiescence_delay_ms`
//! - `BM_RESOURCES__ROOT=/srv/www` sets `resources.root`
//! - `BM_LOGGING__DEFAULT=debug` sets `logging.default`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::bundle::DebugInclusion;
use crate::variant::VariantError;

/// Directory holding the settings file, searched upward from the current
/// directory.
pub const CONFIG_DIR: &str = ".bundlemap";
const CONFIG_FILE: &str = "settings.toml";
const ENV_PREFIX: &str = "BM_";

/// Errors from loading configuration or turning it into bundles.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("Bundle '{name}' is declared more than once")]
    DuplicateBundle { name: String },

    #[error("Composite bundle '{composite}' refers to unknown bundle '{child}'")]
    UnknownChild { composite: String, child: String },

    #[error("Bundle '{bundle}' has invalid variants: {source}")]
    InvalidVariants {
        bundle: String,
        #[source]
        source: VariantError,
    },

    #[error("Bundle '{bundle}' has an invalid file filter '{pattern}': {reason}")]
    InvalidFileFilter {
        bundle: String,
        pattern: String,
        reason: String,
    },

    #[error("Configuration file already exists at {}. Use --force to overwrite", .path.display())]
    AlreadyExists { path: PathBuf },

    #[error("Failed to write configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Where resources are read from
    #[serde(default)]
    pub resources: ResourcesConfig,

    /// Generated resource prefixes
    #[serde(default)]
    pub generators: Vec<GeneratorSettings>,

    /// Filesystem watching
    #[serde(default)]
    pub watcher: WatcherConfig,

    /// Log levels
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Declared bundles, in order
    #[serde(default)]
    pub bundles: Vec<BundleSettings>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ResourcesConfig {
    /// Root directory web paths are resolved against
    #[serde(default = "default_resource_root")]
    pub root: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GeneratorSettings {
    /// Path prefix identifying generated resources (e.g. `messages:`)
    pub prefix: String,

    /// Variant dimensions generated resources are produced in
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub variants: IndexMap<String, VariantSettings>,

    /// Source mapping watched on behalf of generated resources
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watch: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct WatcherConfig {
    /// Enable filesystem watching in `bundlemap watch`
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// How long the event queue must stay quiet before a rebuild
    #[serde(default = "default_quiescence_delay_ms")]
    pub quiescence_delay_ms: u64,

    /// Capacity of the event queue between the two watcher threads
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Granularity of the watcher threads' stop checks
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Default level for every module
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module overrides, e.g. `watcher = "debug"`
    #[serde(default)]
    pub modules: IndexMap<String, String>,
}

/// One `[[bundles]]` entry.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BundleSettings {
    /// Bundle name, e.g. `/bundles/app.js`
    pub name: String,

    /// Mapping patterns
    #[serde(default)]
    pub mappings: Vec<String>,

    /// Resource extension; taken from the name when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    #[serde(default)]
    pub debug: DebugInclusion,

    #[serde(default)]
    pub global: bool,

    #[serde(default)]
    pub order: i32,

    /// Child bundle names; a non-empty list makes this a composite
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub composite: Vec<String>,

    /// Glob restricting which changed files invalidate directory mappings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_filter: Option<String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub variants: IndexMap<String, VariantSettings>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct VariantSettings {
    pub default: String,
    pub values: Vec<String>,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_true() -> bool {
    true
}
fn default_resource_root() -> PathBuf {
    PathBuf::from(".")
}
fn default_quiescence_delay_ms() -> u64 {
    1000
}
fn default_queue_capacity() -> usize {
    1024
}
fn default_poll_interval_ms() -> u64 {
    100
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            resources: ResourcesConfig::default(),
            generators: Vec::new(),
            watcher: WatcherConfig::default(),
            logging: LoggingConfig::default(),
            bundles: Vec::new(),
        }
    }
}

impl Default for ResourcesConfig {
    fn default() -> Self {
        Self {
            root: default_resource_root(),
        }
    }
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            quiescence_delay_ms: default_quiescence_delay_ms(),
            queue_capacity: default_queue_capacity(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: IndexMap::new(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            Self::find_workspace_config().unwrap_or_else(|| Path::new(CONFIG_DIR).join(CONFIG_FILE));

        let mut settings = Self::figment(&config_path).extract::<Settings>().map_err(Box::new)?;

        // A relative resource root is relative to the workspace, not to the
        // directory the command runs in.
        if settings.resources.root.is_relative() {
            if let Some(workspace) = Self::workspace_root() {
                settings.resources.root = workspace.join(&settings.resources.root);
            }
        }

        Ok(settings)
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Ok(Self::figment(path.as_ref())
            .extract::<Settings>()
            .map_err(Box::new)?)
    }

    fn figment(path: &Path) -> Figment {
        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(path))
            // Double underscore separates nested levels, single underscores
            // stay within field names
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
    }

    /// Find the settings file by looking for the config directory upward
    fn find_workspace_config() -> Option<PathBuf> {
        Self::workspace_root().map(|root| root.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Get the workspace root directory (where `.bundlemap` is located)
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        current
            .ancestors()
            .find(|ancestor| ancestor.join(CONFIG_DIR).is_dir())
            .map(Path::to_path_buf)
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file under `dir`
    pub fn init_config_file(dir: impl AsRef<Path>, force: bool) -> Result<PathBuf, ConfigError> {
        let config_path = dir.as_ref().join(CONFIG_DIR).join(CONFIG_FILE);

        if !force && config_path.exists() {
            return Err(ConfigError::AlreadyExists { path: config_path });
        }

        let mut settings = Settings::default();
        settings.bundles.push(BundleSettings::example());
        settings.save(&config_path)?;

        Ok(config_path)
    }
}

impl BundleSettings {
    /// A bundle collecting every script under `/js/`.
    pub fn example() -> Self {
        Self {
            name: "/bundles/app.js".to_string(),
            mappings: vec!["/js/**".to_string()],
            extension: None,
            prefix: None,
            debug: DebugInclusion::Always,
            global: false,
            order: 0,
            composite: Vec::new(),
            file_filter: None,
            variants: IndexMap::new(),
        }
    }
}
