pub mod bundle;
pub mod cli;
pub mod config;
pub mod logging;
pub mod mapping;
pub mod resource;
pub mod types;
pub mod variant;
pub mod watcher;

pub use bundle::{
    Bundle, BundleKind, BundleRegistry, BundlesHandler, DebugInclusion, InclusionPattern,
};
pub use config::Settings;
pub use mapping::{
    BundlePath, BundlePathMapping, BundlePathMappingBuilder, CompositeMappingBuilder, MappingError,
    PathMapping,
};
pub use resource::{FsResourceReader, GeneratorRegistry, PrefixGeneratorRegistry, ResourceReader};
pub use types::BundleId;
pub use variant::{VariantError, VariantSet};
pub use watcher::{DirtyBundleHandler, RebuildGate, ResourceWatcher, WatchError};
