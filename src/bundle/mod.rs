//! Bundle declarations and their lifecycle.
//!
//! [`BundleRegistry`] holds what was declared, [`BundlesHandler`] holds what it
//! resolved to and keeps it current as sources change.

mod handler;
mod inclusion;
mod model;
mod registry;

pub use handler::BundlesHandler;
pub use inclusion::{DebugInclusion, InclusionPattern};
pub use model::{Bundle, BundleKind};
pub use registry::{BundleRegistry, variants_from_settings};
