//! Path mappings and their resolution into bundle items.
//!
//! A bundle declares patterns ([`PathMapping`]); the
//! [`BundlePathMappingBuilder`] resolves them against a
//! [`ResourceReader`](crate::resource::ResourceReader) into ordered item lists
//! and the concrete files backing them ([`FilePathMapping`]). Composite bundles
//! are the union of their resolved children ([`CompositeMappingBuilder`]).

mod builder;
mod bundle_path;
mod composite;
mod error;
mod file;
pub mod normalize;
mod path;
mod sort;

pub use builder::{BundlePathMappingBuilder, LICENSE_FILE_NAME};
pub use bundle_path::{BundlePath, BundlePathMapping};
pub use composite::CompositeMappingBuilder;
pub use error::MappingError;
pub use file::FilePathMapping;
pub use path::{FileFilter, PathKind, PathMapping};
pub use sort::{SORT_FILE_NAME, parse_sort_file};
