//! Error types for bundle resolution.

use thiserror::Error;

use crate::variant::VariantError;

/// Errors raised while resolving a bundle's mappings.
///
/// These are configuration errors for the bundle being resolved. Transient
/// filesystem races never surface here; they are logged and skipped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    #[error(
        "Wrong mapping [{mapping}] for bundle [{bundle}]. Please check configuration."
    )]
    UnrecognizedMapping { bundle: String, mapping: String },

    #[error("Invalid variants for bundle [{bundle}]: {source}")]
    Variant {
        bundle: String,
        #[source]
        source: VariantError,
    },

    #[error("Composite bundle [{composite}] refers to unknown child bundle {child}")]
    MissingChild { composite: String, child: String },

    #[error("Composite bundle [{bundle}] contains itself")]
    CompositeCycle { bundle: String },
}
