//! Error types for variant declarations.

use thiserror::Error;

/// Errors raised while declaring or merging variant sets.
///
/// Both are configuration errors: they point at a broken bundle definition
/// and are never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VariantError {
    #[error(
        "For the variant type '{variant_type}', the default variant '{default}' doesn't exist in the variant set {values:?}"
    )]
    DefaultNotInSet {
        variant_type: String,
        default: String,
        values: Vec<String>,
    },

    #[error(
        "For the variant type '{variant_type}', the variant sets don't have the same default value ('{left}' vs '{right}')"
    )]
    IncompatibleDefaults {
        variant_type: String,
        left: String,
        right: String,
    },
}
