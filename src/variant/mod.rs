//! Content variants and the algebra that combines them.
//!
//! A bundle can be specialised along independent dimensions (locale, skin,
//! browser, connection type...). Each dimension is described by a
//! [`VariantSet`]; the functions in this module merge dimensions declared by
//! different sources and expand them into concrete variant keys.
//!
//! # Keys
//!
//! A variant key joins one value per dimension with [`VARIANT_SEPARATOR`],
//! dimensions sorted by name:
//!
//! ```text
//! {locale: {en, fr}, skin: {summer}}  ->  ["en@summer", "fr@summer"]
//! ```

mod algebra;
mod error;
mod set;

pub use algebra::{
    all_variant_keys, all_variant_keys_fixed, all_variants, concat_variants, variant_bundle_name,
    variant_key,
};
pub use error::VariantError;
pub use set::VariantSet;

/// Separator between dimension values inside a variant key.
pub const VARIANT_SEPARATOR: char = '@';

/// Locale dimension.
pub const LOCALE_VARIANT_TYPE: &str = "locale";

/// Skin dimension (CSS themes).
pub const SKIN_VARIANT_TYPE: &str = "skin";

/// Browser dimension.
pub const BROWSER_VARIANT_TYPE: &str = "browser";

/// Connection type dimension (e.g. plain vs. ssl).
pub const CONNECTION_TYPE_VARIANT_TYPE: &str = "connectionType";

/// URL scheme dimension.
pub const URL_SCHEME_VARIANT_TYPE: &str = "urlScheme";
