use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::VariantError;

/// The legal values of one variant dimension and its default.
///
/// The default is always a member of the set; [`VariantSet::new`] refuses to
/// build anything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSet {
    variant_type: String,
    default_variant: String,
    variants: BTreeSet<String>,
}

impl VariantSet {
    /// Create a variant set, checking that `default_variant` is one of `variants`.
    pub fn new<I, S>(
        variant_type: impl Into<String>,
        default_variant: impl Into<String>,
        variants: I,
    ) -> Result<Self, VariantError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let variant_type = variant_type.into();
        let default_variant = default_variant.into();
        let variants: BTreeSet<String> = variants.into_iter().map(Into::into).collect();

        if !variants.contains(&default_variant) {
            return Err(VariantError::DefaultNotInSet {
                variant_type,
                default: default_variant,
                values: variants.into_iter().collect(),
            });
        }

        Ok(Self {
            variant_type,
            default_variant,
            variants,
        })
    }

    /// A set holding only `value`, which is also its default.
    pub fn singleton(variant_type: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            variant_type: variant_type.into(),
            default_variant: value.clone(),
            variants: BTreeSet::from([value]),
        }
    }

    /// Dimension name (e.g. `locale`).
    pub fn variant_type(&self) -> &str {
        &self.variant_type
    }

    pub fn default_variant(&self) -> &str {
        &self.default_variant
    }

    pub fn variants(&self) -> &BTreeSet<String> {
        &self.variants
    }

    pub fn contains(&self, value: &str) -> bool {
        self.variants.contains(value)
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.variants.iter().map(String::as_str)
    }

    /// Two sets of the same dimension can be merged only if they agree on the default.
    pub fn is_compatible_with(&self, other: &VariantSet) -> bool {
        self.default_variant == other.default_variant
    }
}

impl<'a> IntoIterator for &'a VariantSet {
    type Item = &'a String;
    type IntoIter = std::collections::btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.variants.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_must_be_member() {
        let err = VariantSet::new("locale", "de", ["en", "fr"]).unwrap_err();
        match err {
            VariantError::DefaultNotInSet {
                variant_type,
                default,
                values,
            } => {
                assert_eq!(variant_type, "locale");
                assert_eq!(default, "de");
                assert_eq!(values, vec!["en", "fr"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_default_is_a_regular_value() {
        let set = VariantSet::new("locale", "", ["", "fr"]).unwrap();
        assert_eq!(set.default_variant(), "");
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_compatibility_follows_default() {
        let a = VariantSet::new("skin", "summer", ["summer", "winter"]).unwrap();
        let b = VariantSet::new("skin", "summer", ["summer", "autumn"]).unwrap();
        let c = VariantSet::new("skin", "winter", ["summer", "winter"]).unwrap();

        assert!(a.is_compatible_with(&b));
        assert!(!a.is_compatible_with(&c));
    }

    #[test]
    fn test_singleton() {
        let set = VariantSet::singleton("browser", "ie6");
        assert_eq!(set.default_variant(), "ie6");
        assert!(set.contains("ie6"));
        assert_eq!(set.len(), 1);
    }
}
