//! Combinators over variant dimensions.
//!
//! Everything here is pure: no I/O, no shared state.

use std::collections::{BTreeMap, HashMap};

use super::{VARIANT_SEPARATOR, VariantError, VariantSet};

/// Merge two dimension maps.
///
/// Dimensions present on one side only are copied. Dimensions present on both
/// sides must agree on their default value; their values are unioned and the
/// default of `b` (the later, more specific declaration) is kept.
pub fn concat_variants(
    a: &HashMap<String, VariantSet>,
    b: &HashMap<String, VariantSet>,
) -> Result<HashMap<String, VariantSet>, VariantError> {
    let mut result = a.clone();

    for (variant_type, right) in b {
        let merged = match result.get(variant_type) {
            None => right.clone(),
            Some(left) => {
                if !left.is_compatible_with(right) {
                    return Err(VariantError::IncompatibleDefaults {
                        variant_type: variant_type.clone(),
                        left: left.default_variant().to_string(),
                        right: right.default_variant().to_string(),
                    });
                }
                VariantSet::new(
                    variant_type.clone(),
                    right.default_variant(),
                    left.iter().chain(right.iter()),
                )?
            }
        };
        result.insert(variant_type.clone(), merged);
    }

    Ok(result)
}

/// Expand dimensions into every variant key of their cartesian product.
///
/// Dimensions are visited in name order and their values in iteration order.
/// The result holds exactly the product of the dimension sizes; an empty map
/// yields the single empty key, meaning "no variant". Dimensions without any
/// value are skipped.
pub fn all_variant_keys<C, S>(dimensions: &HashMap<String, C>) -> Vec<String>
where
    for<'a> &'a C: IntoIterator<Item = &'a S>,
    S: AsRef<str> + 'static,
{
    let mut keys: Vec<String> = vec![String::new()];
    let mut first = true;

    for (_, values) in sorted_dimensions(dimensions) {
        let values: Vec<&str> = values.into_iter().map(AsRef::as_ref).collect();
        if values.is_empty() {
            continue;
        }

        let mut next = Vec::with_capacity(keys.len() * values.len());
        for key in &keys {
            for value in &values {
                if first {
                    next.push((*value).to_string());
                } else {
                    next.push(format!("{key}{VARIANT_SEPARATOR}{value}"));
                }
            }
        }
        keys = next;
        first = false;
    }

    keys.into_iter()
        .map(|key| key.trim_end_matches(VARIANT_SEPARATOR).to_string())
        .collect()
}

/// Same as [`all_variant_keys`], with some dimensions pinned to one value.
///
/// A pinned value that is not legal for its dimension falls back to the
/// dimension's default. Pins for undeclared dimensions are ignored.
pub fn all_variant_keys_fixed(
    dimensions: &HashMap<String, VariantSet>,
    fixed: &HashMap<String, String>,
) -> Vec<String> {
    let mut pinned = dimensions.clone();

    for (variant_type, requested) in fixed {
        if let Some(set) = dimensions.get(variant_type) {
            let value = if set.contains(requested) {
                requested.as_str()
            } else {
                set.default_variant()
            };
            pinned.insert(
                variant_type.clone(),
                VariantSet::singleton(variant_type.clone(), value),
            );
        }
    }

    all_variant_keys(&pinned)
}

/// Every concrete variant of the cartesian product, as dimension → value maps.
pub fn all_variants<C, S>(dimensions: &HashMap<String, C>) -> Vec<BTreeMap<String, String>>
where
    for<'a> &'a C: IntoIterator<Item = &'a S>,
    S: AsRef<str> + 'static,
{
    let mut variants: Vec<BTreeMap<String, String>> = vec![BTreeMap::new()];

    for (variant_type, values) in sorted_dimensions(dimensions) {
        let values: Vec<&str> = values.into_iter().map(AsRef::as_ref).collect();
        if values.is_empty() {
            continue;
        }

        variants = variants
            .iter()
            .flat_map(|current| {
                values.iter().map(move |value| {
                    let mut variant = current.clone();
                    variant.insert(variant_type.clone(), (*value).to_string());
                    variant
                })
            })
            .collect();
    }

    variants
}

/// Canonical key of one concrete variant.
///
/// Only dimensions listed in `dimensions` take part; values for any other
/// dimension are left out of the key.
pub fn variant_key<'a, I>(values: &HashMap<String, String>, dimensions: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let registered: Vec<&str> = dimensions.into_iter().collect();
    let sorted: BTreeMap<&String, &String> = values
        .iter()
        .filter(|(variant_type, _)| registered.contains(&variant_type.as_str()))
        .collect();

    let separator = VARIANT_SEPARATOR.to_string();
    let key = sorted
        .values()
        .map(|value| value.as_str())
        .collect::<Vec<_>>()
        .join(separator.as_str());

    key.trim_end_matches(VARIANT_SEPARATOR).to_string()
}

/// Name of the bundle instance serving `variant_key`.
///
/// For regular bundles the key goes right before the file extension
/// (`/bundles/app.js` → `/bundles/app@fr.js`). Generated resources and names
/// without extension get the key appended at the end.
pub fn variant_bundle_name(bundle_name: &str, variant_key: &str, is_generated: bool) -> String {
    if variant_key.is_empty() {
        return bundle_name.to_string();
    }

    let file_start = bundle_name.rfind('/').map_or(0, |idx| idx + 1);
    let extension_dot = bundle_name[file_start..]
        .rfind('.')
        .map(|idx| file_start + idx);

    match extension_dot {
        Some(idx) if !is_generated => format!(
            "{}{VARIANT_SEPARATOR}{variant_key}{}",
            &bundle_name[..idx],
            &bundle_name[idx..]
        ),
        _ => format!("{bundle_name}{VARIANT_SEPARATOR}{variant_key}"),
    }
}

fn sorted_dimensions<C>(dimensions: &HashMap<String, C>) -> Vec<(&String, &C)> {
    let mut sorted: Vec<(&String, &C)> = dimensions.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    sorted
}
