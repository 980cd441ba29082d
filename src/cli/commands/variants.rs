//! Variants command - expand a bundle's variant dimensions.

use std::collections::HashMap;

use anyhow::Context;

use crate::config::Settings;
use crate::variant::{all_variant_keys_fixed, variant_bundle_name};

/// Parse `dim=value` pairs.
fn parse_fixed(pairs: &[String]) -> anyhow::Result<HashMap<String, String>> {
    pairs
        .iter()
        .map(|pair| {
            let (dim, value) = pair
                .split_once('=')
                .with_context(|| format!("expected DIM=VALUE, got '{pair}'"))?;
            Ok((dim.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Run the variants command.
pub fn run(settings: &Settings, bundle: &str, fix: &[String]) -> anyhow::Result<()> {
    let fixed = parse_fixed(fix)?;

    let handler = crate::cli::bundles_handler(settings)?;
    handler.resolve_all()?;
    let mapping = handler
        .mapping_by_name(bundle)
        .ok_or_else(|| anyhow::anyhow!("unknown bundle '{bundle}'"))?;

    for dim in fixed.keys() {
        if !mapping.variants().contains_key(dim) {
            anyhow::bail!("bundle '{bundle}' has no '{dim}' variants");
        }
    }

    for key in all_variant_keys_fixed(mapping.variants(), &fixed) {
        let display = if key.is_empty() { "(none)" } else { key.as_str() };
        println!("{display:<24} {}", variant_bundle_name(bundle, &key, false));
    }
    Ok(())
}
