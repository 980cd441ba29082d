//! Resolve command - print resolved bundle contents.

use std::path::Path;

use serde::Serialize;

use crate::config::Settings;
use crate::mapping::{BundlePath, BundlePathMapping};

/// JSON shape of one resolved bundle.
#[derive(Serialize)]
struct BundleView<'a> {
    id: u32,
    name: &'a str,
    composite: bool,
    items: Vec<&'a BundlePath>,
    debug_items: Vec<&'a BundlePath>,
    files: Vec<&'a Path>,
    licenses: Vec<&'a str>,
    variant_keys: Vec<String>,
}

impl<'a> BundleView<'a> {
    fn new(mapping: &'a BundlePathMapping) -> Self {
        let bundle = mapping.bundle();
        Self {
            id: bundle.id.value(),
            name: &bundle.name,
            composite: bundle.is_composite(),
            items: mapping.item_paths().collect(),
            debug_items: mapping.item_debug_paths().collect(),
            files: mapping.file_path_mappings().map(|f| f.path()).collect(),
            licenses: mapping.license_paths().iter().map(String::as_str).collect(),
            variant_keys: mapping.variant_keys(),
        }
    }
}

/// Run the resolve command.
pub fn run(settings: &Settings, bundle: Option<&str>, json: bool) -> anyhow::Result<()> {
    let handler = crate::cli::bundles_handler(settings)?;
    handler.resolve_all()?;

    let mappings = match bundle {
        Some(name) => {
            let mapping = handler
                .mapping_by_name(name)
                .ok_or_else(|| anyhow::anyhow!("unknown bundle '{name}'"))?;
            vec![mapping]
        }
        None => handler.mappings(),
    };

    if json {
        let views: Vec<BundleView> = mappings.iter().map(|m| BundleView::new(m)).collect();
        println!("{}", serde_json::to_string_pretty(&views)?);
        return Ok(());
    }

    for mapping in &mappings {
        print_mapping(mapping);
    }
    Ok(())
}

fn print_mapping(mapping: &BundlePathMapping) {
    let bundle = mapping.bundle();
    let kind = if bundle.is_composite() { " (composite)" } else { "" };
    println!("{} {}{kind}", bundle.id, bundle.name);

    for item in mapping.item_paths() {
        println!("  {item}");
    }

    let debug_only: Vec<&BundlePath> = mapping
        .item_debug_paths()
        .filter(|item| !mapping.item_paths().any(|p| p == *item))
        .collect();
    if !debug_only.is_empty() {
        println!("  debug only:");
        for item in debug_only {
            println!("    {item}");
        }
    }

    for license in mapping.license_paths() {
        println!("  license: {license}");
    }

    let keys = mapping.variant_keys();
    if keys.iter().any(|key| !key.is_empty()) {
        println!("  variants: {}", keys.join(", "));
    }
}
