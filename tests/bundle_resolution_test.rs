//! Settings file to resolved bundles, through the public API.

use std::fs;
use std::sync::Arc;

use bundlemap::variant::{all_variant_keys_fixed, variant_bundle_name};
use bundlemap::{
    BundleRegistry, BundlesHandler, FsResourceReader, MappingError, PrefixGeneratorRegistry,
    Settings,
};
use tempfile::TempDir;

const SETTINGS: &str = r#"
[[generators]]
prefix = "messages:"
watch = "/i18n/"

[generators.variants.locale]
default = "en"
values = ["en", "fr", "de"]

[[bundles]]
name = "/bundles/app.js"
mappings = ["/js/**", "messages:app"]

[bundles.variants.skin]
default = "light"
values = ["light", "dark"]

[[bundles]]
name = "/bundles/debug.js"
mappings = ["/debug/"]
debug = "only"

[[bundles]]
name = "/bundles/all.js"
composite = ["/bundles/app.js", "/bundles/debug.js"]
"#;

struct Workspace {
    temp_dir: TempDir,
    settings: Settings,
}

impl Workspace {
    fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("web");
        fs::create_dir_all(root.join("js/widgets")).unwrap();
        fs::create_dir_all(root.join("debug")).unwrap();
        fs::create_dir_all(root.join("i18n")).unwrap();

        fs::write(root.join("js/.sorting"), "# core first\ncore.js\nwidgets\n").unwrap();
        fs::write(root.join("js/.license"), "MIT").unwrap();
        fs::write(root.join("js/core.js"), "core").unwrap();
        fs::write(root.join("js/app.js"), "app").unwrap();
        fs::write(root.join("js/notes.txt"), "ignored").unwrap();
        fs::write(root.join("js/widgets/menu.js"), "menu").unwrap();
        fs::write(root.join("debug/trace.js"), "trace").unwrap();

        let config_path = temp_dir.path().join("settings.toml");
        fs::write(&config_path, SETTINGS).unwrap();
        let mut settings = Settings::load_from(&config_path).unwrap();
        settings.resources.root = root;

        Self { temp_dir, settings }
    }

    fn handler(&self) -> BundlesHandler {
        BundlesHandler::new(
            Arc::new(BundleRegistry::from_settings(&self.settings.bundles).unwrap()),
            Arc::new(FsResourceReader::new(&self.settings.resources.root)),
            Arc::new(PrefixGeneratorRegistry::from_settings(&self.settings.generators).unwrap()),
        )
    }
}

#[test]
fn test_settings_resolve_into_ordered_items() {
    let workspace = Workspace::new();
    let handler = workspace.handler();
    handler.resolve_all().unwrap();

    let app = handler.mapping_by_name("/bundles/app.js").unwrap();
    let items: Vec<&str> = app.item_paths().map(|p| p.path.as_str()).collect();
    assert_eq!(
        items,
        vec!["/js/core.js", "/js/widgets/menu.js", "/js/app.js", "messages:app"]
    );
    assert_eq!(app.license_paths().len(), 1);

    // The sort file, the license and the three scripts back the bundle.
    assert_eq!(app.file_path_mappings().len(), 5);
    let root = workspace.temp_dir.path().canonicalize().unwrap();
    assert!(app.file_path_mappings().all(|f| f.path.starts_with(&root)));
}

#[test]
fn test_variants_merge_bundle_and_generator_dimensions() {
    let workspace = Workspace::new();
    let handler = workspace.handler();
    handler.resolve_all().unwrap();

    let app = handler.mapping_by_name("/bundles/app.js").unwrap();
    let keys = app.variant_keys();
    assert_eq!(keys.len(), 6);
    assert!(keys.contains(&"fr@dark".to_string()));

    let fixed = [("locale".to_string(), "fr".to_string())].into_iter().collect();
    let french = all_variant_keys_fixed(app.variants(), &fixed);
    assert_eq!(french, vec!["fr@dark", "fr@light"]);
    assert_eq!(
        variant_bundle_name("/bundles/app.js", &french[0], false),
        "/bundles/app@fr@dark.js"
    );
}

#[test]
fn test_composite_unions_children() {
    let workspace = Workspace::new();
    let handler = workspace.handler();
    handler.resolve_all().unwrap();

    let all = handler.mapping_by_name("/bundles/all.js").unwrap();
    let production: Vec<&str> = all.item_paths().map(|p| p.path.as_str()).collect();
    let debug: Vec<&str> = all.item_debug_paths().map(|p| p.path.as_str()).collect();

    assert!(!production.contains(&"/debug/trace.js"));
    assert!(debug.contains(&"/debug/trace.js"));
    assert!(debug.contains(&"/js/core.js"));
    assert_eq!(all.variant_keys().len(), 6);
}

#[test]
fn test_unrecognized_mapping_fails_resolution() {
    let mut workspace = Workspace::new();
    workspace.settings.bundles[1].mappings = vec!["/debug/trace.css".to_string()];

    let handler = workspace.handler();
    match handler.resolve_all() {
        Err(MappingError::UnrecognizedMapping { bundle, mapping }) => {
            assert_eq!(bundle, "/bundles/debug.js");
            assert_eq!(mapping, "/debug/trace.css");
        }
        other => panic!("expected unrecognized mapping, got {other:?}"),
    }
    assert!(handler.mappings().is_empty());
}
