use std::collections::HashMap;

use super::GeneratorRegistry;
use crate::bundle::variants_from_settings;
use crate::config::{ConfigError, GeneratorSettings};
use crate::mapping::PathMapping;
use crate::variant::VariantSet;

#[derive(Debug, Clone)]
struct PrefixGenerator {
    prefix: String,
    variants: HashMap<String, VariantSet>,
    watch: Option<String>,
}

/// Recognizes generated resources by path prefix (`jar:`, `messages:`...).
///
/// Each prefix may declare the variants its resources come in and a source
/// mapping to watch on their behalf.
#[derive(Debug, Clone, Default)]
pub struct PrefixGeneratorRegistry {
    generators: Vec<PrefixGenerator>,
}

impl PrefixGeneratorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a generator prefix.
    ///
    /// `watch` is a mapping pattern (e.g. `/i18n/`) whose changes invalidate
    /// every bundle using this generator.
    pub fn with_generator(
        mut self,
        prefix: impl Into<String>,
        variants: HashMap<String, VariantSet>,
        watch: Option<String>,
    ) -> Self {
        self.generators.push(PrefixGenerator {
            prefix: prefix.into(),
            variants,
            watch,
        });
        self
    }

    /// Build the registry from `[[generators]]` declarations.
    pub fn from_settings(declarations: &[GeneratorSettings]) -> Result<Self, ConfigError> {
        declarations.iter().try_fold(Self::new(), |registry, decl| {
            let variants = variants_from_settings(&decl.variants).map_err(|source| {
                ConfigError::InvalidVariants {
                    bundle: decl.prefix.clone(),
                    source,
                }
            })?;
            Ok(registry.with_generator(decl.prefix.as_str(), variants, decl.watch.clone()))
        })
    }

    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.generators.iter().map(|g| g.prefix.as_str())
    }

    fn generator_for(&self, path: &str) -> Option<&PrefixGenerator> {
        self.generators
            .iter()
            .find(|g| path.starts_with(g.prefix.as_str()))
    }
}

impl GeneratorRegistry for PrefixGeneratorRegistry {
    fn is_generated_path(&self, path: &str) -> bool {
        self.generator_for(path).is_some()
    }

    fn available_variants(&self, path: &str) -> HashMap<String, VariantSet> {
        self.generator_for(path)
            .map(|g| g.variants.clone())
            .unwrap_or_default()
    }

    fn watch_mappings(&self, mapping: &PathMapping) -> Option<Vec<PathMapping>> {
        let generator = self.generator_for(mapping.path())?;
        let watch = generator.watch.as_ref()?;
        Some(vec![
            PathMapping::new(mapping.owner(), watch.as_str())
                .with_file_filter(mapping.file_filter().cloned()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BundleId;

    #[test]
    fn test_prefix_detection() {
        let registry = PrefixGeneratorRegistry::new()
            .with_generator("jar:", HashMap::new(), None)
            .with_generator("messages:", HashMap::new(), Some("/i18n/".into()));

        assert!(registry.is_generated_path("jar:/net/lib.js"));
        assert!(registry.is_generated_path("messages:app"));
        assert!(!registry.is_generated_path("/js/app.js"));
        assert_eq!(registry.prefixes().collect::<Vec<_>>(), vec!["jar:", "messages:"]);
    }

    #[test]
    fn test_from_settings() {
        let declarations: Vec<GeneratorSettings> = toml::from_str::<toml::Table>(
            r#"
            [[generators]]
            prefix = "messages:"
            watch = "/i18n/"

            [generators.variants.locale]
            default = "en"
            values = ["en", "fr"]
            "#,
        )
        .unwrap()["generators"]
            .clone()
            .try_into()
            .unwrap();

        let registry = PrefixGeneratorRegistry::from_settings(&declarations).unwrap();
        let variants = registry.available_variants("messages:app");
        assert_eq!(variants["locale"].default_variant(), "en");
        assert_eq!(variants["locale"].len(), 2);
        assert!(registry.available_variants("/js/app.js").is_empty());
    }

    #[test]
    fn test_from_settings_rejects_unknown_default() {
        let mut decl = GeneratorSettings {
            prefix: "messages:".into(),
            variants: Default::default(),
            watch: None,
        };
        decl.variants.insert(
            "locale".into(),
            crate::config::VariantSettings {
                default: "de".into(),
                values: vec!["en".into()],
            },
        );

        assert!(matches!(
            PrefixGeneratorRegistry::from_settings(&[decl]),
            Err(ConfigError::InvalidVariants { .. })
        ));
    }

    #[test]
    fn test_watch_mappings() {
        let registry = PrefixGeneratorRegistry::new()
            .with_generator("jar:", HashMap::new(), None)
            .with_generator("messages:", HashMap::new(), Some("/i18n/".into()));
        let owner = BundleId::new(4).unwrap();

        assert!(
            registry
                .watch_mappings(&PathMapping::new(owner, "jar:/lib.js"))
                .is_none()
        );

        let watched = registry
            .watch_mappings(&PathMapping::new(owner, "messages:app"))
            .unwrap();
        assert_eq!(watched.len(), 1);
        assert!(watched[0].is_directory());
        assert_eq!(watched[0].path(), "/i18n/");
        assert_eq!(watched[0].owner(), owner);
    }
}
