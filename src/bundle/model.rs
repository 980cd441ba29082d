use std::collections::HashMap;

use super::InclusionPattern;
use crate::mapping::FileFilter;
use crate::types::BundleId;
use crate::variant::VariantSet;

/// Regular bundles resolve their own mappings; composites aggregate other
/// bundles.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BundleKind {
    #[default]
    Standard,
    Composite(Vec<BundleId>),
}

/// A declared bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    pub id: BundleId,
    /// Served name, e.g. `/bundles/app.js`.
    pub name: String,
    /// Extension of the resources this bundle collects (`js`, `css`).
    pub extension: String,
    /// Path prefix items are served under.
    pub prefix: Option<String>,
    /// Raw mapping patterns, in declaration order.
    pub mappings: Vec<String>,
    pub inclusion: InclusionPattern,
    pub file_filter: Option<FileFilter>,
    /// Declared variant dimensions.
    pub variants: HashMap<String, VariantSet>,
    pub kind: BundleKind,
}

impl Bundle {
    /// A standard bundle with no mappings. The extension is taken from the
    /// bundle name.
    pub fn new(id: BundleId, name: impl Into<String>) -> Self {
        let name = name.into();
        let extension = extension_of(&name).unwrap_or_default().to_string();
        Self {
            id,
            name,
            extension,
            prefix: None,
            mappings: Vec::new(),
            inclusion: InclusionPattern::default(),
            file_filter: None,
            variants: HashMap::new(),
            kind: BundleKind::Standard,
        }
    }

    pub fn with_mappings<I, S>(mut self, mappings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mappings = mappings.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn with_prefix(mut self, prefix: Option<String>) -> Self {
        self.prefix = prefix;
        self
    }

    pub fn with_inclusion(mut self, inclusion: InclusionPattern) -> Self {
        self.inclusion = inclusion;
        self
    }

    pub fn with_file_filter(mut self, filter: Option<FileFilter>) -> Self {
        self.file_filter = filter;
        self
    }

    pub fn with_variants(mut self, variants: HashMap<String, VariantSet>) -> Self {
        self.variants = variants;
        self
    }

    pub fn with_kind(mut self, kind: BundleKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn is_composite(&self) -> bool {
        matches!(self.kind, BundleKind::Composite(_))
    }

    /// Child bundles of a composite, empty for standard bundles.
    pub fn children(&self) -> &[BundleId] {
        match &self.kind {
            BundleKind::Composite(children) => children,
            BundleKind::Standard => &[],
        }
    }
}

fn extension_of(name: &str) -> Option<&str> {
    let file = name.rsplit('/').next()?;
    let (_, ext) = file.rsplit_once('.')?;
    Some(ext)
}
