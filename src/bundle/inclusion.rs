use serde::{Deserialize, Serialize};

/// Which item lists a bundle's resources go to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebugInclusion {
    /// Production and debug lists.
    #[default]
    Always,
    /// Debug list only.
    Only,
    /// Production list only.
    Never,
}

/// How a bundle takes part in page rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct InclusionPattern {
    /// Included in every page before the other bundles.
    #[serde(default)]
    pub global: bool,
    /// Position among global bundles.
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub debug: DebugInclusion,
}
