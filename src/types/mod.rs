use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;

/// Opaque handle to a bundle held by a [`BundleRegistry`](crate::bundle::BundleRegistry).
///
/// Mappings carry this id instead of a reference to the bundle itself, so a
/// reconfigured bundle never stays alive through a stale mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BundleId(NonZeroU32);

impl BundleId {
    pub const MAX: BundleId = BundleId(NonZeroU32::MAX);

    pub fn new(value: u32) -> Option<Self> {
        NonZeroU32::new(value).map(Self)
    }

    pub fn value(&self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for BundleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundle_id_creation() {
        assert!(BundleId::new(0).is_none());

        let id = BundleId::new(42).unwrap();
        assert_eq!(id.value(), 42);
        assert_eq!(id.to_string(), "#42");
    }

    #[test]
    fn test_id_equality_and_hash() {
        let id1 = BundleId::new(42).unwrap();
        let id2 = BundleId::new(42).unwrap();
        let id3 = BundleId::new(43).unwrap();

        assert_eq!(id1, id2);
        assert_ne!(id1, id3);

        // Test that they can be used in HashMaps
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(id1);
        assert!(set.contains(&id2));
        assert!(!set.contains(&id3));
    }
}
