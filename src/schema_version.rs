use serde::{Deserialize, Serialize};
use std::fmt;

/// Version of a data dictionary schema, compared by major, minor and patch
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl SchemaVersion {
    /// Schema the annotation tool emitted before variable types existed
    pub const LEGACY: SchemaVersion = SchemaVersion::new(1, 0, 0);
    /// Schema with an explicit `VariableType` on every annotation block
    pub const LATEST: SchemaVersion = SchemaVersion::new(2, 0, 0);

    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl PartialOrd for SchemaVersion {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SchemaVersion {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.major.cmp(&other.major)
            .then_with(|| self.minor.cmp(&other.minor))
            .then_with(|| self.patch.cmp(&other.patch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_version_display() {
        assert_eq!(SchemaVersion::LEGACY.to_string(), "1.0.0");
        assert_eq!(SchemaVersion::new(2, 1, 3).to_string(), "2.1.3");
    }

    #[test]
    fn test_latest_is_newer_than_legacy() {
        assert!(SchemaVersion::LEGACY < SchemaVersion::LATEST);
    }

    #[test]
    fn test_schema_version_ordering() {
        let v1 = SchemaVersion::new(1, 0, 10);
        let v2 = SchemaVersion::new(1, 2, 0);
        let v3 = SchemaVersion::new(2, 0, 0);

        assert!(v1 < v2);
        assert!(v2 < v3);
        assert!(v1 < v3);
        assert_eq!(v3.clone().max(v1.clone()), v3);
    }
}
