//! Protocol version identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// A protocol revision, ordered by its protocol number
///
/// Several game releases can share one protocol number (1.20.3 and 1.20.4
/// both speak 765), so the number is the identity and the release name is
/// only a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProtocolVersion(pub i32);

/// Release names for every protocol number this crate knows about
///
/// The first name listed for a number is the canonical one.
const KNOWN_VERSIONS: &[(i32, &str)] = &[
    (764, "1.20.2"),
    (765, "1.20.3"),
    (765, "1.20.4"),
    (766, "1.20.5"),
    (766, "1.20.6"),
    (767, "1.21"),
    (767, "1.21.1"),
];

impl ProtocolVersion {
    pub const V1_20_2: Self = Self(764);
    pub const V1_20_3: Self = Self(765);
    pub const V1_20_5: Self = Self(766);
    pub const V1_21: Self = Self(767);

    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    pub const fn id(self) -> i32 {
        self.0
    }

    /// Canonical release name, if the number is known
    pub fn name(self) -> Option<&'static str> {
        KNOWN_VERSIONS
            .iter()
            .find(|(id, _)| *id == self.0)
            .map(|(_, name)| *name)
    }

    /// Look up a release name such as `"1.20.4"`
    pub fn from_name(name: &str) -> Option<Self> {
        KNOWN_VERSIONS
            .iter()
            .find(|(_, known)| *known == name)
            .map(|(id, _)| Self(*id))
    }

    /// Parse either a release name or a raw protocol number
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::from_name(value).or_else(|| value.parse::<i32>().ok().map(Self))
    }

    pub fn is_known(self) -> bool {
        self.name().is_some()
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} ({})", name, self.0),
            None => write!(f, "unknown ({})", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versions_are_ordered() {
        assert!(ProtocolVersion::V1_20_2 < ProtocolVersion::V1_20_3);
        assert!(ProtocolVersion::V1_20_5 < ProtocolVersion::V1_21);
    }

    #[test]
    fn test_parse_name_and_number() {
        assert_eq!(ProtocolVersion::parse("1.20.4"), Some(ProtocolVersion::V1_20_3));
        assert_eq!(ProtocolVersion::parse("766"), Some(ProtocolVersion::V1_20_5));
        assert_eq!(ProtocolVersion::parse(" 1.21 "), Some(ProtocolVersion::V1_21));
        assert_eq!(ProtocolVersion::parse("beta"), None);
    }

    #[test]
    fn test_display_uses_canonical_name() {
        assert_eq!(ProtocolVersion::V1_20_3.to_string(), "1.20.3 (765)");
        assert_eq!(ProtocolVersion::new(5).to_string(), "unknown (5)");
    }
}
