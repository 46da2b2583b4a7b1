//! Blocked client versions
//!
//! A comma-separated list of rules. Each rule is a version, by release name
//! or protocol number, optionally prefixed with a comparison:
//!
//! ```text
//! blocked-versions = 764, <1.20.3, >=767
//! ```

use bridge_core::{BridgeError, ProtocolVersion, Result};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionRule {
    Exact(ProtocolVersion),
    Below(ProtocolVersion),
    AtMost(ProtocolVersion),
    Above(ProtocolVersion),
    AtLeast(ProtocolVersion),
}

impl VersionRule {
    pub fn parse(rule: &str) -> Result<Self> {
        let rule = rule.trim();
        let (make, rest): (fn(ProtocolVersion) -> Self, &str) =
            if let Some(rest) = rule.strip_prefix("<=") {
                (Self::AtMost, rest)
            } else if let Some(rest) = rule.strip_prefix(">=") {
                (Self::AtLeast, rest)
            } else if let Some(rest) = rule.strip_prefix('<') {
                (Self::Below, rest)
            } else if let Some(rest) = rule.strip_prefix('>') {
                (Self::Above, rest)
            } else {
                (Self::Exact, rule)
            };

        let version = ProtocolVersion::parse(rest)
            .ok_or_else(|| BridgeError::Config(format!("invalid blocked version: {}", rule)))?;
        Ok(make(version))
    }

    pub fn matches(&self, version: ProtocolVersion) -> bool {
        match *self {
            Self::Exact(v) => version == v,
            Self::Below(v) => version < v,
            Self::AtMost(v) => version <= v,
            Self::Above(v) => version > v,
            Self::AtLeast(v) => version >= v,
        }
    }
}

impl fmt::Display for VersionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(v) => write!(f, "{}", v.id()),
            Self::Below(v) => write!(f, "<{}", v.id()),
            Self::AtMost(v) => write!(f, "<={}", v.id()),
            Self::Above(v) => write!(f, ">{}", v.id()),
            Self::AtLeast(v) => write!(f, ">={}", v.id()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockedVersions {
    rules: Vec<VersionRule>,
}

impl BlockedVersions {
    /// Parse a comma-separated rule list; empty entries are skipped
    pub fn parse(value: &str) -> Result<Self> {
        let rules = value
            .split(',')
            .map(str::trim)
            .filter(|rule| !rule.is_empty())
            .map(VersionRule::parse)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn contains(&self, version: ProtocolVersion) -> bool {
        self.rules.iter().any(|rule| rule.matches(version))
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[VersionRule] {
        &self.rules
    }
}

impl fmt::Display for BlockedVersions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, rule) in self.rules.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", rule)?;
        }
        Ok(())
    }
}
