use serde::{Deserialize, Serialize};
use std::fmt;

/// Packaging convention a version string is rendered for.
///
/// Debian versions cannot carry the `.opt` marker in their local tag, so an
/// optimized Debian build is only distinguishable on exact releases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionDialect {
    /// PEP 440: `1.10.5.post3`, `1.11.0.dev42+g1234567.opt`.
    #[default]
    Wheel,
    /// Debian: `1.10.5+post3`, `1.11.0~dev42+g1234567`.
    Debian,
}

impl VersionDialect {
    pub fn post_separator(&self) -> &'static str {
        match self {
            VersionDialect::Wheel => ".post",
            VersionDialect::Debian => "+post",
        }
    }

    pub fn dev_separator(&self) -> &'static str {
        match self {
            VersionDialect::Wheel => ".dev",
            VersionDialect::Debian => "~dev",
        }
    }

    pub fn supports_optimize_local(&self) -> bool {
        matches!(self, VersionDialect::Wheel)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VersionDialect::Wheel => "wheel",
            VersionDialect::Debian => "debian",
        }
    }
}

impl fmt::Display for VersionDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
