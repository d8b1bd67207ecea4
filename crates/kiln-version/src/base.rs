//! The `major.minor.patch` version declared by the project sources.

use crate::error::VersionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BaseVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl BaseVersion {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Release tag for this version, e.g. `v1.10.5`.
    pub fn tag(&self) -> String {
        format!("v{self}")
    }

    /// Release series, e.g. `1.10`.
    pub fn series(&self) -> String {
        format!("{}.{}", self.major, self.minor)
    }
}

impl fmt::Display for BaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for BaseVersion {
    type Err = VersionError;

    /// Accepts exactly three dot-separated decimal integers. Surrounding
    /// whitespace (a trailing newline from command output) is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || VersionError::MalformedVersionMetadata(s.to_string());

        let mut parts = s.trim().split('.');
        let mut next = || -> Result<u32, VersionError> {
            let part = parts.next().ok_or_else(malformed)?;
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(malformed());
            }
            part.parse().map_err(|_| malformed())
        };

        let version = BaseVersion::new(next()?, next()?, next()?);
        if parts.next().is_some() {
            return Err(malformed());
        }
        Ok(version)
    }
}
