//! Parsing of `git describe --tags --match 'v*'` output.

use crate::base::BaseVersion;
use crate::error::VersionError;
use regex::Regex;
use std::sync::LazyLock;

static DESCRIBE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^v(\d+)\.(\d+)\.(\d+)(?:-(\d+)-g([0-9a-fA-F]+))?$").expect("valid describe regex")
});

/// The nearest release tag and the distance from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Describe {
    pub tag: BaseVersion,
    /// Commits since the tag and the abbreviated hash; `None` when HEAD is tagged.
    pub distance: Option<(u64, String)>,
}

impl Describe {
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let ambiguous = || VersionError::AmbiguousDescribeOutput(input.to_string());

        let caps = DESCRIBE.captures(input.trim()).ok_or_else(ambiguous)?;
        let number = |i: usize| -> Result<u32, VersionError> {
            caps[i].parse().map_err(|_| ambiguous())
        };
        let tag = BaseVersion::new(number(1)?, number(2)?, number(3)?);

        let distance = match (caps.get(4), caps.get(5)) {
            (Some(count), Some(hash)) => {
                let count = count.as_str().parse().map_err(|_| ambiguous())?;
                Some((count, hash.as_str().to_string()))
            }
            _ => None,
        };

        Ok(Self { tag, distance })
    }

    /// Whether the described commit is exactly the tagged one.
    pub fn is_exact(&self) -> bool {
        self.distance.is_none()
    }

    pub fn commits_since_tag(&self) -> u64 {
        self.distance.as_ref().map_or(0, |(count, _)| *count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_post_release() {
        let describe = Describe::parse("v1.10.5-3-gabcdef1").unwrap();
        assert_eq!(describe.tag, BaseVersion::new(1, 10, 5));
        assert_eq!(describe.distance, Some((3, "abcdef1".to_string())));
        assert_eq!(describe.commits_since_tag(), 3);
        assert!(!describe.is_exact());
    }

    #[test]
    fn test_parse_exact_tag() {
        let describe = Describe::parse("v1.10.5").unwrap();
        assert!(describe.is_exact());
        assert_eq!(describe.commits_since_tag(), 0);
    }

    #[test]
    fn test_ambiguous_inputs() {
        for input in [
            "",
            "1.10.5-3-gabcdef1",
            "v1.10-3-gabcdef1",
            "v1.10.5-rc1",
            "v1.10.5-rc1-3-gabcdef1",
            "v1.10.5-3",
            "v1.10.5-x-gabcdef1",
            "v1.10.5-3-gxyz",
        ] {
            assert!(
                matches!(
                    Describe::parse(input),
                    Err(VersionError::AmbiguousDescribeOutput(_))
                ),
                "{input:?} should be ambiguous"
            );
        }
    }
}
