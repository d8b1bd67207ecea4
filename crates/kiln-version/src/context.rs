//! Git metadata of a single build.

use crate::base::BaseVersion;
use crate::error::Result;
use kiln_core::Properties;

/// Everything the resolver needs to know about the commit being built.
///
/// Assembled once per build from the properties filled in by the checkout
/// and version steps; see [`CommitContext::from_properties`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitContext {
    /// Ref or tag that was requested, e.g. `v1.10.5`, a branch, or a SHA.
    pub requested_revision: String,
    /// Full hash of the commit actually checked out.
    pub resolved_commit: String,
    /// Branch being built; empty for detached or tag builds.
    pub branch_name: String,
    /// Commit at which the branch diverged from trunk.
    pub merge_base_commit: String,
    pub base_version: BaseVersion,
    /// `<tag>-<N>-g<hash>`, or `<tag>` when HEAD is tagged.
    pub describe_output: Option<String>,
    /// Commits between the base release point and the merge base.
    pub commits_since_base: u64,
    /// Commits between the merge base and the resolved commit, when measured.
    pub commits_on_branch: Option<u64>,
    pub optimize_flag: bool,
}

impl CommitContext {
    /// Assemble the context from build properties.
    ///
    /// | field                | property             | required |
    /// |----------------------|----------------------|----------|
    /// | `base_version`       | `version`            | yes      |
    /// | `requested_revision` | `revision`           | no       |
    /// | `resolved_commit`    | `got_revision`       | yes      |
    /// | `branch_name`        | `branch`             | no       |
    /// | `merge_base_commit`  | `merge-base`         | yes      |
    /// | `describe_output`    | `commit-description` | no       |
    /// | `commits_since_base` | `commit-index`       | yes      |
    /// | `commits_on_branch`  | `divergence`         | no       |
    /// | `optimize_flag`      | `optimize`           | no       |
    pub fn from_properties(props: &Properties) -> Result<Self> {
        let base_version = props.require_str("version")?.parse()?;

        let describe_output = props
            .get_string("commit-description")
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        Ok(Self {
            requested_revision: props.get_string("revision").unwrap_or_default(),
            resolved_commit: props.require_str("got_revision")?.trim().to_string(),
            branch_name: props.get_string("branch").unwrap_or_default(),
            merge_base_commit: props.require_str("merge-base")?.trim().to_string(),
            base_version,
            describe_output,
            commits_since_base: props.require_u64("commit-index")?,
            commits_on_branch: props.get_u64("divergence")?,
            optimize_flag: props.get_bool("optimize")?.unwrap_or(false),
        })
    }

    /// Whether the requested revision is the release tag of the base version.
    pub fn is_tag_build(&self) -> bool {
        self.requested_revision == self.base_version.tag()
    }

    /// Whether the resolved commit is off the trunk line.
    pub fn has_diverged(&self) -> bool {
        self.resolved_commit != self.merge_base_commit
    }

    /// Abbreviated hash of the resolved commit.
    pub fn short_commit(&self) -> &str {
        abbreviate_commit(&self.resolved_commit)
    }
}

/// The first seven characters of a commit hash.
pub fn abbreviate_commit(commit: &str) -> &str {
    let end = commit.char_indices().nth(7).map_or(commit.len(), |(i, _)| i);
    &commit[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VersionError;
    use serde_json::json;

    fn props() -> Properties {
        serde_json::from_value(json!({
            "version": "1.11.0\n",
            "revision": "",
            "got_revision": "abcdef1234567890",
            "branch": "feature/foo",
            "merge-base": "0123456789abcdef",
            "commit-description": "v1.10.5-120-gabcdef1",
            "commit-index": "42",
            "divergence": 7,
            "optimize": false,
        }))
        .unwrap()
    }

    #[test]
    fn test_from_properties() {
        let ctx = CommitContext::from_properties(&props()).unwrap();
        assert_eq!(ctx.base_version, BaseVersion::new(1, 11, 0));
        assert_eq!(ctx.branch_name, "feature/foo");
        assert_eq!(ctx.describe_output.as_deref(), Some("v1.10.5-120-gabcdef1"));
        assert_eq!(ctx.commits_since_base, 42);
        assert_eq!(ctx.commits_on_branch, Some(7));
        assert!(!ctx.optimize_flag);
        assert!(ctx.has_diverged());
        assert_eq!(ctx.short_commit(), "abcdef1");
    }

    #[test]
    fn test_optional_properties() {
        let mut props = props();
        props.set("commit-description", "");
        props.set("divergence", serde_json::Value::Null);
        props.set("branch", serde_json::Value::Null);

        let ctx = CommitContext::from_properties(&props).unwrap();
        assert_eq!(ctx.describe_output, None);
        assert_eq!(ctx.commits_on_branch, None);
        assert_eq!(ctx.branch_name, "");
    }

    #[test]
    fn test_malformed_version_is_fatal() {
        let props = props().with("version", "1.11");
        assert!(matches!(
            CommitContext::from_properties(&props),
            Err(VersionError::MalformedVersionMetadata(_))
        ));
    }

    #[test]
    fn test_missing_required_property() {
        let mut props = props();
        props.set("merge-base", serde_json::Value::Null);
        let err = CommitContext::from_properties(&props).unwrap_err();
        assert!(matches!(
            err,
            VersionError::Property(kiln_core::Error::MissingProperty(ref name)) if name == "merge-base"
        ));
    }

    #[test]
    fn test_short_commit_of_short_hash() {
        let mut ctx = CommitContext::from_properties(&props()).unwrap();
        ctx.resolved_commit = "abc".to_string();
        assert_eq!(ctx.short_commit(), "abc");
    }

    #[test]
    fn test_abbreviate_commit() {
        assert_eq!(abbreviate_commit("abcdef1234567890"), "abcdef1");
        assert_eq!(abbreviate_commit("abcdef1"), "abcdef1");
        assert_eq!(abbreviate_commit(""), "");
    }
}
