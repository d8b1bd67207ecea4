//! Version resolution.
//!
//! Precedence, first match wins:
//!
//! 1. the requested revision is the release tag: a release;
//! 2. `git describe` names the release tag plus a distance: a post-release;
//! 3. otherwise: a development build counted from the base release point.
//!
//! Post-release and development versions carry a local tag (`+...`) when
//! the commit has diverged from trunk on a non-release branch.

use crate::context::CommitContext;
use crate::describe::Describe;
use crate::dialect::VersionDialect;
use crate::error::Result;
use kiln_core::Properties;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

pub const DEFAULT_RELEASE_PREFIX: &str = "release/";

/// A resolved version string, substituted verbatim into filenames and
/// packaging metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolvedVersion(String);

impl ResolvedVersion {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Only a package-version override can be empty; it means "use the
    /// canonical project version".
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ResolvedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResolvedVersion {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Kind of build a context describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildKind {
    Release,
    PostRelease { commits_since_tag: u64 },
    Development { commits_since_base: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionResolver {
    release_prefix: String,
}

impl Default for VersionResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionResolver {
    pub fn new() -> Self {
        Self {
            release_prefix: DEFAULT_RELEASE_PREFIX.to_string(),
        }
    }

    /// Set the branch prefix that exempts branches from local tags.
    pub fn with_release_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.release_prefix = prefix.into();
        self
    }

    pub fn release_prefix(&self) -> &str {
        &self.release_prefix
    }

    pub fn classify(&self, ctx: &CommitContext) -> BuildKind {
        if ctx.is_tag_build() {
            return BuildKind::Release;
        }

        if let Some(raw) = ctx.describe_output.as_deref() {
            match Describe::parse(raw) {
                Ok(describe) if describe.tag == ctx.base_version => {
                    return match describe.distance {
                        None => BuildKind::Release,
                        Some((commits_since_tag, _)) => BuildKind::PostRelease { commits_since_tag },
                    };
                }
                Ok(describe) => {
                    debug!(tag = %describe.tag, base = %ctx.base_version, "Nearest tag is not the base release");
                }
                Err(err) => {
                    warn!(error = %err, "Ignoring describe output; treating build as pre-release");
                }
            }
        }

        BuildKind::Development {
            commits_since_base: ctx.commits_since_base,
        }
    }

    /// The version shown to users and embedded in installers.
    pub fn display_version(&self, ctx: &CommitContext, dialect: VersionDialect) -> ResolvedVersion {
        let base = ctx.base_version;
        let kind = self.classify(ctx);

        let version = match kind {
            BuildKind::Release if ctx.optimize_flag => format!("{base}+opt"),
            BuildKind::Release => base.to_string(),
            BuildKind::PostRelease { commits_since_tag } => format!(
                "{base}{}{commits_since_tag}{}",
                dialect.post_separator(),
                self.local_suffix(ctx, dialect)
            ),
            BuildKind::Development { commits_since_base } => format!(
                "{base}{}{commits_since_base}{}",
                dialect.dev_separator(),
                self.local_suffix(ctx, dialect)
            ),
        };

        debug!(%dialect, ?kind, %version, "Resolved version");
        ResolvedVersion(version)
    }

    /// The version override handed to packaging tools. Empty for a plain
    /// release, which tells the tool to use the canonical project version.
    pub fn package_version(&self, ctx: &CommitContext, dialect: VersionDialect) -> ResolvedVersion {
        if !ctx.optimize_flag && self.classify(ctx) == BuildKind::Release {
            return ResolvedVersion(String::new());
        }
        self.display_version(ctx, dialect)
    }

    /// Local version tag marking unofficial changes, including the leading `+`.
    pub fn local_suffix(&self, ctx: &CommitContext, dialect: VersionDialect) -> String {
        if !ctx.has_diverged() || ctx.branch_name.starts_with(&self.release_prefix) {
            return String::new();
        }

        // A branch with no label-safe characters is as good as unknown.
        let label = sanitize_branch(&ctx.branch_name);
        let mut suffix = match ctx.commits_on_branch {
            Some(count) if !label.is_empty() => format!("+{label}.{count}"),
            _ => format!("+g{}", ctx.short_commit()),
        };

        if ctx.optimize_flag && dialect.supports_optimize_local() {
            suffix.push_str(".opt");
        }
        suffix
    }

    /// Resolve straight from build properties.
    pub fn resolve_properties(
        &self,
        props: &Properties,
        dialect: VersionDialect,
    ) -> Result<ResolvedVersion> {
        let ctx = CommitContext::from_properties(props)?;
        Ok(self.display_version(&ctx, dialect))
    }
}

/// Make a branch name safe for a local version label: path separators
/// become dots, anything outside `[A-Za-z0-9.]` is dropped, and empty
/// dot-separated segments are collapsed away.
pub fn sanitize_branch(branch: &str) -> String {
    let label: String = branch
        .chars()
        .map(|c| if c == '/' || c == '\\' { '.' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.')
        .collect();
    label
        .split('.')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(".")
}
