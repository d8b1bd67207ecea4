//! Version strings rendered for packaging tools.

use kiln_core::{Error, Properties, Result};
use kiln_version::{CommitContext, VersionDialect, VersionError, VersionResolver};

fn core_error(renderer: &str, err: VersionError) -> Error {
    match err {
        VersionError::Property(inner) => inner,
        other => Error::render(renderer, other.to_string()),
    }
}

fn context(props: &Properties, renderer: &str) -> Result<CommitContext> {
    CommitContext::from_properties(props).map_err(|err| core_error(renderer, err))
}

/// Upstream part of the Debian package version.
pub fn upstream_version(props: &Properties, resolver: &VersionResolver) -> Result<String> {
    let ctx = context(props, "upstream_version")?;
    Ok(resolver
        .display_version(&ctx, VersionDialect::Debian)
        .into_string())
}

/// Full Debian package version, qualified with the distribution suite.
pub fn debian_version(props: &Properties, resolver: &VersionResolver) -> Result<String> {
    let upstream = upstream_version(props, resolver)?;
    Ok(format!("{upstream}~{}", props.require_string("suite")?))
}

pub fn wheel_version(props: &Properties, resolver: &VersionResolver) -> Result<String> {
    let ctx = context(props, "wheel_version")?;
    Ok(resolver
        .display_version(&ctx, VersionDialect::Wheel)
        .into_string())
}

/// `--version <v>` for makewheel, omitted for a plain release so the tool
/// falls back to the canonical project version.
pub fn wheel_version_override(props: &Properties, resolver: &VersionResolver) -> Result<Vec<String>> {
    let ctx = context(props, "wheel_version_override")?;
    let version = resolver.package_version(&ctx, VersionDialect::Wheel);
    if version.is_empty() {
        Ok(Vec::new())
    } else {
        Ok(vec!["--version".to_string(), version.into_string()])
    }
}
