//! makepanda flags shared by all builders.

use kiln_core::{BuildType, Error, MasterConfig, Properties, Result};
use kiln_version::BaseVersion;

/// Build type of the build; absent or empty means an SDK build.
pub fn build_type(props: &Properties) -> Result<BuildType> {
    match props.get_string("buildtype") {
        Some(value) => value.parse(),
        None => Ok(BuildType::Sdk),
    }
}

/// The `major.minor` series of the `version` property.
pub fn version_series(props: &Properties) -> Result<String> {
    let version = props
        .require_str("version")?
        .parse::<BaseVersion>()
        .map_err(|err| Error::invalid_property("version", err.to_string()))?;
    Ok(version.series())
}

/// SSE2 flags for the requested architecture.
pub fn sse2_flags(props: &Properties) -> Result<Vec<String>> {
    // Every Intel Mac has SSE2.
    if props.require_string("buildername")?.contains("macosx") {
        return Ok(vec!["--use-sse2".to_string()]);
    }

    if props.require_string("arch")? == "amd64" {
        Ok(vec!["--use-sse2".to_string()])
    } else {
        // Eigen is not worth it without SSE2 and makes the Windows build too slow.
        Ok(vec!["--no-sse2".to_string(), "--no-eigen".to_string()])
    }
}

pub fn threads_flag(props: &Properties) -> Result<Option<String>> {
    Ok(props
        .get_u64("threads")?
        .filter(|&threads| threads > 1)
        .map(|threads| format!("--threads={threads}")))
}

/// `--runtime`, `--rtdist`, or nothing for SDK builds.
pub fn buildtype_flag(props: &Properties) -> Result<Option<String>> {
    Ok(match build_type(props)? {
        BuildType::Sdk => None,
        other => Some(format!("--{other}")),
    })
}

/// Flags passed to makepanda by every builder.
pub fn common_flags(props: &Properties, config: &MasterConfig) -> Result<Vec<String>> {
    let mut flags = vec!["--verbose".to_string(), "--nocolor".to_string()];
    flags.extend(sse2_flags(props)?);
    flags.push(format!("--distributor={}", config.distributor));
    flags.push(format!("--git-commit={}", props.require_string("got_revision")?));
    flags.extend(threads_flag(props)?);

    if props.get_bool("clean")?.unwrap_or(false) {
        flags.push("--clean".to_string());
    }

    match build_type(props)? {
        BuildType::Sdk => {
            // Deployment tools only make sense on a series that has had a release.
            let tag_prefix = format!("v{}.", version_series(props)?);
            if props
                .get_str("commit-description")
                .is_some_and(|desc| desc.starts_with(&tag_prefix))
            {
                flags.push(format!("--host={}", config.runtime_host));
            }
        }
        BuildType::Runtime => flags.push("--runtime".to_string()),
        BuildType::Rtdist => {
            flags.push("--rtdist".to_string());
            flags.push(format!("--host={}", config.runtime_host));
        }
    }

    Ok(flags)
}
