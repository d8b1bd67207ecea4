//! Artifact filenames and their upload locations on the master.
//!
//! Worker-side names are what the build leaves in its output directory.
//! Upload names live under `<downloads_dir>/<got_revision>/`; tagged builds
//! get clean names while other builds embed the abbreviated commit.

use crate::flags::{build_type, version_series};
use crate::version::{debian_version, wheel_version};
use kiln_core::{BuildType, Error, MasterConfig, Properties, Result};
use kiln_version::{VersionResolver, abbreviate_commit};

fn is_tag_build(props: &Properties) -> bool {
    props
        .get_str("revision")
        .is_some_and(|revision| revision.starts_with('v'))
}

/// Non-empty `python-version`, if any.
fn python_version(props: &Properties) -> Option<String> {
    props.get_string("python-version").filter(|v| !v.is_empty())
}

/// Master-side path for an uploaded artifact.
pub fn upload_path(config: &MasterConfig, props: &Properties, basename: &str) -> Result<String> {
    Ok(format!(
        "{}/{}/{basename}",
        config.downloads_dir,
        props.require_string("got_revision")?
    ))
}

/// CPython ABI tag, e.g. `cp36-cp36m`.
pub fn python_abi(props: &Properties) -> Result<String> {
    let version = props.require_string("python-version")?;
    let invalid = || Error::invalid_property("python-version", format!("expected X.Y, got {version:?}"));

    let (major, minor) = version.trim().split_once('.').ok_or_else(invalid)?;
    let major: u32 = major.parse().map_err(|_| invalid())?;
    let minor: u32 = minor.parse().map_err(|_| invalid())?;

    let tag = format!("cp{major}{minor}");
    let abi_flags = match (major, minor) {
        // The manylinux images ship the wide-unicode build of Python 2.
        (2, _) => "mu",
        (3, 0..=7) => "m",
        _ => "",
    };
    Ok(format!("{tag}-{tag}{abi_flags}"))
}

/// Wheel platform tag derived from the `platform` property.
pub fn wheel_platform_tag(props: &Properties) -> Result<String> {
    Ok(props.require_string("platform")?.replace(['-', '.'], "_"))
}

pub fn wheel_filename(props: &Properties, resolver: &VersionResolver) -> Result<String> {
    Ok(format!(
        "panda3d-{}-{}-{}.whl",
        wheel_version(props, resolver)?,
        python_abi(props)?,
        wheel_platform_tag(props)?
    ))
}

pub fn wheel_upload_filename(
    props: &Properties,
    config: &MasterConfig,
    resolver: &VersionResolver,
) -> Result<String> {
    upload_path(config, props, &wheel_filename(props, resolver)?)
}

pub fn deb_package_name(props: &Properties) -> Result<String> {
    Ok(match build_type(props)? {
        BuildType::Runtime => "panda3d-runtime".to_string(),
        _ => format!("panda3d{}", version_series(props)?),
    })
}

pub fn deb_filename(props: &Properties, resolver: &VersionResolver) -> Result<String> {
    Ok(format!(
        "{}_{}_{}.deb",
        deb_package_name(props)?,
        debian_version(props, resolver)?,
        props.require_string("arch")?
    ))
}

pub fn deb_upload_filename(
    props: &Properties,
    config: &MasterConfig,
    resolver: &VersionResolver,
) -> Result<String> {
    upload_path(config, props, &deb_filename(props, resolver)?)
}

/// apt repository for the build's distribution.
pub fn deb_archive_dir(props: &Properties, config: &MasterConfig) -> Result<String> {
    Ok(format!("{}/{}", config.archive_dir, props.require_string("distro")?))
}

/// Development builds go to the `-dev` suite.
pub fn deb_archive_suite(props: &Properties) -> Result<String> {
    Ok(format!("{}-dev", props.require_string("suite")?))
}

pub fn dmg_filename(props: &Properties) -> Result<String> {
    if build_type(props)? == BuildType::Runtime {
        return Ok("p3d-setup.dmg".to_string());
    }
    Ok(format!("Panda3D-{}.dmg", props.require_string("version")?))
}

pub fn dmg_upload_filename(props: &Properties, config: &MasterConfig) -> Result<String> {
    let (prefix, suffix) = match build_type(props)? {
        BuildType::Runtime => ("Panda3D-Runtime", String::new()),
        _ => (
            "Panda3D-SDK",
            format!("-MacOSX{}", props.require_string("osxtarget")?),
        ),
    };
    let version = props.require_string("version")?;

    let basename = if is_tag_build(props) {
        format!("{prefix}-{version}{suffix}.dmg")
    } else {
        let commit = props.require_string("got_revision")?;
        format!("{prefix}-{version}-{}{suffix}.dmg", abbreviate_commit(&commit))
    };
    upload_path(config, props, &basename)
}

fn arch_suffix(props: &Properties) -> Result<&'static str> {
    Ok(if props.require_string("arch")? == "amd64" {
        "-x64"
    } else {
        ""
    })
}

pub fn exe_filename(props: &Properties) -> Result<String> {
    let mut suffix = arch_suffix(props)?.to_string();
    // makepanda only tags the installer with non-default Python versions.
    if let Some(python) = python_version(props).filter(|v| v != "2.7") {
        suffix = format!("-py{python}{suffix}");
    }

    let prefix = match build_type(props)? {
        BuildType::Runtime => "Panda3D-Runtime",
        _ => "Panda3D",
    };
    Ok(format!("{prefix}-{}{suffix}.exe", props.require_string("version")?))
}

pub fn exe_upload_filename(props: &Properties, config: &MasterConfig) -> Result<String> {
    let mut suffix = arch_suffix(props)?.to_string();
    if let Some(python) = python_version(props) {
        suffix = format!("-py{python}{suffix}");
    }

    let prefix = match build_type(props)? {
        BuildType::Runtime => "Panda3D-Runtime",
        _ => "Panda3D-SDK",
    };
    let version = props.require_string("version")?;

    let basename = if is_tag_build(props) {
        format!("{prefix}-{version}{suffix}.exe")
    } else {
        let commit = props.require_string("got_revision")?;
        format!("{prefix}-{version}pre-{}{suffix}.exe", abbreviate_commit(&commit))
    };
    upload_path(config, props, &basename)
}

/// Per-build directory the rtdist is staged in before pmerge.
pub fn rtdist_staging_dir(props: &Properties, config: &MasterConfig) -> Result<String> {
    Ok(format!(
        "{}/{}-{}",
        config.staging_dir,
        props.require_string("buildername")?,
        props.require_u64("buildnumber")?
    ))
}
