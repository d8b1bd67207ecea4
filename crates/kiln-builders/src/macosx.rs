//! macOS SDK installers and the macOS runtime distribution.

use crate::common::{checkout, publish_file_steps, publish_rtdist_steps, version_step};
use crate::env::BuildEnv;
use crate::flags::build_type;
use crate::renderer::RenderKind;
use kiln_core::step::{Arg, BuildFactory, StepDefinition};
use kiln_core::{BuildType, BuilderConfig, Properties, Result};
use std::sync::Arc;

pub fn arch_flags(props: &Properties) -> Result<String> {
    Ok(match build_type(props)? {
        BuildType::Runtime => "--arch=i386".to_string(),
        _ => "--universal".to_string(),
    })
}

pub fn dist_flags(props: &Properties) -> Result<Vec<String>> {
    Ok(match build_type(props)? {
        BuildType::Rtdist => Vec::new(),
        _ => vec!["--installer".to_string()],
    })
}

pub fn python_path(props: &Properties) -> Result<String> {
    Ok(match build_type(props)? {
        BuildType::Rtdist => "/Users/buildbot/thirdparty/darwin-libs-a/rocket/lib/python2.7".to_string(),
        _ => String::new(),
    })
}

/// Python interpreter to run makepanda with.
pub fn python(props: &Properties) -> Result<String> {
    if let Some(version) = props.get_string("python-version").filter(|v| !v.is_empty()) {
        return Ok(format!("python{version}"));
    }
    if build_type(props)? == BuildType::Rtdist {
        return Ok("python2.7".to_string());
    }
    // The 10.6 SDK ships Python 2.6.
    if props.is("osxtarget", "10.6") {
        return Ok("python2.6".to_string());
    }
    Ok("python2.7".to_string())
}

fn build_steps(env: &Arc<BuildEnv>) -> Vec<StepDefinition> {
    let command = vec![
        env.arg(RenderKind::MacPython),
        "makepanda/makepanda.py".into(),
        "--everything".into(),
        "--outputdir".into(),
        "built".into(),
        env.arg(RenderKind::CommonFlags),
        env.arg(RenderKind::MacArchFlags),
        env.arg(RenderKind::MacDistFlags),
        "--osxtarget".into(),
        Arg::property("osxtarget"),
        "--no-gles".into(),
        "--no-gles2".into(),
        "--no-egl".into(),
        "--version".into(),
        Arg::property("version"),
    ];

    vec![
        checkout(&env.config),
        version_step(env, "python".into(), "makepanda/getversion.py", true),
        StepDefinition::compile(command)
            .timeout_secs(60 * 60)
            .env("MAKEPANDA_THIRDPARTY", "/Users/buildbot/thirdparty")
            .env("MAKEPANDA_SDKS", "/Users/buildbot/sdks")
            .env("PYTHONPATH", env.arg(RenderKind::MacPythonPath))
            .halt_on_failure(),
    ]
}

pub fn dmg_factory(env: &Arc<BuildEnv>) -> BuildFactory {
    let mut factory = BuildFactory::new("dmg");
    factory.extend(build_steps(env));
    factory.extend(publish_file_steps(env, RenderKind::DmgFilename, RenderKind::DmgUploadFilename));
    factory
}

pub fn rtdist_factory(env: &Arc<BuildEnv>) -> BuildFactory {
    let mut factory = BuildFactory::new("rtdist-macosx");
    factory.add_step(StepDefinition::remove_directory("built/slave"));
    factory.extend(build_steps(env));
    factory.extend(publish_rtdist_steps(env));
    factory
}

/// SDK builders are per deployment target; the other build types target
/// a single macOS version.
pub fn builder_name(buildtype: BuildType, osxtarget: &str) -> String {
    match buildtype {
        BuildType::Sdk => format!("sdk-macosx{osxtarget}"),
        other => format!("{other}-macosx"),
    }
}

pub fn builder(
    factory: Arc<BuildFactory>,
    workers: Vec<String>,
    buildtype: BuildType,
    osxtarget: &str,
) -> BuilderConfig {
    BuilderConfig::new(builder_name(buildtype, osxtarget), workers, factory).with_properties(
        Properties::new()
            .with("osxtarget", osxtarget)
            .with("buildtype", buildtype.as_str()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_python_selection() {
        let sdk = Properties::new().with("osxtarget", "10.9");
        assert_eq!(python(&sdk).unwrap(), "python2.7");
        assert_eq!(python(&sdk.clone().with("osxtarget", "10.6")).unwrap(), "python2.6");
        assert_eq!(python(&sdk.clone().with("python-version", "3.6")).unwrap(), "python3.6");
        assert_eq!(python(&sdk.clone().with("python-version", "")).unwrap(), "python2.7");

        let rtdist = Properties::new().with("osxtarget", "10.6").with("buildtype", "rtdist");
        assert_eq!(python(&rtdist).unwrap(), "python2.7");
    }

    #[test]
    fn test_flags_by_buildtype() {
        let runtime = Properties::new().with("buildtype", "runtime");
        assert_eq!(arch_flags(&runtime).unwrap(), "--arch=i386");
        assert_eq!(dist_flags(&runtime).unwrap(), vec!["--installer"]);

        let rtdist = Properties::new().with("buildtype", "rtdist");
        assert_eq!(arch_flags(&rtdist).unwrap(), "--universal");
        assert!(dist_flags(&rtdist).unwrap().is_empty());
        assert!(python_path(&rtdist).unwrap().ends_with("/rocket/lib/python2.7"));
    }

    #[test]
    fn test_builder_names() {
        assert_eq!(builder_name(BuildType::Sdk, "10.9"), "sdk-macosx10.9");
        assert_eq!(builder_name(BuildType::Rtdist, "10.6"), "rtdist-macosx");
        assert_eq!(builder_name(BuildType::Runtime, "10.6"), "runtime-macosx");
    }
}
