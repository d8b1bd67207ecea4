//! Windows SDK installers and the Windows runtime distribution.

use crate::common::{checkout, publish_file_steps, publish_rtdist_steps, version_step};
use crate::env::BuildEnv;
use crate::flags::build_type;
use crate::renderer::RenderKind;
use kiln_core::step::{Arg, BuildFactory, StepDefinition};
use kiln_core::{BuildType, BuilderConfig, Properties, Result};
use std::sync::Arc;

/// Location of `python.exe` on the worker.
pub fn python_executable(props: &Properties) -> Result<String> {
    let suffix = if props.require_string("arch")? == "amd64" { "-x64" } else { "" };

    if build_type(props)? == BuildType::Rtdist {
        return Ok(format!("C:\\Python27{suffix}\\python.exe"));
    }
    let version = props.get_string("python-version").unwrap_or_default();
    Ok(format!("C:\\thirdparty\\win-python{version}{suffix}\\python.exe"))
}

pub fn dist_flags(props: &Properties) -> Result<Vec<String>> {
    Ok(match build_type(props)? {
        BuildType::Rtdist => Vec::new(),
        _ => vec!["--installer".to_string(), "--lzma".to_string()],
    })
}

/// Builds for a non-default Python version get their own output directory.
pub fn outputdir(props: &Properties) -> String {
    match props.get_string("python-version") {
        Some(version) if !version.is_empty() && version != "2.7" => format!("built-py{version}"),
        _ => "built".to_string(),
    }
}

fn build_steps(env: &Arc<BuildEnv>) -> Vec<StepDefinition> {
    let command = vec![
        env.arg(RenderKind::WindowsPython),
        "makepanda\\makepanda.py".into(),
        "--everything".into(),
        "--outputdir=built".into(),
        "--no-touchinput".into(),
        env.arg(RenderKind::CommonFlags),
        env.arg(RenderKind::WindowsDistFlags),
        "--outputdir".into(),
        env.arg(RenderKind::WindowsOutputDir),
        "--arch".into(),
        Arg::property("arch"),
        "--version".into(),
        Arg::property("version"),
    ];

    vec![
        checkout(&env.config),
        version_step(
            env,
            env.arg(RenderKind::WindowsPython),
            "makepanda\\getversion.py",
            true,
        ),
        // Some of the build steps take ages.
        StepDefinition::compile(command)
            .timeout_secs(6 * 60 * 60)
            .env("MAKEPANDA_THIRDPARTY", "C:\\thirdparty")
            .env("MAKEPANDA_SDKS", "C:\\sdks")
            .halt_on_failure(),
    ]
}

pub fn exe_factory(env: &Arc<BuildEnv>) -> BuildFactory {
    let mut factory = BuildFactory::new("exe");
    factory.extend(build_steps(env));
    factory.extend(publish_file_steps(env, RenderKind::ExeFilename, RenderKind::ExeUploadFilename));
    factory
}

pub fn rtdist_factory(env: &Arc<BuildEnv>) -> BuildFactory {
    let mut factory = BuildFactory::new("rtdist-windows");
    factory.add_step(StepDefinition::remove_directory("built/slave"));
    factory.extend(build_steps(env));
    factory.extend(publish_rtdist_steps(env));
    factory
}

pub fn builder(factory: Arc<BuildFactory>, workers: Vec<String>, buildtype: BuildType, arch: &str) -> BuilderConfig {
    BuilderConfig::new(format!("{buildtype}-windows-{arch}"), workers, factory).with_properties(
        Properties::new()
            .with("buildtype", buildtype.as_str())
            .with("arch", arch),
    )
}
