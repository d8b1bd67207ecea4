//! Python wheels for Linux, built in the manylinux Docker images.

use crate::artifacts::python_abi;
use crate::common::{checkout, version_step, version_steps};
use crate::env::BuildEnv;
use crate::renderer::RenderKind;
use kiln_core::step::{Arg, BuildFactory, StepDefinition};
use kiln_core::{BuilderConfig, Properties, Result};
use std::sync::Arc;

pub fn python_incdir(props: &Properties) -> Result<String> {
    Ok(format!("/opt/python/{}/include", python_abi(props)?))
}

pub fn python_libdir(props: &Properties) -> Result<String> {
    Ok(format!("/opt/python/{}/lib", python_abi(props)?))
}

pub fn python_executable(props: &Properties) -> Result<String> {
    Ok(format!("/opt/python/{}/bin/python", python_abi(props)?))
}

/// Each Python version gets its own output directory.
pub fn built_dir(props: &Properties) -> Result<String> {
    Ok(format!("built-{}", python_abi(props)?))
}

pub fn setarch(props: &Properties) -> Vec<String> {
    match props.get_string("arch") {
        Some(arch) if arch != "amd64" && arch != "x86_64" => vec!["setarch".to_string(), arch],
        _ => Vec::new(),
    }
}

fn build_command(env: &Arc<BuildEnv>) -> Vec<Arg> {
    vec![
        "docker".into(),
        "run".into(),
        "--rm=true".into(),
        "-i".into(),
        Arg::template("--name=${{ prop.buildername }}"),
        "-v".into(),
        Arg::template("${{ prop.workdir }}/build/:/build/:rw"),
        "-w".into(),
        "/build/".into(),
        Arg::property("platform"),
        env.arg(RenderKind::ManylinuxSetarch),
        env.arg(RenderKind::ManylinuxPythonExecutable),
        "makepanda/makepanda.py".into(),
        "--everything".into(),
        "--no-directscripts".into(),
        "--no-gles".into(),
        "--no-gles2".into(),
        "--no-egl".into(),
        "--python-incdir".into(),
        env.arg(RenderKind::ManylinuxIncDir),
        "--python-libdir".into(),
        env.arg(RenderKind::ManylinuxLibDir),
        env.arg(RenderKind::CommonFlags),
        "--outputdir".into(),
        env.arg(RenderKind::ManylinuxBuiltDir),
        "--wheel".into(),
        env.arg(RenderKind::WheelVersionOverride),
    ]
}

pub fn factory(env: &Arc<BuildEnv>) -> BuildFactory {
    let mut factory = BuildFactory::new("wheel");
    factory.add_step(checkout(&env.config));
    factory.add_step(version_step(env, "python".into(), "makepanda/getversion.py", false));
    factory.extend(version_steps(env));

    factory.add_step(
        StepDefinition::file_download(Arg::template("dockerfiles/manylinux1-${{ prop.arch }}"), "Dockerfile")
            .workdir("context"),
    );
    for script in ["build_scripts/build.sh", "build_scripts/build_utils.sh"] {
        factory.add_step(StepDefinition::file_download(script, script).workdir("context"));
    }

    factory.add_step(
        StepDefinition::shell(vec![
            "docker".into(),
            "build".into(),
            "-t".into(),
            Arg::property("platform"),
            ".".into(),
        ])
        .named("setup")
        .workdir("context")
        .halt_on_failure(),
    );
    factory.add_step(StepDefinition::compile(build_command(env)).halt_on_failure());
    factory.add_step(
        StepDefinition::file_upload(
            env.arg(RenderKind::WheelFilename),
            env.arg(RenderKind::WheelUploadFilename),
        )
        .mode(0o664)
        .halt_on_failure(),
    );
    factory
}

pub fn builder(factory: Arc<BuildFactory>, workers: Vec<String>, suite: &str, arch: &str) -> BuilderConfig {
    let platform = format!("{suite}-{arch}");
    BuilderConfig::new(platform.clone(), workers, factory)
        .with_properties(Properties::new().with("arch", arch).with("platform", platform))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_python_paths() {
        let props = Properties::new().with("python-version", "3.7");
        assert_eq!(python_executable(&props).unwrap(), "/opt/python/cp37-cp37m/bin/python");
        assert_eq!(python_incdir(&props).unwrap(), "/opt/python/cp37-cp37m/include");
        assert_eq!(python_libdir(&props).unwrap(), "/opt/python/cp37-cp37m/lib");
        assert_eq!(built_dir(&props).unwrap(), "built-cp37-cp37m");
    }

    #[test]
    fn test_setarch() {
        assert!(setarch(&Properties::new().with("arch", "x86_64")).is_empty());
        assert_eq!(
            setarch(&Properties::new().with("arch", "i686")),
            vec!["setarch", "i686"]
        );
    }

    #[test]
    fn test_builder_uses_platform_name() {
        let builder = builder(Arc::new(BuildFactory::new("wheel")), vec![], "manylinux1", "i686");
        assert_eq!(builder.name, "manylinux1-i686");
        assert!(builder.properties.is("platform", "manylinux1-i686"));
        assert!(builder.properties.is("arch", "i686"));
    }
}
