//! Debian packages built inside a Docker image of each distribution.
//!
//! All Linux builders share one worker; Docker provides the distribution.
//! The image is described by a Dockerfile kept on the master, which also
//! installs the build dependencies.

use crate::common::{checkout, is_branch, publish_file_steps, repo_lock, version_step, version_steps};
use crate::env::BuildEnv;
use crate::flags::build_type;
use crate::renderer::RenderKind;
use kiln_core::step::{Arg, BuildFactory, StepDefinition};
use kiln_core::{BuildType, BuilderConfig, Properties, Result};
use std::sync::Arc;

/// The runtime plugin links against static, position-independent builds of
/// its dependencies, kept under the worker's home directory.
pub fn dist_flags(props: &Properties) -> Result<Vec<String>> {
    if build_type(props)? != BuildType::Rtdist {
        return Ok(vec!["--installer".to_string()]);
    }

    let arch = props.require_string("arch")?;
    Ok(vec![
        format!("--openssl-incdir=/home/buildbot/rtdist_ssl_{arch}/include"),
        format!("--openssl-libdir=/home/buildbot/rtdist_ssl_{arch}/lib"),
        "--rocket-incdir=/home/buildbot/rtdist_rocket/include".to_string(),
        format!("--rocket-libdir=/home/buildbot/rtdist_rocket/lib_{arch}"),
        "--fltk-incdir=/home/buildbot/rtdist_fltk/include".to_string(),
        format!("--fltk-libdir=/home/buildbot/rtdist_fltk/lib_{arch}"),
        "--zlib-incdir=/home/buildbot/rtdist_zlib/include".to_string(),
        format!("--zlib-libdir=/home/buildbot/rtdist_zlib/lib_{arch}"),
    ])
}

pub fn python_path(props: &Properties) -> Result<String> {
    if build_type(props)? == BuildType::Rtdist {
        let arch = props.require_string("arch")?;
        return Ok(format!("/home/buildbot/rtdist_rocket/lib_{arch}/python2.7"));
    }
    Ok(String::new())
}

pub fn setarch(props: &Properties) -> Vec<String> {
    match props.get_string("arch") {
        Some(arch) if arch != "amd64" => vec!["/usr/bin/setarch".to_string(), arch],
        _ => Vec::new(),
    }
}

const CLOUDIMG_CMD: &str = "wget -N https://partner-images.canonical.com/core/${{ prop.suite }}/current/ubuntu-${{ prop.suite }}-core-cloudimg-${{ prop.arch }}-root.tar.gz \
     || wget -N https://partner-images.canonical.com/core/unsupported/${{ prop.suite }}/current/ubuntu-${{ prop.suite }}-core-cloudimg-${{ prop.arch }}-root.tar.gz";

const IMAGE: &str = "${{ prop.suite }}-${{ prop.arch }}";

/// `docker run` prefix shared by the build and test commands.
fn docker_run(extra_env: &[&str]) -> Vec<Arg> {
    let mut command: Vec<Arg> = vec![
        "docker".into(),
        "run".into(),
        "--rm=true".into(),
        "-i".into(),
        Arg::template("--name=${{ prop.buildername }}"),
        "-v".into(),
        Arg::template("${{ prop.workdir }}/build/:/build/:rw"),
        "-w".into(),
        "/build/".into(),
    ];
    for var in extra_env {
        command.push("-e".into());
        command.push((*var).into());
    }
    command.push(Arg::template(IMAGE));
    command
}

fn build_command(env: &Arc<BuildEnv>) -> Vec<Arg> {
    let mut command = docker_run(&[]);
    command.extend([
        env.arg(RenderKind::DockerSetarch),
        "/usr/bin/python".into(),
        "makepanda/makepanda.py".into(),
        "--everything".into(),
        "--no-gles".into(),
        "--no-gles2".into(),
        "--no-egl".into(),
        env.arg(RenderKind::CommonFlags),
        env.arg(RenderKind::DockerDistFlags),
        "--debversion".into(),
        env.arg(RenderKind::DebianVersion),
        "--version".into(),
        Arg::property("version"),
        "--outputdir".into(),
        "built".into(),
    ]);
    command
}

const TEST_ENV: [&str; 2] = ["PYTHONPATH=/build/built", "LD_LIBRARY_PATH=/build/built/lib"];

fn test_command(env: &Arc<BuildEnv>) -> Vec<Arg> {
    let mut command = docker_run(&TEST_ENV);
    command.extend([
        env.arg(RenderKind::DockerSetarch),
        "/usr/bin/python".into(),
        "-m".into(),
        "pytest".into(),
        "tests".into(),
    ]);
    command
}

fn build_samples_command(env: &Arc<BuildEnv>) -> Vec<Arg> {
    let mut command = docker_run(&[TEST_ENV[0], TEST_ENV[1], "PATH=/build/built/bin"]);
    command.extend([
        env.arg(RenderKind::DockerSetarch),
        "/usr/bin/python".into(),
        "tests/build_samples.py".into(),
    ]);
    command
}

fn build_steps(env: &Arc<BuildEnv>) -> Vec<StepDefinition> {
    let mut steps = vec![
        checkout(&env.config),
        version_step(env, "python".into(), "makepanda/getversion.py", true),
    ];
    steps.extend(version_steps(env));
    steps.extend([
        StepDefinition::file_download(Arg::template("dockerfiles/${{ prop.suite }}-${{ prop.arch }}"), "Dockerfile")
            .workdir("context"),
        // Keep the base distribution image current.
        StepDefinition::shell(vec![Arg::template(CLOUDIMG_CMD)]).workdir("context"),
        StepDefinition::shell(vec![
            "docker".into(),
            "build".into(),
            "-t".into(),
            Arg::template(IMAGE),
            ".".into(),
        ])
        .named("setup")
        .workdir("context")
        .halt_on_failure(),
        StepDefinition::compile(build_command(env))
            .env("PYTHONPATH", env.arg(RenderKind::DockerPythonPath))
            .halt_on_failure(),
        StepDefinition::test(test_command(env)).halt_on_failure(),
        StepDefinition::test(build_samples_command(env))
            .named("build_samples")
            .when(is_branch("deploy-ng"))
            .halt_on_failure(),
    ]);
    steps
}

fn publish_deb_steps(env: &Arc<BuildEnv>) -> Vec<StepDefinition> {
    let mut steps = publish_file_steps(env, RenderKind::DebFilename, RenderKind::DebUploadFilename);
    steps.push(
        StepDefinition::master_shell(vec![
            "reprepro".into(),
            "-b".into(),
            env.arg(RenderKind::DebArchiveDir),
            "includedeb".into(),
            env.arg(RenderKind::DebArchiveSuite),
            env.arg(RenderKind::DebUploadFilename),
        ])
        .named("reprepro")
        .lock(repo_lock().exclusive()),
    );
    steps
}

pub fn factory(env: &Arc<BuildEnv>) -> BuildFactory {
    let mut factory = BuildFactory::new("deb");
    factory.extend(build_steps(env));
    factory.extend(publish_deb_steps(env));
    factory
}

pub fn builder(
    factory: Arc<BuildFactory>,
    workers: Vec<String>,
    buildtype: BuildType,
    distro: &str,
    suite: &str,
    arch: &str,
) -> BuilderConfig {
    BuilderConfig::new(format!("{buildtype}-{suite}-{arch}"), workers, factory).with_properties(
        Properties::new()
            .with("buildtype", buildtype.as_str())
            .with("distro", distro)
            .with("suite", suite)
            .with("arch", arch),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_dist_flags() {
        let sdk = Properties::new().with("arch", "amd64");
        assert_eq!(dist_flags(&sdk).unwrap(), vec!["--installer"]);

        let rtdist = sdk.with("buildtype", "rtdist");
        let flags = dist_flags(&rtdist).unwrap();
        assert_eq!(flags.len(), 8);
        assert_eq!(flags[0], "--openssl-incdir=/home/buildbot/rtdist_ssl_amd64/include");
        assert_eq!(flags[7], "--zlib-libdir=/home/buildbot/rtdist_zlib/lib_amd64");
    }

    #[test]
    fn test_python_path_only_for_rtdist() {
        let props = Properties::new().with("arch", "i386");
        assert_eq!(python_path(&props).unwrap(), "");
        assert_eq!(
            python_path(&props.with("buildtype", "rtdist")).unwrap(),
            "/home/buildbot/rtdist_rocket/lib_i386/python2.7"
        );
    }

    #[test]
    fn test_setarch() {
        assert!(setarch(&Properties::new().with("arch", "amd64")).is_empty());
        assert!(setarch(&Properties::new()).is_empty());
        assert_eq!(
            setarch(&Properties::new().with("arch", "i386")),
            vec!["/usr/bin/setarch", "i386"]
        );
    }

    #[test]
    fn test_builder_naming() {
        let factory = Arc::new(BuildFactory::new("deb"));
        let builder = builder(factory, vec!["build-lnx".to_string()], BuildType::Runtime, "ubuntu", "xenial", "amd64");
        assert_eq!(builder.name, "runtime-xenial-amd64");
        assert!(builder.properties.is("distro", "ubuntu"));
        assert!(builder.properties.is("buildtype", "runtime"));
    }
}
