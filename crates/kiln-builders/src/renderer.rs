//! Property-dependent step arguments.
//!
//! Every computed value a factory needs is a [`RenderKind`]. A [`Renderer`]
//! pairs one with the shared [`BuildEnv`] and evaluates it against the
//! build's property snapshot when the step is rendered.

use crate::env::BuildEnv;
use crate::{artifacts, docker, flags, macosx, manylinux, version, windows};
use kiln_core::step::Render;
use kiln_core::{Properties, Result};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderKind {
    CommonFlags,
    BuildTypeFlag,
    DebianVersion,
    WheelVersion,
    /// `--version <v>` for makewheel, or nothing for a plain release.
    WheelVersionOverride,
    DebFilename,
    DebUploadFilename,
    DebArchiveDir,
    DebArchiveSuite,
    WheelFilename,
    WheelUploadFilename,
    DmgFilename,
    DmgUploadFilename,
    ExeFilename,
    ExeUploadFilename,
    RtdistStagingDir,
    /// The `.torrent` file next to a rendered path.
    Torrent(Box<RenderKind>),
    DockerDistFlags,
    DockerPythonPath,
    DockerSetarch,
    ManylinuxPythonExecutable,
    ManylinuxIncDir,
    ManylinuxLibDir,
    ManylinuxBuiltDir,
    ManylinuxSetarch,
    MacArchFlags,
    MacDistFlags,
    MacPythonPath,
    MacPython,
    WindowsPython,
    WindowsDistFlags,
    WindowsOutputDir,
}

impl RenderKind {
    pub fn name(&self) -> &'static str {
        match self {
            RenderKind::CommonFlags => "common_flags",
            RenderKind::BuildTypeFlag => "buildtype_flag",
            RenderKind::DebianVersion => "debian_version",
            RenderKind::WheelVersion => "wheel_version",
            RenderKind::WheelVersionOverride => "wheel_version_override",
            RenderKind::DebFilename => "deb_filename",
            RenderKind::DebUploadFilename => "deb_upload_filename",
            RenderKind::DebArchiveDir => "deb_archive_dir",
            RenderKind::DebArchiveSuite => "deb_archive_suite",
            RenderKind::WheelFilename => "wheel_filename",
            RenderKind::WheelUploadFilename => "wheel_upload_filename",
            RenderKind::DmgFilename => "dmg_filename",
            RenderKind::DmgUploadFilename => "dmg_upload_filename",
            RenderKind::ExeFilename => "exe_filename",
            RenderKind::ExeUploadFilename => "exe_upload_filename",
            RenderKind::RtdistStagingDir => "rtdist_staging_dir",
            RenderKind::Torrent(_) => "torrent",
            RenderKind::DockerDistFlags => "docker_dist_flags",
            RenderKind::DockerPythonPath => "docker_python_path",
            RenderKind::DockerSetarch => "docker_setarch",
            RenderKind::ManylinuxPythonExecutable => "manylinux_python_executable",
            RenderKind::ManylinuxIncDir => "manylinux_python_incdir",
            RenderKind::ManylinuxLibDir => "manylinux_python_libdir",
            RenderKind::ManylinuxBuiltDir => "manylinux_built_dir",
            RenderKind::ManylinuxSetarch => "manylinux_setarch",
            RenderKind::MacArchFlags => "macosx_arch_flags",
            RenderKind::MacDistFlags => "macosx_dist_flags",
            RenderKind::MacPythonPath => "macosx_python_path",
            RenderKind::MacPython => "macosx_python",
            RenderKind::WindowsPython => "windows_python_executable",
            RenderKind::WindowsDistFlags => "windows_dist_flags",
            RenderKind::WindowsOutputDir => "windows_outputdir",
        }
    }

    pub fn evaluate(&self, props: &Properties, env: &BuildEnv) -> Result<Vec<String>> {
        let config = &env.config;
        let resolver = &env.resolver;

        let values = match self {
            RenderKind::CommonFlags => flags::common_flags(props, config)?,
            RenderKind::BuildTypeFlag => flags::buildtype_flag(props)?.into_iter().collect(),
            RenderKind::DebianVersion => vec![version::debian_version(props, resolver)?],
            RenderKind::WheelVersion => vec![version::wheel_version(props, resolver)?],
            RenderKind::WheelVersionOverride => version::wheel_version_override(props, resolver)?,
            RenderKind::DebFilename => vec![artifacts::deb_filename(props, resolver)?],
            RenderKind::DebUploadFilename => {
                vec![artifacts::deb_upload_filename(props, config, resolver)?]
            }
            RenderKind::DebArchiveDir => vec![artifacts::deb_archive_dir(props, config)?],
            RenderKind::DebArchiveSuite => vec![artifacts::deb_archive_suite(props)?],
            RenderKind::WheelFilename => vec![artifacts::wheel_filename(props, resolver)?],
            RenderKind::WheelUploadFilename => {
                vec![artifacts::wheel_upload_filename(props, config, resolver)?]
            }
            RenderKind::DmgFilename => vec![artifacts::dmg_filename(props)?],
            RenderKind::DmgUploadFilename => vec![artifacts::dmg_upload_filename(props, config)?],
            RenderKind::ExeFilename => vec![artifacts::exe_filename(props)?],
            RenderKind::ExeUploadFilename => vec![artifacts::exe_upload_filename(props, config)?],
            RenderKind::RtdistStagingDir => vec![artifacts::rtdist_staging_dir(props, config)?],
            RenderKind::Torrent(inner) => vec![format!(
                "{}.torrent",
                inner.evaluate(props, env)?.join(" ")
            )],
            RenderKind::DockerDistFlags => docker::dist_flags(props)?,
            RenderKind::DockerPythonPath => vec![docker::python_path(props)?],
            RenderKind::DockerSetarch => docker::setarch(props),
            RenderKind::ManylinuxPythonExecutable => vec![manylinux::python_executable(props)?],
            RenderKind::ManylinuxIncDir => vec![manylinux::python_incdir(props)?],
            RenderKind::ManylinuxLibDir => vec![manylinux::python_libdir(props)?],
            RenderKind::ManylinuxBuiltDir => vec![manylinux::built_dir(props)?],
            RenderKind::ManylinuxSetarch => manylinux::setarch(props),
            RenderKind::MacArchFlags => vec![macosx::arch_flags(props)?],
            RenderKind::MacDistFlags => macosx::dist_flags(props)?,
            RenderKind::MacPythonPath => vec![macosx::python_path(props)?],
            RenderKind::MacPython => vec![macosx::python(props)?],
            RenderKind::WindowsPython => vec![windows::python_executable(props)?],
            RenderKind::WindowsDistFlags => windows::dist_flags(props)?,
            RenderKind::WindowsOutputDir => vec![windows::outputdir(props)],
        };
        Ok(values)
    }
}

/// A [`RenderKind`] bound to the settings it is evaluated with.
#[derive(Debug, Clone)]
pub struct Renderer {
    kind: RenderKind,
    env: Arc<BuildEnv>,
}

impl Renderer {
    pub fn new(kind: RenderKind, env: Arc<BuildEnv>) -> Self {
        Self { kind, env }
    }

    pub fn kind(&self) -> &RenderKind {
        &self.kind
    }
}

impl Render for Renderer {
    fn name(&self) -> &str {
        self.kind.name()
    }

    fn render(&self, props: &Properties) -> Result<Vec<String>> {
        self.kind.evaluate(props, &self.env)
    }
}
