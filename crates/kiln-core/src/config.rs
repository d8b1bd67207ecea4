//! Build master configuration.
//!
//! Loaded once at startup and passed by reference to everything that needs
//! it. Every field has a default matching the production deployment, so an
//! absent file still yields a usable configuration.

use crate::error::{Error, Result};
use crate::worker::{self, WebUser, Worker};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Build master configuration.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct MasterConfig {
    /// Passed to every build with `--distributor`.
    pub distributor: String,
    /// Where the source code is hosted.
    pub git_url: String,
    /// Branch that merge bases are computed against.
    pub trunk_branch: String,
    /// Branches with this prefix never get a local version tag.
    pub release_branch_prefix: String,
    /// Ref excluded when counting `commit-index`; all history when unset.
    pub commit_index_since: Option<String>,
    /// Link to the project.
    pub title_url: String,
    /// Link to the build master status page.
    pub buildbot_url: String,
    /// Upload root on the master.
    pub downloads_dir: String,
    /// Root of the apt repositories.
    pub archive_dir: String,
    /// Where rtdist builds are staged before being merged.
    pub staging_dir: String,
    /// Runtime distribution the rtdist builds are merged into.
    pub runtime_dir: String,
    /// Host URL embedded in rtdist builds.
    pub runtime_host: String,
    /// Copy of pmerge runnable on the master.
    pub pmerge_bin: String,
    /// Trackers announced in generated torrents.
    pub trackers: Vec<String>,
    /// JSON file with worker credentials, relative to the config file.
    pub workers_file: PathBuf,
    /// JSON file with web users, relative to the config file.
    pub users_file: PathBuf,
    pub workers: WorkerGroups,
    pub builders: Vec<BuilderSpec>,
    #[serde(skip)]
    #[schemars(skip)]
    base_dir: Option<PathBuf>,
}

/// Worker names per platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct WorkerGroups {
    pub linux: Vec<String>,
    pub windows: Vec<String>,
    pub macosx: Vec<String>,
}

impl Default for WorkerGroups {
    fn default() -> Self {
        Self {
            linux: vec!["build-lnx".to_string()],
            windows: vec!["build-win".to_string()],
            macosx: vec!["build-osx".to_string()],
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum BuildType {
    #[default]
    Sdk,
    Runtime,
    Rtdist,
}

impl BuildType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildType::Sdk => "sdk",
            BuildType::Runtime => "runtime",
            BuildType::Rtdist => "rtdist",
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "" | "sdk" => Ok(BuildType::Sdk),
            "runtime" => Ok(BuildType::Runtime),
            "rtdist" => Ok(BuildType::Rtdist),
            other => Err(Error::invalid_property("buildtype", format!("unknown build type {other:?}"))),
        }
    }
}

/// One entry of the builder catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BuilderSpec {
    /// Debian package built inside a Docker image of the distribution.
    Docker {
        #[serde(default)]
        buildtype: BuildType,
        distro: String,
        suite: String,
        arch: String,
    },
    /// Python wheel built in a manylinux image.
    Manylinux { suite: String, arch: String },
    Macosx {
        #[serde(default)]
        buildtype: BuildType,
        osxtarget: String,
    },
    Windows {
        #[serde(default)]
        buildtype: BuildType,
        arch: String,
    },
}

fn docker(buildtype: BuildType, distro: &str, suite: &str, arch: &str) -> BuilderSpec {
    BuilderSpec::Docker {
        buildtype,
        distro: distro.to_string(),
        suite: suite.to_string(),
        arch: arch.to_string(),
    }
}

fn default_builders() -> Vec<BuilderSpec> {
    let mut builders = Vec::new();
    for suite in ["xenial", "bionic"] {
        for arch in ["amd64", "i386"] {
            builders.push(docker(BuildType::Sdk, "ubuntu", suite, arch));
        }
    }
    builders.push(docker(BuildType::Sdk, "debian", "stretch", "amd64"));
    builders.push(docker(BuildType::Runtime, "ubuntu", "xenial", "amd64"));
    builders.push(docker(BuildType::Rtdist, "ubuntu", "xenial", "amd64"));

    for arch in ["x86_64", "i686"] {
        builders.push(BuilderSpec::Manylinux {
            suite: "manylinux1".to_string(),
            arch: arch.to_string(),
        });
    }

    for osxtarget in ["10.6", "10.9"] {
        builders.push(BuilderSpec::Macosx {
            buildtype: BuildType::Sdk,
            osxtarget: osxtarget.to_string(),
        });
    }
    builders.push(BuilderSpec::Macosx {
        buildtype: BuildType::Rtdist,
        osxtarget: "10.6".to_string(),
    });

    for arch in ["amd64", "i386"] {
        builders.push(BuilderSpec::Windows {
            buildtype: BuildType::Sdk,
            arch: arch.to_string(),
        });
    }
    builders.push(BuilderSpec::Windows {
        buildtype: BuildType::Runtime,
        arch: "i386".to_string(),
    });
    builders.push(BuilderSpec::Windows {
        buildtype: BuildType::Rtdist,
        arch: "i386".to_string(),
    });

    builders
}

impl Default for MasterConfig {
    fn default() -> Self {
        Self {
            distributor: "cmu".to_string(),
            git_url: "git://github.com/panda3d/panda3d.git".to_string(),
            trunk_branch: "master".to_string(),
            release_branch_prefix: "release/".to_string(),
            commit_index_since: None,
            title_url: "https://www.panda3d.org/".to_string(),
            buildbot_url: "http://buildbot.panda3d.org/".to_string(),
            downloads_dir: "/var/www/html/buildbot.panda3d.org/downloads".to_string(),
            archive_dir: "/var/www/html/archive.panda3d.org".to_string(),
            staging_dir: "/home/panda3d-bot/staging-tmp".to_string(),
            runtime_dir: "/var/www/html/runtime-dev.panda3d.org".to_string(),
            runtime_host: "https://runtime.panda3d.org/".to_string(),
            pmerge_bin: "/var/www/html/runtime.panda3d.org/pmerge.p3d".to_string(),
            trackers: vec![
                "udp://tracker.publicbt.com:80".to_string(),
                "udp://tracker.opentrackr.org:1337/announce".to_string(),
                "http://tracker.bittorrent.am/announce".to_string(),
                "udp://tracker.sktorrent.net:6969".to_string(),
            ],
            workers_file: PathBuf::from("workers.json"),
            users_file: PathBuf::from("users.json"),
            workers: WorkerGroups::default(),
            builders: default_builders(),
            base_dir: None,
        }
    }
}

impl MasterConfig {
    /// Load configuration from a YAML file, or defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml_str(&content)?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        tracing::info!(path = %path.display(), builders = config.builders.len(), "Loaded master config");
        Ok(config)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Resolve a path from the config relative to the config file's directory.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    pub fn load_workers(&self) -> Result<Vec<Worker>> {
        worker::read_workers(&self.resolve_path(&self.workers_file))
    }

    pub fn load_users(&self) -> Result<Vec<WebUser>> {
        worker::read_users(&self.resolve_path(&self.users_file))
    }

    /// Every worker named in a group must be registered, and registered
    /// worker names must be unique.
    pub fn validate_workers(&self, workers: &[Worker]) -> Result<()> {
        let mut known = BTreeSet::new();
        for worker in workers {
            if !known.insert(worker.name.as_str()) {
                return Err(Error::InvalidConfig(format!(
                    "duplicate worker name: {}",
                    worker.name
                )));
            }
        }

        let groups = [
            ("linux", &self.workers.linux),
            ("windows", &self.workers.windows),
            ("macosx", &self.workers.macosx),
        ];
        for (group, names) in groups {
            for name in names {
                if !known.contains(name.as_str()) {
                    return Err(Error::UnknownWorker {
                        worker: name.clone(),
                        referenced_by: format!("worker group {group}"),
                    });
                }
            }
        }
        Ok(())
    }
}
