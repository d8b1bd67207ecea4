//! The builder catalog of a build master.

use crate::env::BuildEnv;
use crate::{docker, macosx, manylinux, windows};
use kiln_core::step::BuildFactory;
use kiln_core::{BuildType, BuilderConfig, BuilderSpec, Error, MasterConfig, Result};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// One instance of every factory; builders of a platform share theirs.
struct Factories {
    deb: Arc<BuildFactory>,
    wheel: Arc<BuildFactory>,
    dmg: Arc<BuildFactory>,
    rtdist_macosx: Arc<BuildFactory>,
    exe: Arc<BuildFactory>,
    rtdist_windows: Arc<BuildFactory>,
}

impl Factories {
    fn new(env: &Arc<BuildEnv>) -> Self {
        Self {
            deb: Arc::new(docker::factory(env)),
            wheel: Arc::new(manylinux::factory(env)),
            dmg: Arc::new(macosx::dmg_factory(env)),
            rtdist_macosx: Arc::new(macosx::rtdist_factory(env)),
            exe: Arc::new(windows::exe_factory(env)),
            rtdist_windows: Arc::new(windows::rtdist_factory(env)),
        }
    }
}

#[derive(Debug)]
pub struct Catalog {
    builders: Vec<BuilderConfig>,
}

impl Catalog {
    pub fn from_config(config: MasterConfig) -> Result<Self> {
        let env = BuildEnv::new(config);
        let factories = Factories::new(&env);
        let groups = &env.config.workers;

        let mut builders = Vec::with_capacity(env.config.builders.len());
        let mut names = BTreeSet::new();

        for spec in &env.config.builders {
            let builder = match spec {
                BuilderSpec::Docker { buildtype, distro, suite, arch } => docker::builder(
                    Arc::clone(&factories.deb),
                    workers("linux", &groups.linux)?,
                    *buildtype,
                    distro,
                    suite,
                    arch,
                ),
                BuilderSpec::Manylinux { suite, arch } => manylinux::builder(
                    Arc::clone(&factories.wheel),
                    workers("linux", &groups.linux)?,
                    suite,
                    arch,
                ),
                BuilderSpec::Macosx { buildtype, osxtarget } => {
                    let factory = match buildtype {
                        BuildType::Rtdist => &factories.rtdist_macosx,
                        _ => &factories.dmg,
                    };
                    macosx::builder(
                        Arc::clone(factory),
                        workers("macosx", &groups.macosx)?,
                        *buildtype,
                        osxtarget,
                    )
                }
                BuilderSpec::Windows { buildtype, arch } => {
                    let factory = match buildtype {
                        BuildType::Rtdist => &factories.rtdist_windows,
                        _ => &factories.exe,
                    };
                    windows::builder(
                        Arc::clone(factory),
                        workers("windows", &groups.windows)?,
                        *buildtype,
                        arch,
                    )
                }
            };

            if !names.insert(builder.name.clone()) {
                return Err(Error::InvalidConfig(format!(
                    "duplicate builder name: {}",
                    builder.name
                )));
            }
            debug!(builder = %builder.name, factory = builder.factory.name(), "Registered builder");
            builders.push(builder);
        }

        Ok(Self { builders })
    }

    pub fn builders(&self) -> &[BuilderConfig] {
        &self.builders
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.builders.iter().map(|b| b.name.as_str())
    }

    pub fn get(&self, name: &str) -> Result<&BuilderConfig> {
        self.builders
            .iter()
            .find(|b| b.name == name)
            .ok_or_else(|| Error::UnknownBuilder(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.builders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }
}

fn workers(group: &str, names: &[String]) -> Result<Vec<String>> {
    if names.is_empty() {
        return Err(Error::InvalidConfig(format!(
            "worker group {group} is empty but has builders"
        )));
    }
    Ok(names.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_catalog() {
        let catalog = Catalog::from_config(MasterConfig::default()).unwrap();
        let names: Vec<_> = catalog.names().collect();
        assert_eq!(
            names,
            vec![
                "sdk-xenial-amd64",
                "sdk-xenial-i386",
                "sdk-bionic-amd64",
                "sdk-bionic-i386",
                "sdk-stretch-amd64",
                "runtime-xenial-amd64",
                "rtdist-xenial-amd64",
                "manylinux1-x86_64",
                "manylinux1-i686",
                "sdk-macosx10.6",
                "sdk-macosx10.9",
                "rtdist-macosx",
                "sdk-windows-amd64",
                "sdk-windows-i386",
                "runtime-windows-i386",
                "rtdist-windows-i386",
            ]
        );
    }

    #[test]
    fn test_factories_are_shared() {
        let catalog = Catalog::from_config(MasterConfig::default()).unwrap();
        let first = catalog.get("sdk-xenial-amd64").unwrap();
        let second = catalog.get("rtdist-xenial-amd64").unwrap();
        assert!(Arc::ptr_eq(&first.factory, &second.factory));

        let rtdist = catalog.get("rtdist-windows-i386").unwrap();
        assert_eq!(rtdist.factory.name(), "rtdist-windows");
        assert_eq!(catalog.get("runtime-windows-i386").unwrap().factory.name(), "exe");
    }

    #[test]
    fn test_unknown_builder() {
        let catalog = Catalog::from_config(MasterConfig::default()).unwrap();
        assert!(matches!(
            catalog.get("sdk-solaris"),
            Err(Error::UnknownBuilder(ref name)) if name == "sdk-solaris"
        ));
    }

    #[test]
    fn test_duplicate_builder_names_rejected() {
        let yaml = r#"
builders:
  - kind: macosx
    buildtype: rtdist
    osxtarget: "10.6"
  - kind: macosx
    buildtype: rtdist
    osxtarget: "10.9"
"#;
        let config = MasterConfig::from_yaml_str(yaml).unwrap();
        assert!(matches!(
            Catalog::from_config(config),
            Err(Error::InvalidConfig(ref msg)) if msg.contains("rtdist-macosx")
        ));
    }

    #[test]
    fn test_empty_worker_group_rejected() {
        let yaml = "workers:\n  windows: []\n";
        let config = MasterConfig::from_yaml_str(yaml).unwrap();
        assert!(matches!(
            Catalog::from_config(config),
            Err(Error::InvalidConfig(ref msg)) if msg.contains("windows")
        ));
    }
}
