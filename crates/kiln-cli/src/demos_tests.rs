use crate::commands::PropertyArgs;
use crate::handlers::{load_config, load_properties, resolve_version};
use kiln_builders::Catalog;
use kiln_version::VersionDialect;
use std::path::PathBuf;

fn demos_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("demos")
}

fn props(name: &str) -> kiln_core::Properties {
    load_properties(&PropertyArgs {
        files: vec![demos_dir().join("props").join(name)],
        defines: vec![],
    })
    .unwrap()
}

#[test]
fn test_demo_config_is_valid() {
    let config = load_config(&demos_dir().join("kiln.yaml")).unwrap();
    let workers = config.load_workers().unwrap();
    let users = config.load_users().unwrap();
    config.validate_workers(&workers).unwrap();
    assert_eq!(users.len(), 1);

    let catalog = Catalog::from_config(config).unwrap();
    let names: Vec<_> = catalog.names().collect();
    assert_eq!(
        names,
        vec![
            "sdk-bionic-amd64",
            "sdk-bionic-i386",
            "rtdist-xenial-amd64",
            "manylinux1-x86_64",
            "sdk-macosx10.9",
            "rtdist-macosx",
            "sdk-windows-amd64",
            "runtime-windows-i386",
        ]
    );
}

#[test]
fn test_demo_props_resolve() {
    let config = load_config(&demos_dir().join("kiln.yaml")).unwrap();
    let cases = [
        ("tagged-release.json", VersionDialect::Wheel, "1.10.5"),
        ("post-release.json", VersionDialect::Wheel, "1.10.5.post3"),
        ("post-release.json", VersionDialect::Debian, "1.10.5+post3"),
        ("feature-branch.json", VersionDialect::Wheel, "1.11.0.dev42+feature.foo.7"),
    ];
    for (file, dialect, expected) in cases {
        let version = resolve_version(&config, &props(file), dialect, false).unwrap();
        assert_eq!(version, expected, "{file} as {dialect}");
    }
}

#[test]
fn test_demo_builders_render() {
    let config = load_config(&demos_dir().join("kiln.yaml")).unwrap();
    let catalog = Catalog::from_config(config).unwrap();

    for builder in catalog.builders() {
        let build = props("feature-branch.json");
        let steps = builder
            .render(&build)
            .unwrap_or_else(|e| panic!("{} failed to render: {e}", builder.name));
        assert!(!steps.is_empty());
    }
}
