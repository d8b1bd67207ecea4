//! End-to-end version resolution from build properties.

use kiln_core::Properties;
use kiln_version::{BaseVersion, CommitContext, VersionDialect, VersionError, VersionResolver};
use pretty_assertions::assert_eq;
use serde_json::json;

fn properties(value: serde_json::Value) -> Properties {
    serde_json::from_value(value).expect("valid properties")
}

fn resolve(props: &Properties, dialect: VersionDialect) -> String {
    VersionResolver::new()
        .resolve_properties(props, dialect)
        .expect("resolves")
        .into_string()
}

fn tagged_release(optimize: bool) -> Properties {
    properties(json!({
        "version": "1.10.5",
        "revision": "v1.10.5",
        "got_revision": "abcdef1234567890",
        "branch": "",
        "merge-base": "abcdef1234567890",
        "commit-description": "v1.10.5",
        "commit-index": "512",
        "optimize": optimize,
    }))
}

fn post_release() -> Properties {
    properties(json!({
        "version": "1.10.5",
        "revision": "release/1.10.x",
        "got_revision": "abcdef1234567890",
        "branch": "release/1.10.x",
        "merge-base": "abcdef1234567890",
        "commit-description": "v1.10.5-3-gabcdef1",
        "commit-index": "515",
    }))
}

fn feature_branch() -> Properties {
    properties(json!({
        "version": "1.11.0",
        "revision": "feature/foo",
        "got_revision": "abcdef1234567",
        "branch": "feature/foo",
        "merge-base": "99887766554433",
        "commit-description": "v1.10.5-220-g9988776",
        "commit-index": 42,
        "divergence": 7,
        "optimize": false,
    }))
}

#[test]
fn test_tagged_release() {
    assert_eq!(resolve(&tagged_release(false), VersionDialect::Wheel), "1.10.5");
}

#[test]
fn test_tagged_release_optimized() {
    assert_eq!(resolve(&tagged_release(true), VersionDialect::Wheel), "1.10.5+opt");
}

#[test]
fn test_post_release_wheel() {
    assert_eq!(resolve(&post_release(), VersionDialect::Wheel), "1.10.5.post3");
}

#[test]
fn test_dev_build_on_feature_branch() {
    assert_eq!(
        resolve(&feature_branch(), VersionDialect::Wheel),
        "1.11.0.dev42+feature.foo.7"
    );
}

#[test]
fn test_dev_build_detached() {
    let mut props = feature_branch();
    props.set("branch", "");
    assert_eq!(
        resolve(&props, VersionDialect::Wheel),
        "1.11.0.dev42+gabcdef1"
    );
}

#[test]
fn test_post_release_debian() {
    assert_eq!(resolve(&post_release(), VersionDialect::Debian), "1.10.5+post3");
}

#[test]
fn test_dev_build_debian() {
    assert_eq!(
        resolve(&feature_branch(), VersionDialect::Debian),
        "1.11.0~dev42+feature.foo.7"
    );
}

#[test]
fn test_diverged_post_release_on_feature_branch() {
    let mut props = post_release();
    props.set("branch", "bugfix/crash_on_exit");
    props.set("merge-base", "1111111111111");
    props.set("divergence", "2");
    assert_eq!(
        resolve(&props, VersionDialect::Wheel),
        "1.10.5.post3+bugfix.crashonexit.2"
    );
}

#[test]
fn test_tag_build_wins_over_describe() {
    let mut props = tagged_release(false);
    props.set("commit-description", "v1.10.5-9-g1234567");
    props.set("merge-base", "0000000");
    assert_eq!(resolve(&props, VersionDialect::Wheel), "1.10.5");
    assert_eq!(resolve(&props, VersionDialect::Debian), "1.10.5");
}

#[test]
fn test_exact_builds_carry_no_decoration() {
    for optimize in [false, true] {
        for dialect in [VersionDialect::Wheel, VersionDialect::Debian] {
            let version = resolve(&tagged_release(optimize), dialect);
            for marker in [
                dialect.dev_separator(),
                dialect.post_separator(),
                ".dev",
                "~dev",
                ".post",
                "+post",
                "+g",
            ] {
                assert!(!version.contains(marker), "{version} contains {marker}");
            }
        }
    }
}

#[test]
fn test_resolution_is_deterministic() {
    let props = feature_branch();
    let first = resolve(&props, VersionDialect::Wheel);
    for _ in 0..10 {
        assert_eq!(resolve(&props, VersionDialect::Wheel), first);
    }
}

#[test]
fn test_local_suffix_charset() {
    let resolver = VersionResolver::new();
    let base = CommitContext::from_properties(&feature_branch()).expect("context");

    for branch in [
        "feature/foo",
        "user/jane_doe/fix-#123",
        "weird!@$%^&*()branch",
        "a\\b/c:d;e",
        "emoji-🚀-branch",
    ] {
        let ctx = CommitContext {
            branch_name: branch.to_string(),
            ..base.clone()
        };
        let suffix = resolver.local_suffix(&ctx, VersionDialect::Wheel);
        assert!(suffix.starts_with('+'), "{suffix}");
        assert!(
            suffix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '+'),
            "{branch:?} produced {suffix:?}"
        );
    }
}

#[test]
fn test_separator_only_branches_fall_back_to_commit() {
    let resolver = VersionResolver::new();
    let base = CommitContext::from_properties(&feature_branch()).expect("context");

    let cases = [
        ("/", "1.11.0.dev42+gabcdef1"),
        ("//", "1.11.0.dev42+gabcdef1"),
        ("a//b/", "1.11.0.dev42+a.b.7"),
        ("/feature/", "1.11.0.dev42+feature.7"),
    ];
    for (branch, expected) in cases {
        let ctx = CommitContext {
            branch_name: branch.to_string(),
            ..base.clone()
        };
        let version = resolver.display_version(&ctx, VersionDialect::Wheel);
        assert_eq!(version.as_str(), expected, "branch {branch:?}");
        assert!(!version.as_str().contains(".."), "{version}");
    }
}

#[test]
fn test_release_branch_exemption() {
    let resolver = VersionResolver::new();
    let base = CommitContext::from_properties(&feature_branch()).expect("context");

    for divergence in [None, Some(0), Some(7), Some(1000)] {
        let ctx = CommitContext {
            branch_name: "release/1.11.x".to_string(),
            commits_on_branch: divergence,
            optimize_flag: true,
            ..base.clone()
        };
        assert_eq!(resolver.local_suffix(&ctx, VersionDialect::Wheel), "");
    }
}

#[test]
fn test_unrelated_nearest_tag_is_dev_build() {
    let mut props = feature_branch();
    props.set("commit-description", "v1.10.5-3-gabcdef1");
    props.set("merge-base", "abcdef1234567");
    assert_eq!(resolve(&props, VersionDialect::Wheel), "1.11.0.dev42");
}

#[test]
fn test_malformed_version_metadata() {
    let props = feature_branch().with("version", "1.11.0-beta");
    let err = VersionResolver::new()
        .resolve_properties(&props, VersionDialect::Wheel)
        .unwrap_err();
    assert!(matches!(err, VersionError::MalformedVersionMetadata(_)));
}

#[test]
fn test_context_round_trip_of_base_version() {
    let ctx = CommitContext::from_properties(&post_release()).expect("context");
    assert_eq!(ctx.base_version, BaseVersion::new(1, 10, 5));
    assert!(!ctx.is_tag_build());
}
