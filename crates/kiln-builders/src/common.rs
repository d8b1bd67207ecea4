//! Steps and locks used by more than one factory.

use crate::env::BuildEnv;
use crate::renderer::RenderKind;
use kiln_core::lock::MasterLock;
use kiln_core::step::{Arg, StepDefinition};
use kiln_core::MasterConfig;
use std::sync::Arc;

/// Only one builder may merge into the runtime distribution at a time.
pub fn rtdist_lock() -> MasterLock {
    MasterLock::new("rtdist")
}

/// reprepro does not allow concurrent access to a repository.
pub fn repo_lock() -> MasterLock {
    MasterLock::new("reprepro")
}

/// Step condition that holds on the given branch only.
pub fn is_branch(name: &str) -> String {
    format!("${{{{ prop.branch }}}} == {name}")
}

/// Check out the source and describe it against the release tags.
pub fn checkout(config: &MasterConfig) -> StepDefinition {
    StepDefinition::git(config.git_url.clone(), Some("v*"))
}

/// Read the base version from the source tree.
pub fn version_step(env: &Arc<BuildEnv>, python: Arg, script: &str, with_buildtype: bool) -> StepDefinition {
    let mut command = vec![python, script.into()];
    if with_buildtype {
        command.push(env.arg(RenderKind::BuildTypeFlag));
    }
    StepDefinition::set_property("version", command).halt_on_failure()
}

/// Fill in `merge-base`, `commit-index` and `divergence` for version resolution.
pub fn version_steps(env: &Arc<BuildEnv>) -> Vec<StepDefinition> {
    let config = &env.config;

    let merge_base = StepDefinition::set_property(
        "merge-base",
        vec![
            "git".into(),
            "merge-base".into(),
            format!("origin/{}", config.trunk_branch).into(),
            Arg::property("got_revision"),
        ],
    )
    .halt_on_failure();

    let mut count = vec![
        "git".into(),
        "rev-list".into(),
        "--count".into(),
        Arg::property("merge-base"),
    ];
    if let Some(since) = &config.commit_index_since {
        count.push(format!("^{since}").into());
    }
    let commit_index = StepDefinition::set_property("commit-index", count).halt_on_failure();

    let divergence = StepDefinition::set_property(
        "divergence",
        vec![
            "git".into(),
            "rev-list".into(),
            "--count".into(),
            Arg::template("${{ prop.merge-base }}..${{ prop.got_revision }}"),
        ],
    )
    .halt_on_failure();

    vec![merge_base, commit_index, divergence]
}

/// Create a torrent for an uploaded file on the master.
pub fn make_torrent(env: &Arc<BuildEnv>, file: RenderKind) -> StepDefinition {
    let mut command: Vec<Arg> = vec!["transmission-create".into()];
    for tracker in &env.config.trackers {
        command.push("-t".into());
        command.push(tracker.clone().into());
    }
    command.push("-o".into());
    command.push(env.arg(RenderKind::Torrent(Box::new(file.clone()))));
    command.push(env.arg(file));

    StepDefinition::master_shell(command).named("make torrent")
}

/// Start seeding a torrent created by [`make_torrent`]. The master needs
/// transmission-remote credentials in its `.netrc`.
pub fn seed_torrent(env: &Arc<BuildEnv>, file: RenderKind) -> StepDefinition {
    StepDefinition::master_shell(vec![
        "transmission-remote".into(),
        "-a".into(),
        env.arg(RenderKind::Torrent(Box::new(file.clone()))),
        "--find".into(),
        env.arg(file),
    ])
    .named("seed torrent")
}

/// Upload an artifact from the worker and publish it as a torrent.
pub fn publish_file_steps(
    env: &Arc<BuildEnv>,
    worker_file: RenderKind,
    upload: RenderKind,
) -> Vec<StepDefinition> {
    vec![
        StepDefinition::file_upload(env.arg(worker_file), env.arg(upload.clone()))
            .mode(0o664)
            .halt_on_failure(),
        make_torrent(env, upload.clone()),
        seed_torrent(env, upload),
    ]
}

/// Upload the staged runtime distribution and merge it into the live one.
pub fn publish_rtdist_steps(env: &Arc<BuildEnv>) -> Vec<StepDefinition> {
    let config = &env.config;
    vec![
        StepDefinition::directory_upload("built/stage", env.arg(RenderKind::RtdistStagingDir))
            .halt_on_failure(),
        StepDefinition::master_shell(vec![
            config.pmerge_bin.clone().into(),
            "-i".into(),
            config.runtime_dir.clone().into(),
            env.arg(RenderKind::RtdistStagingDir),
        ])
        .named("pmerge")
        .lock(rtdist_lock().exclusive()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_core::Properties;
    use pretty_assertions::assert_eq;

    fn props() -> Properties {
        Properties::new()
            .with("got_revision", "abcdef1234567890")
            .with("merge-base", "0123456789abcdef")
            .with("buildername", "rtdist-macosx")
            .with("buildnumber", 5)
    }

    #[test]
    fn test_is_branch_condition() {
        assert_eq!(is_branch("deploy-ng"), "${{ prop.branch }} == deploy-ng");
    }

    #[test]
    fn test_version_steps() {
        let env = BuildEnv::new(MasterConfig::default());
        let rendered: Vec<_> = version_steps(&env)
            .iter()
            .map(|step| step.render(&props()).unwrap().command)
            .collect();
        assert_eq!(
            rendered,
            vec![
                vec!["git", "merge-base", "origin/master", "abcdef1234567890"],
                vec!["git", "rev-list", "--count", "0123456789abcdef"],
                vec!["git", "rev-list", "--count", "0123456789abcdef..abcdef1234567890"],
            ]
        );
    }

    #[test]
    fn test_commit_index_since() {
        let mut config = MasterConfig::default();
        config.commit_index_since = Some("v1.10.0".to_string());
        config.trunk_branch = "main".to_string();
        let env = BuildEnv::new(config);
        let steps = version_steps(&env);
        assert_eq!(
            steps[0].render(&props()).unwrap().command[2],
            "origin/main"
        );
        assert_eq!(
            steps[1].render(&props()).unwrap().command,
            vec!["git", "rev-list", "--count", "0123456789abcdef", "^v1.10.0"]
        );
    }

    #[test]
    fn test_torrent_steps() {
        let env = BuildEnv::new(MasterConfig::default());
        let make = make_torrent(&env, RenderKind::RtdistStagingDir).render(&props()).unwrap();
        let dir = "/home/panda3d-bot/staging-tmp/rtdist-macosx-5";

        assert_eq!(make.command.first().map(String::as_str), Some("transmission-create"));
        assert_eq!(make.command.iter().filter(|arg| *arg == "-t").count(), 4);
        assert_eq!(
            &make.command[make.command.len() - 3..],
            &["-o".to_string(), format!("{dir}.torrent"), dir.to_string()]
        );

        let seed = seed_torrent(&env, RenderKind::RtdistStagingDir).render(&props()).unwrap();
        let torrent = format!("{dir}.torrent");
        assert_eq!(
            seed.command,
            vec!["transmission-remote", "-a", torrent.as_str(), "--find", dir]
        );
    }

    #[test]
    fn test_publish_rtdist_takes_lock() {
        let env = BuildEnv::new(MasterConfig::default());
        let steps = publish_rtdist_steps(&env);
        let upload = steps[0].render(&props()).unwrap();
        assert_eq!(upload.source.as_deref(), Some("built/stage"));
        assert!(upload.halt_on_failure);

        let pmerge = steps[1].render(&props()).unwrap();
        assert_eq!(pmerge.name, "pmerge");
        assert_eq!(pmerge.locks, vec![rtdist_lock().exclusive()]);
        assert_eq!(&pmerge.command[1..3], &["-i", "/var/www/html/runtime-dev.panda3d.org"]);
    }
}
