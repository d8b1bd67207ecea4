//! Build step and factory declarations.
//!
//! A factory is declared once per platform and rendered against the
//! properties of each build. Arguments are either literal, interpolated
//! templates, property lookups, or values computed by a [`Render`]
//! implementation. Rendering is eager: a [`RenderedStep`] holds the
//! concrete command line the worker would run.

use crate::error::Result;
use crate::interpolation::InterpolationContext;
use crate::lock::LockAccess;
use crate::properties::Properties;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A value computed from the build properties.
///
/// May expand to zero, one or several command-line arguments.
pub trait Render: fmt::Debug + Send + Sync {
    /// Name used in error messages and dry-run output.
    fn name(&self) -> &str;

    fn render(&self, props: &Properties) -> Result<Vec<String>>;
}

#[derive(Debug, Clone)]
pub enum Arg {
    Literal(String),
    /// Interpolated with `${{ prop.name }}` expressions; missing properties fail.
    Template(String),
    Property(String),
    Computed(Arc<dyn Render>),
}

impl Arg {
    pub fn template(template: impl Into<String>) -> Self {
        Arg::Template(template.into())
    }

    pub fn property(name: impl Into<String>) -> Self {
        Arg::Property(name.into())
    }

    pub fn computed(renderer: impl Render + 'static) -> Self {
        Arg::Computed(Arc::new(renderer))
    }

    pub fn evaluate(&self, ctx: &InterpolationContext<'_>) -> Result<Vec<String>> {
        match self {
            Arg::Literal(s) => Ok(vec![s.clone()]),
            Arg::Template(t) => Ok(vec![ctx.interpolate_strict(t)?]),
            Arg::Property(name) => Ok(vec![ctx.properties.require_string(name)?]),
            Arg::Computed(renderer) => renderer.render(ctx.properties),
        }
    }

    /// Evaluate into a single value, joining multi-value renders with spaces.
    pub fn evaluate_single(&self, ctx: &InterpolationContext<'_>) -> Result<String> {
        Ok(self.evaluate(ctx)?.join(" "))
    }
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Arg::Literal(s.to_string())
    }
}

impl From<String> for Arg {
    fn from(s: String) -> Self {
        Arg::Literal(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepKind {
    /// Check out the source; `describe_match` fills `commit-description`.
    Git {
        repo_url: String,
        describe_match: Option<String>,
    },
    /// Run a command on the worker and store its stripped stdout.
    SetPropertyFromCommand { property: String },
    Compile,
    Test,
    ShellCommand,
    /// Run a command on the build master rather than the worker.
    MasterShellCommand,
    FileDownload,
    FileUpload,
    DirectoryUpload,
    RemoveDirectory { dir: String },
}

impl StepKind {
    fn default_name(&self) -> String {
        match self {
            StepKind::Git { .. } => "git".to_string(),
            StepKind::SetPropertyFromCommand { property } => format!("set {property}"),
            StepKind::Compile => "compile".to_string(),
            StepKind::Test => "test".to_string(),
            StepKind::ShellCommand => "shell".to_string(),
            StepKind::MasterShellCommand => "master shell".to_string(),
            StepKind::FileDownload => "download".to_string(),
            StepKind::FileUpload => "upload".to_string(),
            StepKind::DirectoryUpload => "upload directory".to_string(),
            StepKind::RemoveDirectory { .. } => "remove directory".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StepDefinition {
    pub name: String,
    pub kind: StepKind,
    pub command: Vec<Arg>,
    pub env: BTreeMap<String, Arg>,
    pub workdir: Option<String>,
    pub source: Option<Arg>,
    pub dest: Option<Arg>,
    pub mode: Option<u32>,
    pub timeout_secs: Option<u64>,
    pub halt_on_failure: bool,
    /// Expression evaluated against the properties; the step is skipped when false.
    pub condition: Option<String>,
    pub locks: Vec<LockAccess>,
}

impl StepDefinition {
    pub fn new(kind: StepKind) -> Self {
        Self {
            name: kind.default_name(),
            kind,
            command: Vec::new(),
            env: BTreeMap::new(),
            workdir: None,
            source: None,
            dest: None,
            mode: None,
            timeout_secs: None,
            halt_on_failure: false,
            condition: None,
            locks: Vec::new(),
        }
    }

    pub fn git(repo_url: impl Into<String>, describe_match: Option<&str>) -> Self {
        Self::new(StepKind::Git {
            repo_url: repo_url.into(),
            describe_match: describe_match.map(str::to_string),
        })
    }

    pub fn set_property(property: impl Into<String>, command: Vec<Arg>) -> Self {
        Self::new(StepKind::SetPropertyFromCommand {
            property: property.into(),
        })
        .command(command)
    }

    pub fn compile(command: Vec<Arg>) -> Self {
        Self::new(StepKind::Compile).command(command)
    }

    pub fn test(command: Vec<Arg>) -> Self {
        Self::new(StepKind::Test).command(command)
    }

    pub fn shell(command: Vec<Arg>) -> Self {
        Self::new(StepKind::ShellCommand).command(command)
    }

    pub fn master_shell(command: Vec<Arg>) -> Self {
        Self::new(StepKind::MasterShellCommand).command(command)
    }

    pub fn file_download(source: impl Into<Arg>, dest: impl Into<Arg>) -> Self {
        Self::new(StepKind::FileDownload).source(source).dest(dest)
    }

    pub fn file_upload(source: impl Into<Arg>, dest: impl Into<Arg>) -> Self {
        Self::new(StepKind::FileUpload).source(source).dest(dest)
    }

    pub fn directory_upload(source: impl Into<Arg>, dest: impl Into<Arg>) -> Self {
        Self::new(StepKind::DirectoryUpload).source(source).dest(dest)
    }

    pub fn remove_directory(dir: impl Into<String>) -> Self {
        Self::new(StepKind::RemoveDirectory { dir: dir.into() })
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn command(mut self, command: Vec<Arg>) -> Self {
        self.command = command;
        self
    }

    pub fn env(mut self, name: impl Into<String>, value: impl Into<Arg>) -> Self {
        self.env.insert(name.into(), value.into());
        self
    }

    pub fn workdir(mut self, workdir: impl Into<String>) -> Self {
        self.workdir = Some(workdir.into());
        self
    }

    pub fn source(mut self, source: impl Into<Arg>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn dest(mut self, dest: impl Into<Arg>) -> Self {
        self.dest = Some(dest.into());
        self
    }

    pub fn mode(mut self, mode: u32) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn halt_on_failure(mut self) -> Self {
        self.halt_on_failure = true;
        self
    }

    pub fn when(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn lock(mut self, access: LockAccess) -> Self {
        self.locks.push(access);
        self
    }

    /// Render this step against a property snapshot.
    pub fn render(&self, props: &Properties) -> Result<RenderedStep> {
        let mut ctx = InterpolationContext::new(props);

        let skipped = self
            .condition
            .as_deref()
            .is_some_and(|cond| !ctx.evaluate_condition(cond));

        let mut rendered = RenderedStep {
            name: self.name.clone(),
            kind: self.kind.clone(),
            command: Vec::new(),
            env: BTreeMap::new(),
            workdir: self.workdir.clone(),
            source: None,
            dest: None,
            mode: self.mode,
            timeout_secs: self.timeout_secs,
            halt_on_failure: self.halt_on_failure,
            locks: self.locks.clone(),
            skipped,
        };

        if skipped {
            return Ok(rendered);
        }

        for (name, value) in &self.env {
            let value = value.evaluate_single(&ctx)?;
            ctx.variables.insert(name.clone(), value.clone());
            rendered.env.insert(name.clone(), value);
        }

        for arg in &self.command {
            rendered.command.extend(arg.evaluate(&ctx)?);
        }

        rendered.source = self
            .source
            .as_ref()
            .map(|arg| arg.evaluate_single(&ctx))
            .transpose()?;
        rendered.dest = self
            .dest
            .as_ref()
            .map(|arg| arg.evaluate_single(&ctx))
            .transpose()?;

        Ok(rendered)
    }
}

/// A step with every argument resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedStep {
    pub name: String,
    #[serde(flatten)]
    pub kind: StepKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workdir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub halt_on_failure: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locks: Vec<LockAccess>,
    #[serde(default)]
    pub skipped: bool,
}

/// An ordered list of build steps for one platform or configuration.
#[derive(Debug, Clone, Default)]
pub struct BuildFactory {
    name: String,
    steps: Vec<StepDefinition>,
}

impl BuildFactory {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_step(&mut self, step: StepDefinition) {
        self.steps.push(step);
    }

    pub fn extend(&mut self, steps: impl IntoIterator<Item = StepDefinition>) {
        self.steps.extend(steps);
    }

    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn render(&self, props: &Properties) -> Result<Vec<RenderedStep>> {
        self.steps.iter().map(|step| step.render(props)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::lock::MasterLock;
    use pretty_assertions::assert_eq;

    #[derive(Debug)]
    struct ArchFlags;

    impl Render for ArchFlags {
        fn name(&self) -> &str {
            "arch_flags"
        }

        fn render(&self, props: &Properties) -> Result<Vec<String>> {
            if props.is("arch", "amd64") {
                Ok(vec![])
            } else {
                Ok(vec!["setarch".to_string(), props.require_string("arch")?])
            }
        }
    }

    fn props() -> Properties {
        Properties::new()
            .with("suite", "bionic")
            .with("arch", "i386")
            .with("version", "1.10.5")
    }

    #[test]
    fn test_render_mixed_args() {
        let step = StepDefinition::compile(vec![
            "docker".into(),
            "run".into(),
            Arg::template("${{ prop.suite }}-${{ prop.arch }}"),
            Arg::computed(ArchFlags),
            "--version".into(),
            Arg::property("version"),
        ])
        .halt_on_failure();

        let rendered = step.render(&props()).unwrap();
        assert_eq!(
            rendered.command,
            vec!["docker", "run", "bionic-i386", "setarch", "i386", "--version", "1.10.5"]
        );
        assert!(rendered.halt_on_failure);
        assert!(!rendered.skipped);
    }

    #[test]
    fn test_computed_arg_may_expand_to_nothing() {
        let step = StepDefinition::shell(vec!["python".into(), Arg::computed(ArchFlags)]);
        let rendered = step.render(&props().with("arch", "amd64")).unwrap();
        assert_eq!(rendered.command, vec!["python"]);
    }

    #[test]
    fn test_condition_skips_step() {
        let step = StepDefinition::test(vec![Arg::property("not-set")])
            .named("build_samples")
            .when("${{ prop.branch }} == deploy-ng");

        let rendered = step.render(&props().with("branch", "master")).unwrap();
        assert!(rendered.skipped);
        assert!(rendered.command.is_empty());

        let err = step.render(&props().with("branch", "deploy-ng")).unwrap_err();
        assert!(matches!(err, Error::MissingProperty(ref name) if name == "not-set"));
    }

    #[test]
    fn test_upload_paths_and_locks() {
        let lock = MasterLock::new("reprepro");
        let step = StepDefinition::file_upload(
            Arg::template("built/${{ prop.suite }}.deb"),
            Arg::template("/srv/downloads/${{ prop.suite }}.deb"),
        )
        .mode(0o664)
        .lock(lock.exclusive());

        let rendered = step.render(&props()).unwrap();
        assert_eq!(rendered.source.as_deref(), Some("built/bionic.deb"));
        assert_eq!(rendered.dest.as_deref(), Some("/srv/downloads/bionic.deb"));
        assert_eq!(rendered.mode, Some(0o664));
        assert_eq!(rendered.locks, vec![lock.exclusive()]);
    }

    #[test]
    fn test_env_is_visible_to_templates() {
        let step = StepDefinition::shell(vec![Arg::template("${{ env.OUT }}/bin")])
            .env("OUT", Arg::template("/build/${{ prop.suite }}"));
        let rendered = step.render(&props()).unwrap();
        assert_eq!(rendered.env.get("OUT").map(String::as_str), Some("/build/bionic"));
        assert_eq!(rendered.command, vec!["/build/bionic/bin"]);
    }

    #[test]
    fn test_rendered_step_serializes_kind_inline() {
        let step = StepDefinition::set_property("version", vec!["python".into(), "getversion.py".into()]);
        let json = serde_json::to_value(step.render(&props()).unwrap()).unwrap();
        assert_eq!(json["type"], "set_property_from_command");
        assert_eq!(json["property"], "version");
        assert_eq!(json["name"], "set version");
    }

    #[test]
    fn test_factory_renders_in_order() {
        let mut factory = BuildFactory::new("deb");
        factory.add_step(StepDefinition::git("https://example.com/repo.git", Some("v*")));
        factory.extend([StepDefinition::remove_directory("built/slave")]);

        let steps = factory.render(&props()).unwrap();
        assert_eq!(factory.len(), 2);
        assert_eq!(steps[0].name, "git");
        assert_eq!(steps[1].kind, StepKind::RemoveDirectory { dir: "built/slave".to_string() });
    }
}
