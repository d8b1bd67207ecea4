//! Command handlers.

use crate::commands::{OutputFormat, PropertyArgs};
use anyhow::Context;
use console::style;
use kiln_builders::Catalog;
use kiln_core::{MasterConfig, Properties, RenderedStep};
use kiln_version::{CommitContext, VersionDialect, VersionResolver};
use serde::Serialize;
use serde_json::json;
use std::path::Path;
use tracing::debug;

const REDACTED: &str = "<redacted>";

pub fn load_config(path: &Path) -> anyhow::Result<MasterConfig> {
    MasterConfig::load(path).with_context(|| format!("Failed to load config {}", path.display()))
}

/// Merge the property files in order, then apply `-D` overrides as strings.
pub fn load_properties(args: &PropertyArgs) -> anyhow::Result<Properties> {
    let mut props = Properties::new();
    for file in &args.files {
        let loaded = Properties::from_json_file(file)
            .with_context(|| format!("Failed to read properties from {}", file.display()))?;
        props.merge(&loaded);
    }
    for (key, value) in &args.defines {
        props.set(key.clone(), value.clone());
    }
    debug!(files = args.files.len(), count = props.len(), "Loaded build properties");
    Ok(props)
}

fn print_serialized<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text | OutputFormat::Yaml => print!("{}", serde_yaml::to_string(value)?),
    }
    Ok(())
}

pub fn resolve_version(
    config: &MasterConfig,
    props: &Properties,
    dialect: VersionDialect,
    package: bool,
) -> anyhow::Result<String> {
    let resolver = VersionResolver::new().with_release_prefix(config.release_branch_prefix.clone());
    let ctx = CommitContext::from_properties(props).context("Invalid build properties")?;
    let version = if package {
        resolver.package_version(&ctx, dialect)
    } else {
        resolver.display_version(&ctx, dialect)
    };
    Ok(version.into_string())
}

pub fn version(
    config_path: &Path,
    args: &PropertyArgs,
    dialect: VersionDialect,
    package: bool,
) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let props = load_properties(args)?;
    println!("{}", resolve_version(&config, &props, dialect, package)?);
    Ok(())
}

pub fn list_builders(config_path: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let catalog = Catalog::from_config(load_config(config_path)?).context("Invalid builder catalog")?;

    if format != OutputFormat::Text {
        let builders: Vec<_> = catalog
            .builders()
            .iter()
            .map(|b| {
                json!({
                    "name": b.name,
                    "factory": b.factory.name(),
                    "workers": b.workers,
                    "properties": b.properties,
                })
            })
            .collect();
        return print_serialized(&builders, format);
    }

    println!("{} builders:", catalog.len());
    for builder in catalog.builders() {
        println!(
            "  {} {} on {}",
            style(&builder.name).bold(),
            style(format!("[{}]", builder.factory.name())).dim(),
            builder.workers.join(", ")
        );
    }
    Ok(())
}

fn print_step(index: usize, step: &RenderedStep) {
    if step.skipped {
        println!(
            "{} {} {}",
            style(format!("{index:>2}.")).dim(),
            step.name,
            style("(skipped)").yellow()
        );
        return;
    }

    println!("{} {}", style(format!("{index:>2}.")).dim(), style(&step.name).bold());
    if let Some(workdir) = &step.workdir {
        println!("      workdir: {workdir}");
    }
    for (name, value) in &step.env {
        println!("      env: {name}={value}");
    }
    if !step.command.is_empty() {
        println!("      $ {}", step.command.join(" "));
    }
    match (&step.source, &step.dest) {
        (Some(source), Some(dest)) => println!("      {source} -> {dest}"),
        (Some(source), None) => println!("      {source}"),
        _ => {}
    }
    for lock in &step.locks {
        println!("      lock: {}", lock.lock);
    }
}

pub fn render_builder(
    config_path: &Path,
    name: &str,
    args: &PropertyArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let catalog = Catalog::from_config(load_config(config_path)?).context("Invalid builder catalog")?;
    let builder = catalog.get(name)?;
    let props = load_properties(args)?;

    let steps = builder
        .render(&props)
        .with_context(|| format!("Failed to render builder {name}"))?;

    if format != OutputFormat::Text {
        return print_serialized(&steps, format);
    }

    println!(
        "{} {} ({} steps)",
        style("▶").cyan(),
        style(&builder.name).bold(),
        steps.len()
    );
    for (index, step) in steps.iter().enumerate() {
        print_step(index + 1, step);
    }
    Ok(())
}

pub fn validate_config(config_path: &Path) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let workers = config.load_workers().context("Failed to load workers")?;
    let users = config.load_users().context("Failed to load users")?;
    config.validate_workers(&workers)?;
    let catalog = Catalog::from_config(config).context("Invalid builder catalog")?;

    if config_path.exists() {
        println!("{} {} is valid", style("✓").green(), config_path.display());
    } else {
        println!(
            "{} No config at {}; defaults are valid",
            style("✓").green(),
            config_path.display()
        );
    }
    println!("  Workers: {}", workers.len());
    println!("  Users: {}", users.len());
    println!("  Builders: {}", catalog.len());
    Ok(())
}

pub fn show_config(config_path: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let mut effective = serde_json::to_value(&config)?;

    let workers_path = config.resolve_path(&config.workers_file);
    if workers_path.exists() {
        let workers = config.load_workers().context("Failed to load workers")?;
        effective["registered_workers"] = workers
            .iter()
            .map(|w| {
                json!({
                    "name": w.name,
                    "password": REDACTED,
                    "max_builds": w.max_builds,
                })
            })
            .collect();
    }

    print_serialized(&effective, format)
}

pub fn config_schema() -> anyhow::Result<()> {
    let schema = schemars::schema_for!(MasterConfig);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
