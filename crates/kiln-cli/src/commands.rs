//! CLI command definitions.

use clap::{Args, Subcommand, ValueEnum};
use kiln_version::VersionDialect;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve the version string for a build
    Version {
        #[command(flatten)]
        props: PropertyArgs,

        /// Version dialect
        #[arg(short, long, value_enum, default_value_t = Dialect::Wheel)]
        dialect: Dialect,

        /// Print the packaging-tool override instead (empty for a plain release)
        #[arg(long)]
        package: bool,
    },

    /// Inspect the builder catalog
    Builders {
        #[command(subcommand)]
        command: BuilderCommands,
    },

    /// Manage master configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum BuilderCommands {
    /// List builders
    List,

    /// Dry-run a builder's steps for a build
    Render {
        /// Builder name
        name: String,

        #[command(flatten)]
        props: PropertyArgs,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Check the config, worker and user files
    Validate,

    /// Show the effective configuration
    Show,

    /// Print the JSON schema of the config file
    Schema,
}

/// Build properties given on the command line.
#[derive(Args, Debug, Clone, Default)]
pub struct PropertyArgs {
    /// JSON file of build properties; later files win
    #[arg(short = 'p', long = "props", value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Set a property, overriding the files
    #[arg(short = 'D', value_name = "KEY=VALUE", value_parser = parse_define)]
    pub defines: Vec<(String, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Dialect {
    Wheel,
    Debian,
}

impl From<Dialect> for VersionDialect {
    fn from(dialect: Dialect) -> Self {
        match dialect {
            Dialect::Wheel => VersionDialect::Wheel,
            Dialect::Debian => VersionDialect::Debian,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

pub fn parse_define(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got {raw:?}")),
    }
}
