//! Kiln CI CLI entrypoint.

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod handlers;

#[cfg(test)]
mod demos_tests;

use commands::{BuilderCommands, Commands, ConfigCommands, LogFormat, OutputFormat};

#[derive(Parser)]
#[command(name = "kiln")]
#[command(author, version, about = "Kiln CI build master tooling", long_about = None)]
struct Cli {
    /// Master configuration file
    #[arg(short, long, global = true, env = "KILN_CONFIG", default_value = "kiln.yaml")]
    config: PathBuf,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing(format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let registry = tracing_subscriber::registry().with(env_filter);
    match format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match cli.command {
        Commands::Version {
            props,
            dialect,
            package,
        } => handlers::version(&cli.config, &props, dialect.into(), package)?,
        Commands::Builders { command } => match command {
            BuilderCommands::List => handlers::list_builders(&cli.config, cli.format)?,
            BuilderCommands::Render { name, props } => {
                handlers::render_builder(&cli.config, &name, &props, cli.format)?
            }
        },
        Commands::Config { command } => match command {
            ConfigCommands::Validate => handlers::validate_config(&cli.config)?,
            ConfigCommands::Show => handlers::show_config(&cli.config, cli.format)?,
            ConfigCommands::Schema => handlers::config_schema()?,
        },
    }

    Ok(())
}
