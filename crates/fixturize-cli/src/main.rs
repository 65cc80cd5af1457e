//! fixturize - GitHub API fixture recorder
//!
//! Records scripted scenarios against the GitHub API and stores their
//! normalized request/response pairs as fixtures.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fixturize_core::config::{Config, DEFAULT_CONFIG_FILE};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;

/// fixturize - GitHub API fixture recorder
#[derive(Parser, Debug)]
#[command(name = "fixturize")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Record scenarios and compare them with the stored fixtures
    Record(commands::record::RecordArgs),

    /// Re-normalize stored raw fixtures
    Normalize(commands::normalize::NormalizeArgs),

    /// List scenarios and their stored fixtures
    #[command(alias = "ls")]
    List,

    /// Delete temporary repositories left behind by failed recordings
    RemoveTemporaryRepositories,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config = Config::from_file_or_default(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;

    match cli.command {
        Commands::Record(args) => {
            // Exit codes distinguish out-of-date fixtures from failures.
            let exit_code = commands::record::run_record(&config, &args);
            std::process::exit(i32::from(exit_code));
        },
        Commands::Normalize(args) => {
            let exit_code = commands::normalize::run_normalize(&config, &args);
            std::process::exit(i32::from(exit_code));
        },
        Commands::List => commands::list::run_list(&config),
        Commands::RemoveTemporaryRepositories => commands::cleanup::run_cleanup(&config),
    }
}
