//! CLI parser and dispatch.

mod commands;
mod helpers;
mod icons;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::models::RunDate;

#[derive(Parser)]
#[command(name = "ruleacquire")]
#[command(about = "Discover and archive tabletop rulebook PDFs")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true, env = "RULEACQUIRE_CONFIG")]
    config: Option<PathBuf>,

    /// Output root (overrides output_dir from the config file)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Run date as YYYY-MM-DD (default: today)
    #[arg(long, global = true)]
    date: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Show the browser window instead of running headless
    #[arg(long, global = true)]
    headful: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Walk the catalog, then every product line (or the ones given)
    Run {
        /// Only process these product lines (repeatable, case-insensitive)
        #[arg(short, long = "line")]
        lines: Vec<String>,
    },

    /// Only walk the catalog
    Catalog,

    /// List configured product lines
    Lines,

    /// Print the effective configuration as TOML
    Config,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cwd = std::env::current_dir().context("Failed to read working directory")?;
    let mut config = Config::load(cli.config.as_deref(), &cwd)
        .await
        .context("Failed to load configuration")?;

    if let Some(output) = cli.output {
        config.output_dir = output;
    }
    if cli.headful {
        config.browser.headless = false;
    }

    let run_date = match cli.date.as_deref() {
        Some(date) => RunDate::parse(date)?,
        None => RunDate::today(),
    };

    match cli.command {
        Commands::Run { lines } => commands::run::cmd_run(config, run_date, &lines).await,
        Commands::Catalog => commands::catalog::cmd_catalog(config, run_date).await,
        Commands::Lines => commands::lines::cmd_lines(&config),
        Commands::Config => commands::config_cmd::cmd_config_show(&config),
    }
}
