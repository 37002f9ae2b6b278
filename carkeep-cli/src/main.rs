use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::debug;

use carkeep_cli::app::{self, Command, OutputFormat};
use carkeep_cli::config::AppConfig;
use carkeep_cli::logging;

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Compare the three-year cost of replacing a vehicle against keeping it.
///
/// Connects to the configured database (SQLite by default, created and
/// seeded on first use), runs one command and prints the result.
#[derive(Debug, Parser)]
#[command(name = "carkeep", version)]
struct Cli {
    /// Configuration file. Defaults to `$CARKEEP_CONFIG`, then `./carkeep.toml`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database backend, overriding the configuration file.
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Database connection string, overriding the configuration file.
    /// For SQLite this is a file path (e.g. `carkeep.db`) or `:memory:`.
    #[arg(long, global = true)]
    db: Option<String>,

    /// Log filter, overriding the configuration file (e.g. `debug`).
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(backend) = cli.backend {
        config.database.backend = backend;
    }
    if let Some(db) = cli.db {
        config.database.connection_string = db;
    }

    logging::init_logging(&config.logging)?;
    if let Some(level) = &cli.log_level {
        logging::set_log_level(level)?;
    }
    debug!(?config, "configuration resolved");

    let repo = app::open_repository(&config.db_config()).await?;
    let output = app::run(&*repo, &cli.command, cli.format).await?;
    print!("{output}");

    Ok(())
}
