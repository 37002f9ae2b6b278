use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use carkeep_data::{ScenarioFileLoader, StateTaxLoader};
use carkeep_db_sqlite::{SqliteRepository, sqlite_url};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Load state tax configurations and scenario documents into the database.
///
/// The state tax CSV file should have the following columns:
/// - state_code: Two-letter code (e.g., VA)
/// - state_name: Display name
/// - property_tax_rate: Annual rate as a fraction (e.g., 0.0457)
/// - pptra_relief: Relief fraction (e.g., 0.51)
/// - relief_cap: Relief cap in dollars
/// - relief_cap_basis: relief_amount (default) or taxable_value
///
/// The scenario file is a JSON document with `baseline` and `examples` keys.
#[derive(Parser, Debug)]
#[command(name = "carkeep-loader")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to a CSV file of state tax configurations
    #[arg(long)]
    states: Option<PathBuf>,

    /// Path to a JSON scenario document
    #[arg(long)]
    scenarios: Option<PathBuf>,

    /// SQLite database path or URL (":memory:" for a throwaway database)
    #[arg(short, long, default_value = "carkeep.db")]
    database: String,

    /// Run database migrations before loading data
    #[arg(short, long, default_value_t = false)]
    migrate: bool,

    /// Run seed files from the specified directory after migrations
    #[arg(short, long)]
    seeds: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if args.states.is_none() && args.scenarios.is_none() && !args.migrate && args.seeds.is_none() {
        bail!("nothing to do: pass --states, --scenarios, --migrate or --seeds");
    }

    let url = sqlite_url(&args.database);
    let repo = SqliteRepository::new(&url)
        .await
        .with_context(|| format!("Failed to connect to database: {}", url))?;

    if args.migrate {
        println!("Running migrations...");
        repo.run_migrations()
            .await
            .context("Failed to run migrations")?;
        println!("Migrations complete.");
    }

    if let Some(seeds_dir) = &args.seeds {
        println!("Running seeds from: {}", seeds_dir.display());
        repo.run_seeds(seeds_dir)
            .await
            .with_context(|| format!("Failed to run seeds from: {}", seeds_dir.display()))?;
        println!("Seeds complete.");
    }

    if let Some(path) = &args.states {
        println!("Loading state taxes from: {}", path.display());
        let file = File::open(path).with_context(|| format!("Failed to open: {}", path.display()))?;
        let records = StateTaxLoader::parse(file)
            .with_context(|| format!("Failed to parse CSV: {}", path.display()))?;
        println!("Parsed {} records from CSV", records.len());

        let loaded = StateTaxLoader::load(&repo, &records)
            .await
            .context("Failed to load state taxes into database")?;
        println!("Successfully loaded {} state tax configurations.", loaded);
    }

    if let Some(path) = &args.scenarios {
        println!("Loading scenarios from: {}", path.display());
        let file = File::open(path).with_context(|| format!("Failed to open: {}", path.display()))?;
        let document = ScenarioFileLoader::parse(file)
            .with_context(|| format!("Failed to parse JSON: {}", path.display()))?;

        let summary = ScenarioFileLoader::load(&repo, &document)
            .await
            .context("Failed to load scenarios into database")?;
        println!(
            "Successfully loaded scenarios: {} created, {} updated{}.",
            summary.created,
            summary.updated,
            if summary.baseline_replaced { ", baseline replaced" } else { "" }
        );
    }

    Ok(())
}
