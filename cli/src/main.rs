mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process;

use crate::commands::{cmd_check, cmd_clear, cmd_foods, cmd_history, cmd_thresholds, cmd_weekly};
use crate::config::Config;
use nutricheck_core::db::Database;
use nutricheck_core::history::History;
use nutricheck_core::service::NutritionService;

#[derive(Parser)]
#[command(
    name = "nutricheck",
    version,
    about = "A simple nutrition checker CLI",
    long_about = "\nLog meals as free text (\"apple, egg, yam\"), get per-nutrient totals,\nand see each nutrient classified low/normal/high against its thresholds.\n"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a meal's nutrition and log it to the history
    Check {
        /// Foods separated by commas (e.g. "apple, egg, yam")
        meal: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the cumulative summary over all logged meals
    Weekly {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List all logged meal records
    History {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete the entire meal history
    Clear {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the food catalog
    Foods {
        /// Filter foods by name
        #[arg(short, long)]
        search: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the classification threshold table
    Thresholds {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let catalog = config.load_catalog()?;
    let thresholds = config.load_thresholds()?;

    let db = Database::open(&config.db_path)?;
    let mut history = History::new(db);
    if let Err(e) = history.load_all() {
        eprintln!("Warning: {e:#}; starting with an empty history");
    }
    let mut svc = NutritionService::new(catalog, thresholds, history)?;

    match cli.command {
        Commands::Check { meal, json } => cmd_check(&mut svc, &meal, json),
        Commands::Weekly { json } => cmd_weekly(&svc, json),
        Commands::History { json } => cmd_history(&svc, json),
        Commands::Clear { json } => cmd_clear(&mut svc, json),
        Commands::Foods { search, json } => cmd_foods(&svc, search.as_deref(), json),
        Commands::Thresholds { json } => cmd_thresholds(&svc, json),
    }
}
