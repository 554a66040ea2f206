//! Command implementations for the GEP CLI.
//!
//! Provides subcommands for serving the scenario API, building a database
//! from CSV exports, and printing a single scenario summary.

use clap::Subcommand;
use std::path::PathBuf;

pub mod load;
pub mod rise;
pub mod serve;
pub mod summary;

#[cfg(test)]
pub(crate) mod test_support;

#[derive(Subcommand)]
pub enum Command {
    /// Serve the scenario API over HTTP
    Serve {
        /// SQLite database to read from
        #[arg(long, env = "GEP_DB_PATH", default_value = "gep.sqlite3")]
        db: PathBuf,

        /// Address to listen on
        #[arg(long, env = "GEP_BIND_ADDR", default_value = "0.0.0.0:8000")]
        bind: String,

        /// RISE indicators JSON (array of objects with an `iso` field)
        #[arg(
            long,
            env = "GEP_RISE_SCORES",
            default_value = "fixtures/rise-indicators.json"
        )]
        rise_scores: PathBuf,
    },

    /// Create or update a database from CSV exports
    Load {
        /// SQLite database to write (created if missing)
        #[arg(long, env = "GEP_DB_PATH", default_value = "gep.sqlite3")]
        db: PathBuf,

        /// Countries CSV (`id,name`)
        #[arg(long)]
        countries: Option<PathBuf>,

        /// Models CSV
        #[arg(long)]
        models: Option<PathBuf>,

        /// Scenario feature rows CSV
        #[arg(long)]
        scenarios: Option<PathBuf>,
    },

    /// Print one scenario summary as JSON
    Summary {
        /// Scenario id, e.g. `onsset-ke-1`
        scenario_id: String,

        #[arg(long, env = "GEP_DB_PATH", default_value = "gep.sqlite3")]
        db: PathBuf,

        /// Target year (defaults to the model's first timestep)
        #[arg(short, long)]
        year: Option<i64>,

        /// Filters as a JSON array, e.g. `[{"key":"Pop","max":100}]`
        #[arg(short, long)]
        filters: Option<String>,
    },
}

pub async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Serve {
            db,
            bind,
            rise_scores,
        } => serve::run_serve(&db, &bind, &rise_scores).await,
        Command::Load {
            db,
            countries,
            models,
            scenarios,
        } => load::run_load(
            &db,
            countries.as_deref(),
            models.as_deref(),
            scenarios.as_deref(),
        ),
        Command::Summary {
            scenario_id,
            db,
            year,
            filters,
        } => summary::run_summary(&db, &scenario_id, year, filters.as_deref()),
    }
}
