//! Print one scenario summary.

use gep_db::Database;
use gep_scenario::filters::parse_json_filters;
use gep_scenario::{build_scenario_summary, SummaryResponse};
use std::path::Path;

pub fn summarize(
    db: &Database,
    scenario_id: &str,
    year: Option<i64>,
    filters: Option<&str>,
) -> anyhow::Result<SummaryResponse> {
    let filters = filters.map(parse_json_filters).transpose()?;
    Ok(build_scenario_summary(db, scenario_id, year, filters, None)?)
}

pub fn run_summary(
    db_path: &Path,
    scenario_id: &str,
    year: Option<i64>,
    filters: Option<&str>,
) -> anyhow::Result<()> {
    let db = Database::open(db_path)?;
    let response = summarize(&db, scenario_id, year, filters)?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
