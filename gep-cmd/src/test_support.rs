//! Fixture databases for the command tests.

use gep_db::Database;
use std::path::PathBuf;

const COUNTRIES_CSV: &str = include_str!("../../fixtures/countries.csv");
const MODELS_CSV: &str = include_str!("../../fixtures/models.csv");
const SCENARIOS_CSV: &str = include_str!("../../fixtures/scenarios.csv");

fn load(db: &Database) {
    db.load_countries(COUNTRIES_CSV).unwrap();
    db.load_models(MODELS_CSV).unwrap();
    db.load_scenarios(SCENARIOS_CSV).unwrap();
}

pub fn fixture_db() -> Database {
    let db = Database::new().unwrap();
    load(&db);
    db
}

/// Write the fixtures to a fresh database file named after `name`.
pub fn fixture_file(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("gep-{}-{}.sqlite3", name, std::process::id()));
    let _ = std::fs::remove_file(&path);
    let db = Database::create(&path).unwrap();
    load(&db);
    path
}
