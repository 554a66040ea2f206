//! Shared fixture database for the scenario tests.
//!
//! Scenario `onsset-ke-1` has features 0, 1, 2, 4 and 5 (3 is absent).
//! Code 99 marks "not applicable".

use gep_db::Database;

pub fn sample_db() -> Database {
    let db = Database::new().unwrap();
    db.load_countries(include_str!("../../fixtures/countries.csv")).unwrap();
    db.load_models(include_str!("../../fixtures/models.csv")).unwrap();
    db.load_scenarios(include_str!("../../fixtures/scenarios.csv")).unwrap();
    db
}
