//! SQL schema definitions for the SQLite database.
//!
//! Contains CREATE TABLE statements for the fixed tables. The measure
//! columns of `scenarios` depend on each model's timesteps, so only the key
//! columns are declared here; the scenario loader adds the rest.

/// Returns the full SQL schema as a single batch string.
///
/// This creates the following tables:
///
/// - `countries` - ISO code and display name
/// - `models` - Model metadata. `timesteps`, `filters` and `levers` are
///   list columns stored as text (JSON, or the legacy bracketed encoding)
/// - `scenarios` - Feature rows keyed by `(scenarioId, featureId)`
pub fn create_schema() -> &'static str {
    r#"
    CREATE TABLE IF NOT EXISTS countries (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS models (
        id TEXT PRIMARY KEY,
        country TEXT NOT NULL,
        name TEXT,
        description TEXT,
        type TEXT,
        version TEXT,
        attribution TEXT,
        disclaimer TEXT,
        sourceData TEXT,
        map TEXT,
        baseYear INTEGER NOT NULL,
        timesteps TEXT,
        filters TEXT,
        levers TEXT,
        updatedAt TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_models_country ON models(country);

    CREATE TABLE IF NOT EXISTS scenarios (
        scenarioId TEXT NOT NULL,
        featureId INTEGER NOT NULL,
        PRIMARY KEY (scenarioId, featureId)
    );
    CREATE INDEX IF NOT EXISTS idx_scenarios_scenario ON scenarios(scenarioId);
    "#
}
