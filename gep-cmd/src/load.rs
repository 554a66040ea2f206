//! Build a database file from CSV exports.

use gep_db::Database;
use log::info;
use std::path::Path;

/// Load whichever of the three CSV files are given into `db_path`.
pub fn run_load(
    db_path: &Path,
    countries: Option<&Path>,
    models: Option<&Path>,
    scenarios: Option<&Path>,
) -> anyhow::Result<()> {
    if countries.is_none() && models.is_none() && scenarios.is_none() {
        anyhow::bail!("nothing to load: pass --countries, --models or --scenarios");
    }
    let db = Database::create(db_path)?;

    if let Some(path) = countries {
        db.load_countries(&read_csv(path)?)?;
    }
    if let Some(path) = models {
        db.load_models(&read_csv(path)?)?;
    }
    if let Some(path) = scenarios {
        db.load_scenarios(&read_csv(path)?)?;
    }

    let stats = db.query_stats()?;
    info!(
        "Load complete. {} now has {} countries with models, {} model types",
        db_path.display(),
        stats.totals.countries,
        stats.totals.models
    );
    Ok(())
}

fn read_csv(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn fixture(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../fixtures")
            .join(name)
    }

    #[test]
    fn loads_fixture_files() {
        let db_path = std::env::temp_dir().join(format!("gep-load-{}.sqlite3", std::process::id()));
        let _ = std::fs::remove_file(&db_path);

        run_load(
            &db_path,
            Some(&fixture("countries.csv")),
            Some(&fixture("models.csv")),
            Some(&fixture("scenarios.csv")),
        )
        .unwrap();

        let db = Database::open(&db_path).unwrap();
        assert_eq!(db.query_stats().unwrap().totals.countries, 1);
        assert_eq!(db.query_model("onsset-ke").unwrap().base_year, 2020);
        let _ = std::fs::remove_file(&db_path);
    }

    #[test]
    fn requires_an_input() {
        let db_path = std::env::temp_dir().join("gep-load-nothing.sqlite3");
        assert!(run_load(&db_path, None, None, None).is_err());
    }

    #[test]
    fn missing_csv_is_an_error() {
        let db_path = std::env::temp_dir().join(format!("gep-load-missing-{}.sqlite3", std::process::id()));
        let missing = fixture("does-not-exist.csv");
        assert!(run_load(&db_path, Some(&missing), None, None).is_err());
        let _ = std::fs::remove_file(&db_path);
    }
}
