//! Country RISE indicator scores.
//!
//! The table is read once at startup and is read-only afterwards.

use log::{info, warn};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

static RISE_SCORES: OnceLock<HashMap<String, Value>> = OnceLock::new();

/// Index a JSON array of indicator records by their `iso` code.
pub fn parse_rise_scores(json: &str) -> anyhow::Result<HashMap<String, Value>> {
    let records: Vec<Value> = serde_json::from_str(json)?;
    let mut scores = HashMap::with_capacity(records.len());
    for record in records {
        match record.get("iso").and_then(Value::as_str) {
            Some(iso) => {
                scores.insert(iso.to_uppercase(), record);
            }
            None => warn!("[GEP] rise: skipping record without iso: {}", record),
        }
    }
    Ok(scores)
}

/// Read the indicator file. A missing file gives an empty table.
pub fn load_rise_scores(path: &Path) -> anyhow::Result<HashMap<String, Value>> {
    if !path.exists() {
        warn!("[GEP] rise: {} not found, serving without scores", path.display());
        return Ok(HashMap::new());
    }
    let json = std::fs::read_to_string(path)?;
    let scores = parse_rise_scores(&json)
        .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path.display(), e))?;
    info!("[GEP] rise: loaded {} countries from {}", scores.len(), path.display());
    Ok(scores)
}

/// Install the process-wide table. Returns false if one was already installed.
pub fn install(scores: HashMap<String, Value>) -> bool {
    RISE_SCORES.set(scores).is_ok()
}

pub fn rise_scores(iso: &str) -> Option<Value> {
    RISE_SCORES.get()?.get(&iso.to_uppercase()).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_are_keyed_by_iso() {
        let scores = parse_rise_scores(
            r#"[{"iso":"KE","overall":71.3},{"iso":"bj","overall":40},{"name":"no iso"}]"#,
        )
        .unwrap();
        assert_eq!(scores.len(), 2);
        assert_eq!(scores["KE"]["overall"], 71.3);
        assert!(scores.contains_key("BJ"));
    }

    #[test]
    fn missing_file_is_empty() {
        let path = std::env::temp_dir().join("gep-rise-does-not-exist.json");
        assert!(load_rise_scores(&path).unwrap().is_empty());
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(parse_rise_scores("{not json").is_err());
    }

    #[test]
    fn fixture_parses() {
        let scores = parse_rise_scores(include_str!("../../fixtures/rise-indicators.json")).unwrap();
        assert!(scores.contains_key("KE"));
    }
}
