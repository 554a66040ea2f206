//! Resolution of a scenario's model: filters, timesteps and base year.

use crate::encoding::decode_list;
use crate::{Result, ScenarioError};
use gep_db::{Params, QueryExecutor};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A filter a model allows on its feature rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterDefinition {
    /// User-facing name, unique within the model.
    pub key: String,
    /// Storage column; the key itself when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    /// Whether the column carries a year suffix (`Pop` -> `Pop2030`).
    #[serde(default, alias = "timestamp")]
    pub timestep: bool,
    /// Display metadata (label, unit, type, ...) passed through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl FilterDefinition {
    pub fn column(&self) -> &str {
        self.column.as_deref().unwrap_or(&self.key)
    }
}

/// The parts of a model a scenario summary depends on.
#[derive(Debug, Clone)]
pub struct Model {
    pub id: String,
    pub base_year: i64,
    /// Projection years after the base year, ascending.
    pub timesteps: Vec<i64>,
    pub filters: Vec<FilterDefinition>,
    pub levers: Vec<serde_json::Value>,
    filter_index: HashMap<String, usize>,
}

impl Model {
    pub fn new(
        id: String,
        base_year: i64,
        timesteps: Vec<i64>,
        filters: Vec<FilterDefinition>,
        levers: Vec<serde_json::Value>,
    ) -> Self {
        let filter_index = filters
            .iter()
            .enumerate()
            .map(|(i, f)| (f.key.clone(), i))
            .collect();
        Self {
            id,
            base_year,
            timesteps,
            filters,
            levers,
            filter_index,
        }
    }

    /// Filter definition by user-facing key.
    pub fn filter(&self, key: &str) -> Option<&FilterDefinition> {
        self.filter_index.get(key).map(|&i| &self.filters[i])
    }

    pub fn intermediate_year(&self) -> Option<i64> {
        self.timesteps.first().copied()
    }

    pub fn final_year(&self) -> Option<i64> {
        self.timesteps.last().copied()
    }

    /// Check `year` against the timesteps, defaulting to `default` when unset.
    pub fn resolve_year(&self, year: Option<i64>, default: Option<i64>) -> Result<i64> {
        let allowed = || {
            self.timesteps
                .iter()
                .map(|y| y.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };
        match year.or(default) {
            Some(year) if self.timesteps.contains(&year) => Ok(year),
            Some(year) => Err(ScenarioError::InvalidParameter(format!(
                "The parameter {} is invalid for this scenario, must be one of {}",
                year,
                allowed()
            ))),
            None => Err(ScenarioError::InvalidParameter(format!(
                "model {} declares no timesteps",
                self.id
            ))),
        }
    }
}

/// Model id of a scenario: the first two dash-separated segments of the
/// lowercased scenario id (`abc-countryx-1` -> `abc-countryx`).
pub fn model_id_for_scenario(scenario_id: &str) -> String {
    let scenario_id = scenario_id.to_lowercase();
    let mut segments = scenario_id.splitn(3, '-');
    match (segments.next(), segments.next()) {
        (Some(kind), Some(country)) => format!("{}-{}", kind, country),
        _ => scenario_id,
    }
}

/// Load the model a scenario belongs to.
pub fn resolve_model<E: QueryExecutor>(exec: &E, scenario_id: &str) -> Result<Model> {
    let model_id = model_id_for_scenario(scenario_id);
    let mut params = Params::new();
    params.bind("modelId", model_id.clone());

    let row = exec
        .execute_one(
            "SELECT id, filters, timesteps, baseYear, levers FROM models WHERE id = :modelId",
            &params,
        )
        .map_err(|e| match ScenarioError::from(e) {
            ScenarioError::NotFound(_) => ScenarioError::NotFound(format!("model {}", model_id)),
            other => other,
        })?;

    let filters: Vec<FilterDefinition> = decode_list("filters", row.get_text("filters"))?;
    let mut timesteps: Vec<i64> = decode_list("timesteps", row.get_text("timesteps"))?;
    timesteps.sort_unstable();
    let levers = decode_list("levers", row.get_text("levers"))?;
    let base_year = row.get_i64("baseYear").ok_or_else(|| {
        ScenarioError::InvalidParameter(format!("model {} has no base year", model_id))
    })?;

    let model = Model::new(model_id, base_year, timesteps, filters, levers);
    if model.filter_index.len() != model.filters.len() {
        log::warn!("[GEP] model {}: duplicate filter keys, last one wins", model.id);
    }
    log::debug!(
        "[GEP] model {}: base year {}, timesteps {:?}, {} filters",
        model.id,
        model.base_year,
        model.timesteps,
        model.filters.len()
    );
    Ok(model)
}
