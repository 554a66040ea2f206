//! Model, country and single-feature lookups with decoded list columns.

use crate::encoding::decode_list;
use crate::model_schema::{model_id_for_scenario, resolve_model, FilterDefinition};
use crate::query_builder::feature_query;
use crate::{Result, ScenarioError};
use gep_db::models::ModelRecord;
use gep_db::{Database, QueryExecutor};
use serde::Serialize;
use serde_json::Value;

/// Model metadata as the API returns it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDetails {
    pub id: String,
    pub country: String,
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub model_type: Option<String>,
    pub version: Option<String>,
    pub attribution: Option<String>,
    pub disclaimer: Option<String>,
    pub source_data: Option<String>,
    pub map: Option<String>,
    pub base_year: i64,
    pub timesteps: Vec<i64>,
    pub filters: Vec<FilterDefinition>,
    pub levers: Vec<Value>,
    pub updated_at: Option<String>,
}

impl ModelDetails {
    pub fn decode(record: ModelRecord) -> Result<Self> {
        let mut timesteps: Vec<i64> = decode_list("timesteps", record.timesteps.as_deref())?;
        timesteps.sort_unstable();
        Ok(Self {
            filters: decode_list("filters", record.filters.as_deref())?,
            levers: decode_list("levers", record.levers.as_deref())?,
            timesteps,
            id: record.id,
            country: record.country,
            name: record.name,
            description: record.description,
            model_type: record.model_type,
            version: record.version,
            attribution: record.attribution,
            disclaimer: record.disclaimer,
            source_data: record.source_data,
            map: record.map,
            base_year: record.base_year,
            updated_at: record.updated_at,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryDetails {
    pub id: String,
    pub name: String,
    pub models: Vec<ModelDetails>,
    /// Filled in by the caller from the indicator table.
    pub rise_scores: Option<Value>,
}

/// Per-feature figures at one year.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureDetails {
    pub investment_cost: Option<f64>,
    pub new_capacity: Option<f64>,
    pub people_connected: Option<f64>,
}

pub fn model_details(db: &Database, model_id: &str) -> Result<ModelDetails> {
    ModelDetails::decode(db.query_model(&model_id.to_lowercase())?)
}

/// A country and every model built for it, newest first.
pub fn country_details(db: &Database, country_id: &str) -> Result<CountryDetails> {
    let country = db.query_country(country_id)?;
    let models = db
        .query_country_models(&country.id)?
        .into_iter()
        .map(ModelDetails::decode)
        .collect::<Result<Vec<_>>>()?;
    Ok(CountryDetails {
        id: country.id,
        name: country.name,
        models,
        rise_scores: None,
    })
}

/// Investment, new capacity and connected population of one feature.
///
/// `year` defaults to the model's final timestep.
pub fn feature_details<E: QueryExecutor>(
    exec: &E,
    scenario_id: &str,
    feature_id: i64,
    year: Option<i64>,
) -> Result<FeatureDetails> {
    let scenario_id = scenario_id.to_lowercase();
    let model = resolve_model(exec, &scenario_id)?;
    let year = model.resolve_year(year, model.final_year())?;
    let row = feature_query(&scenario_id, feature_id, year)?
        .run_one(exec)
        .map_err(|e| match e {
            ScenarioError::NotFound(_) => ScenarioError::NotFound(format!(
                "feature {} of scenario {}",
                feature_id, scenario_id
            )),
            other => other,
        })?;
    log::debug!(
        "[GEP] feature: {} of {} (model {}) at {}",
        feature_id,
        scenario_id,
        model_id_for_scenario(&scenario_id),
        year
    );
    Ok(FeatureDetails {
        investment_cost: row.get_f64("investmentCost"),
        new_capacity: row.get_f64("newCapacity"),
        people_connected: row.get_f64("peopleConnected"),
    })
}
